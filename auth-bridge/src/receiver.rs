//! Native-side receivers
//!
//! A [`Receiver`] is whatever sits on the far side of the boundary: the C
//! vtable adapter in [`crate::ffi`], an application closure, or the
//! [`Recorder`] used by tests and the CLI.
//!
//! Receivers are called synchronously on the platform's callback thread and
//! must not block it; long-running work belongs on the receiver's own
//! executor.

use crate::types::{Handle, Progress, Terminal};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;

/// The native application's view of the bridge
pub trait Receiver: Send + Sync {
    /// Called exactly once per session that reaches a terminal event
    fn on_terminal(&self, handle: Handle, terminal: &Terminal);

    /// Called for non-terminal events, strictly before `on_terminal`
    fn on_progress(&self, handle: Handle, progress: &Progress) {
        let _ = (handle, progress);
    }
}

impl<R: Receiver + ?Sized> Receiver for Arc<R> {
    fn on_terminal(&self, handle: Handle, terminal: &Terminal) {
        (**self).on_terminal(handle, terminal)
    }

    fn on_progress(&self, handle: Handle, progress: &Progress) {
        (**self).on_progress(handle, progress)
    }
}

impl<R: Receiver + ?Sized> Receiver for Box<R> {
    fn on_terminal(&self, handle: Handle, terminal: &Terminal) {
        (**self).on_terminal(handle, terminal)
    }

    fn on_progress(&self, handle: Handle, progress: &Progress) {
        (**self).on_progress(handle, progress)
    }
}

/// Adapts a pair of closures to [`Receiver`]
pub struct FnReceiver<T, P> {
    terminal: T,
    progress: P,
}

impl<T> FnReceiver<T, fn(Handle, &Progress)>
where
    T: Fn(Handle, &Terminal) + Send + Sync,
{
    /// Receiver that only cares about terminal notifications
    pub fn terminal_only(terminal: T) -> Self {
        Self {
            terminal,
            progress: |_, _| {},
        }
    }
}

impl<T, P> FnReceiver<T, P>
where
    T: Fn(Handle, &Terminal) + Send + Sync,
    P: Fn(Handle, &Progress) + Send + Sync,
{
    pub fn new(terminal: T, progress: P) -> Self {
        Self { terminal, progress }
    }
}

impl<T, P> Receiver for FnReceiver<T, P>
where
    T: Fn(Handle, &Terminal) + Send + Sync,
    P: Fn(Handle, &Progress) + Send + Sync,
{
    fn on_terminal(&self, handle: Handle, terminal: &Terminal) {
        (self.terminal)(handle, terminal)
    }

    fn on_progress(&self, handle: Handle, progress: &Progress) {
        (self.progress)(handle, progress)
    }
}

/// A notification as observed by a receiver
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "path", rename_all = "lowercase")]
pub enum Notification {
    Progress(Progress),
    Terminal(Terminal),
}

impl Notification {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Notification::Terminal(_))
    }
}

/// Receiver that records every notification in arrival order
#[derive(Debug, Default)]
pub struct Recorder {
    log: Mutex<Vec<(Handle, Notification)>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every notification received so far, across all handles
    pub fn notifications(&self) -> Vec<(Handle, Notification)> {
        self.log.lock().clone()
    }

    /// Notifications received for one handle, in order
    pub fn for_handle(&self, handle: Handle) -> Vec<Notification> {
        self.log
            .lock()
            .iter()
            .filter(|(h, _)| *h == handle)
            .map(|(_, n)| n.clone())
            .collect()
    }

    /// Terminal notifications received for one handle
    pub fn terminals(&self, handle: Handle) -> Vec<Terminal> {
        self.for_handle(handle)
            .into_iter()
            .filter_map(|n| match n {
                Notification::Terminal(t) => Some(t),
                Notification::Progress(_) => None,
            })
            .collect()
    }

    /// Progress notifications received for one handle
    pub fn progress(&self, handle: Handle) -> Vec<Progress> {
        self.for_handle(handle)
            .into_iter()
            .filter_map(|n| match n {
                Notification::Progress(p) => Some(p),
                Notification::Terminal(_) => None,
            })
            .collect()
    }

    /// Remove and return the notifications recorded for one handle.
    ///
    /// A handle value can be registered again once retired; taking a
    /// session's notifications when it ends keeps them out of the next one.
    pub fn take(&self, handle: Handle) -> Vec<Notification> {
        let mut log = self.log.lock();
        let mut taken = Vec::new();
        log.retain(|(h, n)| {
            if *h == handle {
                taken.push(n.clone());
                false
            } else {
                true
            }
        });
        taken
    }

    pub fn clear(&self) {
        self.log.lock().clear();
    }
}

impl Receiver for Recorder {
    fn on_terminal(&self, handle: Handle, terminal: &Terminal) {
        self.log
            .lock()
            .push((handle, Notification::Terminal(terminal.clone())));
    }

    fn on_progress(&self, handle: Handle, progress: &Progress) {
        self.log
            .lock()
            .push((handle, Notification::Progress(progress.clone())));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Outcome;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_recorder_keeps_order_per_handle() {
        let recorder = Recorder::new();
        let a = Handle::from_raw(1);
        let b = Handle::from_raw(2);

        recorder.on_progress(a, &Progress::Failed { attempt: 1 });
        recorder.on_progress(b, &Progress::Failed { attempt: 1 });
        recorder.on_terminal(a, &Terminal::new(Outcome::Success, 1));

        let for_a = recorder.for_handle(a);
        assert_eq!(for_a.len(), 2);
        assert!(!for_a[0].is_terminal());
        assert!(for_a[1].is_terminal());
        assert_eq!(recorder.terminals(b).len(), 0);
        assert_eq!(recorder.progress(b).len(), 1);
    }

    #[test]
    fn test_take_drains_one_handle() {
        let recorder = Recorder::new();
        let a = Handle::from_raw(1);
        let b = Handle::from_raw(2);

        recorder.on_progress(a, &Progress::Failed { attempt: 1 });
        recorder.on_progress(b, &Progress::Help { code: 1, message: "partial".into() });
        recorder.on_terminal(a, &Terminal::new(Outcome::Success, 1));

        let taken = recorder.take(a);
        assert_eq!(taken.len(), 2);
        assert!(taken[1].is_terminal());
        assert!(recorder.for_handle(a).is_empty());
        assert_eq!(recorder.for_handle(b).len(), 1);
        assert!(recorder.take(a).is_empty());
    }

    #[test]
    fn test_fn_receiver() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let receiver = FnReceiver::terminal_only(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        receiver.on_progress(Handle::from_raw(1), &Progress::Failed { attempt: 1 });
        receiver.on_terminal(Handle::from_raw(1), &Terminal::new(Outcome::Success, 0));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
