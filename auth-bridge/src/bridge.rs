//! Main bridge API
//!
//! The [`Bridge`] struct is the entry point for native code: it issues
//! session handles, accepts platform callbacks for them, and guarantees that
//! the receiver sees exactly one terminal notification per session.

use crate::config::BridgeConfig;
use crate::ffi::Boundary;
use crate::guard::TerminalGuard;
use crate::normalizer::{normalize, RawSignal};
use crate::receiver::Receiver;
use crate::registry::SessionRegistry;
use crate::types::{AuthEvent, Dispatch, Handle, Result, SessionSnapshot, SessionStatus};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Platform-to-native authentication bridge
pub struct Bridge {
    /// Live sessions, keyed by handle
    registry: SessionRegistry,
    /// Path into the native receiver
    boundary: Boundary,
    config: BridgeConfig,
    counters: Counters,
}

impl Bridge {
    /// Create a bridge with the default configuration
    pub fn new<R: Receiver + 'static>(receiver: R) -> Self {
        Self::with_config(receiver, BridgeConfig::default())
    }

    /// Create a bridge with an explicit configuration
    pub fn with_config<R: Receiver + 'static>(receiver: R, config: BridgeConfig) -> Self {
        Self::from_shared(Arc::new(receiver), config)
    }

    /// Create a bridge around a receiver that is shared with other code
    pub fn from_shared(receiver: Arc<dyn Receiver>, config: BridgeConfig) -> Self {
        Self {
            registry: SessionRegistry::with_capacity(config.initial_capacity),
            boundary: Boundary::new(receiver),
            config,
            counters: Counters::default(),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Start a new session and return its handle
    ///
    /// # Example
    /// ```
    /// use auth_bridge::{Bridge, Recorder};
    ///
    /// let bridge = Bridge::new(Recorder::new());
    /// let handle = bridge.begin_session();
    /// assert!(bridge.session(handle).is_ok());
    /// ```
    pub fn begin_session(&self) -> Handle {
        let handle = self.registry.issue();
        log::info!("Began authentication session {}", handle);
        handle
    }

    /// Register a session for a handle chosen by the native side.
    ///
    /// Fails with `DuplicateHandle` if that handle is still live.
    pub fn register(&self, handle: Handle) -> Result<SessionSnapshot> {
        let session = self.registry.register(handle)?;
        log::info!("Registered authentication session {}", handle);
        Ok(session)
    }

    /// Snapshot of a live session
    pub fn session(&self, handle: Handle) -> Result<SessionSnapshot> {
        self.registry.lookup(handle)
    }

    /// Feed one platform callback for `handle` through the bridge
    ///
    /// # Example
    /// ```
    /// use auth_bridge::{Bridge, Dispatch, RawSignal, Recorder};
    /// use std::sync::Arc;
    ///
    /// let recorder = Arc::new(Recorder::new());
    /// let bridge = Bridge::new(Arc::clone(&recorder));
    /// let handle = bridge.begin_session();
    ///
    /// assert_eq!(bridge.signal(handle, RawSignal::Failed), Dispatch::Progress);
    /// assert_eq!(
    ///     bridge.signal(handle, RawSignal::Succeeded { authentication_type: 2 }),
    ///     Dispatch::Delivered
    /// );
    /// assert_eq!(recorder.terminals(handle).len(), 1);
    /// ```
    pub fn signal(&self, handle: Handle, signal: RawSignal) -> Dispatch {
        self.dispatch_event(handle, normalize(signal))
    }

    /// Feed an already-normalized event through the guard
    pub fn dispatch_event(&self, handle: Handle, event: AuthEvent) -> Dispatch {
        let dispatch =
            TerminalGuard::new(&self.registry, &self.boundary, &self.config).dispatch(handle, event);
        self.counters.record(dispatch);
        dispatch
    }

    /// `onAuthenticationError(errorCode, errString)`
    pub fn on_error(&self, handle: Handle, code: i32, message: impl Into<String>) -> Dispatch {
        self.signal(
            handle,
            RawSignal::Error {
                code,
                message: Some(message.into()),
            },
        )
    }

    /// `onAuthenticationFailed()`
    pub fn on_failed(&self, handle: Handle) -> Dispatch {
        self.signal(handle, RawSignal::Failed)
    }

    /// `onAuthenticationHelp(helpCode, helpString)`
    pub fn on_help(&self, handle: Handle, code: i32, message: impl Into<String>) -> Dispatch {
        self.signal(
            handle,
            RawSignal::Help {
                code,
                message: Some(message.into()),
            },
        )
    }

    /// `onAuthenticationSucceeded(result)`
    pub fn on_succeeded(&self, handle: Handle) -> Dispatch {
        self.signal(
            handle,
            RawSignal::Succeeded {
                authentication_type: 0,
            },
        )
    }

    /// Cancel a session before its terminal event.
    ///
    /// Takes effect immediately; later callbacks for the handle are
    /// discarded. Returns `true` only if the session was still prompting.
    /// An unknown handle returns `false`, which is not an error. So does a
    /// session whose terminal notification is already being delivered: the
    /// handle is retired, but that delivery still completes.
    pub fn cancel(&self, handle: Handle) -> bool {
        match self.registry.retire_live(handle) {
            Some(SessionStatus::Prompting) => {
                self.counters.cancelled.fetch_add(1, Ordering::Relaxed);
                log::info!("Cancelled authentication session {}", handle);
                true
            }
            Some(status) => {
                log::debug!("Cancel of session {} came too late ({})", handle, status);
                false
            }
            None => false,
        }
    }

    /// Same as [`cancel`](Self::cancel)
    pub fn retire(&self, handle: Handle) -> bool {
        self.cancel(handle)
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Counters describing what the bridge has done so far
    pub fn stats(&self) -> BridgeStats {
        BridgeStats {
            live_sessions: self.registry.len(),
            delivered: self.counters.delivered.load(Ordering::Relaxed),
            progress_relayed: self.counters.progress.load(Ordering::Relaxed),
            suppressed: self.counters.suppressed.load(Ordering::Relaxed),
            discarded: self.counters.discarded.load(Ordering::Relaxed),
            cancelled: self.counters.cancelled.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    delivered: AtomicU64,
    progress: AtomicU64,
    suppressed: AtomicU64,
    discarded: AtomicU64,
    cancelled: AtomicU64,
}

impl Counters {
    fn record(&self, dispatch: Dispatch) {
        let counter = match dispatch {
            Dispatch::Progress => &self.progress,
            Dispatch::Suppressed => &self.suppressed,
            Dispatch::Delivered => &self.delivered,
            Dispatch::Discarded(_) => &self.discarded,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Bridge activity counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BridgeStats {
    pub live_sessions: usize,
    pub delivered: u64,
    pub progress_relayed: u64,
    pub suppressed: u64,
    pub discarded: u64,
    pub cancelled: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::receiver::Recorder;
    use crate::types::{BridgeError, DiscardReason};

    #[test]
    fn test_bridge_creation() {
        let bridge = Bridge::new(Recorder::new());
        let stats = bridge.stats();
        assert_eq!(stats.live_sessions, 0);
        assert_eq!(stats.delivered, 0);
    }

    #[test]
    fn test_session_retired_after_delivery() {
        let bridge = Bridge::new(Recorder::new());
        let handle = bridge.begin_session();

        assert_eq!(bridge.on_succeeded(handle), Dispatch::Delivered);
        assert_eq!(bridge.session(handle), Err(BridgeError::UnknownHandle(handle)));
        assert_eq!(
            bridge.on_succeeded(handle),
            Dispatch::Discarded(DiscardReason::UnknownHandle)
        );

        let stats = bridge.stats();
        assert_eq!(stats.delivered, 1);
        assert_eq!(stats.discarded, 1);
        assert_eq!(stats.live_sessions, 0);
    }

    #[test]
    fn test_session_tracks_attempts() {
        let bridge = Bridge::new(Recorder::new());
        let handle = bridge.begin_session();

        bridge.on_failed(handle);
        bridge.on_help(handle, 5, "too fast");
        bridge.on_failed(handle);

        let session = bridge.session(handle).unwrap();
        assert_eq!(session.attempt_count, 2);
        assert_eq!(session.help_count, 1);
    }

    #[test]
    fn test_cancel_counts_only_live_sessions() {
        let bridge = Bridge::new(Recorder::new());
        let handle = bridge.begin_session();

        assert!(bridge.cancel(handle));
        assert!(!bridge.retire(handle));
        assert_eq!(bridge.stats().cancelled, 1);
    }
}
