//! Session handle registry
//!
//! Maps an opaque [`Handle`] to the state of one in-flight prompt. The
//! registry is the sole owner of session state; everything outside the crate
//! only ever sees [`SessionSnapshot`] copies.
//!
//! Each live session lives in its own [`SessionCell`] with two locks:
//! - `lane` serializes callbacks for one handle and is held across the call
//!   into native code. It is re-entrant so a receiver that calls back into
//!   the bridge on the same thread does not deadlock.
//! - `state` guards the session fields and is only held for short
//!   transitions, never across a native call.
//!
//! The map itself is sharded, so sessions with different handles never wait
//! on each other.

use crate::types::{BridgeError, Handle, Result, SessionSnapshot, SessionStatus, Timestamp};
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::{Mutex, ReentrantMutex};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// State of one authentication attempt
#[derive(Debug)]
pub(crate) struct Session {
    pub(crate) handle: Handle,
    pub(crate) status: SessionStatus,
    /// Rejected attempts seen so far (diagnostic only)
    pub(crate) attempt_count: u32,
    pub(crate) help_count: u32,
    pub(crate) started_at: Timestamp,
    /// Set once the terminal notification has been handed to the boundary
    pub(crate) handed_off: bool,
}

impl Session {
    fn new(handle: Handle) -> Self {
        Self {
            handle,
            status: SessionStatus::Prompting,
            attempt_count: 0,
            help_count: 0,
            started_at: Utc::now(),
            handed_off: false,
        }
    }

    pub(crate) fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            handle: self.handle,
            status: self.status,
            attempt_count: self.attempt_count,
            help_count: self.help_count,
            started_at: self.started_at,
        }
    }
}

/// Registry-owned storage for one session
#[derive(Debug)]
pub(crate) struct SessionCell {
    pub(crate) lane: ReentrantMutex<()>,
    pub(crate) state: Mutex<Session>,
}

impl SessionCell {
    fn new(handle: Handle) -> Self {
        Self {
            lane: ReentrantMutex::new(()),
            state: Mutex::new(Session::new(handle)),
        }
    }

    /// Mark retired and return the status it had before
    fn retire(&self) -> SessionStatus {
        std::mem::replace(&mut self.state.lock().status, SessionStatus::Retired)
    }
}

/// Concurrent table of live sessions
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: DashMap<Handle, Arc<SessionCell>>,
    next_handle: AtomicI64,
}

impl SessionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty registry with room for `capacity` sessions
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sessions: DashMap::with_capacity(capacity),
            next_handle: AtomicI64::new(1),
        }
    }

    /// Allocate a fresh handle and register a `Prompting` session for it.
    ///
    /// Issued handles are never reused. Values already taken by
    /// [`register`](Self::register) are skipped.
    pub fn issue(&self) -> Handle {
        loop {
            let handle = Handle::from_raw(self.next_handle.fetch_add(1, Ordering::Relaxed));
            match self.register(handle) {
                Ok(_) => return handle,
                Err(_) => {
                    log::debug!("Handle {} taken by an external registration, skipping", handle);
                }
            }
        }
    }

    /// Register a `Prompting` session for `handle`.
    ///
    /// Fails with [`BridgeError::DuplicateHandle`] if the handle is live and
    /// with [`BridgeError::NullHandle`] for the null handle.
    pub fn register(&self, handle: Handle) -> Result<SessionSnapshot> {
        if handle.is_null() {
            return Err(BridgeError::NullHandle);
        }

        match self.sessions.entry(handle) {
            Entry::Occupied(_) => Err(BridgeError::DuplicateHandle(handle)),
            Entry::Vacant(vacant) => {
                let cell = Arc::new(SessionCell::new(handle));
                let snapshot = cell.state.lock().snapshot();
                vacant.insert(cell);
                log::debug!("Registered session {}", handle);
                Ok(snapshot)
            }
        }
    }

    /// Look up a live session.
    ///
    /// Fails with [`BridgeError::UnknownHandle`] if the handle was never
    /// registered or has been retired.
    pub fn lookup(&self, handle: Handle) -> Result<SessionSnapshot> {
        let cell = self.cell(handle)?;
        let snapshot = cell.state.lock().snapshot();
        Ok(snapshot)
    }

    /// Retire a session and remove it from the live set.
    ///
    /// Idempotent: returns `false` without error if the handle is unknown or
    /// already retired.
    pub fn retire(&self, handle: Handle) -> bool {
        self.retire_live(handle).is_some()
    }

    /// Retire a live session, returning the status it was in beforehand
    pub(crate) fn retire_live(&self, handle: Handle) -> Option<SessionStatus> {
        match self.sessions.remove(&handle) {
            Some((_, cell)) => {
                let previous = cell.retire();
                log::debug!("Retired session {} (was {})", handle, previous);
                Some(previous)
            }
            None => {
                log::trace!("Retire of unknown handle {} ignored", handle);
                None
            }
        }
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.sessions.contains_key(&handle)
    }

    /// Handles of all live sessions, in no particular order
    pub fn handles(&self) -> Vec<Handle> {
        self.sessions.iter().map(|entry| *entry.key()).collect()
    }

    /// Shared reference to a live session's cell
    pub(crate) fn cell(&self, handle: Handle) -> Result<Arc<SessionCell>> {
        self.sessions
            .get(&handle)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(BridgeError::UnknownHandle(handle))
    }

    /// Retire `cell`, but only remove the table entry if it still belongs to
    /// that cell. The handle may have been cancelled and registered again
    /// while the cell's terminal notification was in flight.
    pub(crate) fn retire_cell(&self, handle: Handle, cell: &Arc<SessionCell>) -> bool {
        cell.retire();
        self.sessions
            .remove_if(&handle, |_, live| Arc::ptr_eq(live, cell))
            .is_some()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
