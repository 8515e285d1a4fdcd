//! FFI call boundary
//!
//! Everything that crosses into native code goes through [`Boundary`]: the
//! terminal path ([`Boundary::deliver`]) and the optional progress path
//! ([`Boundary::relay`]). Both call the receiver synchronously on the
//! current (platform callback) thread.
//!
//! The C ABI lives in two submodules:
//! - `abi`: `#[repr(C)]` encodings and the vtable-backed [`NativeReceiver`]
//! - `exports`: `extern "C"` entry points for the platform shim

use crate::receiver::Receiver;
use crate::types::{Handle, Progress, Terminal};
use std::sync::Arc;

pub mod abi;
pub mod exports;

pub use abi::{
    AuthOutcomeRepr, AuthProgressRepr, AuthReceiverVTable, AuthStr, NativeReceiver,
    AUTH_OUTCOME_ERROR, AUTH_OUTCOME_SUCCESS, AUTH_PROGRESS_FAILED, AUTH_PROGRESS_HELP,
};

/// The single path from the bridge into the receiver
pub(crate) struct Boundary {
    receiver: Arc<dyn Receiver>,
}

impl Boundary {
    pub(crate) fn new(receiver: Arc<dyn Receiver>) -> Self {
        Self { receiver }
    }

    /// Hand the terminal notification for `handle` to the receiver.
    ///
    /// The guard calls this at most once per session.
    pub(crate) fn deliver(&self, handle: Handle, terminal: &Terminal) {
        log::info!(
            "Delivering {} for session {} after {} failed attempt(s)",
            terminal.outcome,
            handle,
            terminal.failed_attempts
        );
        self.receiver.on_terminal(handle, terminal);
    }

    /// Hand a non-terminal notification to the receiver
    pub(crate) fn relay(&self, handle: Handle, progress: &Progress) {
        log::debug!("Relaying {} for session {}", progress, handle);
        self.receiver.on_progress(handle, progress);
    }
}
