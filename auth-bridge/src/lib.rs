//! Biometric Authentication Bridge
//!
//! Connects a callback-driven platform biometric prompt (fingerprint, face,
//! device credential) to native application code, guaranteeing exactly one
//! terminal outcome per authentication attempt.
//!
//! # Architecture
//!
//! The platform reports an attempt as a stream of callbacks: zero or more
//! non-terminal events (help messages, rejected attempts) followed by one
//! terminal event (success or error). The bridge:
//! - Issues an opaque [`Handle`] per attempt and owns its session state
//! - Normalizes each platform callback into an [`AuthEvent`]
//! - Relays non-terminal events as [`Progress`] (configurable)
//! - Delivers the terminal event as a [`Terminal`] exactly once, then retires
//!   the handle
//! - Silently discards callbacks that arrive after retirement or cancellation
//!
//! The bridge does NOT:
//! - Render prompts or talk to sensors
//! - Decide retry or lockout policy
//! - Time out sessions on its own
//!
//! # Example Usage
//!
//! ```
//! use auth_bridge::{Bridge, Notification, Outcome, Recorder};
//! use std::sync::Arc;
//!
//! let recorder = Arc::new(Recorder::new());
//! let bridge = Bridge::new(Arc::clone(&recorder));
//!
//! let handle = bridge.begin_session();
//! bridge.on_failed(handle);
//! bridge.on_help(handle, 10, "center finger");
//! bridge.on_succeeded(handle);
//!
//! // Stray callback after the terminal one: no effect
//! bridge.on_error(handle, 5, "canceled");
//!
//! let seen = recorder.for_handle(handle);
//! assert_eq!(seen.len(), 3);
//! match &seen[2] {
//!     Notification::Terminal(terminal) => {
//!         assert_eq!(terminal.outcome, Outcome::Success);
//!         assert!(terminal.had_failures);
//!     }
//!     other => panic!("expected terminal, got {:?}", other),
//! }
//! ```

// Public modules
pub mod bridge;
pub mod codes;
pub mod config;
pub mod ffi;
pub mod normalizer;
pub mod receiver;
pub mod registry;
pub mod types;

// Re-export main types for convenience
pub use bridge::{Bridge, BridgeStats};
pub use codes::{ErrorKind, HelpKind};
pub use config::BridgeConfig;
pub use normalizer::{normalize, RawSignal};
pub use receiver::{FnReceiver, Notification, Receiver, Recorder};
pub use registry::SessionRegistry;
pub use types::{
    AuthEvent, BridgeError, DiscardReason, Dispatch, Handle, Outcome, Progress, Result,
    SessionSnapshot, SessionStatus, Terminal, Timestamp,
};

// Internal modules (not exposed in public API)
mod guard;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
