//! Core types for the authentication bridge
//!
//! This module defines the canonical event taxonomy that every platform
//! callback is normalized into, the notifications handed to the native side,
//! and the bridge error type. Terminal and non-terminal events are separate
//! variants so that the terminal path can only ever carry `Succeeded` or
//! `Error`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp type used for session bookkeeping
pub type Timestamp = DateTime<Utc>;

/// Result type for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Opaque identifier for one authentication attempt.
///
/// Transparent over `i64` so it crosses a JNI `long` or a C `int64_t`
/// unchanged. `0` is the null handle and is never issued.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(i64);

impl Handle {
    /// The reserved null handle
    pub const NULL: Handle = Handle(0);

    /// Wrap a raw handle value received from the native side
    pub const fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    /// The raw value to hand back across the boundary
    pub const fn as_raw(self) -> i64 {
        self.0
    }

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of one session. Transitions are monotonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// The platform prompt is visible and may still emit events
    Prompting,
    /// The terminal notification is crossing the boundary
    Delivering,
    /// Terminal notification delivered or session cancelled
    Retired,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Prompting => write!(f, "Prompting"),
            SessionStatus::Delivering => write!(f, "Delivering"),
            SessionStatus::Retired => write!(f, "Retired"),
        }
    }
}

/// Canonical platform event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AuthEvent {
    /// Unrecoverable error; the platform has dismissed the prompt
    Error {
        code: i32,
        message: String,
    },
    /// One authenticator attempt was rejected; the prompt stays open
    Failed,
    /// Informational message while the prompt stays open
    Help {
        code: i32,
        message: String,
    },
    /// Authentication accepted
    Succeeded,
}

impl AuthEvent {
    /// True for `Error` and `Succeeded`
    pub fn is_terminal(&self) -> bool {
        matches!(self, AuthEvent::Error { .. } | AuthEvent::Succeeded)
    }

    /// Convert a terminal event into the outcome handed to the native side.
    ///
    /// Returns `None` for `Failed` and `Help`.
    pub fn into_outcome(self) -> Option<Outcome> {
        match self {
            AuthEvent::Error { code, message } => Some(Outcome::Error { code, message }),
            AuthEvent::Succeeded => Some(Outcome::Success),
            AuthEvent::Failed | AuthEvent::Help { .. } => None,
        }
    }

    /// Short name used in log lines
    pub fn name(&self) -> &'static str {
        match self {
            AuthEvent::Error { .. } => "error",
            AuthEvent::Failed => "failed",
            AuthEvent::Help { .. } => "help",
            AuthEvent::Succeeded => "succeeded",
        }
    }
}

/// Final result of one authentication attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Error { code: i32, message: String },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    /// Platform error code, if this is an error outcome
    pub fn code(&self) -> Option<i32> {
        match self {
            Outcome::Success => None,
            Outcome::Error { code, .. } => Some(*code),
        }
    }

    /// Advisory classification of the platform error code
    pub fn error_kind(&self) -> Option<crate::codes::ErrorKind> {
        self.code().map(crate::codes::ErrorKind::from_code)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success => write!(f, "success"),
            Outcome::Error { code, message } if message.is_empty() => {
                write!(f, "error {}", code)
            }
            Outcome::Error { code, message } => write!(f, "error {}: {}", code, message),
        }
    }
}

/// Terminal notification delivered exactly once per session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Terminal {
    pub outcome: Outcome,
    /// Number of `Failed` events observed before the terminal one
    pub failed_attempts: u32,
    /// Whether any `Failed` event preceded the terminal one
    pub had_failures: bool,
}

impl Terminal {
    pub fn new(outcome: Outcome, failed_attempts: u32) -> Self {
        Self {
            outcome,
            failed_attempts,
            had_failures: failed_attempts > 0,
        }
    }
}

/// Non-terminal notification, relayed zero or more times before the terminal one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Progress {
    /// A rejected attempt; `attempt` counts from 1 within the session
    Failed { attempt: u32 },
    Help { code: i32, message: String },
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Progress::Failed { attempt } => write!(f, "failed (attempt {})", attempt),
            Progress::Help { code, message } => write!(f, "help {}: {}", code, message),
        }
    }
}

/// Read-only copy of a session's state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub handle: Handle,
    pub status: SessionStatus,
    pub attempt_count: u32,
    pub help_count: u32,
    pub started_at: Timestamp,
}

/// What the bridge did with one inbound platform signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dispatch {
    /// Non-terminal event relayed to the receiver
    Progress,
    /// Non-terminal event recorded but not forwarded (configuration)
    Suppressed,
    /// Terminal notification delivered and the handle retired
    Delivered,
    /// Event dropped without any observable effect
    Discarded(DiscardReason),
}

impl Dispatch {
    /// Integer code used by the C ABI
    pub fn as_code(self) -> i32 {
        match self {
            Dispatch::Progress => 0,
            Dispatch::Suppressed => 1,
            Dispatch::Delivered => 2,
            Dispatch::Discarded(_) => 3,
        }
    }
}

/// Why an inbound signal was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscardReason {
    /// No live session; it was never registered or has been retired
    UnknownHandle,
    /// Session was cancelled while this callback waited for its turn
    Retired,
    /// Callback re-entered while the terminal notification was in flight
    Delivering,
}

/// Errors produced by the bridge itself.
///
/// Platform-reported errors are never represented here; they travel as
/// `Outcome::Error` data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    #[error("Handle {0} is already registered")]
    DuplicateHandle(Handle),

    #[error("Handle {0} is not registered")]
    UnknownHandle(Handle),

    #[error("The null handle cannot be registered")]
    NullHandle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_classification() {
        assert!(AuthEvent::Succeeded.is_terminal());
        assert!(AuthEvent::Error { code: 7, message: "lockout".into() }.is_terminal());
        assert!(!AuthEvent::Failed.is_terminal());
        assert!(!AuthEvent::Help { code: 1, message: String::new() }.is_terminal());
    }

    #[test]
    fn test_into_outcome() {
        assert_eq!(AuthEvent::Succeeded.into_outcome(), Some(Outcome::Success));
        assert_eq!(
            AuthEvent::Error { code: 9, message: "too many attempts".into() }.into_outcome(),
            Some(Outcome::Error { code: 9, message: "too many attempts".into() })
        );
        assert_eq!(AuthEvent::Failed.into_outcome(), None);
    }

    #[test]
    fn test_terminal_failure_flag() {
        assert!(!Terminal::new(Outcome::Success, 0).had_failures);
        assert!(Terminal::new(Outcome::Success, 2).had_failures);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Handle::from_raw(42)), "#42");
        assert_eq!(
            format!("{}", Outcome::Error { code: 7, message: "lockout".into() }),
            "error 7: lockout"
        );
        assert_eq!(format!("{}", Progress::Failed { attempt: 2 }), "failed (attempt 2)");
    }
}
