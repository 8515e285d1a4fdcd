//! Callback normalizer
//!
//! Converts platform-shaped callback signals into [`AuthEvent`] values. This
//! is a pure remapping: every signal produces exactly one event and no
//! signal is ever dropped or reinterpreted here.
//!
//! The one rule that matters: the platform's "failed" callback means a
//! single attempt was rejected while the prompt stays open. It is
//! non-terminal and maps to [`AuthEvent::Failed`].

use crate::types::AuthEvent;

/// A callback exactly as the platform reports it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawSignal {
    /// `onAuthenticationError(errorCode, errString)`
    Error { code: i32, message: Option<String> },
    /// `onAuthenticationFailed()`
    Failed,
    /// `onAuthenticationHelp(helpCode, helpString)`
    Help { code: i32, message: Option<String> },
    /// `onAuthenticationSucceeded(result)`; only the authenticator type is kept
    Succeeded { authentication_type: i32 },
}

impl RawSignal {
    /// Decode the packed `(error_code, failed, help_code)` triple used by
    /// older platform shims, where one native method carried every callback.
    ///
    /// A non-zero error code wins, then the failed flag, then a non-zero help
    /// code; all zeroes means success.
    pub fn from_packed(error_code: i32, failed: bool, help_code: i32) -> Self {
        if error_code != 0 {
            RawSignal::Error { code: error_code, message: None }
        } else if failed {
            RawSignal::Failed
        } else if help_code != 0 {
            RawSignal::Help { code: help_code, message: None }
        } else {
            RawSignal::Succeeded { authentication_type: 0 }
        }
    }
}

/// Map one platform signal to its canonical event
pub fn normalize(signal: RawSignal) -> AuthEvent {
    match signal {
        RawSignal::Error { code, message } => AuthEvent::Error {
            code,
            message: message.unwrap_or_default(),
        },
        RawSignal::Failed => AuthEvent::Failed,
        RawSignal::Help { code, message } => AuthEvent::Help {
            code,
            message: message.unwrap_or_default(),
        },
        RawSignal::Succeeded { authentication_type } => {
            log::trace!("Authentication succeeded with authenticator type {}", authentication_type);
            AuthEvent::Succeeded
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_is_not_terminal() {
        let event = normalize(RawSignal::Failed);
        assert_eq!(event, AuthEvent::Failed);
        assert!(!event.is_terminal());
    }

    #[test]
    fn test_payloads_carried_verbatim() {
        assert_eq!(
            normalize(RawSignal::Error { code: 7, message: Some("lockout".into()) }),
            AuthEvent::Error { code: 7, message: "lockout".into() }
        );
        assert_eq!(
            normalize(RawSignal::Help { code: 10, message: Some("center finger".into()) }),
            AuthEvent::Help { code: 10, message: "center finger".into() }
        );
        assert_eq!(
            normalize(RawSignal::Succeeded { authentication_type: 2 }),
            AuthEvent::Succeeded
        );
    }

    #[test]
    fn test_missing_text_is_empty() {
        assert_eq!(
            normalize(RawSignal::Error { code: 3, message: None }),
            AuthEvent::Error { code: 3, message: String::new() }
        );
    }

    #[test]
    fn test_packed_precedence() {
        assert_eq!(RawSignal::from_packed(7, true, 3), RawSignal::Error { code: 7, message: None });
        assert_eq!(RawSignal::from_packed(0, true, 3), RawSignal::Failed);
        assert_eq!(RawSignal::from_packed(0, false, 3), RawSignal::Help { code: 3, message: None });
        assert_eq!(
            RawSignal::from_packed(0, false, 0),
            RawSignal::Succeeded { authentication_type: 0 }
        );
    }
}
