//! Platform error and help code classification
//!
//! Numeric codes are relayed verbatim in every outcome; these kinds are an
//! advisory view for application code that wants to branch on them.
//! Values follow the Android `BiometricPrompt` constants.

use serde::{Deserialize, Serialize};
use std::fmt;

// https://developer.android.com/reference/android/hardware/biometrics/BiometricPrompt#constants
pub const BIOMETRIC_ERROR_HW_UNAVAILABLE: i32 = 1;
pub const BIOMETRIC_ERROR_UNABLE_TO_PROCESS: i32 = 2;
pub const BIOMETRIC_ERROR_TIMEOUT: i32 = 3;
pub const BIOMETRIC_ERROR_NO_SPACE: i32 = 4;
pub const BIOMETRIC_ERROR_CANCELED: i32 = 5;
pub const BIOMETRIC_ERROR_LOCKOUT: i32 = 7;
pub const BIOMETRIC_ERROR_VENDOR: i32 = 8;
pub const BIOMETRIC_ERROR_LOCKOUT_PERMANENT: i32 = 9;
pub const BIOMETRIC_ERROR_USER_CANCELED: i32 = 0xa;
pub const BIOMETRIC_ERROR_NO_BIOMETRICS: i32 = 0xb;
pub const BIOMETRIC_ERROR_HW_NOT_PRESENT: i32 = 0xc;
pub const BIOMETRIC_ERROR_NO_DEVICE_CREDENTIAL: i32 = 0xe;
pub const BIOMETRIC_ERROR_SECURITY_UPDATE_REQUIRED: i32 = 0xf;
// Not expected from onAuthenticationError in practice.
pub const BIOMETRIC_NO_AUTHENTICATION: i32 = -1;

pub const BIOMETRIC_ACQUIRED_GOOD: i32 = 0;
pub const BIOMETRIC_ACQUIRED_PARTIAL: i32 = 1;
pub const BIOMETRIC_ACQUIRED_INSUFFICIENT: i32 = 2;
pub const BIOMETRIC_ACQUIRED_IMAGER_DIRTY: i32 = 3;
pub const BIOMETRIC_ACQUIRED_TOO_SLOW: i32 = 4;
pub const BIOMETRIC_ACQUIRED_TOO_FAST: i32 = 5;
pub const BIOMETRIC_ACQUIRED_VENDOR: i32 = 6;

/// Coarse classification of a platform error code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    HardwareUnavailable,
    UnableToProcess,
    Timeout,
    NoSpace,
    SystemCanceled,
    Lockout,
    Vendor,
    LockoutPermanent,
    UserCanceled,
    NoBiometrics,
    HardwareNotPresent,
    NoDeviceCredential,
    SecurityUpdateRequired,
    NoAuthentication,
    Unknown(i32),
}

impl ErrorKind {
    /// Classify a platform error code. Unrecognized codes are logged and
    /// returned as `Unknown`.
    pub fn from_code(code: i32) -> Self {
        match code {
            BIOMETRIC_ERROR_HW_UNAVAILABLE => ErrorKind::HardwareUnavailable,
            BIOMETRIC_ERROR_UNABLE_TO_PROCESS => ErrorKind::UnableToProcess,
            BIOMETRIC_ERROR_TIMEOUT => ErrorKind::Timeout,
            BIOMETRIC_ERROR_NO_SPACE => ErrorKind::NoSpace,
            BIOMETRIC_ERROR_CANCELED => ErrorKind::SystemCanceled,
            BIOMETRIC_ERROR_LOCKOUT => ErrorKind::Lockout,
            BIOMETRIC_ERROR_VENDOR => ErrorKind::Vendor,
            BIOMETRIC_ERROR_LOCKOUT_PERMANENT => ErrorKind::LockoutPermanent,
            BIOMETRIC_ERROR_USER_CANCELED => ErrorKind::UserCanceled,
            BIOMETRIC_ERROR_NO_BIOMETRICS => ErrorKind::NoBiometrics,
            BIOMETRIC_ERROR_HW_NOT_PRESENT => ErrorKind::HardwareNotPresent,
            BIOMETRIC_ERROR_NO_DEVICE_CREDENTIAL => ErrorKind::NoDeviceCredential,
            BIOMETRIC_ERROR_SECURITY_UPDATE_REQUIRED => ErrorKind::SecurityUpdateRequired,
            BIOMETRIC_NO_AUTHENTICATION => ErrorKind::NoAuthentication,
            _ => {
                log::warn!("received unknown biometric error code: {code:#0x}");
                ErrorKind::Unknown(code)
            }
        }
    }

    /// True if the prompt went away because someone cancelled it
    pub fn is_cancellation(self) -> bool {
        matches!(self, ErrorKind::SystemCanceled | ErrorKind::UserCanceled)
    }

    /// True if the platform locked the authenticator after repeated failures
    pub fn is_lockout(self) -> bool {
        matches!(self, ErrorKind::Lockout | ErrorKind::LockoutPermanent)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Unknown(code) => write!(f, "Unknown({})", code),
            other => write!(f, "{:?}", other),
        }
    }
}

/// Classification of a platform help ("acquired") code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HelpKind {
    Good,
    Partial,
    Insufficient,
    ImagerDirty,
    TooSlow,
    TooFast,
    Vendor,
    Unknown(i32),
}

impl HelpKind {
    pub fn from_code(code: i32) -> Self {
        match code {
            BIOMETRIC_ACQUIRED_GOOD => HelpKind::Good,
            BIOMETRIC_ACQUIRED_PARTIAL => HelpKind::Partial,
            BIOMETRIC_ACQUIRED_INSUFFICIENT => HelpKind::Insufficient,
            BIOMETRIC_ACQUIRED_IMAGER_DIRTY => HelpKind::ImagerDirty,
            BIOMETRIC_ACQUIRED_TOO_SLOW => HelpKind::TooSlow,
            BIOMETRIC_ACQUIRED_TOO_FAST => HelpKind::TooFast,
            BIOMETRIC_ACQUIRED_VENDOR => HelpKind::Vendor,
            _ => HelpKind::Unknown(code),
        }
    }
}
