//! C ABI types for the native receiver
//!
//! These layouts are what native code sees. Strings are borrowed UTF-8
//! views (`ptr` + `len`, not NUL-terminated) valid only for the duration of
//! the call they are passed to.

use crate::receiver::Receiver;
use crate::types::{Handle, Outcome, Progress, Terminal};
use std::os::raw::c_void;

pub const AUTH_OUTCOME_SUCCESS: u32 = 0;
pub const AUTH_OUTCOME_ERROR: u32 = 1;

pub const AUTH_PROGRESS_FAILED: u32 = 0;
pub const AUTH_PROGRESS_HELP: u32 = 1;

/// Borrowed string view
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct AuthStr {
    pub ptr: *const u8,
    pub len: usize,
}

impl AuthStr {
    /// View of `s`; empty strings are passed as a null pointer
    pub fn borrowed(s: &str) -> Self {
        if s.is_empty() {
            Self::empty()
        } else {
            Self {
                ptr: s.as_ptr(),
                len: s.len(),
            }
        }
    }

    pub const fn empty() -> Self {
        Self {
            ptr: std::ptr::null(),
            len: 0,
        }
    }

    /// Copy the viewed bytes into an owned string.
    ///
    /// Returns `None` for a null pointer. Invalid UTF-8 is replaced.
    ///
    /// # Safety
    /// `ptr` must be null or point to `len` readable bytes.
    pub unsafe fn to_string_lossy(self) -> Option<String> {
        if self.ptr.is_null() {
            return None;
        }
        let bytes = std::slice::from_raw_parts(self.ptr, self.len);
        Some(String::from_utf8_lossy(bytes).into_owned())
    }
}

/// Terminal notification as seen by native code
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct AuthOutcomeRepr {
    /// `AUTH_OUTCOME_SUCCESS` or `AUTH_OUTCOME_ERROR`
    pub kind: u32,
    /// Platform error code; 0 on success
    pub code: i32,
    pub had_failures: u8,
    pub failed_attempts: u32,
    /// Platform error text; empty on success
    pub message: AuthStr,
}

impl AuthOutcomeRepr {
    /// Encode `terminal`. The result borrows the error message.
    pub fn encode(terminal: &Terminal) -> Self {
        let (kind, code, message) = match &terminal.outcome {
            Outcome::Success => (AUTH_OUTCOME_SUCCESS, 0, AuthStr::empty()),
            Outcome::Error { code, message } => {
                (AUTH_OUTCOME_ERROR, *code, AuthStr::borrowed(message))
            }
        };
        Self {
            kind,
            code,
            had_failures: u8::from(terminal.had_failures),
            failed_attempts: terminal.failed_attempts,
            message,
        }
    }

    /// Decode back into a [`Terminal`]; `None` for an unknown `kind`.
    ///
    /// # Safety
    /// `message` must satisfy [`AuthStr::to_string_lossy`].
    pub unsafe fn decode(&self) -> Option<Terminal> {
        let outcome = match self.kind {
            AUTH_OUTCOME_SUCCESS => Outcome::Success,
            AUTH_OUTCOME_ERROR => Outcome::Error {
                code: self.code,
                message: self.message.to_string_lossy().unwrap_or_default(),
            },
            _ => return None,
        };
        Some(Terminal {
            outcome,
            failed_attempts: self.failed_attempts,
            had_failures: self.had_failures != 0,
        })
    }
}

/// Progress notification as seen by native code
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct AuthProgressRepr {
    /// `AUTH_PROGRESS_FAILED` or `AUTH_PROGRESS_HELP`
    pub kind: u32,
    /// Help code; 0 for failed attempts
    pub code: i32,
    /// Attempt number for failed attempts; 0 for help
    pub attempt: u32,
    pub message: AuthStr,
}

impl AuthProgressRepr {
    pub fn encode(progress: &Progress) -> Self {
        match progress {
            Progress::Failed { attempt } => Self {
                kind: AUTH_PROGRESS_FAILED,
                code: 0,
                attempt: *attempt,
                message: AuthStr::empty(),
            },
            Progress::Help { code, message } => Self {
                kind: AUTH_PROGRESS_HELP,
                code: *code,
                attempt: 0,
                message: AuthStr::borrowed(message),
            },
        }
    }

    /// # Safety
    /// `message` must satisfy [`AuthStr::to_string_lossy`].
    pub unsafe fn decode(&self) -> Option<Progress> {
        match self.kind {
            AUTH_PROGRESS_FAILED => Some(Progress::Failed { attempt: self.attempt }),
            AUTH_PROGRESS_HELP => Some(Progress::Help {
                code: self.code,
                message: self.message.to_string_lossy().unwrap_or_default(),
            }),
            _ => None,
        }
    }
}

pub type TerminalFn =
    unsafe extern "C" fn(user_data: *mut c_void, handle: i64, outcome: *const AuthOutcomeRepr);
pub type ProgressFn =
    unsafe extern "C" fn(user_data: *mut c_void, handle: i64, progress: *const AuthProgressRepr);
pub type ReleaseFn = unsafe extern "C" fn(user_data: *mut c_void);

/// Native receiver callbacks.
///
/// `on_terminal` is required. `on_progress` and `release` may be null.
/// All callbacks must be safe to invoke from any thread.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct AuthReceiverVTable {
    pub user_data: *mut c_void,
    pub on_terminal: Option<TerminalFn>,
    pub on_progress: Option<ProgressFn>,
    pub release: Option<ReleaseFn>,
}

/// [`Receiver`] backed by a native vtable
#[derive(Debug)]
pub struct NativeReceiver {
    vtable: AuthReceiverVTable,
    on_terminal: TerminalFn,
}

impl NativeReceiver {
    /// Wrap `vtable`; `None` if `on_terminal` is null.
    ///
    /// On success the receiver takes ownership of `user_data` and calls
    /// `release` once when dropped. On failure ownership stays with the
    /// caller.
    ///
    /// # Safety
    /// The callbacks must be valid for the receiver's whole lifetime and
    /// callable from any thread with `user_data`.
    pub unsafe fn from_vtable(vtable: AuthReceiverVTable) -> Option<Self> {
        let on_terminal = vtable.on_terminal?;
        Some(Self { vtable, on_terminal })
    }
}

impl Receiver for NativeReceiver {
    fn on_terminal(&self, handle: Handle, terminal: &Terminal) {
        let repr = AuthOutcomeRepr::encode(terminal);
        unsafe { (self.on_terminal)(self.vtable.user_data, handle.as_raw(), &repr) };
    }

    fn on_progress(&self, handle: Handle, progress: &Progress) {
        if let Some(on_progress) = self.vtable.on_progress {
            let repr = AuthProgressRepr::encode(progress);
            unsafe { on_progress(self.vtable.user_data, handle.as_raw(), &repr) };
        }
    }
}

impl Drop for NativeReceiver {
    fn drop(&mut self) {
        if let Some(release) = self.vtable.release {
            unsafe { release(self.vtable.user_data) };
        }
        log::debug!("Native receiver released");
    }
}

// The vtable contract requires thread-safe callbacks
unsafe impl Send for NativeReceiver {}
unsafe impl Sync for NativeReceiver {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_encoding_is_lossless() {
        let terminal = Terminal::new(
            Outcome::Error { code: 9, message: "too many\0attempts".into() },
            3,
        );
        let repr = AuthOutcomeRepr::encode(&terminal);
        assert_eq!(repr.kind, AUTH_OUTCOME_ERROR);
        assert_eq!(repr.code, 9);
        assert_eq!(repr.had_failures, 1);
        assert_eq!(repr.message.len, "too many\0attempts".len());

        let decoded = unsafe { repr.decode() }.unwrap();
        assert_eq!(decoded, terminal);
    }

    #[test]
    fn test_success_encoding() {
        let repr = AuthOutcomeRepr::encode(&Terminal::new(Outcome::Success, 0));
        assert_eq!(repr.kind, AUTH_OUTCOME_SUCCESS);
        assert_eq!(repr.had_failures, 0);
        assert!(repr.message.ptr.is_null());
    }

    #[test]
    fn test_progress_encoding() {
        let help = Progress::Help { code: 10, message: "center finger".into() };
        let repr = AuthProgressRepr::encode(&help);
        assert_eq!(repr.kind, AUTH_PROGRESS_HELP);
        assert_eq!(unsafe { repr.decode() }, Some(help));

        let failed = AuthProgressRepr::encode(&Progress::Failed { attempt: 2 });
        assert_eq!(failed.attempt, 2);
        assert_eq!(unsafe { failed.decode() }, Some(Progress::Failed { attempt: 2 }));
    }

    #[test]
    fn test_vtable_without_terminal_rejected() {
        let vtable = AuthReceiverVTable {
            user_data: std::ptr::null_mut(),
            on_terminal: None,
            on_progress: None,
            release: None,
        };
        assert!(unsafe { NativeReceiver::from_vtable(vtable) }.is_none());
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let bytes = [0x66u8, 0xff, 0x6f];
        let view = AuthStr { ptr: bytes.as_ptr(), len: bytes.len() };
        assert_eq!(unsafe { view.to_string_lossy() }, Some("f\u{fffd}o".to_string()));
        assert_eq!(unsafe { AuthStr::empty().to_string_lossy() }, None);
    }
}
