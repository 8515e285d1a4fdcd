//! `extern "C"` entry points
//!
//! This is the surface a platform shim calls into: one function per platform
//! callback, plus session lifecycle. A JNI `AuthenticationCallback` class, for
//! instance, forwards `onAuthenticationError` to [`auth_bridge_on_error`] with
//! the handle it was constructed with.
//!
//! Every function tolerates a null bridge pointer. Callback functions return
//! the [`Dispatch`](crate::Dispatch) code (0 progress, 1 suppressed,
//! 2 delivered, 3 discarded) or -1 for a null bridge.

use super::abi::{AuthReceiverVTable, AuthStr, NativeReceiver};
use crate::bridge::Bridge;
use crate::normalizer::RawSignal;
use crate::types::{BridgeError, Handle};

const NULL_BRIDGE: i32 = -1;

pub const AUTH_REGISTER_OK: i32 = 0;
pub const AUTH_REGISTER_DUPLICATE: i32 = 1;
pub const AUTH_REGISTER_NULL_HANDLE: i32 = 2;

/// Create a bridge that owns the given native receiver.
///
/// Returns null if `vtable.on_terminal` is null; the caller then keeps
/// ownership of `user_data`.
///
/// # Safety
/// See [`NativeReceiver::from_vtable`].
#[no_mangle]
pub unsafe extern "C" fn auth_bridge_new(vtable: AuthReceiverVTable) -> *mut Bridge {
    match NativeReceiver::from_vtable(vtable) {
        Some(receiver) => Box::into_raw(Box::new(Bridge::new(receiver))),
        None => {
            log::error!("auth_bridge_new called without an on_terminal callback");
            std::ptr::null_mut()
        }
    }
}

/// Destroy a bridge created by [`auth_bridge_new`]. Null is a no-op.
///
/// # Safety
/// `bridge` must come from `auth_bridge_new` and must not be used afterward.
#[no_mangle]
pub unsafe extern "C" fn auth_bridge_free(bridge: *mut Bridge) {
    if !bridge.is_null() {
        drop(Box::from_raw(bridge));
    }
}

/// Start a session. Returns 0 for a null bridge.
///
/// # Safety
/// `bridge` must be null or a live pointer from `auth_bridge_new`.
#[no_mangle]
pub unsafe extern "C" fn auth_bridge_begin_session(bridge: *const Bridge) -> i64 {
    match bridge.as_ref() {
        Some(bridge) => bridge.begin_session().as_raw(),
        None => 0,
    }
}

/// Register a session for a caller-chosen handle.
///
/// # Safety
/// `bridge` must be null or a live pointer from `auth_bridge_new`.
#[no_mangle]
pub unsafe extern "C" fn auth_bridge_register(bridge: *const Bridge, handle: i64) -> i32 {
    let Some(bridge) = bridge.as_ref() else {
        return NULL_BRIDGE;
    };
    match bridge.register(Handle::from_raw(handle)) {
        Ok(_) => AUTH_REGISTER_OK,
        Err(BridgeError::NullHandle) => AUTH_REGISTER_NULL_HANDLE,
        Err(e) => {
            log::error!("auth_bridge_register failed: {}", e);
            AUTH_REGISTER_DUPLICATE
        }
    }
}

/// Cancel a session. Returns 1 if a prompting session was cancelled.
///
/// # Safety
/// `bridge` must be null or a live pointer from `auth_bridge_new`.
#[no_mangle]
pub unsafe extern "C" fn auth_bridge_cancel(bridge: *const Bridge, handle: i64) -> u8 {
    match bridge.as_ref() {
        Some(bridge) => u8::from(bridge.cancel(Handle::from_raw(handle))),
        None => 0,
    }
}

/// `onAuthenticationError(errorCode, errString)`
///
/// # Safety
/// `bridge` must be null or live; `message` must be null or point to
/// `message_len` readable bytes.
#[no_mangle]
pub unsafe extern "C" fn auth_bridge_on_error(
    bridge: *const Bridge,
    handle: i64,
    code: i32,
    message: *const u8,
    message_len: usize,
) -> i32 {
    let message = AuthStr { ptr: message, len: message_len }.to_string_lossy();
    forward(bridge, handle, RawSignal::Error { code, message })
}

/// `onAuthenticationFailed()`
///
/// # Safety
/// `bridge` must be null or a live pointer from `auth_bridge_new`.
#[no_mangle]
pub unsafe extern "C" fn auth_bridge_on_failed(bridge: *const Bridge, handle: i64) -> i32 {
    forward(bridge, handle, RawSignal::Failed)
}

/// `onAuthenticationHelp(helpCode, helpString)`
///
/// # Safety
/// Same as [`auth_bridge_on_error`].
#[no_mangle]
pub unsafe extern "C" fn auth_bridge_on_help(
    bridge: *const Bridge,
    handle: i64,
    code: i32,
    message: *const u8,
    message_len: usize,
) -> i32 {
    let message = AuthStr { ptr: message, len: message_len }.to_string_lossy();
    forward(bridge, handle, RawSignal::Help { code, message })
}

/// `onAuthenticationSucceeded(result)`
///
/// # Safety
/// `bridge` must be null or a live pointer from `auth_bridge_new`.
#[no_mangle]
pub unsafe extern "C" fn auth_bridge_on_succeeded(
    bridge: *const Bridge,
    handle: i64,
    authentication_type: i32,
) -> i32 {
    forward(bridge, handle, RawSignal::Succeeded { authentication_type })
}

/// Single-entry callback of older shims: `(errorCode, failed, helpCode)`
///
/// # Safety
/// `bridge` must be null or a live pointer from `auth_bridge_new`.
#[no_mangle]
pub unsafe extern "C" fn auth_bridge_on_packed(
    bridge: *const Bridge,
    handle: i64,
    error_code: i32,
    failed: u8,
    help_code: i32,
) -> i32 {
    forward(
        bridge,
        handle,
        RawSignal::from_packed(error_code, failed != 0, help_code),
    )
}

unsafe fn forward(bridge: *const Bridge, handle: i64, signal: RawSignal) -> i32 {
    match bridge.as_ref() {
        Some(bridge) => bridge.signal(Handle::from_raw(handle), signal).as_code(),
        None => {
            log::warn!("Platform callback for handle {} with null bridge", handle);
            NULL_BRIDGE
        }
    }
}
