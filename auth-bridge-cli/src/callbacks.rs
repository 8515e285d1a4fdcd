//! Receivers used by the CLI
//!
//! Every notification is recorded for the report. When `--receiver` names a
//! dynamic library, notifications are also forwarded to the native vtable it
//! returns from `auth_bridge_receiver`.

use anyhow::{anyhow, Context, Result};
use auth_bridge::ffi::{AuthReceiverVTable, NativeReceiver};
use auth_bridge::{Handle, Progress, Receiver, Recorder, Terminal};
use libloading::{Library, Symbol};
use std::path::Path;
use std::sync::Arc;

/// Symbol a receiver library must export
pub const RECEIVER_SYMBOL: &[u8] = b"auth_bridge_receiver";

type ReceiverEntryFn = unsafe extern "C" fn() -> AuthReceiverVTable;

/// A native receiver together with the library that provides its callbacks
pub struct LibraryReceiver {
    // Dropped before `_library` so `release` runs while the code is mapped
    receiver: NativeReceiver,
    _library: Library,
}

impl Receiver for LibraryReceiver {
    fn on_terminal(&self, handle: Handle, terminal: &Terminal) {
        self.receiver.on_terminal(handle, terminal);
    }

    fn on_progress(&self, handle: Handle, progress: &Progress) {
        self.receiver.on_progress(handle, progress);
    }
}

/// Load a receiver library and ask it for its vtable
pub fn load_native_receiver(path: &Path) -> Result<LibraryReceiver> {
    log::info!("Loading receiver library: {:?}", path);

    let library = unsafe { Library::new(path) }
        .with_context(|| format!("Failed to load receiver library: {:?}", path))?;

    let vtable = unsafe {
        let entry: Symbol<ReceiverEntryFn> = library.get(RECEIVER_SYMBOL).with_context(|| {
            format!(
                "Receiver library {:?} does not export `{}`",
                path,
                String::from_utf8_lossy(RECEIVER_SYMBOL)
            )
        })?;
        entry()
    };

    let receiver = unsafe { NativeReceiver::from_vtable(vtable) }
        .ok_or_else(|| anyhow!("Receiver library {:?} returned a vtable without on_terminal", path))?;

    log::debug!("Receiver library loaded");
    Ok(LibraryReceiver { receiver, _library: library })
}

/// Records everything and optionally forwards to a native library
pub struct CliReceiver {
    recorder: Arc<Recorder>,
    native: Option<LibraryReceiver>,
}

impl CliReceiver {
    pub fn new(recorder: Arc<Recorder>, native: Option<LibraryReceiver>) -> Self {
        Self { recorder, native }
    }
}

impl Receiver for CliReceiver {
    fn on_terminal(&self, handle: Handle, terminal: &Terminal) {
        self.recorder.on_terminal(handle, terminal);
        if let Some(native) = &self.native {
            native.on_terminal(handle, terminal);
        }
    }

    fn on_progress(&self, handle: Handle, progress: &Progress) {
        self.recorder.on_progress(handle, progress);
        if let Some(native) = &self.native {
            native.on_progress(handle, progress);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auth_bridge::{Bridge, Outcome};

    #[test]
    fn test_cli_receiver_records_without_library() {
        let recorder = Arc::new(Recorder::new());
        let bridge = Bridge::new(CliReceiver::new(Arc::clone(&recorder), None));
        let handle = bridge.begin_session();

        bridge.on_failed(handle);
        bridge.on_succeeded(handle);

        assert_eq!(recorder.progress(handle), vec![Progress::Failed { attempt: 1 }]);
        assert_eq!(recorder.terminals(handle)[0].outcome, Outcome::Success);
    }

    #[test]
    fn test_missing_library_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_native_receiver(&dir.path().join("libnope.so"));
        assert!(result.is_err());
    }
}
