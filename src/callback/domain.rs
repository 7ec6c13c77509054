//! Dart closures kept alive on the Rust side.

use crate::common::error::BridgeResult;
use crate::dl::{ApiTable, Dart_Handle, Dart_PersistentHandle};

/// Dart-side function that invokes a closure handle. Registered once through
/// `RegisterClosureCallerFP` (`Pointer.fromFunction` on the Dart side).
pub type ClosureCaller = extern "C" fn(Dart_Handle);

/// A Dart closure pinned by a persistent handle. Dropping it releases the
/// handle.
pub struct DartCallback {
    handle: Dart_PersistentHandle,
    table: ApiTable,
}

// SAFETY: a persistent handle may be moved between threads; it is only
// dereferenced through the VM, which checks the current isolate.
unsafe impl Send for DartCallback {}
// SAFETY: `&DartCallback` only reads the handle value.
unsafe impl Sync for DartCallback {}

impl DartCallback {
    /// Pin `closure` with a new persistent handle.
    ///
    /// # Safety
    ///
    /// Must be called from native code invoked by Dart with `closure` a valid
    /// local handle.
    pub unsafe fn new(table: &ApiTable, closure: Dart_Handle) -> BridgeResult<Self> {
        let handle = table.new_persistent_handle(closure)?;
        Ok(Self {
            handle,
            table: *table,
        })
    }

    /// Resolve the closure and hand it to `caller`.
    ///
    /// # Safety
    ///
    /// `caller` must be safe to invoke from the current thread.
    pub unsafe fn call(&self, caller: ClosureCaller) -> BridgeResult<()> {
        let closure = self.table.handle_from_persistent(self.handle)?;
        caller(closure);
        Ok(())
    }
}

impl Drop for DartCallback {
    fn drop(&mut self) {
        // SAFETY: `handle` was created by `new` and is released only here.
        if let Err(err) = unsafe { self.table.delete_persistent_handle(self.handle) } {
            tracing::error!(%err, "failed to release dart callback");
        }
    }
}

impl std::fmt::Debug for DartCallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DartCallback")
            .field("handle", &self.handle)
            .finish()
    }
}
