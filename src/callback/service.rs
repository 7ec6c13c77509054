//! Registration slots for the closure caller and the single stored callback.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::common::error::{BridgeError, BridgeResult};
use crate::dl::{self, Dart_Handle};

use super::domain::{ClosureCaller, DartCallback};

static CALLER: RwLock<Option<ClosureCaller>> = parking_lot::const_rwlock(None);
static REGISTERED: Mutex<Option<Arc<DartCallback>>> = parking_lot::const_mutex(None);

pub fn register_caller(caller: ClosureCaller) {
    *CALLER.write() = Some(caller);
    tracing::debug!("closure caller registered");
}

pub fn caller() -> BridgeResult<ClosureCaller> {
    (*CALLER.read()).ok_or(BridgeError::NoClosureCaller)
}

/// Pin `closure` with the installed API table.
///
/// # Safety
///
/// See [`DartCallback::new`].
pub unsafe fn pin(closure: Dart_Handle) -> BridgeResult<DartCallback> {
    DartCallback::new(&dl::current()?, closure)
}

/// Invoke `callback` through the registered closure caller.
///
/// # Safety
///
/// See [`DartCallback::call`].
pub unsafe fn invoke(callback: &DartCallback) -> BridgeResult<()> {
    callback.call(caller()?)
}

/// Store `closure` in the callback slot, releasing any previous one.
///
/// # Safety
///
/// See [`DartCallback::new`].
pub unsafe fn register(closure: Dart_Handle) -> BridgeResult<()> {
    let callback = pin(closure)?;
    let previous = REGISTERED.lock().replace(Arc::new(callback));
    if previous.is_some() {
        tracing::debug!("replaced registered callback");
    }
    Ok(())
}

/// Invoke the callback stored by [`register`]. The slot is not locked while
/// Dart runs, so the closure may register a replacement.
///
/// # Safety
///
/// See [`DartCallback::call`].
pub unsafe fn invoke_registered() -> BridgeResult<()> {
    let callback = REGISTERED
        .lock()
        .clone()
        .ok_or(BridgeError::NoCallback)?;
    invoke(&callback)
}

/// Release the stored callback, if any.
pub fn unregister() -> bool {
    REGISTERED.lock().take().is_some()
}
