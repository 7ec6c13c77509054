//! `*_DL_Trampolined` entry points for C code linked into the same library.
//!
//! Each one forwards its arguments to the matching API table function and
//! returns that function's result unchanged. If the table is not installed or
//! lacks the symbol, the failure is logged and a null handle is returned.

#![allow(non_snake_case)]

use std::os::raw::c_char;
use std::ptr;

use crate::common::error::BridgeResult;
use crate::dl::{self, ApiTable, Dart_Handle, Dart_PersistentHandle};

fn forward<T>(
    symbol: &'static str,
    fallback: T,
    call: impl FnOnce(&ApiTable) -> BridgeResult<T>,
) -> T {
    match dl::current().and_then(|table| call(&table)) {
        Ok(value) => value,
        Err(err) => {
            tracing::error!(symbol, %err, "trampoline call failed");
            fallback
        }
    }
}

#[no_mangle]
pub unsafe extern "C" fn Dart_NewPersistentHandle_DL_Trampolined(
    handle: Dart_Handle,
) -> Dart_PersistentHandle {
    forward("Dart_NewPersistentHandle", ptr::null_mut(), |table| {
        table.new_persistent_handle(handle)
    })
}

#[no_mangle]
pub unsafe extern "C" fn Dart_HandleFromPersistent_DL_Trampolined(
    handle: Dart_PersistentHandle,
) -> Dart_Handle {
    forward("Dart_HandleFromPersistent", ptr::null_mut(), |table| {
        table.handle_from_persistent(handle)
    })
}

#[no_mangle]
pub unsafe extern "C" fn Dart_DeletePersistentHandle_DL_Trampolined(handle: Dart_PersistentHandle) {
    forward("Dart_DeletePersistentHandle", (), |table| {
        table.delete_persistent_handle(handle)
    })
}

#[no_mangle]
pub unsafe extern "C" fn Dart_NewApiError_DL_Trampolined(error: *const c_char) -> Dart_Handle {
    forward("Dart_NewApiError", ptr::null_mut(), |table| table.new_api_error(error))
}

#[no_mangle]
pub unsafe extern "C" fn Dart_NewUnhandledExceptionError_DL_Trampolined(
    handle: Dart_Handle,
) -> Dart_Handle {
    forward("Dart_NewUnhandledExceptionError", ptr::null_mut(), |table| {
        table.new_unhandled_exception_error(handle)
    })
}

/// Does not return when the VM propagates the error.
#[no_mangle]
pub unsafe extern "C" fn Dart_PropagateError_DL_Trampolined(handle: Dart_Handle) {
    forward("Dart_PropagateError", (), |table| table.propagate_error(handle))
}
