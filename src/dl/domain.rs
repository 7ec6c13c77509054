//! C types shared with the Dart VM through `dart_api_dl.h`.
//!
//! Handles are opaque tokens owned by the VM; the bridge never looks inside.

#![allow(non_camel_case_types)]

use std::os::raw::{c_char, c_int};

use crate::port::domain::{Dart_CObject, Dart_Port};

/// Major version of the API table this crate was written against.
pub const DART_API_DL_MAJOR_VERSION: c_int = 2;

/// Minor version of the API table this crate was written against. The VM may
/// hand over a newer minor version.
pub const DART_API_DL_MINOR_VERSION: c_int = 3;

#[repr(C)]
pub struct _Dart_Handle {
    _private: [u8; 0],
}

pub type Dart_Handle = *mut _Dart_Handle;

/// In `dart_api.h` a persistent handle is the same pointer type as a local one.
pub type Dart_PersistentHandle = Dart_Handle;

/// Untyped entry point as stored in the table.
pub type RawFn = unsafe extern "C" fn();

/// One `(name, function)` pair of the table (`DartApiEntry`).
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct DartApiEntry {
    pub name: *const c_char,
    pub function: Option<RawFn>,
}

/// Header passed to `Dart_InitializeApiDL` (`DartApi`). `functions` is
/// terminated by an entry whose `name` is null.
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct DartApi {
    pub major: c_int,
    pub minor: c_int,
    pub functions: *const DartApiEntry,
}

pub type PostCObjectFn = unsafe extern "C" fn(Dart_Port, *mut Dart_CObject) -> bool;
pub type PostIntegerFn = unsafe extern "C" fn(Dart_Port, i64) -> bool;
pub type NewApiErrorFn = unsafe extern "C" fn(*const c_char) -> Dart_Handle;
pub type NewUnhandledExceptionErrorFn = unsafe extern "C" fn(Dart_Handle) -> Dart_Handle;
pub type PropagateErrorFn = unsafe extern "C" fn(Dart_Handle);
pub type IsErrorFn = unsafe extern "C" fn(Dart_Handle) -> bool;
pub type GetErrorFn = unsafe extern "C" fn(Dart_Handle) -> *const c_char;
pub type HandleFromPersistentFn = unsafe extern "C" fn(Dart_PersistentHandle) -> Dart_Handle;
pub type NewPersistentHandleFn = unsafe extern "C" fn(Dart_Handle) -> Dart_PersistentHandle;
pub type DeletePersistentHandleFn = unsafe extern "C" fn(Dart_PersistentHandle);
