//! Resolved view of the VM's API table and the forwarding calls into it.
//!
//! Every forwarder passes its arguments through untouched and returns the
//! VM's result untouched. The only thing added is a `MissingSymbol` error in
//! place of a jump through a null pointer.

use std::ffi::CStr;
use std::os::raw::c_char;

use crate::common::error::{BridgeError, BridgeResult};
use crate::port::domain::{Dart_CObject, Dart_Port};

use super::domain::*;

macro_rules! api_table {
    ($( $field:ident : $symbol:literal => $ty:ty ),* $(,)?) => {
        /// Function pointers resolved from a `DartApi` header.
        #[derive(Copy, Clone, Default)]
        pub struct ApiTable {
            major: i32,
            minor: i32,
            $( $field: Option<$ty>, )*
        }

        impl ApiTable {
            /// Names of every symbol the bridge resolves.
            pub const SYMBOLS: &'static [&'static str] = &[$( $symbol ),*];

            fn resolve(&mut self, name: &[u8], function: RawFn) -> bool {
                $(
                    if name == $symbol.as_bytes() {
                        // SAFETY: the VM publishes each symbol with the
                        // signature declared in `dart_api_dl.h`.
                        self.$field =
                            Some(unsafe { std::mem::transmute::<RawFn, $ty>(function) });
                        return true;
                    }
                )*
                false
            }

            /// Whether `symbol` was present in the table.
            pub fn has(&self, symbol: &str) -> bool {
                $( if symbol == $symbol { return self.$field.is_some(); } )*
                false
            }

            /// Number of known symbols the table resolved.
            pub fn resolved_count(&self) -> usize {
                0 $( + usize::from(self.$field.is_some()) )*
            }
        }
    };
}

api_table! {
    post_cobject_fn: "Dart_PostCObject" => PostCObjectFn,
    post_integer_fn: "Dart_PostInteger" => PostIntegerFn,
    new_api_error_fn: "Dart_NewApiError" => NewApiErrorFn,
    new_unhandled_exception_error_fn: "Dart_NewUnhandledExceptionError"
        => NewUnhandledExceptionErrorFn,
    propagate_error_fn: "Dart_PropagateError" => PropagateErrorFn,
    is_error_fn: "Dart_IsError" => IsErrorFn,
    get_error_fn: "Dart_GetError" => GetErrorFn,
    handle_from_persistent_fn: "Dart_HandleFromPersistent" => HandleFromPersistentFn,
    new_persistent_handle_fn: "Dart_NewPersistentHandle" => NewPersistentHandleFn,
    delete_persistent_handle_fn: "Dart_DeletePersistentHandle" => DeletePersistentHandleFn,
}

impl std::fmt::Debug for ApiTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiTable")
            .field("major", &self.major)
            .field("minor", &self.minor)
            .field("resolved", &self.resolved_count())
            .finish()
    }
}

fn require<T>(slot: Option<T>, symbol: &'static str) -> BridgeResult<T> {
    slot.ok_or(BridgeError::MissingSymbol(symbol))
}

impl ApiTable {
    /// Read the header the VM passes to `Dart_InitializeApiDL`.
    ///
    /// A newer minor version is accepted. Names the bridge does not know are
    /// skipped and known names missing from the list stay unresolved.
    ///
    /// # Safety
    ///
    /// `data` must be null or point to a valid `DartApi` whose entry list is
    /// terminated by a null name.
    pub unsafe fn from_raw(data: *const DartApi) -> BridgeResult<Self> {
        let api = data.as_ref().ok_or(BridgeError::NullApiData)?;
        if api.major != DART_API_DL_MAJOR_VERSION {
            return Err(BridgeError::VersionMismatch {
                expected: DART_API_DL_MAJOR_VERSION,
                found: api.major,
            });
        }

        let mut table = ApiTable {
            major: api.major,
            minor: api.minor,
            ..ApiTable::default()
        };

        let mut entry = api.functions;
        while let Some(current) = entry.as_ref() {
            if current.name.is_null() {
                break;
            }
            if let Some(function) = current.function {
                let name = CStr::from_ptr(current.name).to_bytes();
                table.resolve(name, function);
            }
            entry = entry.add(1);
        }

        Ok(table)
    }

    pub fn version(&self) -> (i32, i32) {
        (self.major, self.minor)
    }

    /// `Dart_NewPersistentHandle`.
    ///
    /// # Safety
    ///
    /// Must be called on a thread with a current isolate and a valid handle.
    pub unsafe fn new_persistent_handle(
        &self,
        object: Dart_Handle,
    ) -> BridgeResult<Dart_PersistentHandle> {
        let f = require(self.new_persistent_handle_fn, "Dart_NewPersistentHandle")?;
        Ok(f(object))
    }

    /// `Dart_HandleFromPersistent`.
    ///
    /// # Safety
    ///
    /// `object` must be a live persistent handle of the current isolate group.
    pub unsafe fn handle_from_persistent(
        &self,
        object: Dart_PersistentHandle,
    ) -> BridgeResult<Dart_Handle> {
        let f = require(self.handle_from_persistent_fn, "Dart_HandleFromPersistent")?;
        Ok(f(object))
    }

    /// `Dart_DeletePersistentHandle`.
    ///
    /// # Safety
    ///
    /// `object` must be a live persistent handle and must not be used afterwards.
    pub unsafe fn delete_persistent_handle(
        &self,
        object: Dart_PersistentHandle,
    ) -> BridgeResult<()> {
        let f = require(self.delete_persistent_handle_fn, "Dart_DeletePersistentHandle")?;
        f(object);
        Ok(())
    }

    /// `Dart_NewApiError`.
    ///
    /// # Safety
    ///
    /// `message` must be a valid NUL-terminated string.
    pub unsafe fn new_api_error(&self, message: *const c_char) -> BridgeResult<Dart_Handle> {
        let f = require(self.new_api_error_fn, "Dart_NewApiError")?;
        Ok(f(message))
    }

    /// `Dart_NewUnhandledExceptionError`.
    ///
    /// # Safety
    ///
    /// Must be called on a thread with a current isolate.
    pub unsafe fn new_unhandled_exception_error(
        &self,
        exception: Dart_Handle,
    ) -> BridgeResult<Dart_Handle> {
        let f = require(
            self.new_unhandled_exception_error_fn,
            "Dart_NewUnhandledExceptionError",
        )?;
        Ok(f(exception))
    }

    /// `Dart_PropagateError`.
    ///
    /// In a live VM this never returns: control leaves through a longjmp and no
    /// Rust frame between here and the VM is unwound, so no `Drop` runs. Callers
    /// must not hold values with destructors across this call. `Ok(())` is only
    /// seen when the entry point does return.
    ///
    /// # Safety
    ///
    /// `handle` must be an error handle and the caller must be native code
    /// invoked directly by Dart.
    pub unsafe fn propagate_error(&self, handle: Dart_Handle) -> BridgeResult<()> {
        let f = require(self.propagate_error_fn, "Dart_PropagateError")?;
        f(handle);
        Ok(())
    }

    /// `Dart_IsError`.
    ///
    /// # Safety
    ///
    /// Must be called on a thread with a current isolate.
    pub unsafe fn is_error(&self, handle: Dart_Handle) -> BridgeResult<bool> {
        let f = require(self.is_error_fn, "Dart_IsError")?;
        Ok(f(handle))
    }

    /// `Dart_GetError`. The returned string is owned by the VM.
    ///
    /// # Safety
    ///
    /// Must be called on a thread with a current isolate.
    pub unsafe fn get_error(&self, handle: Dart_Handle) -> BridgeResult<*const c_char> {
        let f = require(self.get_error_fn, "Dart_GetError")?;
        Ok(f(handle))
    }

    /// `Dart_PostCObject`. Safe to call from any thread.
    ///
    /// # Safety
    ///
    /// `message` must point to a valid `Dart_CObject` tree.
    pub unsafe fn post_cobject(
        &self,
        port: Dart_Port,
        message: *mut Dart_CObject,
    ) -> BridgeResult<bool> {
        let f = require(self.post_cobject_fn, "Dart_PostCObject")?;
        Ok(f(port, message))
    }

    /// `Dart_PostInteger`. Safe to call from any thread.
    pub fn post_integer(&self, port: Dart_Port, message: i64) -> BridgeResult<bool> {
        let f = require(self.post_integer_fn, "Dart_PostInteger")?;
        // SAFETY: the call only takes plain integers.
        Ok(unsafe { f(port, message) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;

    unsafe extern "C" fn fake_post_integer(port: Dart_Port, message: i64) -> bool {
        port == message
    }

    unsafe extern "C" fn fake_is_error(handle: Dart_Handle) -> bool {
        !handle.is_null()
    }

    unsafe extern "C" fn fake_get_error(_handle: Dart_Handle) -> *const c_char {
        c"fake error".as_ptr()
    }

    fn entry(name: &'static CStr, function: RawFn) -> DartApiEntry {
        DartApiEntry {
            name: name.as_ptr(),
            function: Some(function),
        }
    }

    fn terminator() -> DartApiEntry {
        DartApiEntry {
            name: ptr::null(),
            function: None,
        }
    }

    fn entries() -> Vec<DartApiEntry> {
        unsafe {
            vec![
                entry(
                    c"Dart_PostInteger",
                    std::mem::transmute::<PostIntegerFn, RawFn>(fake_post_integer),
                ),
                entry(
                    c"Dart_SomethingNewer",
                    std::mem::transmute::<IsErrorFn, RawFn>(fake_is_error),
                ),
                entry(
                    c"Dart_IsError",
                    std::mem::transmute::<IsErrorFn, RawFn>(fake_is_error),
                ),
                entry(
                    c"Dart_GetError",
                    std::mem::transmute::<GetErrorFn, RawFn>(fake_get_error),
                ),
                terminator(),
            ]
        }
    }

    #[test]
    fn rejects_null_data() {
        let err = unsafe { ApiTable::from_raw(ptr::null()) }.unwrap_err();
        assert!(matches!(err, BridgeError::NullApiData));
    }

    #[test]
    fn rejects_other_major_versions() {
        let entries = entries();
        let api = DartApi {
            major: DART_API_DL_MAJOR_VERSION + 1,
            minor: 0,
            functions: entries.as_ptr(),
        };
        let err = unsafe { ApiTable::from_raw(&api) }.unwrap_err();
        assert!(matches!(
            err,
            BridgeError::VersionMismatch { expected: 2, found: 3 }
        ));
    }

    #[test]
    fn accepts_newer_minor_and_skips_unknown_names() {
        let entries = entries();
        let api = DartApi {
            major: DART_API_DL_MAJOR_VERSION,
            minor: DART_API_DL_MINOR_VERSION + 5,
            functions: entries.as_ptr(),
        };
        let table = unsafe { ApiTable::from_raw(&api) }.unwrap();
        assert_eq!(table.version(), (2, DART_API_DL_MINOR_VERSION + 5));
        assert_eq!(table.resolved_count(), 3);
        assert!(table.has("Dart_PostInteger"));
        assert!(table.has("Dart_IsError"));
        assert!(!table.has("Dart_PostCObject"));
        assert!(!table.has("Dart_SomethingNewer"));
    }

    #[test]
    fn forwards_results_unchanged() {
        let entries = entries();
        let api = DartApi {
            major: DART_API_DL_MAJOR_VERSION,
            minor: DART_API_DL_MINOR_VERSION,
            functions: entries.as_ptr(),
        };
        let table = unsafe { ApiTable::from_raw(&api) }.unwrap();
        assert!(table.post_integer(9, 9).unwrap());
        assert!(!table.post_integer(9, 8).unwrap());
        assert!(!unsafe { table.is_error(ptr::null_mut()) }.unwrap());
        let message = unsafe { CStr::from_ptr(table.get_error(ptr::null_mut()).unwrap()) };
        assert_eq!(message.to_str().unwrap(), "fake error");
    }

    #[test]
    fn missing_symbols_are_errors() {
        let table = ApiTable::default();
        let err = unsafe { table.new_persistent_handle(ptr::null_mut()) }.unwrap_err();
        assert!(matches!(err, BridgeError::MissingSymbol("Dart_NewPersistentHandle")));
        let err = unsafe { table.propagate_error(ptr::null_mut()) }.unwrap_err();
        assert!(matches!(err, BridgeError::MissingSymbol("Dart_PropagateError")));
    }

    #[test]
    fn empty_list_resolves_nothing() {
        let entries = [terminator()];
        let api = DartApi {
            major: DART_API_DL_MAJOR_VERSION,
            minor: 0,
            functions: entries.as_ptr(),
        };
        let table = unsafe { ApiTable::from_raw(&api) }.unwrap();
        assert_eq!(table.resolved_count(), 0);
        assert_eq!(ApiTable::SYMBOLS.len(), 10);
    }
}
