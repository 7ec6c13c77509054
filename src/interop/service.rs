//! String handling at the FFI boundary.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use crate::common::error::{BridgeError, BridgeResult};

/// Reverse `input` by Unicode scalar value.
pub fn reverse(input: &str) -> String {
    input.chars().rev().collect()
}

/// Copy a borrowed C string into an owned `String`.
///
/// # Safety
///
/// `ptr` must be null or a valid NUL-terminated string.
pub unsafe fn read_c_str(ptr: *const c_char) -> BridgeResult<String> {
    if ptr.is_null() {
        return Err(BridgeError::invalid("null string pointer"));
    }
    Ok(CStr::from_ptr(ptr).to_str()?.to_owned())
}

/// Move `value` into a C string owned by the caller, released with
/// [`free_string`].
pub fn into_c_string(value: String) -> BridgeResult<*mut c_char> {
    Ok(CString::new(value)?.into_raw())
}

/// Release a string produced by [`into_c_string`]. Null is a no-op.
///
/// # Safety
///
/// `ptr` must be null or come from [`into_c_string`] and not be freed twice.
pub unsafe fn free_string(ptr: *mut c_char) {
    if ptr.is_null() {
        return;
    }
    drop(CString::from_raw(ptr));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverses_by_char() {
        assert_eq!(reverse("hello"), "olleh");
        assert_eq!(reverse("añb"), "bña");
        assert_eq!(reverse(""), "");
    }

    #[test]
    fn c_strings_round_trip() {
        let raw = into_c_string("dart".to_string()).unwrap();
        let read = unsafe { read_c_str(raw) }.unwrap();
        assert_eq!(read, "dart");
        unsafe { free_string(raw) };
    }

    #[test]
    fn rejects_null_and_interior_nul() {
        assert!(unsafe { read_c_str(std::ptr::null()) }.is_err());
        assert!(into_c_string("a\0b".to_string()).is_err());
        unsafe { free_string(std::ptr::null_mut()) };
    }
}
