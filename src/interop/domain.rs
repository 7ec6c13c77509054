//! Plain values exchanged with Dart by value.

use crate::common::error::BridgeError;

/// Enum shared with Dart as its `u8` discriminant.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Color {
    Blue = 0,
    Rust = 1,
}

impl TryFrom<u8> for Color {
    type Error = BridgeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Color::Blue),
            1 => Ok(Color::Rust),
            other => Err(BridgeError::invalid(format!("unknown color {other}"))),
        }
    }
}

/// `i64` buffer returned to Dart by value. Ownership moves to Dart, which hands
/// it back to `FreeArray`.
#[repr(C)]
#[derive(Debug)]
pub struct Array {
    pub arr: *const i64,
    pub len: u64,
}

impl Array {
    pub fn as_slice(&self) -> &[i64] {
        if self.arr.is_null() {
            return &[];
        }
        // SAFETY: `arr` and `len` describe the boxed slice leaked in `from`.
        unsafe { std::slice::from_raw_parts(self.arr, self.len as usize) }
    }
}

impl From<Vec<i64>> for Array {
    fn from(values: Vec<i64>) -> Self {
        let boxed = values.into_boxed_slice();
        let len = boxed.len() as u64;
        Self {
            arr: Box::leak(boxed).as_ptr(),
            len,
        }
    }
}

impl Drop for Array {
    fn drop(&mut self) {
        if self.arr.is_null() {
            return;
        }
        // SAFETY: reconstructs the boxed slice leaked in `from`.
        unsafe {
            let slice = std::ptr::slice_from_raw_parts_mut(self.arr as *mut i64, self.len as usize);
            drop(Box::from_raw(slice));
        }
    }
}
