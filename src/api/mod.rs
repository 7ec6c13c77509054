//! Symbols exported from the shared library.

pub mod ffi;
pub mod trampoline;
