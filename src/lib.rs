// lib.rs - native side of the Dart FFI bridge
pub mod common;
pub mod dl;
pub mod port;
pub mod callback;
pub mod runtime;
pub mod interop;
pub mod api;

pub use common::{BridgeCode, BridgeError, BridgeResult};
pub use port::{CObject, Port};
