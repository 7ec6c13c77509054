//! Cross-isolate messaging through `Dart_PostCObject`.

pub mod domain;
pub mod service;

pub use domain::{CObject, Dart_CObject, Dart_Port};
pub use service::Port;
