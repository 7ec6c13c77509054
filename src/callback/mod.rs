//! Dart closures held across calls through persistent handles.

pub mod domain;
pub mod service;

pub use domain::{ClosureCaller, DartCallback};
