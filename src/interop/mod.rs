//! Values passed to and from Dart directly rather than through handles.

pub mod domain;
pub mod service;

pub use domain::{Array, Color};
