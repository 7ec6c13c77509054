//! Access to the Dart VM through the dynamically linked API table
//! (`dart_api_dl.h`).
//!
//! The VM hands the extension a list of `(name, function)` pairs at startup.
//! [`table::ApiTable`] resolves that list once and the rest of the crate
//! forwards calls through it.

pub mod domain;
pub mod service;
pub mod table;

pub use domain::{Dart_Handle, Dart_PersistentHandle, DartApi, DartApiEntry};
pub use service::{current, install};
pub use table::ApiTable;
