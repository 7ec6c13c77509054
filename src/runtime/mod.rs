//! Background execution for work started from Dart.
//!
//! [`executor`] runs tasks that touch VM handles on the isolate thread;
//! [`workers`] runs plain work that only posts to ports.

pub mod executor;
pub mod service;
pub mod workers;

pub use service::{complete, completion_channel, run_after, spawn, CompletionSender, DartOutcome};
