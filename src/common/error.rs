//! Error handling primitives shared across the bridge.
//!
//! Rust errors never cross the FFI boundary as values. Exported functions log
//! them and fall back to the sentinel that the Dart side expects.
//! `InitDartApiDL` reports the negated [`BridgeCode`] of its failure.

use thiserror::Error;

/// Stable error codes that cross the FFI boundary.
#[repr(i32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BridgeCode {
    /// Success code used as a sentinel.
    Ok = 0,
    /// `InitDartApiDL` has not been called yet.
    NotInitialized = 1,
    /// The VM handed over an API table with an unsupported major version.
    VersionMismatch = 2,
    /// The API table does not export a symbol the bridge needs.
    MissingSymbol = 3,
    /// Input failed validation.
    InvalidInput = 4,
    /// The VM refused to deliver a message to a port.
    PostRejected = 5,
    /// No closure caller, callback or executor port has been registered.
    NotRegistered = 6,
    /// Catch-all for runtime failures (thread pool, allocation).
    Internal = 7,
}

/// Canonical error type for the bridge.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("dart api table is not initialized")]
    NotInitialized,

    #[error("dart api data pointer is null")]
    NullApiData,

    #[error("dart api major version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: i32, found: i32 },

    #[error("dart api symbol {0} is not available")]
    MissingSymbol(&'static str),

    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    #[error("string contains an interior nul byte: {0}")]
    Nul(#[from] std::ffi::NulError),

    #[error("string is not valid utf-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("dart rejected message posted to port {0}")]
    PostRejected(i64),

    #[error("no closure caller registered")]
    NoClosureCaller,

    #[error("no closure callback registered")]
    NoCallback,

    #[error("no executor port registered")]
    NoExecutorPort,

    #[error("runtime error: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Result alias used throughout the crate.
pub type BridgeResult<T> = Result<T, BridgeError>;

impl BridgeError {
    /// Validation helper.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Stable code reported across the FFI boundary.
    pub fn code(&self) -> BridgeCode {
        match self {
            Self::NotInitialized | Self::NullApiData => BridgeCode::NotInitialized,
            Self::VersionMismatch { .. } => BridgeCode::VersionMismatch,
            Self::MissingSymbol(_) => BridgeCode::MissingSymbol,
            Self::InvalidInput { .. } | Self::Nul(_) | Self::Utf8(_) => BridgeCode::InvalidInput,
            Self::PostRejected(_) => BridgeCode::PostRejected,
            Self::NoClosureCaller | Self::NoCallback | Self::NoExecutorPort => {
                BridgeCode::NotRegistered
            }
            Self::Runtime(_) => BridgeCode::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(BridgeCode::Ok as i32, 0);
        assert_eq!(BridgeCode::NotInitialized as i32, 1);
        assert_eq!(BridgeCode::VersionMismatch as i32, 2);
        assert_eq!(BridgeCode::MissingSymbol as i32, 3);
        assert_eq!(BridgeCode::InvalidInput as i32, 4);
        assert_eq!(BridgeCode::PostRejected as i32, 5);
        assert_eq!(BridgeCode::NotRegistered as i32, 6);
        assert_eq!(BridgeCode::Internal as i32, 7);
    }

    #[test]
    fn errors_map_to_codes() {
        assert_eq!(BridgeError::NullApiData.code(), BridgeCode::NotInitialized);
        assert_eq!(
            BridgeError::MissingSymbol("Dart_PostCObject").code(),
            BridgeCode::MissingSymbol
        );
        assert_eq!(BridgeError::invalid("bad").code(), BridgeCode::InvalidInput);
        assert_eq!(BridgeError::NoCallback.code(), BridgeCode::NotRegistered);
        assert_eq!(BridgeError::NoExecutorPort.code(), BridgeCode::NotRegistered);
    }

    #[test]
    fn messages_name_the_failure() {
        let err = BridgeError::VersionMismatch {
            expected: 2,
            found: 1,
        };
        assert_eq!(
            err.to_string(),
            "dart api major version mismatch: expected 2, found 1"
        );
        assert_eq!(
            BridgeError::PostRejected(42).to_string(),
            "dart rejected message posted to port 42"
        );
    }
}
