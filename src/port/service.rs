//! Posting messages to Dart `ReceivePort`s from any thread.

use crate::common::error::{BridgeError, BridgeResult};
use crate::dl::{self, ApiTable};

use super::domain::{CObject, Dart_Port};

/// Native side of a Dart `SendPort` (`receivePort.sendPort.nativePort`).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Port(pub Dart_Port);

impl Port {
    pub fn new(id: Dart_Port) -> Self {
        Self(id)
    }

    pub fn id(&self) -> Dart_Port {
        self.0
    }

    /// Post `value` through the installed API table.
    pub fn post(&self, value: impl Into<CObject>) -> BridgeResult<()> {
        self.post_with(&dl::current()?, value)
    }

    /// Post `value` through an explicit table.
    pub fn post_with(&self, table: &ApiTable, value: impl Into<CObject>) -> BridgeResult<()> {
        let value = value.into();
        let mut encoded = value.encode()?;
        // SAFETY: `encoded` owns a well-formed tree that lives until the call
        // returns, and the VM copies it before returning.
        let delivered = unsafe { table.post_cobject(self.0, encoded.as_mut_ptr())? };
        self.check(delivered)
    }

    /// Post a bare integer through the `Dart_PostInteger` fast path.
    pub fn post_integer(&self, value: i64) -> BridgeResult<()> {
        let delivered = dl::current()?.post_integer(self.0, value)?;
        self.check(delivered)
    }

    fn check(&self, delivered: bool) -> BridgeResult<()> {
        if delivered {
            tracing::trace!(port = self.0, "message posted");
            Ok(())
        } else {
            tracing::debug!(port = self.0, "port rejected message");
            Err(BridgeError::PostRejected(self.0))
        }
    }
}

impl From<Dart_Port> for Port {
    fn from(id: Dart_Port) -> Self {
        Self(id)
    }
}
