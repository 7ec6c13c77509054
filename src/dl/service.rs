//! Process-wide API table installed by `InitDartApiDL`.

use std::os::raw::c_void;

use parking_lot::RwLock;

use crate::common::error::{BridgeError, BridgeResult};

use super::domain::DartApi;
use super::table::ApiTable;

static TABLE: RwLock<Option<ApiTable>> = parking_lot::const_rwlock(None);

/// Resolve and install the table the VM passed in. A second call replaces the
/// first, so a hot-restarted isolate group can re-initialize.
///
/// # Safety
///
/// `data` must be the pointer obtained from `NativeApi.initializeApiDLData`.
pub unsafe fn install(data: *mut c_void) -> BridgeResult<ApiTable> {
    let table = ApiTable::from_raw(data as *const DartApi)?;
    let (major, minor) = table.version();
    tracing::info!(
        major,
        minor,
        resolved = table.resolved_count(),
        expected = ApiTable::SYMBOLS.len(),
        "dart api table installed"
    );
    for symbol in ApiTable::SYMBOLS {
        if !table.has(symbol) {
            tracing::warn!(symbol, "dart api symbol missing");
        }
    }
    *TABLE.write() = Some(table);
    Ok(table)
}

/// Forget the installed table; later calls fail with `NotInitialized`.
pub fn reset() {
    *TABLE.write() = None;
}

/// Copy of the installed table.
pub fn current() -> BridgeResult<ApiTable> {
    (*TABLE.read()).ok_or(BridgeError::NotInitialized)
}

pub fn is_initialized() -> bool {
    TABLE.read().is_some()
}
