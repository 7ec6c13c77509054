//! Worker pool driving futures spawned on behalf of Dart.
//!
//! The pool is created on first use with the size from [`BridgeCfg`] and lives
//! for the rest of the process, like the extension itself.

use futures::executor::ThreadPool;
use once_cell::sync::OnceCell;

use crate::common::config::BridgeCfg;
use crate::common::error::BridgeResult;

static POOL: OnceCell<ThreadPool> = OnceCell::new();

/// Build a pool with `size` worker threads.
pub fn build(size: usize) -> BridgeResult<ThreadPool> {
    let pool = ThreadPool::builder()
        .pool_size(size.max(1))
        .name_prefix("dart-bridge-")
        .create()?;
    Ok(pool)
}

/// Shared pool, created on first call.
pub fn pool() -> BridgeResult<&'static ThreadPool> {
    POOL.get_or_try_init(|| {
        let cfg = BridgeCfg::load();
        tracing::debug!(workers = cfg.workers, "starting worker pool");
        build(cfg.workers)
    })
}
