//! Executor whose tasks are polled by the Dart event loop.
//!
//! Anything that touches VM handles must run on the isolate thread. A task
//! here is never polled by Rust: waking it posts the task pointer to the
//! executor port, and the Dart listener hands it back to `PollTask` on the
//! isolate thread. Timers and channels only wake the task, so they may fire
//! on any thread.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::task::{waker_ref, ArcWake, Context};
use parking_lot::{Mutex, RwLock};

use crate::common::error::{BridgeError, BridgeResult};
use crate::port::Port;

static EXECUTOR_PORT: RwLock<Option<Port>> = parking_lot::const_rwlock(None);

/// Route task wake-ups to `port`.
pub fn register_port(port: Port) {
    *EXECUTOR_PORT.write() = Some(port);
    tracing::debug!(port = port.id(), "executor port registered");
}

pub fn port() -> BridgeResult<Port> {
    (*EXECUTOR_PORT.read()).ok_or(BridgeError::NoExecutorPort)
}

/// A spawned future. `None` once it has completed.
pub struct Task {
    future: Mutex<Option<BoxFuture<'static, ()>>>,
}

impl Task {
    /// Hand one strong reference to Dart through the executor port.
    fn schedule(self: &Arc<Self>) -> BridgeResult<()> {
        let port = port()?;
        let raw = Arc::into_raw(Arc::clone(self));
        if let Err(err) = port.post_integer(raw as i64) {
            // SAFETY: the VM did not accept the pointer, so the reference
            // created above is still ours.
            unsafe { drop(Arc::from_raw(raw)) };
            return Err(err);
        }
        Ok(())
    }
}

impl ArcWake for Task {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        if let Err(err) = arc_self.schedule() {
            tracing::error!(%err, "failed to schedule task");
        }
    }
}

/// Queue `future` for its first poll on the isolate thread.
pub fn spawn<F>(future: F) -> BridgeResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let task = Arc::new(Task {
        future: Mutex::new(Some(Box::pin(future))),
    });
    task.schedule()
}

/// Poll the task behind `raw` once, consuming the reference posted for it.
/// Returns `true` when the task has completed; its future is dropped on the
/// calling thread.
///
/// # Safety
///
/// `raw` must be zero or a value posted by this executor, passed back exactly
/// once.
pub unsafe fn poll(raw: i64) -> bool {
    if raw == 0 {
        tracing::warn!("poll called with null task");
        return false;
    }
    let task = Arc::from_raw(raw as *const Task);
    let mut slot = task.future.lock();
    let Some(mut future) = slot.take() else {
        return true;
    };

    let waker = waker_ref(&task);
    let mut cx = Context::from_waker(&waker);
    if future.as_mut().poll(&mut cx).is_pending() {
        *slot = Some(future);
        return false;
    }
    drop(future);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_needs_a_port() {
        let err = spawn(async {}).unwrap_err();
        assert!(matches!(err, BridgeError::NoExecutorPort));
    }

    #[test]
    fn null_task_is_ignored() {
        assert!(!unsafe { poll(0) });
    }

    #[test]
    fn completed_task_polls_as_done() {
        let task = Arc::new(Task {
            future: Mutex::new(Some(Box::pin(async {}))),
        });
        let raw = Arc::into_raw(Arc::clone(&task)) as i64;
        assert!(unsafe { poll(raw) });
        assert!(task.future.lock().is_none());

        let raw = Arc::into_raw(Arc::clone(&task)) as i64;
        assert!(unsafe { poll(raw) });
        assert_eq!(Arc::strong_count(&task), 1);
    }
}
