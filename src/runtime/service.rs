//! Async helpers used by the exported entry points.

use std::future::Future;
use std::time::Duration;

use futures::channel::oneshot;
use futures_timer::Delay;

use crate::common::error::BridgeResult;

use super::workers;

/// Outcome reported by a Dart future: `Ok(value)` or `Err(code)`.
pub type DartOutcome = Result<i64, i64>;

/// Sender half handed to Dart as an opaque pointer.
pub type CompletionSender = oneshot::Sender<DartOutcome>;

/// Run `future` on the shared pool.
pub fn spawn<F>(future: F) -> BridgeResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    workers::pool()?.spawn_ok(future);
    Ok(())
}

/// Run `job` on the shared pool once `delay` has elapsed.
pub fn run_after<F>(delay: Duration, job: F) -> BridgeResult<()>
where
    F: FnOnce() + Send + 'static,
{
    spawn(async move {
        Delay::new(delay).await;
        job();
    })
}

/// Create a completion channel whose sender is leaked to a raw pointer for
/// Dart. The pointer must be consumed by exactly one [`complete`] call.
pub fn completion_channel() -> (*mut CompletionSender, oneshot::Receiver<DartOutcome>) {
    let (tx, rx) = oneshot::channel();
    (Box::into_raw(Box::new(tx)), rx)
}

/// Reclaim the sender behind `tx` and deliver `outcome`. Returns `false` for a
/// null pointer or when the receiver is gone.
///
/// # Safety
///
/// `tx` must be null or come from [`completion_channel`] and not have been
/// completed before.
pub unsafe fn complete(tx: *mut CompletionSender, outcome: DartOutcome) -> bool {
    if tx.is_null() {
        tracing::warn!("completion called with null sender");
        return false;
    }
    let tx = Box::from_raw(tx);
    match tx.send(outcome) {
        Ok(()) => true,
        Err(outcome) => {
            tracing::debug!(?outcome, "completion receiver dropped");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::sync::mpsc;

    #[test]
    fn completes_with_ok_and_err() {
        let (tx, rx) = completion_channel();
        assert!(unsafe { complete(tx, Ok(5)) });
        assert_eq!(block_on(rx).unwrap(), Ok(5));

        let (tx, rx) = completion_channel();
        assert!(unsafe { complete(tx, Err(-1)) });
        assert_eq!(block_on(rx).unwrap(), Err(-1));
    }

    #[test]
    fn null_sender_is_ignored() {
        assert!(!unsafe { complete(std::ptr::null_mut(), Ok(1)) });
    }

    #[test]
    fn dropped_receiver_reports_false() {
        let (tx, rx) = completion_channel();
        drop(rx);
        assert!(!unsafe { complete(tx, Ok(1)) });
    }

    #[test]
    fn run_after_waits_then_runs() {
        let (done_tx, done_rx) = mpsc::channel();
        let started = std::time::Instant::now();
        run_after(Duration::from_millis(20), move || {
            let _ = done_tx.send(());
        })
        .unwrap();
        done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(started.elapsed() >= Duration::from_millis(20));
    }
}
