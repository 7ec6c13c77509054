//! C-compatible API looked up by the Dart side through `DynamicLibrary`.
//!
//! Nothing here unwinds into the VM: failures are logged and reported through
//! the sentinel each function documents.

#![allow(non_snake_case)]

use std::os::raw::c_char;
use std::ptr;
use std::time::Duration;

use futures_timer::Delay;
use libc::{c_int, c_void, intptr_t};

use crate::callback::{self, ClosureCaller};
use crate::common::config::BridgeCfg;
use crate::common::log;
use crate::dl::{self, Dart_Handle};
use crate::interop::{self, Array, Color};
use crate::port::Port;
use crate::runtime::{self, executor, CompletionSender};

/// ABI version to coordinate with the Dart bindings.
#[no_mangle]
pub extern "C" fn dart_bridge_api_version() -> u32 {
    1
}

/// Initialize the API table from `NativeApi.initializeApiDLData`. Returns 0 on
/// success and the negated `BridgeCode` on failure: -1 for a null pointer, -2
/// for an unsupported major version.
#[no_mangle]
pub unsafe extern "C" fn InitDartApiDL(data: *mut c_void) -> intptr_t {
    log::init(&BridgeCfg::load());
    match dl::install(data) {
        Ok(_) => 0,
        Err(err) => {
            tracing::error!(%err, "dart api initialization failed");
            -(err.code() as intptr_t)
        }
    }
}

/// Register the port whose listener passes each received integer to
/// `PollTask` on the isolate thread.
#[no_mangle]
pub extern "C" fn RegisterExecutorPort(port: i64) {
    executor::register_port(Port::new(port));
}

/// Poll a task posted to the executor port. Returns whether it completed.
#[no_mangle]
pub unsafe extern "C" fn PollTask(task: i64) -> bool {
    executor::poll(task)
}

/// Register the Dart function used to invoke closures held by Rust.
#[no_mangle]
pub extern "C" fn RegisterClosureCallerFP(caller: ClosureCaller) {
    callback::service::register_caller(caller);
}

/// Keep `closure` alive until it is replaced by another registration.
#[no_mangle]
pub unsafe extern "C" fn RegisterClosureCallback(closure: Dart_Handle) {
    if let Err(err) = callback::service::register(closure) {
        tracing::error!(%err, "failed to register closure callback");
    }
}

/// Invoke the closure stored by `RegisterClosureCallback`.
#[no_mangle]
pub unsafe extern "C" fn InvokeClosureCallback() {
    if let Err(err) = callback::service::invoke_registered() {
        tracing::error!(%err, "failed to invoke closure callback");
    }
}

/// Invoke `closure` after `timeout` milliseconds. The timer runs off-thread;
/// the invocation and the handle release happen in `PollTask`.
#[no_mangle]
pub unsafe extern "C" fn RunAsync(timeout: i64, closure: Dart_Handle) {
    let callback = match callback::service::pin(closure) {
        Ok(callback) => callback,
        Err(err) => {
            tracing::error!(%err, "RunAsync could not pin closure");
            return;
        }
    };

    let spawned = executor::spawn(async move {
        Delay::new(delay(timeout)).await;
        // SAFETY: executor tasks are polled by `PollTask` on the isolate thread.
        if let Err(err) = unsafe { callback::service::invoke(&callback) } {
            tracing::error!(%err, "RunAsync callback failed");
        }
    });
    if let Err(err) = spawned {
        tracing::error!(%err, "RunAsync could not schedule work");
    }
}

/// Post `value` to `port` after `timeout` milliseconds.
#[no_mangle]
pub extern "C" fn PostAfter(timeout: i64, port: i64, value: i64) {
    let port = Port::new(port);
    let scheduled = runtime::run_after(delay(timeout), move || {
        if let Err(err) = port.post(value) {
            tracing::error!(%err, port = port.id(), "PostAfter failed");
        }
    });
    if let Err(err) = scheduled {
        tracing::error!(%err, "PostAfter could not schedule work");
    }
}

/// Post a copy of `message` to `port`. Returns whether the VM accepted it.
#[no_mangle]
pub unsafe extern "C" fn PostString(port: i64, message: *const c_char) -> bool {
    let result = interop::service::read_c_str(message).and_then(|text| Port::new(port).post(text));
    match result {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(%err, port, "PostString failed");
            false
        }
    }
}

/// Reverse a string. The result must be released with `FreeRustString`; null
/// is returned for invalid input.
#[no_mangle]
pub unsafe extern "C" fn Strings(string_in: *const c_char) -> *const c_char {
    let reversed = interop::service::read_c_str(string_in).and_then(|text| {
        tracing::debug!(len = text.len(), "received string from dart");
        interop::service::into_c_string(interop::service::reverse(&text))
    });
    match reversed {
        Ok(ptr) => ptr,
        Err(err) => {
            tracing::warn!(%err, "Strings rejected input");
            ptr::null()
        }
    }
}

#[no_mangle]
pub unsafe extern "C" fn FreeRustString(s: *mut c_char) {
    interop::service::free_string(s);
}

/// Throw an exception into Dart. Control leaves through `Dart_PropagateError`
/// and nothing after that call runs, so no value with a destructor may be
/// alive at that point.
#[no_mangle]
pub unsafe extern "C" fn ThrowFromNative() {
    let table = match dl::current() {
        Ok(table) => table,
        Err(err) => {
            tracing::error!(%err, "ThrowFromNative without api table");
            return;
        }
    };
    let message = c"Exception thrown from rust message";
    let exception = table
        .new_api_error(message.as_ptr())
        .and_then(|api_error| table.new_unhandled_exception_error(api_error));
    let exception = match exception {
        Ok(exception) => exception,
        Err(err) => {
            tracing::error!(%err, "ThrowFromNative could not build exception");
            return;
        }
    };
    if let Err(err) = table.propagate_error(exception) {
        tracing::error!(%err, "ThrowFromNative could not propagate");
        return;
    }
    unreachable!("Dart_PropagateError returned");
}

/// Ask Dart for a future via `get_future` and invoke `completion` once Dart
/// resolves it through `OneshotSendOk` or `OneshotSendErr`.
#[no_mangle]
pub unsafe extern "C" fn CallDartFutureFromRust(
    get_future: extern "C" fn(tx: *mut CompletionSender),
    completion: Dart_Handle,
) {
    let completion = match callback::service::pin(completion) {
        Ok(callback) => callback,
        Err(err) => {
            tracing::error!(%err, "CallDartFutureFromRust could not pin closure");
            return;
        }
    };

    let (tx, rx) = runtime::completion_channel();
    get_future(tx);

    let spawned = executor::spawn(async move {
        match rx.await {
            Ok(outcome) => tracing::info!(?outcome, "dart future resolved"),
            Err(_) => tracing::warn!("dart future sender dropped"),
        }
        // SAFETY: see `RunAsync`.
        if let Err(err) = unsafe { callback::service::invoke(&completion) } {
            tracing::error!(%err, "completion callback failed");
        }
    });
    if let Err(err) = spawned {
        tracing::error!(%err, "CallDartFutureFromRust could not spawn");
    }
}

#[no_mangle]
pub unsafe extern "C" fn OneshotSendOk(tx: *mut CompletionSender, ok: i64) {
    runtime::complete(tx, Ok(ok));
}

#[no_mangle]
pub unsafe extern "C" fn OneshotSendErr(tx: *mut CompletionSender, err: i64) {
    runtime::complete(tx, Err(err));
}

/// Returns `Color::Rust` when handed `Color::Blue`, -1 otherwise.
#[no_mangle]
pub extern "C" fn Enums(color: u8) -> c_int {
    match Color::try_from(color) {
        Ok(Color::Blue) => Color::Rust as c_int,
        Ok(other) => {
            tracing::warn!(?other, "Enums expected blue");
            -1
        }
        Err(err) => {
            tracing::warn!(%err, "Enums rejected input");
            -1
        }
    }
}

/// Return `[1, 2, 3]`. Ownership passes to the caller, who returns it to
/// `FreeArray`.
#[no_mangle]
pub extern "C" fn Arrays() -> Array {
    Array::from(vec![1, 2, 3])
}

#[no_mangle]
pub extern "C" fn FreeArray(arr: Array) {
    drop(arr);
}

fn delay(timeout_ms: i64) -> Duration {
    Duration::from_millis(timeout_ms.max(0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_maps_blue_to_rust() {
        assert_eq!(Enums(Color::Blue as u8), Color::Rust as c_int);
        assert_eq!(Enums(Color::Rust as u8), -1);
        assert_eq!(Enums(9), -1);
    }

    #[test]
    fn negative_timeouts_clamp_to_zero() {
        assert_eq!(delay(-5), Duration::ZERO);
        assert_eq!(delay(250), Duration::from_millis(250));
    }

    #[test]
    fn arrays_are_freed_by_value() {
        let array = Arrays();
        assert_eq!(array.as_slice(), &[1, 2, 3]);
        FreeArray(array);
    }
}
