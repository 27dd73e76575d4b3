//! One-shot timer host adapter.

use capability_host::ports::TimerHost;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::{closure::Closure, JsCast};

#[derive(Debug, Clone, Copy, Default)]
/// Browser timer host backed by `window.setTimeout`.
pub struct WebTimerHost;

impl TimerHost for WebTimerHost {
    fn set_timeout(&self, delay_ms: u64, callback: Box<dyn FnOnce()>) {
        #[cfg(target_arch = "wasm32")]
        {
            let Some(window) = web_sys::window() else {
                return;
            };
            let delay = i32::try_from(delay_ms).unwrap_or(i32::MAX);
            // once_into_js frees the closure after its single invocation.
            let callback = Closure::once_into_js(move || callback());
            if window
                .set_timeout_with_callback_and_timeout_and_arguments_0(
                    callback.unchecked_ref(),
                    delay,
                )
                .is_err()
            {
                tracing::warn!(delay_ms, "failed to arm host timer");
            }
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = (delay_ms, callback);
        }
    }
}
