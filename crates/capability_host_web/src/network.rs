//! Network information host adapter.

use capability_host::ports::NetworkHost;
#[cfg(target_arch = "wasm32")]
use std::rc::Rc;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::{closure::Closure, JsCast, JsValue};

#[derive(Debug, Clone, Copy, Default)]
/// Browser network host backed by `navigator` connectivity state and the
/// window `online`/`offline` events.
pub struct WebNetworkHost;

impl NetworkHost for WebNetworkHost {
    fn online(&self) -> Option<bool> {
        #[cfg(target_arch = "wasm32")]
        {
            Some(web_sys::window()?.navigator().on_line())
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            None
        }
    }

    fn connection_kind(&self) -> Option<String> {
        #[cfg(target_arch = "wasm32")]
        {
            let navigator = web_sys::window()?.navigator();
            // Reflect reads cover the vendor-prefixed connection objects and
            // the effective-type estimate the typed bindings do not expose.
            let connection = ["connection", "mozConnection", "webkitConnection"]
                .iter()
                .find_map(|name| {
                    js_sys::Reflect::get(navigator.as_ref(), &JsValue::from_str(name))
                        .ok()
                        .filter(|value| !value.is_undefined() && !value.is_null())
                })?;
            ["type", "effectiveType"].iter().find_map(|name| {
                js_sys::Reflect::get(&connection, &JsValue::from_str(name))
                    .ok()
                    .and_then(|value| value.as_string())
            })
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            None
        }
    }

    fn watch(&self, on_change: Box<dyn Fn(bool)>) {
        #[cfg(target_arch = "wasm32")]
        {
            let Some(window) = web_sys::window() else {
                return;
            };
            let on_change: Rc<dyn Fn(bool)> = Rc::from(on_change);
            let online = {
                let on_change = on_change.clone();
                Closure::<dyn FnMut()>::wrap(Box::new(move || on_change(true)))
            };
            let offline = Closure::<dyn FnMut()>::wrap(Box::new(move || on_change(false)));
            let _ = window.add_event_listener_with_callback("online", online.as_ref().unchecked_ref());
            let _ =
                window.add_event_listener_with_callback("offline", offline.as_ref().unchecked_ref());
            // The subscription is process-lifetime; the closures are leaked
            // on purpose.
            online.forget();
            offline.forget();
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = on_change;
        }
    }
}
