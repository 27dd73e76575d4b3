//! Notification API host adapter.

use std::rc::Rc;

use capability_host::ports::{
    HostPermission, NotificationEvents, NotificationHandle, NotificationHost,
    NotificationHostFuture,
};
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::{closure::Closure, JsCast, JsValue};

#[derive(Debug, Clone, Copy, Default)]
/// Browser notification host backed by the Web Notifications API.
pub struct WebNotificationHost;

#[cfg(target_arch = "wasm32")]
struct WebNotificationHandle {
    tag: String,
    notification: web_sys::Notification,
    _on_click: Closure<dyn FnMut()>,
    _on_show: Closure<dyn FnMut()>,
    _on_close: Closure<dyn FnMut()>,
}

#[cfg(target_arch = "wasm32")]
impl NotificationHandle for WebNotificationHandle {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn close(&self) {
        self.notification.close();
    }
}

impl NotificationHost for WebNotificationHost {
    fn supported(&self) -> bool {
        #[cfg(target_arch = "wasm32")]
        {
            let Some(window) = web_sys::window() else {
                return false;
            };
            if !js_sys::Reflect::has(window.as_ref(), &JsValue::from_str("Notification"))
                .unwrap_or(false)
            {
                return false;
            }
            // Skip the construction probe once permission is granted;
            // constructing would show a real notification.
            if web_sys::Notification::permission() != web_sys::NotificationPermission::Granted {
                if let Err(error) = web_sys::Notification::new("") {
                    let name = error
                        .dyn_ref::<js_sys::Error>()
                        .map(|error| String::from(error.name()));
                    if name.as_deref() == Some("TypeError") {
                        return false;
                    }
                }
            }
            true
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            false
        }
    }

    fn permission(&self) -> HostPermission {
        #[cfg(target_arch = "wasm32")]
        {
            match web_sys::Notification::permission() {
                web_sys::NotificationPermission::Granted => HostPermission::Granted,
                web_sys::NotificationPermission::Denied => HostPermission::Denied,
                _ => HostPermission::Default,
            }
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            HostPermission::Default
        }
    }

    fn request_permission(&self) -> NotificationHostFuture<'_, HostPermission> {
        Box::pin(async move {
            #[cfg(target_arch = "wasm32")]
            {
                let promise = match web_sys::Notification::request_permission() {
                    Ok(promise) => promise,
                    Err(_) => return HostPermission::Default,
                };
                match wasm_bindgen_futures::JsFuture::from(promise).await {
                    Ok(value) => match value.as_string().as_deref() {
                        Some("granted") => HostPermission::Granted,
                        Some("denied") => HostPermission::Denied,
                        _ => HostPermission::Default,
                    },
                    Err(_) => HostPermission::Default,
                }
            }

            #[cfg(not(target_arch = "wasm32"))]
            {
                HostPermission::Default
            }
        })
    }

    fn show(
        &self,
        title: &str,
        body: &str,
        tag: &str,
        events: NotificationEvents,
    ) -> Result<Rc<dyn NotificationHandle>, String> {
        #[cfg(target_arch = "wasm32")]
        {
            let options = web_sys::NotificationOptions::new();
            options.set_body(body);
            options.set_tag(tag);
            let notification = web_sys::Notification::new_with_options(title, &options)
                .map_err(|error| format!("notification construction failed: {error:?}"))?;

            let NotificationEvents {
                on_click,
                on_show,
                on_close,
            } = events;
            let on_click = Closure::<dyn FnMut()>::wrap(Box::new(move || on_click()));
            let on_show = Closure::<dyn FnMut()>::wrap(Box::new(move || on_show()));
            let on_close = Closure::<dyn FnMut()>::wrap(Box::new(move || on_close()));
            notification.set_onclick(Some(on_click.as_ref().unchecked_ref()));
            notification.set_onshow(Some(on_show.as_ref().unchecked_ref()));
            notification.set_onclose(Some(on_close.as_ref().unchecked_ref()));

            Ok(Rc::new(WebNotificationHandle {
                tag: tag.to_string(),
                notification,
                _on_click: on_click,
                _on_show: on_show,
                _on_close: on_close,
            }))
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = (title, body, tag, events);
            Err("notifications require a browser host".to_string())
        }
    }
}
