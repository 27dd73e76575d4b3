//! `localStorage`-backed key-value host.

use capability_host::ports::KeyValueHost;

#[derive(Debug, Clone, Copy, Default)]
/// Browser key-value host backed by `window.localStorage`.
pub struct WebKeyValueHost;

impl KeyValueHost for WebKeyValueHost {
    fn get_item(&self, key: &str) -> Option<String> {
        #[cfg(target_arch = "wasm32")]
        {
            let storage = web_sys::window()?.local_storage().ok().flatten()?;
            storage.get_item(key).ok().flatten()
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = key;
            None
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), String> {
        #[cfg(target_arch = "wasm32")]
        {
            let storage = web_sys::window()
                .and_then(|w| w.local_storage().ok().flatten())
                .ok_or_else(|| "localStorage unavailable".to_string())?;
            storage
                .set_item(key, value)
                .map_err(|e| format!("localStorage set_item failed: {e:?}"))
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = (key, value);
            Ok(())
        }
    }

    fn remove_item(&self, key: &str) -> Result<(), String> {
        #[cfg(target_arch = "wasm32")]
        {
            let storage = web_sys::window()
                .and_then(|w| w.local_storage().ok().flatten())
                .ok_or_else(|| "localStorage unavailable".to_string())?;
            storage
                .remove_item(key)
                .map_err(|e| format!("localStorage remove_item failed: {e:?}"))
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = key;
            Ok(())
        }
    }

    fn keys(&self) -> Vec<String> {
        #[cfg(target_arch = "wasm32")]
        {
            let Some(storage) = web_sys::window().and_then(|w| w.local_storage().ok().flatten())
            else {
                return Vec::new();
            };
            let len = storage.length().unwrap_or(0);
            (0..len)
                .filter_map(|index| storage.key(index).ok().flatten())
                .collect()
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            Vec::new()
        }
    }
}
