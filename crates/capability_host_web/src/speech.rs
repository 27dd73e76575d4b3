//! Speech-synthesis host adapter.

use capability_host::ports::SpeechHost;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsValue;

#[derive(Debug, Clone, Copy, Default)]
/// Browser speech host backed by `window.speechSynthesis`.
pub struct WebSpeechHost;

impl SpeechHost for WebSpeechHost {
    fn supported(&self) -> bool {
        #[cfg(target_arch = "wasm32")]
        {
            web_sys::window()
                .map(|window| {
                    js_sys::Reflect::has(window.as_ref(), &JsValue::from_str("speechSynthesis"))
                        .unwrap_or(false)
                })
                .unwrap_or(false)
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            false
        }
    }

    fn speak(&self, text: &str) -> Result<(), String> {
        #[cfg(target_arch = "wasm32")]
        {
            let window = web_sys::window().ok_or_else(|| "no browser window".to_string())?;
            let synthesis = window
                .speech_synthesis()
                .map_err(|error| format!("speech synthesis unavailable: {error:?}"))?;
            let utterance = web_sys::SpeechSynthesisUtterance::new_with_text(text)
                .map_err(|error| format!("utterance construction failed: {error:?}"))?;
            synthesis.speak(&utterance);
            Ok(())
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = text;
            Err("speech synthesis requires a browser host".to_string())
        }
    }
}
