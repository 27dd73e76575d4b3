//! Browser (`wasm32`) port adapters for the `capability_host` contracts.
//!
//! This crate is the concrete browser-side wiring layer: `localStorage`
//! key-value storage, Notification API delivery and permissions, one-shot
//! timers, `navigator` connectivity with window `online`/`offline`
//! bridging, speech synthesis, and the registration functions binding each
//! capability name to its web factory. On non-`wasm32` targets every
//! adapter compiles to an inert fallback so the crate stays buildable and
//! testable everywhere.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod network;
pub mod notifications;
pub mod registration;
pub mod speech;
pub mod storage;
pub mod timer;

pub use network::WebNetworkHost;
pub use notifications::WebNotificationHost;
pub use registration::{
    register_local_notifications, register_network, register_preferences,
    register_screen_reader, register_web_capabilities, WebCapabilityHandles,
};
pub use speech::WebSpeechHost;
pub use storage::WebKeyValueHost;
pub use timer::WebTimerHost;
