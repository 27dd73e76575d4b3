//! Screen-reader fallback backed by host speech synthesis.

use std::rc::Rc;

use serde_json::Value;

use crate::{
    error::CapabilityError,
    listeners::{ListenerHandle, ListenerHub},
    ports::SpeechHost,
};

/// Registry name of the screen-reader capability.
pub const CAPABILITY_NAME: &str = "ScreenReader";

/// Browser-side screen-reader implementation.
#[derive(Clone)]
pub struct ScreenReaderFallback {
    hub: ListenerHub,
    host: Rc<dyn SpeechHost>,
}

impl ScreenReaderFallback {
    /// Creates the fallback over the injected speech port.
    pub fn new(host: Rc<dyn SpeechHost>) -> Self {
        Self {
            hub: ListenerHub::new(),
            host,
        }
    }

    /// Screen-reader detection only exists on native runtimes.
    ///
    /// # Errors
    ///
    /// Always returns [`CapabilityError::Unavailable`].
    pub async fn is_enabled(&self) -> Result<bool, CapabilityError> {
        Err(CapabilityError::unavailable(
            "screen-reader detection is not available on this host",
        ))
    }

    /// Speaks `text` through the host synthesizer.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityError::Unavailable`] when the host has no
    /// speech-synthesis API or rejects the utterance.
    pub async fn speak(&self, text: &str) -> Result<(), CapabilityError> {
        if !self.host.supported() {
            return Err(CapabilityError::unavailable(
                "speech synthesis is not available on this host",
            ));
        }
        self.host.speak(text).map_err(CapabilityError::unavailable)
    }

    /// Registers `callback` for a capability event.
    pub fn add_listener<F>(&self, event: &str, callback: F) -> ListenerHandle
    where
        F: Fn(&Value) -> Result<(), String> + 'static,
    {
        self.hub.add_listener(event, callback)
    }

    /// Removes every subscriber for `event`, or all subscribers when
    /// `event` is `None`.
    pub fn remove_all_listeners(&self, event: Option<&str>) {
        self.hub.remove_all_listeners(event);
    }
}
