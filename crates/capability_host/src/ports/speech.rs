//! Speech-synthesis port.

use std::{cell::RefCell, rc::Rc};

/// Host service for spoken text output.
pub trait SpeechHost {
    /// Reports whether the host exposes a speech-synthesis API.
    fn supported(&self) -> bool;

    /// Speaks `text` through the host synthesizer.
    ///
    /// # Errors
    ///
    /// Returns an error when the host rejects the utterance.
    fn speak(&self, text: &str) -> Result<(), String>;
}

#[derive(Clone)]
/// In-memory speech host recording every utterance.
pub struct MemorySpeechHost {
    supported: Rc<RefCell<bool>>,
    spoken: Rc<RefCell<Vec<String>>>,
}

impl Default for MemorySpeechHost {
    fn default() -> Self {
        Self {
            supported: Rc::new(RefCell::new(true)),
            spoken: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl MemorySpeechHost {
    /// Overrides the support probe.
    pub fn set_supported(&self, supported: bool) {
        *self.supported.borrow_mut() = supported;
    }

    /// Returns every utterance spoken so far.
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.borrow().clone()
    }
}

impl SpeechHost for MemorySpeechHost {
    fn supported(&self) -> bool {
        *self.supported.borrow()
    }

    fn speak(&self, text: &str) -> Result<(), String> {
        self.spoken.borrow_mut().push(text.to_string());
        Ok(())
    }
}
