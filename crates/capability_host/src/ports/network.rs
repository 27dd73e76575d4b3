//! Network-state port.

use std::{cell::RefCell, rc::Rc};

/// Host service for connectivity state and transitions.
pub trait NetworkHost {
    /// Returns the host online flag, or `None` when the host exposes no
    /// network information at all.
    fn online(&self) -> Option<bool>;

    /// Returns the raw host connection token (`"wifi"`, `"4g"`, ...), when
    /// the host reports one.
    fn connection_kind(&self) -> Option<String>;

    /// Installs a connectivity watcher invoked with the new online flag.
    ///
    /// The subscription lives for the rest of the process; there is no
    /// teardown.
    fn watch(&self, on_change: Box<dyn Fn(bool)>);
}

struct MemoryNetworkState {
    navigator_present: bool,
    online: bool,
    connection_kind: Option<String>,
    watchers: Vec<Rc<dyn Fn(bool)>>,
}

impl Default for MemoryNetworkState {
    fn default() -> Self {
        Self {
            navigator_present: true,
            online: true,
            connection_kind: None,
            watchers: Vec::new(),
        }
    }
}

#[derive(Clone, Default)]
/// In-memory network host; tests toggle connectivity manually.
pub struct MemoryNetworkHost {
    inner: Rc<RefCell<MemoryNetworkState>>,
}

impl MemoryNetworkHost {
    /// Simulates a host with no network information surface.
    pub fn set_navigator_present(&self, present: bool) {
        self.inner.borrow_mut().navigator_present = present;
    }

    /// Overrides the raw connection token.
    pub fn set_connection_kind(&self, kind: Option<&str>) {
        self.inner.borrow_mut().connection_kind = kind.map(str::to_string);
    }

    /// Flips the online flag and notifies every watcher.
    pub fn set_online(&self, online: bool) {
        let watchers: Vec<Rc<dyn Fn(bool)>> = {
            let mut state = self.inner.borrow_mut();
            state.online = online;
            state.watchers.clone()
        };
        for watcher in watchers {
            watcher(online);
        }
    }
}

impl NetworkHost for MemoryNetworkHost {
    fn online(&self) -> Option<bool> {
        let state = self.inner.borrow();
        state.navigator_present.then_some(state.online)
    }

    fn connection_kind(&self) -> Option<String> {
        self.inner.borrow().connection_kind.clone()
    }

    fn watch(&self, on_change: Box<dyn Fn(bool)>) {
        self.inner.borrow_mut().watchers.push(Rc::from(on_change));
    }
}
