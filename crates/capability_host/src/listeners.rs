//! Event subscribe/dispatch hub embedded in every fallback implementation.

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use serde_json::Value;

/// Callback signature for event subscribers.
///
/// A callback error is reported and isolated; it never interrupts dispatch
/// to the remaining subscribers.
pub type ListenerCallback = dyn Fn(&Value) -> Result<(), String>;

/// Identity token assigned to one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerToken(u64);

struct Subscriber {
    token: ListenerToken,
    callback: Rc<ListenerCallback>,
}

#[derive(Default)]
struct HubState {
    next_token: u64,
    subscribers: HashMap<String, Vec<Subscriber>>,
}

/// Per-capability mapping from event name to an ordered subscriber list.
///
/// Event names are implementation-defined strings; subscribing to an event
/// the implementation never emits is accepted. Within one event name,
/// dispatch order equals subscription order.
#[derive(Clone, Default)]
pub struct ListenerHub {
    inner: Rc<RefCell<HubState>>,
}

impl ListenerHub {
    /// Creates an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` for `event` and returns a removal handle.
    pub fn add_listener<F>(&self, event: &str, callback: F) -> ListenerHandle
    where
        F: Fn(&Value) -> Result<(), String> + 'static,
    {
        let mut state = self.inner.borrow_mut();
        state.next_token += 1;
        let token = ListenerToken(state.next_token);
        state
            .subscribers
            .entry(event.to_string())
            .or_default()
            .push(Subscriber {
                token,
                callback: Rc::new(callback),
            });
        ListenerHandle {
            hub: self.clone(),
            event: event.to_string(),
            token,
        }
    }

    /// Removes the subscription identified by `token` from `event`.
    pub fn remove_listener(&self, event: &str, token: ListenerToken) {
        let mut state = self.inner.borrow_mut();
        if let Some(subscribers) = state.subscribers.get_mut(event) {
            subscribers.retain(|subscriber| subscriber.token != token);
        }
    }

    /// Removes every subscriber for `event`, or for all events when `event`
    /// is `None`.
    pub fn remove_all_listeners(&self, event: Option<&str>) {
        let mut state = self.inner.borrow_mut();
        match event {
            Some(event) => {
                state.subscribers.remove(event);
            }
            None => state.subscribers.clear(),
        }
    }

    /// Invokes every currently-registered callback for `event` in
    /// subscription order.
    ///
    /// The subscriber list is snapshotted before dispatch, so a callback
    /// that mutates subscriptions cannot corrupt the traversal. A callback
    /// error is logged and the remaining callbacks still run.
    pub fn notify_listeners(&self, event: &str, data: &Value) {
        let snapshot: Vec<(ListenerToken, Rc<ListenerCallback>)> = {
            let state = self.inner.borrow();
            match state.subscribers.get(event) {
                Some(subscribers) => subscribers
                    .iter()
                    .map(|subscriber| (subscriber.token, subscriber.callback.clone()))
                    .collect(),
                None => return,
            }
        };
        for (token, callback) in snapshot {
            if let Err(error) = callback(data) {
                tracing::warn!(event, token = token.0, %error, "listener callback failed");
            }
        }
    }

    /// Returns the number of subscribers currently registered for `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        self.inner
            .borrow()
            .subscribers
            .get(event)
            .map_or(0, Vec::len)
    }
}

/// Handle returned by [`ListenerHub::add_listener`], usable for removal.
pub struct ListenerHandle {
    hub: ListenerHub,
    event: String,
    token: ListenerToken,
}

impl ListenerHandle {
    /// Returns the identity token of this subscription.
    pub fn token(&self) -> ListenerToken {
        self.token
    }

    /// Removes this subscription from its hub.
    pub fn remove(self) {
        self.hub.remove_listener(&self.event, self.token);
    }
}
