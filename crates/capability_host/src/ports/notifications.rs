//! Platform notification port.

use std::{
    cell::{Cell, RefCell},
    future::Future,
    pin::Pin,
    rc::Rc,
};

/// Object-safe boxed future used by [`NotificationHost`].
pub type NotificationHostFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Host-level notification permission, before mapping to the capability
/// tri-state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPermission {
    /// The user granted notification display.
    Granted,
    /// The user denied notification display.
    Denied,
    /// The user has not been asked yet.
    Default,
}

/// Platform event wiring installed when a notification is shown.
pub struct NotificationEvents {
    /// Invoked when the user activates the on-screen notification.
    pub on_click: Box<dyn Fn()>,
    /// Invoked when the notification reaches the screen.
    pub on_show: Box<dyn Fn()>,
    /// Invoked when the on-screen notification is dismissed.
    pub on_close: Box<dyn Fn()>,
}

/// Handle to one on-screen notification.
pub trait NotificationHandle {
    /// Returns the tag the notification was shown under.
    fn tag(&self) -> &str;

    /// Closes the on-screen notification.
    fn close(&self);
}

/// Host service for user-visible notifications and their permission state.
pub trait NotificationHost {
    /// Reports whether the host exposes a usable notification API.
    fn supported(&self) -> bool;

    /// Reads the current host permission without prompting.
    fn permission(&self) -> HostPermission;

    /// Prompts the user for notification permission.
    fn request_permission(&self) -> NotificationHostFuture<'_, HostPermission>;

    /// Shows a notification keyed by `tag` and installs its event wiring.
    ///
    /// # Errors
    ///
    /// Returns an error when the host rejects the notification.
    fn show(
        &self,
        title: &str,
        body: &str,
        tag: &str,
        events: NotificationEvents,
    ) -> Result<Rc<dyn NotificationHandle>, String>;
}

/// One notification recorded by [`MemoryNotificationHost`].
pub struct MemoryNotification {
    title: String,
    body: String,
    tag: String,
    events: NotificationEvents,
    closed: Cell<bool>,
}

impl MemoryNotification {
    /// Returns the recorded title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the recorded body.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Returns whether the notification was closed.
    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }
}

impl NotificationHandle for MemoryNotification {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn close(&self) {
        if !self.closed.replace(true) {
            (self.events.on_close)();
        }
    }
}

struct MemoryNotificationState {
    supported: bool,
    permission: HostPermission,
    request_response: HostPermission,
    shown: Vec<Rc<MemoryNotification>>,
}

impl Default for MemoryNotificationState {
    fn default() -> Self {
        Self {
            supported: true,
            permission: HostPermission::Default,
            request_response: HostPermission::Granted,
            shown: Vec::new(),
        }
    }
}

#[derive(Clone, Default)]
/// In-memory notification host; tests drive its platform events manually.
pub struct MemoryNotificationHost {
    inner: Rc<RefCell<MemoryNotificationState>>,
}

impl MemoryNotificationHost {
    /// Overrides the support probe.
    pub fn set_supported(&self, supported: bool) {
        self.inner.borrow_mut().supported = supported;
    }

    /// Overrides the current permission state.
    pub fn set_permission(&self, permission: HostPermission) {
        self.inner.borrow_mut().permission = permission;
    }

    /// Sets the answer the next permission prompt resolves to.
    pub fn set_request_response(&self, response: HostPermission) {
        self.inner.borrow_mut().request_response = response;
    }

    /// Returns how many notifications were shown so far.
    pub fn shown_count(&self) -> usize {
        self.inner.borrow().shown.len()
    }

    /// Returns the tags of every shown notification, in display order.
    pub fn shown_tags(&self) -> Vec<String> {
        self.inner
            .borrow()
            .shown
            .iter()
            .map(|n| n.tag.clone())
            .collect()
    }

    /// Returns the shown notification with `tag`, if any.
    pub fn shown(&self, tag: &str) -> Option<Rc<MemoryNotification>> {
        self.inner
            .borrow()
            .shown
            .iter()
            .rev()
            .find(|n| n.tag == tag)
            .cloned()
    }

    /// Simulates the user activating the on-screen notification.
    pub fn emit_click(&self, tag: &str) {
        if let Some(notification) = self.shown(tag) {
            (notification.events.on_click)();
        }
    }

    /// Simulates the platform reporting the notification on screen.
    pub fn emit_show(&self, tag: &str) {
        if let Some(notification) = self.shown(tag) {
            (notification.events.on_show)();
        }
    }

    /// Simulates the user dismissing the on-screen notification.
    pub fn emit_close(&self, tag: &str) {
        if let Some(notification) = self.shown(tag) {
            notification.close();
        }
    }
}

impl NotificationHost for MemoryNotificationHost {
    fn supported(&self) -> bool {
        self.inner.borrow().supported
    }

    fn permission(&self) -> HostPermission {
        self.inner.borrow().permission
    }

    fn request_permission(&self) -> NotificationHostFuture<'_, HostPermission> {
        Box::pin(async move {
            let mut state = self.inner.borrow_mut();
            state.permission = state.request_response;
            state.permission
        })
    }

    fn show(
        &self,
        title: &str,
        body: &str,
        tag: &str,
        events: NotificationEvents,
    ) -> Result<Rc<dyn NotificationHandle>, String> {
        let notification = Rc::new(MemoryNotification {
            title: title.to_string(),
            body: body.to_string(),
            tag: tag.to_string(),
            events,
            closed: Cell::new(false),
        });
        self.inner.borrow_mut().shown.push(notification.clone());
        Ok(notification)
    }
}
