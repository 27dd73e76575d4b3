//! Local-notification fallback: scheduling, delivery, and permissions.

use std::{cell::RefCell, rc::Rc};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::CapabilityError,
    listeners::{ListenerHandle, ListenerHub},
    ports::{Clock, HostPermission, NotificationEvents, NotificationHandle, NotificationHost, TimerHost},
};

/// Registry name of the local-notifications capability.
pub const CAPABILITY_NAME: &str = "LocalNotifications";

/// Event emitted when a delivered notification reaches the screen.
pub const RECEIVED_EVENT: &str = "localNotificationReceived";

/// Event emitted when the user activates a delivered notification.
pub const ACTION_PERFORMED_EVENT: &str = "localNotificationActionPerformed";

/// One notification request, optionally deferred to a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalNotification {
    /// Caller-supplied identifier, unique among pending notifications.
    pub id: i32,
    /// Notification title.
    pub title: String,
    /// Notification body.
    pub body: String,
    /// Delivery time in unix milliseconds; absent means deliver now.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_at: Option<u64>,
}

/// Projection of a delivered notification, without the platform handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveredNotification {
    /// Identifier the notification was scheduled under.
    pub id: i32,
    /// Notification title.
    pub title: String,
    /// Notification body.
    pub body: String,
}

/// Capability-level permission tri-state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    /// The user granted notification display.
    Granted,
    /// The user denied notification display.
    Denied,
    /// The user has not decided yet and may be prompted.
    Prompt,
}

impl PermissionState {
    /// Returns the wire token for this state.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Granted => "granted",
            Self::Denied => "denied",
            Self::Prompt => "prompt",
        }
    }
}

impl From<HostPermission> for PermissionState {
    fn from(permission: HostPermission) -> Self {
        match permission {
            HostPermission::Granted => Self::Granted,
            HostPermission::Denied => Self::Denied,
            HostPermission::Default => Self::Prompt,
        }
    }
}

/// Permission snapshot for notification display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionStatus {
    /// Display permission state.
    pub display: PermissionState,
}

struct DeliveredRecord {
    summary: DeliveredNotification,
    handle: Rc<dyn NotificationHandle>,
}

/// Browser-side local-notifications implementation.
///
/// Pending notifications wait on one-shot host timers; a firing timer
/// rescans the whole pending list so timers that land together are
/// coalesced into one delivery pass. Delivered notifications keep their
/// platform handle so they can be closed later, and only notifications
/// that actually reached the platform display enter the delivered list.
#[derive(Clone)]
pub struct LocalNotificationsFallback {
    hub: ListenerHub,
    host: Rc<dyn NotificationHost>,
    timers: Rc<dyn TimerHost>,
    clock: Rc<dyn Clock>,
    pending: Rc<RefCell<Vec<LocalNotification>>>,
    delivered: Rc<RefCell<Vec<DeliveredRecord>>>,
}

impl LocalNotificationsFallback {
    /// Creates the fallback over the injected host ports.
    pub fn new(
        host: Rc<dyn NotificationHost>,
        timers: Rc<dyn TimerHost>,
        clock: Rc<dyn Clock>,
    ) -> Self {
        Self {
            hub: ListenerHub::new(),
            host,
            timers,
            clock,
            pending: Rc::new(RefCell::new(Vec::new())),
            delivered: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Schedules a batch of notifications and returns the accepted ids.
    ///
    /// Each request is processed independently: a future `schedule_at`
    /// parks the request in the pending list, an absent or elapsed time
    /// delivers immediately. Scheduling an id that is already pending
    /// replaces the pending entry.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityError::Unavailable`] when the host has no
    /// usable notification API.
    pub async fn schedule(
        &self,
        requests: Vec<LocalNotification>,
    ) -> Result<Vec<i32>, CapabilityError> {
        if !self.host.supported() {
            return Err(CapabilityError::unavailable(
                "notifications are not supported on this host",
            ));
        }
        let ids = requests.iter().map(|request| request.id).collect();
        for request in requests {
            self.dispatch(request);
        }
        Ok(ids)
    }

    fn dispatch(&self, request: LocalNotification) {
        let now = self.clock.now_ms();
        match request.schedule_at {
            Some(at) if at > now => {
                let delay = at - now;
                {
                    let mut pending = self.pending.borrow_mut();
                    pending.retain(|existing| existing.id != request.id);
                    pending.push(request);
                }
                let scheduler = self.clone();
                self.timers
                    .set_timeout(delay, Box::new(move || scheduler.deliver_due()));
            }
            _ => self.deliver(request),
        }
    }

    fn deliver_due(&self) {
        let now = self.clock.now_ms();
        let due: Vec<LocalNotification> = {
            let mut pending = self.pending.borrow_mut();
            let (due, waiting) = pending
                .drain(..)
                .partition(|request| request.schedule_at.is_some_and(|at| at <= now));
            *pending = waiting;
            due
        };
        for request in due {
            self.deliver(request);
        }
    }

    fn deliver(&self, request: LocalNotification) {
        let tag = request.id.to_string();
        let payload = serde_json::to_value(&request).unwrap_or(Value::Null);
        let events = NotificationEvents {
            on_click: {
                let hub = self.hub.clone();
                let payload = json!({ "actionId": "tap", "notification": payload.clone() });
                Box::new(move || hub.notify_listeners(ACTION_PERFORMED_EVENT, &payload))
            },
            on_show: {
                let hub = self.hub.clone();
                let payload = payload.clone();
                Box::new(move || hub.notify_listeners(RECEIVED_EVENT, &payload))
            },
            on_close: {
                let delivered = self.delivered.clone();
                let id = request.id;
                Box::new(move || {
                    delivered
                        .borrow_mut()
                        .retain(|record| record.summary.id != id)
                })
            },
        };
        match self.host.show(&request.title, &request.body, &tag, events) {
            Ok(handle) => self.delivered.borrow_mut().push(DeliveredRecord {
                summary: DeliveredNotification {
                    id: request.id,
                    title: request.title,
                    body: request.body,
                },
                handle,
            }),
            Err(error) => {
                tracing::warn!(id = request.id, %error, "notification dispatch failed");
            }
        }
    }

    /// Returns a snapshot of the notifications still waiting for delivery.
    pub async fn get_pending(&self) -> Vec<LocalNotification> {
        self.pending.borrow().clone()
    }

    /// Returns a snapshot of the delivered notifications.
    pub async fn get_delivered(&self) -> Vec<DeliveredNotification> {
        self.delivered
            .borrow()
            .iter()
            .map(|record| record.summary.clone())
            .collect()
    }

    /// Removes matching entries from the pending list.
    ///
    /// Already-delivered notifications are unaffected; canceling an id
    /// whose timer has already fired has no effect.
    pub async fn cancel(&self, ids: &[i32]) {
        self.pending
            .borrow_mut()
            .retain(|request| !ids.contains(&request.id));
    }

    /// Closes and evicts matching delivered notifications.
    pub async fn remove_delivered(&self, ids: &[i32]) {
        for &id in ids {
            let record = {
                let mut delivered = self.delivered.borrow_mut();
                delivered
                    .iter()
                    .position(|record| record.summary.id == id)
                    .map(|index| delivered.remove(index))
            };
            if let Some(record) = record {
                record.handle.close();
            }
        }
    }

    /// Closes and evicts every delivered notification.
    pub async fn remove_all_delivered(&self) {
        let records: Vec<DeliveredRecord> = self.delivered.borrow_mut().drain(..).collect();
        for record in records {
            record.handle.close();
        }
    }

    /// Reads the display permission without prompting.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityError::Unavailable`] when the host has no
    /// usable notification API.
    pub async fn check_permissions(&self) -> Result<PermissionStatus, CapabilityError> {
        self.ensure_supported()?;
        Ok(PermissionStatus {
            display: self.host.permission().into(),
        })
    }

    /// Prompts the user for display permission.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityError::Unavailable`] when the host has no
    /// usable notification API.
    pub async fn request_permissions(&self) -> Result<PermissionStatus, CapabilityError> {
        self.ensure_supported()?;
        let permission = self.host.request_permission().await;
        Ok(PermissionStatus {
            display: permission.into(),
        })
    }

    /// Reports whether notifications are enabled, i.e. permission is
    /// granted.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityError::Unavailable`] when the host has no
    /// usable notification API.
    pub async fn are_enabled(&self) -> Result<bool, CapabilityError> {
        let status = self.check_permissions().await?;
        Ok(status.display == PermissionState::Granted)
    }

    /// Notification channels are a native-runtime concept.
    ///
    /// # Errors
    ///
    /// Always returns [`CapabilityError::Unimplemented`].
    pub async fn create_channel(&self) -> Result<(), CapabilityError> {
        Err(CapabilityError::unimplemented(
            "notification channels are not supported on this host",
        ))
    }

    /// Notification channels are a native-runtime concept.
    ///
    /// # Errors
    ///
    /// Always returns [`CapabilityError::Unimplemented`].
    pub async fn delete_channel(&self) -> Result<(), CapabilityError> {
        Err(CapabilityError::unimplemented(
            "notification channels are not supported on this host",
        ))
    }

    /// Notification channels are a native-runtime concept.
    ///
    /// # Errors
    ///
    /// Always returns [`CapabilityError::Unimplemented`].
    pub async fn list_channels(&self) -> Result<(), CapabilityError> {
        Err(CapabilityError::unimplemented(
            "notification channels are not supported on this host",
        ))
    }

    /// Action types are registered by native runtimes only.
    ///
    /// # Errors
    ///
    /// Always returns [`CapabilityError::Unimplemented`].
    pub async fn register_action_types(&self) -> Result<(), CapabilityError> {
        Err(CapabilityError::unimplemented(
            "notification action types are not supported on this host",
        ))
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

    fn ensure_supported(&self) -> Result<(), CapabilityError> {
        if self.host.supported() {
            Ok(())
        } else {
            Err(CapabilityError::unavailable(
                "notifications are not supported on this host",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use pretty_assertions::assert_eq;

    use crate::ports::{ManualClock, ManualTimerHost, MemoryNotificationHost};

    use super::*;

    struct Fixture {
        host: MemoryNotificationHost,
        timers: ManualTimerHost,
        clock: ManualClock,
        notifications: LocalNotificationsFallback,
    }

    fn fixture() -> Fixture {
        let host = MemoryNotificationHost::default();
        let timers = ManualTimerHost::default();
        let clock = ManualClock::starting_at(1_000);
        let notifications = LocalNotificationsFallback::new(
            Rc::new(host.clone()),
            Rc::new(timers.clone()),
            Rc::new(clock.clone()),
        );
        Fixture {
            host,
            timers,
            clock,
            notifications,
        }
    }

    fn request(id: i32, schedule_at: Option<u64>) -> LocalNotification {
        LocalNotification {
            id,
            title: "T".to_string(),
            body: "B".to_string(),
            schedule_at,
        }
    }

    #[test]
    fn unscheduled_requests_deliver_immediately() {
        let fixture = fixture();
        let ids = block_on(fixture.notifications.schedule(vec![request(1, None)])).expect("schedule");
        assert_eq!(ids, vec![1]);

        assert!(block_on(fixture.notifications.get_pending()).is_empty());
        assert_eq!(
            block_on(fixture.notifications.get_delivered()),
            vec![DeliveredNotification {
                id: 1,
                title: "T".to_string(),
                body: "B".to_string(),
            }]
        );
        assert_eq!(fixture.host.shown_tags(), vec!["1"]);
    }

    #[test]
    fn elapsed_schedule_times_deliver_immediately() {
        let fixture = fixture();
        block_on(fixture.notifications.schedule(vec![request(1, Some(500))])).expect("schedule");

        assert!(block_on(fixture.notifications.get_pending()).is_empty());
        assert_eq!(block_on(fixture.notifications.get_delivered()).len(), 1);
        assert_eq!(fixture.timers.armed(), 0);
    }

    #[test]
    fn future_requests_wait_for_their_timer() {
        let fixture = fixture();
        block_on(fixture.notifications.schedule(vec![request(1, Some(1_400))])).expect("schedule");

        assert_eq!(block_on(fixture.notifications.get_pending()), vec![request(1, Some(1_400))]);
        assert!(block_on(fixture.notifications.get_delivered()).is_empty());
        assert_eq!(fixture.timers.armed_delays(), vec![400]);

        fixture.clock.advance(400);
        fixture.timers.fire_all();

        assert!(block_on(fixture.notifications.get_pending()).is_empty());
        assert_eq!(block_on(fixture.notifications.get_delivered()).len(), 1);
    }

    #[test]
    fn a_timer_that_fires_early_leaves_the_request_pending() {
        let fixture = fixture();
        block_on(fixture.notifications.schedule(vec![request(1, Some(1_400))])).expect("schedule");

        fixture.timers.fire_all();
        assert_eq!(block_on(fixture.notifications.get_pending()).len(), 1);
        assert!(block_on(fixture.notifications.get_delivered()).is_empty());
    }

    #[test]
    fn one_firing_timer_delivers_every_elapsed_request() {
        let fixture = fixture();
        block_on(fixture.notifications.schedule(vec![
            request(1, Some(1_100)),
            request(2, Some(1_200)),
        ]))
        .expect("schedule");
        assert_eq!(fixture.timers.armed(), 2);

        fixture.clock.advance(300);
        assert!(fixture.timers.fire_next());

        assert!(block_on(fixture.notifications.get_pending()).is_empty());
        assert_eq!(
            block_on(fixture.notifications.get_delivered())
                .iter()
                .map(|n| n.id)
                .collect::<Vec<_>>(),
            vec![1, 2]
        );
    }

    #[test]
    fn canceling_a_pending_request_prevents_delivery() {
        let fixture = fixture();
        block_on(fixture.notifications.schedule(vec![request(7, Some(2_000))])).expect("schedule");

        block_on(fixture.notifications.cancel(&[7]));
        fixture.clock.advance(2_000);
        fixture.timers.fire_all();

        assert!(block_on(fixture.notifications.get_pending()).is_empty());
        assert!(block_on(fixture.notifications.get_delivered()).is_empty());
        assert_eq!(fixture.host.shown_count(), 0);
    }

    #[test]
    fn rescheduling_a_pending_id_replaces_the_entry() {
        let fixture = fixture();
        block_on(fixture.notifications.schedule(vec![request(1, Some(2_000))])).expect("schedule");
        block_on(fixture.notifications.schedule(vec![request(1, Some(3_000))])).expect("schedule");

        assert_eq!(
            block_on(fixture.notifications.get_pending()),
            vec![request(1, Some(3_000))]
        );
    }

    #[test]
    fn schedule_fails_without_host_support() {
        let fixture = fixture();
        fixture.host.set_supported(false);

        let error = block_on(fixture.notifications.schedule(vec![request(1, None)]))
            .expect_err("expected unavailable");
        assert!(matches!(error, CapabilityError::Unavailable { .. }));
    }

    #[test]
    fn click_and_show_re_emit_capability_events() {
        let fixture = fixture();
        let events = Rc::new(RefCell::new(Vec::new()));
        let _action = fixture.notifications.add_listener(ACTION_PERFORMED_EVENT, {
            let events = events.clone();
            move |data| {
                events.borrow_mut().push(format!("action:{data}"));
                Ok(())
            }
        });
        let _received = fixture.notifications.add_listener(RECEIVED_EVENT, {
            let events = events.clone();
            move |data| {
                events.borrow_mut().push(format!("received:{data}"));
                Ok(())
            }
        });

        block_on(fixture.notifications.schedule(vec![request(1, None)])).expect("schedule");
        fixture.host.emit_show("1");
        fixture.host.emit_click("1");

        let events = events.borrow();
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0],
            r#"received:{"body":"B","id":1,"title":"T"}"#
        );
        assert_eq!(
            events[1],
            r#"action:{"actionId":"tap","notification":{"body":"B","id":1,"title":"T"}}"#
        );
    }

    #[test]
    fn a_platform_close_evicts_only_that_delivered_id() {
        let fixture = fixture();
        block_on(fixture.notifications.schedule(vec![request(1, None), request(2, None)]))
            .expect("schedule");

        fixture.host.emit_close("1");
        assert_eq!(
            block_on(fixture.notifications.get_delivered())
                .iter()
                .map(|n| n.id)
                .collect::<Vec<_>>(),
            vec![2]
        );
    }

    #[test]
    fn remove_delivered_closes_matching_notifications() {
        let fixture = fixture();
        block_on(fixture.notifications.schedule(vec![request(1, None), request(2, None)]))
            .expect("schedule");

        block_on(fixture.notifications.remove_delivered(&[1]));
        assert!(fixture.host.shown("1").expect("shown").is_closed());
        assert!(!fixture.host.shown("2").expect("shown").is_closed());
        assert_eq!(block_on(fixture.notifications.get_delivered()).len(), 1);

        block_on(fixture.notifications.remove_all_delivered());
        assert!(fixture.host.shown("2").expect("shown").is_closed());
        assert!(block_on(fixture.notifications.get_delivered()).is_empty());
    }

    #[test]
    fn permissions_map_the_host_tri_state() {
        let fixture = fixture();
        assert_eq!(
            block_on(fixture.notifications.check_permissions()).expect("check"),
            PermissionStatus {
                display: PermissionState::Prompt
            }
        );
        assert_eq!(block_on(fixture.notifications.are_enabled()).expect("enabled"), false);

        fixture.host.set_request_response(HostPermission::Granted);
        assert_eq!(
            block_on(fixture.notifications.request_permissions()).expect("request"),
            PermissionStatus {
                display: PermissionState::Granted
            }
        );
        assert_eq!(block_on(fixture.notifications.are_enabled()).expect("enabled"), true);

        fixture.host.set_permission(HostPermission::Denied);
        assert_eq!(
            block_on(fixture.notifications.check_permissions()).expect("check"),
            PermissionStatus {
                display: PermissionState::Denied
            }
        );
    }

    #[test]
    fn channel_management_is_unimplemented_here() {
        let fixture = fixture();
        for error in [
            block_on(fixture.notifications.create_channel()).expect_err("create"),
            block_on(fixture.notifications.delete_channel()).expect_err("delete"),
            block_on(fixture.notifications.list_channels()).expect_err("list"),
            block_on(fixture.notifications.register_action_types()).expect_err("actions"),
        ] {
            assert!(matches!(error, CapabilityError::Unimplemented { .. }));
        }
    }
}
