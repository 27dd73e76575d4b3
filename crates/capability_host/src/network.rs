//! Network-status fallback with host online/offline bridging.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::CapabilityError,
    listeners::{ListenerHandle, ListenerHub},
    ports::NetworkHost,
};

/// Registry name of the network capability.
pub const CAPABILITY_NAME: &str = "Network";

/// Event emitted on every connectivity transition.
pub const STATUS_CHANGE_EVENT: &str = "networkStatusChange";

/// Coarse connection classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    /// Wired or wireless LAN-class connectivity.
    Wifi,
    /// Mobile-network-class connectivity.
    Cellular,
    /// No connectivity.
    None,
    /// The host reported nothing usable.
    Unknown,
}

impl ConnectionType {
    /// Returns the wire token for this classification.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Wifi => "wifi",
            Self::Cellular => "cellular",
            Self::None => "none",
            Self::Unknown => "unknown",
        }
    }
}

/// Connectivity snapshot reported to callers and listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkStatus {
    /// Whether the host considers itself online.
    pub connected: bool,
    /// Coarse classification of the active connection.
    pub connection_type: ConnectionType,
}

/// Classifies a raw host connection token.
///
/// The token may come from the host's connection `type` or its effective
/// type estimate; both vocabularies collapse into the same four classes.
pub fn classify_connection(kind: Option<&str>) -> ConnectionType {
    match kind {
        Some("bluetooth" | "cellular" | "slow-2g" | "2g" | "3g") => ConnectionType::Cellular,
        Some("ethernet" | "wifi" | "wimax" | "4g") => ConnectionType::Wifi,
        Some("none") => ConnectionType::None,
        _ => ConnectionType::Unknown,
    }
}

/// Browser-side network implementation.
///
/// Construction installs the host connectivity watch once; the
/// subscription lives for the rest of the process and re-emits every
/// transition as [`STATUS_CHANGE_EVENT`].
#[derive(Clone)]
pub struct NetworkFallback {
    hub: ListenerHub,
    host: Rc<dyn NetworkHost>,
}

impl NetworkFallback {
    /// Creates the fallback over the injected host port and installs the
    /// connectivity watch.
    pub fn new(host: Rc<dyn NetworkHost>) -> Self {
        let fallback = Self {
            hub: ListenerHub::new(),
            host,
        };
        let watcher = fallback.clone();
        fallback
            .host
            .watch(Box::new(move |online| watcher.emit_status(online)));
        fallback
    }

    /// Returns the current connectivity snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityError::Unavailable`] when the host exposes no
    /// network information surface at all.
    pub async fn get_status(&self) -> Result<NetworkStatus, CapabilityError> {
        let Some(connected) = self.host.online() else {
            return Err(CapabilityError::unavailable(
                "host does not expose network information",
            ));
        };
        Ok(self.status_for(connected))
    }

    fn status_for(&self, connected: bool) -> NetworkStatus {
        let connection_type = if connected {
            classify_connection(self.host.connection_kind().as_deref())
        } else {
            ConnectionType::None
        };
        NetworkStatus {
            connected,
            connection_type,
        }
    }

    fn emit_status(&self, online: bool) {
        let status = self.status_for(online);
        let payload = serde_json::to_value(status).unwrap_or(Value::Null);
        self.hub.notify_listeners(STATUS_CHANGE_EVENT, &payload);
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

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use futures::executor::block_on;
    use serde_json::json;

    use crate::ports::MemoryNetworkHost;

    use super::*;

    #[test]
    fn get_status_fails_without_a_network_surface() {
        let host = MemoryNetworkHost::default();
        host.set_navigator_present(false);
        let network = NetworkFallback::new(Rc::new(host));

        let error = block_on(network.get_status()).expect_err("expected unavailable");
        assert!(matches!(error, CapabilityError::Unavailable { .. }));
    }

    #[test]
    fn offline_hosts_report_no_connection() {
        let host = MemoryNetworkHost::default();
        host.set_online(false);
        host.set_connection_kind(Some("wifi"));
        let network = NetworkFallback::new(Rc::new(host));

        assert_eq!(
            block_on(network.get_status()).expect("status"),
            NetworkStatus {
                connected: false,
                connection_type: ConnectionType::None,
            }
        );
    }

    #[test]
    fn online_hosts_report_the_classified_connection() {
        let host = MemoryNetworkHost::default();
        host.set_connection_kind(Some("ethernet"));
        let network = NetworkFallback::new(Rc::new(host));

        assert_eq!(
            block_on(network.get_status()).expect("status"),
            NetworkStatus {
                connected: true,
                connection_type: ConnectionType::Wifi,
            }
        );
    }

    #[test]
    fn connection_classification_covers_both_host_vocabularies() {
        assert_eq!(classify_connection(Some("bluetooth")), ConnectionType::Cellular);
        assert_eq!(classify_connection(Some("3g")), ConnectionType::Cellular);
        assert_eq!(classify_connection(Some("4g")), ConnectionType::Wifi);
        assert_eq!(classify_connection(Some("wimax")), ConnectionType::Wifi);
        assert_eq!(classify_connection(Some("none")), ConnectionType::None);
        assert_eq!(classify_connection(Some("other")), ConnectionType::Unknown);
        assert_eq!(classify_connection(Some("quantum")), ConnectionType::Unknown);
        assert_eq!(classify_connection(None), ConnectionType::Unknown);
    }

    #[test]
    fn transitions_re_emit_status_change_events() {
        let host = MemoryNetworkHost::default();
        host.set_connection_kind(Some("cellular"));
        let network = NetworkFallback::new(Rc::new(host.clone()));

        let received = Rc::new(RefCell::new(Vec::new()));
        let _listener = network.add_listener(STATUS_CHANGE_EVENT, {
            let received = received.clone();
            move |data| {
                received.borrow_mut().push(data.clone());
                Ok(())
            }
        });

        host.set_online(false);
        host.set_online(true);

        assert_eq!(
            *received.borrow(),
            vec![
                json!({ "connected": false, "connectionType": "none" }),
                json!({ "connected": true, "connectionType": "cellular" }),
            ]
        );
    }

    #[test]
    fn removed_listeners_miss_later_transitions() {
        let host = MemoryNetworkHost::default();
        let network = NetworkFallback::new(Rc::new(host.clone()));

        let received = Rc::new(RefCell::new(0u32));
        let listener = network.add_listener(STATUS_CHANGE_EVENT, {
            let received = received.clone();
            move |_| {
                *received.borrow_mut() += 1;
                Ok(())
            }
        });

        host.set_online(false);
        listener.remove();
        host.set_online(true);

        assert_eq!(*received.borrow(), 1);
    }
}
