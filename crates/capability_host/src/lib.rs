//! Runtime capability bridge: registration, resolution, and the
//! browser-side fallback implementations with real logic.
//!
//! Application code calls named capability operations; the registry
//! resolves, at first use, which implementation backs each name on the
//! current runtime and caches the instance for the process lifetime. Every
//! fallback implementation embeds the shared [`ListenerHub`] for its event
//! surface and receives its ambient host objects as explicit port values,
//! so the whole crate is exercised without a browser; the concrete browser
//! adapters live in `capability_host_web`.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod error;
pub mod listeners;
pub mod local_notifications;
pub mod network;
pub mod platform;
pub mod ports;
pub mod preferences;
pub mod registry;
pub mod screen_reader;
pub mod time;

pub use error::CapabilityError;
pub use listeners::{ListenerCallback, ListenerHandle, ListenerHub, ListenerToken};
pub use local_notifications::{
    DeliveredNotification, LocalNotification, LocalNotificationsFallback, PermissionState,
    PermissionStatus,
};
pub use network::{classify_connection, ConnectionType, NetworkFallback, NetworkStatus};
pub use platform::Platform;
pub use preferences::{MigrateResult, PreferencesFallback};
pub use registry::{shared_registry, CapabilityHandle, CapabilityRegistry, PlatformFactories};
pub use screen_reader::ScreenReaderFallback;
pub use time::unix_time_ms_now;
