//! Host port traits and in-memory adapters.
//!
//! Ambient host objects (storage, notification API, timers, the network
//! probe, speech synthesis) are injected into fallback implementations as
//! explicit construction parameters so every implementation is testable
//! without a real host environment. Browser adapters live in
//! `capability_host_web`; the `Memory*`/`Manual*` adapters here back the
//! test suites.

pub mod clock;
pub mod network;
pub mod notifications;
pub mod speech;
pub mod storage;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use network::{MemoryNetworkHost, NetworkHost};
pub use notifications::{
    HostPermission, MemoryNotification, MemoryNotificationHost, NotificationEvents,
    NotificationHandle, NotificationHost, NotificationHostFuture,
};
pub use speech::{MemorySpeechHost, SpeechHost};
pub use storage::{KeyValueHost, MemoryKeyValueHost};
pub use timer::{ManualTimerHost, TimerHost};
