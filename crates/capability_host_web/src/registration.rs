//! Registration of the web capability factories.
//!
//! Each function here is the thin binding between a capability name and
//! its web factory; the factory assembles the fallback implementation from
//! the browser port adapters the first time the capability resolves.

use std::rc::Rc;

use capability_host::{
    local_notifications, network, ports::SystemClock, preferences, screen_reader, CapabilityError,
    CapabilityHandle, CapabilityRegistry, LocalNotificationsFallback, NetworkFallback,
    PlatformFactories, PreferencesFallback, ScreenReaderFallback,
};

use crate::{WebKeyValueHost, WebNetworkHost, WebNotificationHost, WebSpeechHost, WebTimerHost};

/// Typed handles for every capability registered by
/// [`register_web_capabilities`].
#[derive(Debug)]
pub struct WebCapabilityHandles {
    /// Local-notifications capability handle.
    pub local_notifications: CapabilityHandle<LocalNotificationsFallback>,
    /// Preferences capability handle.
    pub preferences: CapabilityHandle<PreferencesFallback>,
    /// Network capability handle.
    pub network: CapabilityHandle<NetworkFallback>,
    /// Screen-reader capability handle.
    pub screen_reader: CapabilityHandle<ScreenReaderFallback>,
}

/// Registers the local-notifications web factory.
///
/// # Errors
///
/// Returns [`CapabilityError::AlreadyRegistered`] when the name was
/// claimed earlier.
pub fn register_local_notifications(
    registry: &CapabilityRegistry,
) -> Result<CapabilityHandle<LocalNotificationsFallback>, CapabilityError> {
    registry.register(
        local_notifications::CAPABILITY_NAME,
        PlatformFactories::new().web(|| async {
            Rc::new(LocalNotificationsFallback::new(
                Rc::new(WebNotificationHost),
                Rc::new(WebTimerHost),
                Rc::new(SystemClock),
            ))
        }),
    )
}

/// Registers the preferences web factory.
///
/// # Errors
///
/// Returns [`CapabilityError::AlreadyRegistered`] when the name was
/// claimed earlier.
pub fn register_preferences(
    registry: &CapabilityRegistry,
) -> Result<CapabilityHandle<PreferencesFallback>, CapabilityError> {
    registry.register(
        preferences::CAPABILITY_NAME,
        PlatformFactories::new()
            .web(|| async { Rc::new(PreferencesFallback::new(Rc::new(WebKeyValueHost))) }),
    )
}

/// Registers the network web factory.
///
/// # Errors
///
/// Returns [`CapabilityError::AlreadyRegistered`] when the name was
/// claimed earlier.
pub fn register_network(
    registry: &CapabilityRegistry,
) -> Result<CapabilityHandle<NetworkFallback>, CapabilityError> {
    registry.register(
        network::CAPABILITY_NAME,
        PlatformFactories::new().web(|| async { Rc::new(NetworkFallback::new(Rc::new(WebNetworkHost))) }),
    )
}

/// Registers the screen-reader web factory.
///
/// # Errors
///
/// Returns [`CapabilityError::AlreadyRegistered`] when the name was
/// claimed earlier.
pub fn register_screen_reader(
    registry: &CapabilityRegistry,
) -> Result<CapabilityHandle<ScreenReaderFallback>, CapabilityError> {
    registry.register(
        screen_reader::CAPABILITY_NAME,
        PlatformFactories::new()
            .web(|| async { Rc::new(ScreenReaderFallback::new(Rc::new(WebSpeechHost))) }),
    )
}

/// Registers every web capability and returns the typed handle bundle.
///
/// # Errors
///
/// Returns [`CapabilityError::AlreadyRegistered`] when any of the names
/// was claimed earlier.
pub fn register_web_capabilities(
    registry: &CapabilityRegistry,
) -> Result<WebCapabilityHandles, CapabilityError> {
    Ok(WebCapabilityHandles {
        local_notifications: register_local_notifications(registry)?,
        preferences: register_preferences(registry)?,
        network: register_network(registry)?,
        screen_reader: register_screen_reader(registry)?,
    })
}
