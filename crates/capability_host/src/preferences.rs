//! Preferences fallback: a group-prefixed view over shared key-value
//! storage, with the one-time legacy migration path.

use std::{cell::RefCell, rc::Rc};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::CapabilityError,
    listeners::{ListenerHandle, ListenerHub},
    ports::KeyValueHost,
};

/// Registry name of the preferences capability.
pub const CAPABILITY_NAME: &str = "Preferences";

/// Group selected when the caller never configures one.
pub const DEFAULT_GROUP: &str = "CapabilityStorage";

/// Reserved group name mapping to the empty prefix, for records written
/// under the oldest native convention.
pub const UNPREFIXED_GROUP: &str = "NativeStorage";

/// Fixed prefix of keys written under the legacy convention.
pub const LEGACY_KEY_PREFIX: &str = "_cap_";

/// Outcome of a [`PreferencesFallback::migrate`] pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrateResult {
    /// Keys copied from the legacy convention to the current one.
    pub migrated: Vec<String>,
    /// Keys left untouched because a current-convention value already
    /// existed.
    pub existing: Vec<String>,
}

/// Browser-side preferences implementation.
///
/// Every logical key is namespaced under the active group's prefix before
/// it reaches the shared store; groups share one physical namespace, so
/// isolation between them holds only as long as group names do not
/// overlap.
#[derive(Clone)]
pub struct PreferencesFallback {
    hub: ListenerHub,
    store: Rc<dyn KeyValueHost>,
    group: Rc<RefCell<String>>,
}

impl PreferencesFallback {
    /// Creates the fallback over the injected store, under
    /// [`DEFAULT_GROUP`].
    pub fn new(store: Rc<dyn KeyValueHost>) -> Self {
        Self {
            hub: ListenerHub::new(),
            store,
            group: Rc::new(RefCell::new(DEFAULT_GROUP.to_string())),
        }
    }

    /// Switches the active group for every subsequent operation.
    pub async fn configure(&self, group: &str) {
        *self.group.borrow_mut() = group.to_string();
    }

    /// Reads the value stored under `key` in the active group.
    pub async fn get(&self, key: &str) -> Option<String> {
        self.store.get_item(&self.apply_prefix(key))
    }

    /// Stores `value` under `key` in the active group.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityError::Unavailable`] when the backing store
    /// rejects the write.
    pub async fn set(&self, key: &str, value: &str) -> Result<(), CapabilityError> {
        self.store
            .set_item(&self.apply_prefix(key), value)
            .map_err(CapabilityError::unavailable)
    }

    /// Removes the value stored under `key` in the active group.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityError::Unavailable`] when the backing store
    /// rejects the delete.
    pub async fn remove(&self, key: &str) -> Result<(), CapabilityError> {
        self.store
            .remove_item(&self.apply_prefix(key))
            .map_err(CapabilityError::unavailable)
    }

    /// Lists the keys stored under the active group, prefix stripped.
    pub async fn keys(&self) -> Vec<String> {
        let prefix = self.prefix();
        self.raw_keys(&prefix)
            .into_iter()
            .map(|key| key[prefix.len()..].to_string())
            .collect()
    }

    /// Removes every key stored under the active group.
    ///
    /// Keys belonging to other groups are never touched.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityError::Unavailable`] when the backing store
    /// rejects a delete.
    pub async fn clear(&self) -> Result<(), CapabilityError> {
        let prefix = self.prefix();
        for key in self.raw_keys(&prefix) {
            self.store
                .remove_item(&key)
                .map_err(CapabilityError::unavailable)?;
        }
        Ok(())
    }

    /// Copies legacy-convention values to the active group.
    ///
    /// A legacy key whose current-convention slot already holds a value is
    /// reported as existing and left untouched; otherwise the legacy value
    /// is copied and the key reported as migrated. Legacy entries are never
    /// deleted here; callers run [`Self::remove_old`] once migration is
    /// confirmed.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityError::Unavailable`] when the backing store
    /// rejects a write.
    pub async fn migrate(&self) -> Result<MigrateResult, CapabilityError> {
        let mut result = MigrateResult::default();
        let legacy_keys: Vec<String> = self
            .store
            .keys()
            .into_iter()
            .filter(|key| key.starts_with(LEGACY_KEY_PREFIX))
            .collect();
        for legacy_key in legacy_keys {
            let key = legacy_key[LEGACY_KEY_PREFIX.len()..].to_string();
            let value = self.store.get_item(&legacy_key).unwrap_or_default();
            if self.get(&key).await.is_some() {
                result.existing.push(key);
            } else {
                self.set(&key, &value).await?;
                result.migrated.push(key);
            }
        }
        Ok(result)
    }

    /// Deletes every legacy-convention key, regardless of migration
    /// status.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityError::Unavailable`] when the backing store
    /// rejects a delete.
    pub async fn remove_old(&self) -> Result<(), CapabilityError> {
        let legacy_keys: Vec<String> = self
            .store
            .keys()
            .into_iter()
            .filter(|key| key.starts_with(LEGACY_KEY_PREFIX))
            .collect();
        for key in legacy_keys {
            self.store
                .remove_item(&key)
                .map_err(CapabilityError::unavailable)?;
        }
        Ok(())
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

    fn prefix(&self) -> String {
        let group = self.group.borrow();
        if *group == UNPREFIXED_GROUP {
            String::new()
        } else {
            format!("{group}.")
        }
    }

    fn apply_prefix(&self, key: &str) -> String {
        format!("{}{key}", self.prefix())
    }

    fn raw_keys(&self, prefix: &str) -> Vec<String> {
        self.store
            .keys()
            .into_iter()
            .filter(|key| key.starts_with(prefix))
            .collect()
    }
}
