//! Capability-level and registry-level error kinds.

use thiserror::Error;

/// Typed error surfaced by capability operations and registry resolution.
///
/// `Unavailable` and `Unimplemented` are the only two capability-level
/// kinds: both carry a human-readable reason and are terminal for the call
/// that produced them. `NotRegistered` and `AlreadyRegistered` are
/// registry-level and name the capability involved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityError {
    /// The operation can never succeed in this environment.
    #[error("capability unavailable: {reason}")]
    Unavailable {
        /// Human-readable reason for the rejection.
        reason: String,
    },
    /// The operation is valid in principle but this runtime's
    /// implementation does not support it yet.
    #[error("capability unimplemented: {reason}")]
    Unimplemented {
        /// Human-readable reason for the rejection.
        reason: String,
    },
    /// No factory exists for the requested capability name on the current
    /// runtime.
    #[error("capability not registered: {name}")]
    NotRegistered {
        /// The capability name that failed to resolve.
        name: String,
    },
    /// The capability name was already claimed by an earlier registration.
    #[error("capability already registered: {name}")]
    AlreadyRegistered {
        /// The capability name that was registered twice.
        name: String,
    },
}

impl CapabilityError {
    /// Builds the error an implementation returns when an operation cannot
    /// run in this environment.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Builds the error an implementation returns when an operation is not
    /// ported to this runtime.
    pub fn unimplemented(reason: impl Into<String>) -> Self {
        Self::Unimplemented {
            reason: reason.into(),
        }
    }

    /// Builds the resolution error for an unknown capability name.
    pub fn not_registered(name: impl Into<String>) -> Self {
        Self::NotRegistered { name: name.into() }
    }

    /// Builds the registration error for a name claimed twice.
    pub fn already_registered(name: impl Into<String>) -> Self {
        Self::AlreadyRegistered { name: name.into() }
    }
}
