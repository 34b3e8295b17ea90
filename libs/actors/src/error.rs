//! Kernel Errors
//!
//! Two separate universes live here:
//!
//! - [`ActorError`] is a *message*. It travels through mailboxes exactly like
//!   application messages and is handled by the receiving actor.
//! - [`KernelError`] is an operational failure reported to the code driving
//!   the kernel (configuration, transport plumbing, snapshots). Actors never
//!   see it.

use crate::identity::ActorPid;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Deliverable error messages
///
/// Every variant is an ordinary message from the receiver's point of view;
/// there is no separate error channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum ActorError {
    /// Payload matched neither the receiver's message type nor `ActorError`
    #[error("unknown message from {sender} to {receiver}")]
    UnknownMessage { sender: ActorPid, receiver: ActorPid },

    /// Dispatch target has no live actor
    #[error("actor {actor} not found")]
    ActorNotFound { actor: ActorPid },

    /// Transport failure while delivering to another server
    #[error("network error: {message}")]
    NetworkError { message: String },
}

/// Operational errors of the kernel and its reference runtime
#[derive(Debug, Error)]
pub enum KernelError {
    /// Configuration sources could not be read or deserialized
    #[error("configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),

    /// A configuration value is out of range
    #[error("invalid setting '{field}': {reason}")]
    InvalidSetting { field: &'static str, reason: String },

    /// A message could not be handed to another server
    #[error("transport to server '{server}' failed: {reason}")]
    Transport { server: String, reason: String },

    /// Structural encoding or decoding failed
    #[error("structural inspection failed: {0}")]
    Inspection(#[from] serde_json::Error),

    /// Global tracing subscriber could not be installed
    #[error("logging initialisation failed: {0}")]
    Logging(String),
}

impl KernelError {
    pub fn invalid_setting(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidSetting {
            field,
            reason: reason.into(),
        }
    }

    pub fn transport(server: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Transport {
            server: server.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = KernelError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::ActorId;

    #[test]
    fn test_actor_error_display() {
        let sender = ActorPid::new("A", "db", ActorId::new(1));
        let receiver = ActorPid::new("B", "db", ActorId::new(2));

        let unknown = ActorError::UnknownMessage { sender, receiver: receiver.clone() };
        assert_eq!(unknown.to_string(), "unknown message from A/db/1 to B/db/2");

        let missing = ActorError::ActorNotFound { actor: receiver };
        assert_eq!(missing.to_string(), "actor B/db/2 not found");
    }

    #[test]
    fn test_actor_error_wire_shape_names_the_alternative() {
        let error = ActorError::NetworkError { message: "connection refused".to_string() };
        let json = serde_json::to_value(&error).unwrap();

        assert_eq!(json["NetworkError"]["message"], "connection refused");
    }

    #[test]
    fn test_kernel_error_helpers() {
        let err = KernelError::invalid_setting("batch_size", "must be at least 1");
        assert_eq!(err.to_string(), "invalid setting 'batch_size': must be at least 1");

        let err = KernelError::transport("PRMR-9", "no route");
        assert!(matches!(err, KernelError::Transport { ref server, .. } if server == "PRMR-9"));
    }
}
