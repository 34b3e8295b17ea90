//! Message Envelopes
//!
//! Three shapes a message takes on its way into an actor:
//!
//! - [`MessagePayload`]: owned, type-erased value handed over by a local
//!   sender. Tagged at construction as application message or error.
//! - raw bytes from another server, decoded with [`MessageOrError::decode`].
//! - [`InternalMessage`]: the resolved mailbox node the handler consumes.
//!
//! Structural inspection (snapshots, wire bytes, diagnostics) is serde based;
//! the wire format is self-describing JSON so that "try the message type,
//! then the error type" is decidable from the bytes alone.

use crate::error::{ActorError, Result};
use crate::identity::ActorPid;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::any::{self, Any, TypeId};
use std::fmt;

/// Capability set every actor message and state type must have
///
/// Structural serialization in both directions plus `Debug` for
/// diagnostics. Implemented automatically; a type lacking one of the
/// capabilities is rejected at compile time where it is used as an
/// `ActorConfig::Message` or `ActorConfig::State`.
pub trait ActorMessage: Serialize + DeserializeOwned + fmt::Debug + Send + 'static {}

impl<T> ActorMessage for T where T: Serialize + DeserializeOwned + fmt::Debug + Send + 'static {}

/// Application message or deliverable error, resolved to exactly one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MessageOrError<M> {
    Message(M),
    Error(ActorError),
}

impl<M> MessageOrError<M> {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl<M: 'static> MessageOrError<M> {
    /// Error alternative, or a message whose value is itself an [`ActorError`]
    ///
    /// Both are delivered as errors, so neither may be answered with one.
    pub fn carries_error(&self) -> bool {
        self.is_error() || TypeId::of::<M>() == TypeId::of::<ActorError>()
    }
}

impl<M: ActorMessage> MessageOrError<M> {
    /// Decode inbound bytes: first as `M`, then as [`ActorError`]
    ///
    /// Returns `None` when neither parses; the caller turns that into an
    /// `UnknownMessage`.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if let Ok(message) = serde_json::from_slice::<M>(bytes) {
            return Some(Self::Message(message));
        }
        serde_json::from_slice::<ActorError>(bytes).ok().map(Self::Error)
    }

    /// Encode the active alternative alone, as a remote sender would
    pub fn encode(&self) -> Result<Vec<u8>> {
        let bytes = match self {
            Self::Message(message) => serde_json::to_vec(message)?,
            Self::Error(error) => serde_json::to_vec(error)?,
        };
        Ok(bytes)
    }
}

impl<M> From<ActorError> for MessageOrError<M> {
    fn from(error: ActorError) -> Self {
        Self::Error(error)
    }
}

/// Mailbox node
#[derive(Debug)]
pub struct InternalMessage<M> {
    pub sender: ActorPid,
    pub payload: MessageOrError<M>,
}

impl<M> InternalMessage<M> {
    pub fn new(sender: ActorPid, payload: MessageOrError<M>) -> Self {
        Self { sender, payload }
    }
}

enum PayloadKind {
    Message {
        value: Box<dyn Any + Send>,
        type_name: &'static str,
    },
    Error(ActorError),
}

/// Exclusively owned local payload
///
/// Lives only until the receiving actor resolves it into its mailbox.
pub struct MessagePayload {
    kind: PayloadKind,
}

impl MessagePayload {
    /// Wrap an application message of any type
    pub fn message<M: Send + 'static>(message: M) -> Self {
        Self {
            kind: PayloadKind::Message {
                value: Box::new(message),
                type_name: any::type_name::<M>(),
            },
        }
    }

    /// Wrap a deliverable error
    pub fn error(error: ActorError) -> Self {
        Self {
            kind: PayloadKind::Error(error),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, PayloadKind::Error(_))
    }

    /// Name of the wrapped type, for diagnostics
    pub fn type_name(&self) -> &'static str {
        match &self.kind {
            PayloadKind::Message { type_name, .. } => type_name,
            PayloadKind::Error(_) => any::type_name::<ActorError>(),
        }
    }

    /// Resolve against the receiver's message type
    ///
    /// Errors always resolve. A message resolves if its concrete type is `M`,
    /// then if it is an [`ActorError`] value; otherwise the payload is handed
    /// back untouched. Same order as [`MessageOrError::decode`].
    pub fn resolve<M: 'static>(self) -> std::result::Result<MessageOrError<M>, Self> {
        match self.kind {
            PayloadKind::Error(error) => Ok(MessageOrError::Error(error)),
            PayloadKind::Message { value, type_name } => match value.downcast::<M>() {
                Ok(message) => Ok(MessageOrError::Message(*message)),
                Err(value) => match value.downcast::<ActorError>() {
                    Ok(error) => Ok(MessageOrError::Error(*error)),
                    Err(value) => Err(Self {
                        kind: PayloadKind::Message { value, type_name },
                    }),
                },
            },
        }
    }
}

impl<M: Send + 'static> From<MessageOrError<M>> for MessagePayload {
    fn from(payload: MessageOrError<M>) -> Self {
        match payload {
            MessageOrError::Message(message) => Self::message(message),
            MessageOrError::Error(error) => Self::error(error),
        }
    }
}

impl fmt::Debug for MessagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            PayloadKind::Message { type_name, .. } => {
                f.debug_struct("MessagePayload").field("message", type_name).finish()
            }
            PayloadKind::Error(error) => f.debug_struct("MessagePayload").field("error", error).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::ActorId;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    enum Command {
        Add(u32),
        Reset,
    }

    fn pid(id: u64) -> ActorPid {
        ActorPid::new("PRMR-1", "db", ActorId::new(id))
    }

    #[test]
    fn test_payload_resolves_matching_type() {
        let payload = MessagePayload::message(Command::Add(3));
        assert!(!payload.is_error());

        let resolved = payload.resolve::<Command>().unwrap();
        assert_eq!(resolved, MessageOrError::Message(Command::Add(3)));
    }

    #[test]
    fn test_payload_hands_back_foreign_type() {
        let payload = MessagePayload::message(String::from("not a command"));

        let unresolved = payload.resolve::<Command>().unwrap_err();
        assert!(unresolved.type_name().ends_with("String"));
    }

    #[test]
    fn test_error_payload_resolves_for_any_receiver() {
        let error = ActorError::ActorNotFound { actor: pid(4) };
        let resolved = MessagePayload::error(error.clone()).resolve::<Command>().unwrap();

        assert!(resolved.is_error());
        assert_eq!(resolved, MessageOrError::Error(error));
    }

    #[test]
    fn test_error_value_sent_as_message_resolves_as_error() {
        let error = ActorError::NetworkError {
            message: "x".to_string(),
        };
        let payload = MessagePayload::message(error.clone());
        assert!(!payload.is_error());

        let resolved = payload.resolve::<Command>().unwrap();
        assert_eq!(resolved, MessageOrError::Error(error.clone()));

        // Same value over the wire takes the same path.
        let bytes = serde_json::to_vec(&error).unwrap();
        assert_eq!(MessageOrError::<Command>::decode(&bytes), Some(resolved));
    }

    #[test]
    fn test_carries_error_covers_error_values() {
        let error = ActorError::ActorNotFound { actor: pid(1) };
        assert!(MessageOrError::<Command>::Error(error.clone()).carries_error());
        assert!(MessageOrError::Message(error).carries_error());
        assert!(!MessageOrError::Message(Command::Reset).carries_error());
    }

    #[test]
    fn test_decode_prefers_message_then_error() {
        let message = MessageOrError::<Command>::decode(br#"{"Add":7}"#).unwrap();
        assert_eq!(message, MessageOrError::Message(Command::Add(7)));

        let bytes = MessageOrError::<Command>::Error(ActorError::NetworkError {
            message: "timeout".to_string(),
        })
        .encode()
        .unwrap();
        let error = MessageOrError::<Command>::decode(&bytes).unwrap();
        assert!(error.is_error());

        assert!(MessageOrError::<Command>::decode(br#"{"Launch":1}"#).is_none());
        assert!(MessageOrError::<Command>::decode(b"\xff\x00").is_none());
    }

    #[test]
    fn test_encode_writes_the_bare_alternative() {
        let bytes = MessageOrError::Message(Command::Reset).encode().unwrap();
        assert_eq!(bytes, br#""Reset""#);
    }

    #[test]
    fn test_payload_debug_names_the_type() {
        let debug = format!("{:?}", MessagePayload::message(5_u8));
        assert!(debug.contains("u8"));
    }
}
