//! Actor Type Descriptions
//!
//! An [`ActorConfig`] ties together everything the kernel needs to run one
//! kind of actor: its state, its message sum type, a stable name and the
//! handler. All checks are trait bounds, so a type that is not actor-shaped
//! fails to compile instead of failing at spawn time.

use crate::error::ActorError;
use crate::handler::HandlerBase;
use crate::messages::ActorMessage;
use crate::runtime::Runtime;
use tracing::warn;

/// Compile-time description of an actor type
///
/// # Example
///
/// ```rust
/// use actor_kernel::{ActorConfig, HandlerBase, Runtime};
/// use serde::{Deserialize, Serialize};
///
/// struct Counter;
///
/// #[derive(Debug, Serialize, Deserialize)]
/// enum CounterMessage {
///     Add(u64),
///     Reset,
/// }
///
/// impl ActorConfig for Counter {
///     type State = u64;
///     type Message = CounterMessage;
///     const TYPE_NAME: &'static str = "Counter";
///
///     fn handle<R: Runtime>(mut handler: HandlerBase<'_, R, u64>, message: CounterMessage) -> u64 {
///         match message {
///             CounterMessage::Add(n) => handler.state += n,
///             CounterMessage::Reset => handler.state = 0,
///         }
///         handler.into_state()
///     }
/// }
/// ```
pub trait ActorConfig: Send + Sync + Sized + 'static {
    /// Exclusively owned actor state, threaded through every handler call
    type State: ActorMessage;

    /// Closed sum type of application messages
    type Message: ActorMessage;

    /// Stable identifier used by registries and snapshots
    const TYPE_NAME: &'static str;

    /// Handle one application message and return the next state
    fn handle<R: Runtime>(handler: HandlerBase<'_, R, Self::State>, message: Self::Message) -> Self::State;

    /// Handle one deliverable error and return the next state
    ///
    /// Default: log and keep the state unchanged.
    fn handle_error<R: Runtime>(handler: HandlerBase<'_, R, Self::State>, error: ActorError) -> Self::State {
        warn!(
            actor = %handler.pid(),
            sender = %handler.sender(),
            actor_type = Self::TYPE_NAME,
            error = %error,
            "Actor received an error message it does not handle"
        );
        handler.into_state()
    }

    /// Per-type override of the runtime's default batch size
    fn batch_size() -> Option<usize> {
        None
    }
}
