//! Handler Capabilities
//!
//! What application handler code may do besides mutating its own state:
//! send, spawn and ask to be retired. Nothing else of the runtime is
//! reachable from a handler.

use crate::config::ActorConfig;
use crate::error::ActorError;
use crate::identity::{ActorId, ActorPid};
use crate::messages::{ActorMessage, MessageOrError};
use crate::runtime::Runtime;

/// Handler value built fresh for every message
///
/// Owns the actor state for the duration of one handler call; the handler
/// returns it (usually via [`HandlerBase::into_state`]) to the kernel.
pub struct HandlerBase<'a, R: Runtime, S> {
    pid: &'a ActorPid,
    sender: ActorPid,
    runtime: &'a R,
    /// Current actor state
    pub state: S,
}

impl<'a, R: Runtime, S> HandlerBase<'a, R, S> {
    pub(crate) fn new(pid: &'a ActorPid, sender: ActorPid, state: S, runtime: &'a R) -> Self {
        Self {
            pid,
            sender,
            runtime,
            state,
        }
    }

    /// Address of the actor running this handler
    pub fn pid(&self) -> &ActorPid {
        self.pid
    }

    /// Address the current message came from
    pub fn sender(&self) -> &ActorPid {
        &self.sender
    }

    /// Fire-and-forget send from this actor to `receiver`
    pub fn dispatch<M: ActorMessage>(&self, receiver: ActorPid, message: M) {
        self.runtime
            .dispatch(self.pid.clone(), receiver, MessageOrError::Message(message));
    }

    /// Fire-and-forget delivery of an error message to `receiver`
    pub fn dispatch_error(&self, receiver: ActorPid, error: ActorError) {
        self.runtime
            .dispatch::<()>(self.pid.clone(), receiver, MessageOrError::Error(error));
    }

    /// Create a new actor in this actor's database
    ///
    /// The returned ID is allocated synchronously and stays valid even if
    /// the runtime creates the actor later.
    pub fn spawn<C: ActorConfig>(&self, initial_state: C::State, initial_message: C::Message) -> ActorId {
        self.runtime
            .spawn::<C>(self.pid.database(), initial_state, initial_message)
    }

    /// Ask the runtime to retire this actor
    pub fn finish(&self) {
        self.runtime.finish(self.pid);
    }

    pub fn into_state(self) -> S {
        self.state
    }
}
