//! Actor Execution Kernel
//!
//! Each actor is either *idle* (busy flag clear) or *draining* (busy flag
//! set). Producers never block: they push into the mailbox and *kick*, i.e.
//! schedule a `work()` call. `work()` admits exactly one drainer through a
//! compare-and-set on the busy flag, handles up to `batch_size` messages,
//! clears the flag and then re-checks the mailbox.
//!
//! # Lost wakeups
//!
//! A producer whose push lands after the drainer's last `pop()` but before
//! the flag is cleared sees its own kick fail the CAS. The drainer therefore
//! looks at the mailbox *after* clearing the flag and kicks again if it is
//! not empty. Flag CAS, flag clear and the fence before the re-check are all
//! `SeqCst`, so one of the two sides always observes the other.
//!
//! # Retirement
//!
//! There is no terminated state in here. `finish()` asks the runtime to drop
//! the actor from its registry; whatever is already queued still drains, and
//! direct `process()` calls on a retained handle keep working.
//!
//! # Handler faults
//!
//! A panicking handler is not caught. While it unwinds out of `work()` the
//! actor asks the runtime to retire it. Its state is gone, so every message
//! that still reaches it is answered with `ActorNotFound` and dropped.

use crate::config::ActorConfig;
use crate::error::{ActorError, Result};
use crate::handler::HandlerBase;
use crate::identity::ActorPid;
use crate::mailbox::Mailbox;
use crate::messages::{InternalMessage, MessageOrError, MessagePayload};
use crate::runtime::Runtime;
use serde::{Deserialize, Serialize};
use std::cell::{RefCell, UnsafeCell};
use std::sync::atomic::{self, AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread;
use tracing::{debug, error, trace, warn};

/// Messages handled per `work()` call unless configured otherwise
pub const DEFAULT_BATCH_SIZE: usize = 16;

/// Delivery boundary used by runtimes and registries
///
/// Object safe, so a registry can hold actors of different types.
pub trait ActorBase: Send + Sync {
    fn pid(&self) -> &ActorPid;

    /// Deliver an owned local payload. Never fails at the call site.
    fn process(&self, sender: ActorPid, payload: MessagePayload);

    /// Deliver serialized bytes from another server. Never fails at the call site.
    fn process_serialized(&self, sender: ActorPid, bytes: &[u8]);

    /// Stable name of the actor's type
    fn type_name(&self) -> &'static str;

    /// Structural snapshot `{pid, state, batch_size}`
    ///
    /// Called from one of this actor's own handlers, the state is moved out
    /// and the snapshot carries `"state": null`. The same holds after a
    /// handler fault.
    fn serialize(&self) -> serde_json::Value;

    /// Messages currently queued (hint)
    fn pending(&self) -> usize;
}

/// Serializable actor snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorSnapshot<S> {
    pub pid: ActorPid,
    pub state: S,
    pub batch_size: usize,
}

impl<S: serde::de::DeserializeOwned> ActorSnapshot<S> {
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

#[derive(Serialize)]
struct SnapshotRef<'a, S> {
    pid: &'a ActorPid,
    state: Option<&'a S>,
    batch_size: usize,
}

thread_local! {
    /// Actors whose handlers are running on this thread, innermost last
    static HANDLING: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// Clears the busy flag when dropped, also while unwinding from a handler panic
struct Draining<'a> {
    busy: &'a AtomicBool,
}

impl Drop for Draining<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::SeqCst);
    }
}

/// Marks the current thread as running handlers of one actor
///
/// Dropped while unwinding, it retires the actor.
struct HandlerScope<'a, R: Runtime> {
    key: usize,
    pid: &'a ActorPid,
    runtime: &'a R,
}

impl<'a, R: Runtime> HandlerScope<'a, R> {
    fn enter(key: usize, pid: &'a ActorPid, runtime: &'a R) -> Self {
        HANDLING.with(|handling| handling.borrow_mut().push(key));
        Self { key, pid, runtime }
    }
}

impl<R: Runtime> Drop for HandlerScope<'_, R> {
    fn drop(&mut self) {
        HANDLING.with(|handling| {
            let mut handling = handling.borrow_mut();
            if let Some(position) = handling.iter().rposition(|key| *key == self.key) {
                handling.remove(position);
            }
        });
        if thread::panicking() {
            error!(actor = %self.pid, "Handler panicked, retiring actor");
            self.runtime.finish(self.pid);
        }
    }
}

/// One actor instance of type `C` running on runtime `R`
pub struct Actor<R: Runtime, C: ActorConfig> {
    pid: ActorPid,
    busy: AtomicBool,
    mailbox: Mailbox<InternalMessage<C::Message>>,
    runtime: Arc<R>,
    /// Only touched while holding the busy flag. `None` after a handler panic.
    state: UnsafeCell<Option<C::State>>,
    batch_size: usize,
    this: Weak<Self>,
}

// SAFETY: `state` is the only non-`Sync` field. It is accessed exclusively by
// the thread that won the busy-flag CAS (see `try_drain`), so there is never
// more than one reference to it at a time.
unsafe impl<R: Runtime, C: ActorConfig> Sync for Actor<R, C> {}

impl<R: Runtime, C: ActorConfig> Actor<R, C> {
    /// Idle actor with the type's batch size (or the kernel default)
    pub fn new(pid: ActorPid, runtime: Arc<R>, initial_state: C::State) -> Arc<Self> {
        let batch_size = C::batch_size().unwrap_or(DEFAULT_BATCH_SIZE);
        Self::with_options(pid, runtime, initial_state, None, batch_size)
    }

    /// Actor optionally seeded with an initial message
    ///
    /// The initial message is queued before the actor is reachable by anyone
    /// else, with the actor itself as sender. Nothing is scheduled; the
    /// runtime calls [`Actor::kick`] once the actor is registered.
    pub fn with_options(
        pid: ActorPid,
        runtime: Arc<R>,
        initial_state: C::State,
        initial_message: Option<C::Message>,
        batch_size: usize,
    ) -> Arc<Self> {
        let mailbox = Mailbox::new();
        if let Some(message) = initial_message {
            mailbox.push(InternalMessage::new(pid.clone(), MessageOrError::Message(message)));
        }

        Arc::new_cyclic(|this| Self {
            pid,
            busy: AtomicBool::new(false),
            mailbox,
            runtime,
            state: UnsafeCell::new(Some(initial_state)),
            batch_size: batch_size.max(1),
            this: this.clone(),
        })
    }

    /// Rebuild an idle actor from a snapshot
    pub fn restore(snapshot: ActorSnapshot<C::State>, runtime: Arc<R>) -> Arc<Self> {
        Self::with_options(snapshot.pid, runtime, snapshot.state, None, snapshot.batch_size)
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Request a `work()` call from the scheduler
    ///
    /// Redundant kicks are harmless: the surplus `work()` calls lose the CAS
    /// or find the mailbox empty.
    pub fn kick(&self) {
        if let Some(actor) = self.this.upgrade() {
            self.runtime.schedule(Box::new(move || {
                actor.work();
            }));
        }
    }

    /// Drain up to one batch; returns the number of handler invocations
    ///
    /// Returns 0 immediately when another thread is already draining.
    pub fn work(&self) -> usize {
        let Some(draining) = self.try_drain() else {
            trace!(actor = %self.pid, "Actor already draining, skipping work");
            return 0;
        };

        // SAFETY: we hold the busy flag until `draining` is dropped below.
        let slot = unsafe { &mut *self.state.get() };
        let Some(mut state) = slot.take() else {
            let rejected = self.reject_pending();
            error!(
                actor = %self.pid,
                actor_type = C::TYPE_NAME,
                rejected = rejected,
                "Actor state lost after a handler fault, rejecting queued messages"
            );
            self.runtime.finish(&self.pid);
            return 0;
        };

        let scope = HandlerScope::enter(self.key(), &self.pid, &*self.runtime);
        let mut handled = 0;
        while handled < self.batch_size {
            let Some(InternalMessage { sender, payload }) = self.mailbox.pop() else {
                break;
            };
            state = self.invoke(sender, state, payload);
            handled += 1;
        }
        *slot = Some(state);
        drop(scope);

        if handled > 0 {
            debug!(
                actor = %self.pid,
                handled = handled,
                batch_size = self.batch_size,
                "Actor drained batch"
            );
        }

        drop(draining);
        atomic::fence(Ordering::SeqCst);
        if !self.mailbox.is_empty() {
            self.kick();
        }

        handled
    }

    /// Identity of this instance for the per-thread handler stack
    fn key(&self) -> usize {
        self as *const Self as usize
    }

    /// Whether one of this actor's handlers is running on the current thread
    fn handling_on_current_thread(&self) -> bool {
        let key = self.key();
        HANDLING.with(|handling| handling.borrow().contains(&key))
    }

    /// Drop every queued message, answering senders of non-errors with `ActorNotFound`
    fn reject_pending(&self) -> usize {
        let mut rejected = 0;
        while let Some(InternalMessage { sender, payload }) = self.mailbox.pop() {
            if !payload.is_error() {
                let error = ActorError::ActorNotFound {
                    actor: self.pid.clone(),
                };
                self.runtime.dispatch::<()>(self.pid.clone(), sender, error.into());
            }
            rejected += 1;
        }
        rejected
    }

    fn snapshot_value(&self, state: Option<&C::State>) -> serde_json::Value {
        let snapshot = SnapshotRef {
            pid: &self.pid,
            state,
            batch_size: self.batch_size,
        };
        match serde_json::to_value(&snapshot) {
            Ok(value) => value,
            Err(e) => panic!("state of actor type {} is not serializable: {}", C::TYPE_NAME, e),
        }
    }

    fn try_drain(&self) -> Option<Draining<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Draining { busy: &self.busy })
    }

    fn invoke(&self, sender: ActorPid, state: C::State, payload: MessageOrError<C::Message>) -> C::State {
        trace!(actor = %self.pid, sender = %sender, message = ?payload, "Handling message");

        let handler = HandlerBase::new(&self.pid, sender, state, &*self.runtime);
        match payload {
            MessageOrError::Message(message) => C::handle(handler, message),
            MessageOrError::Error(error) => C::handle_error(handler, error),
        }
    }

    fn enqueue(&self, sender: ActorPid, payload: MessageOrError<C::Message>) {
        self.mailbox.push(InternalMessage::new(sender, payload));
        self.kick();
    }

    fn unknown_message(&self, sender: ActorPid) -> MessageOrError<C::Message> {
        MessageOrError::Error(ActorError::UnknownMessage {
            sender,
            receiver: self.pid.clone(),
        })
    }
}

impl<R: Runtime, C: ActorConfig> ActorBase for Actor<R, C> {
    fn pid(&self) -> &ActorPid {
        &self.pid
    }

    fn process(&self, sender: ActorPid, payload: MessagePayload) {
        let payload = match payload.resolve::<C::Message>() {
            Ok(payload) => payload,
            Err(foreign) => {
                warn!(
                    actor = %self.pid,
                    sender = %sender,
                    actor_type = C::TYPE_NAME,
                    payload_type = foreign.type_name(),
                    "Dropping payload of unknown type"
                );
                self.unknown_message(sender.clone())
            }
        };
        self.enqueue(sender, payload);
    }

    fn process_serialized(&self, sender: ActorPid, bytes: &[u8]) {
        let payload = match MessageOrError::<C::Message>::decode(bytes) {
            Some(payload) => payload,
            None => {
                warn!(
                    actor = %self.pid,
                    sender = %sender,
                    actor_type = C::TYPE_NAME,
                    payload_len = bytes.len(),
                    "Dropping undecodable payload"
                );
                self.unknown_message(sender.clone())
            }
        };
        self.enqueue(sender, payload);
    }

    fn type_name(&self) -> &'static str {
        C::TYPE_NAME
    }

    /// Waits for an in-flight batch to finish before reading the state.
    ///
    /// Panics if the state cannot be represented structurally: that is a
    /// broken `Serialize` implementation, not a runtime condition.
    fn serialize(&self) -> serde_json::Value {
        // Waiting here would wait for ourselves.
        if self.handling_on_current_thread() {
            warn!(
                actor = %self.pid,
                actor_type = C::TYPE_NAME,
                "Snapshot requested from inside the actor's own handler, state unavailable"
            );
            return self.snapshot_value(None);
        }

        let draining = loop {
            match self.try_drain() {
                Some(draining) => break draining,
                None => thread::yield_now(),
            }
        };

        // SAFETY: we hold the busy flag until `draining` is dropped below.
        let state = unsafe { (*self.state.get()).as_ref() };
        let value = self.snapshot_value(state);

        drop(draining);
        atomic::fence(Ordering::SeqCst);
        if !self.mailbox.is_empty() {
            self.kick();
        }
        value
    }

    fn pending(&self) -> usize {
        self.mailbox.len()
    }
}
