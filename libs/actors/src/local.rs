//! In-Process Runtime
//!
//! Reference [`Runtime`] implementation: an actor registry, synchronous ID
//! allocation, locality resolution by server name and a pluggable
//! [`Scheduler`] / [`Transport`] pair.
//!
//! # Retirement policy
//!
//! `finish()` removes the actor from the registry right away. Messages that
//! were already in its mailbox are still handled, because every enqueue
//! scheduled its own `work()` call and those jobs keep the actor alive. New
//! dispatches to the retired PID are answered with `ActorNotFound`.
//!
//! # Reference cycle
//!
//! Registered actors hold the runtime and the runtime holds its actors.
//! [`LocalRuntime::shutdown`] (or retiring every actor) breaks the cycle.

use crate::actor::{Actor, ActorBase};
use crate::config::ActorConfig;
use crate::error::ActorError;
use crate::identity::{ActorId, ActorPid};
use crate::messages::{ActorMessage, MessageOrError, MessagePayload};
use crate::metrics::{RuntimeMetrics, RuntimeStats};
use crate::runtime::{Job, Runtime, Scheduler};
use crate::settings::RuntimeSettings;
use crate::transport::Transport;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Runtime hosting the actors of one server
pub struct LocalRuntime {
    runtime_id: String,
    settings: RuntimeSettings,
    next_id: AtomicU64,
    actors: RwLock<HashMap<ActorId, Arc<dyn ActorBase>>>,
    scheduler: Arc<dyn Scheduler>,
    transport: Arc<dyn Transport>,
    metrics: RuntimeMetrics,
    this: Weak<Self>,
}

impl LocalRuntime {
    pub fn new(
        settings: RuntimeSettings,
        scheduler: Arc<dyn Scheduler>,
        transport: Arc<dyn Transport>,
    ) -> Arc<Self> {
        let runtime_id = format!("runtime-{}", Uuid::new_v4());
        info!(
            runtime_id = %runtime_id,
            server = %settings.server,
            batch_size = settings.batch_size,
            "Creating local actor runtime"
        );

        Arc::new_cyclic(|this| Self {
            runtime_id,
            settings,
            next_id: AtomicU64::new(1),
            actors: RwLock::new(HashMap::new()),
            scheduler,
            transport,
            metrics: RuntimeMetrics::default(),
            this: this.clone(),
        })
    }

    /// Server name this runtime answers for
    pub fn server(&self) -> &str {
        &self.settings.server
    }

    pub fn settings(&self) -> &RuntimeSettings {
        &self.settings
    }

    /// Spawn from outside any actor, with or without an initial message
    pub fn spawn_actor<C: ActorConfig>(
        &self,
        database: &str,
        initial_state: C::State,
        initial_message: Option<C::Message>,
    ) -> ActorId {
        let id = ActorId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let pid = ActorPid::new(self.server(), database, id);

        let Some(runtime) = self.this.upgrade() else {
            error!(actor = %pid, "Runtime is being dropped, actor not created");
            return id;
        };

        let batch_size = C::batch_size().unwrap_or(self.settings.batch_size);
        let actor = Actor::<Self, C>::with_options(pid.clone(), runtime, initial_state, initial_message, batch_size);

        self.actors
            .write()
            .insert(id, Arc::clone(&actor) as Arc<dyn ActorBase>);
        self.metrics.record_spawn();
        debug!(
            actor = %pid,
            actor_type = C::TYPE_NAME,
            batch_size = actor.batch_size(),
            "Actor spawned"
        );

        actor.kick();
        id
    }

    /// Live actor by ID
    pub fn actor(&self, id: ActorId) -> Option<Arc<dyn ActorBase>> {
        self.actors.read().get(&id).cloned()
    }

    pub fn contains(&self, id: ActorId) -> bool {
        self.actors.read().contains_key(&id)
    }

    pub fn actor_ids(&self) -> Vec<ActorId> {
        let mut ids: Vec<_> = self.actors.read().keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn actor_count(&self) -> usize {
        self.actors.read().len()
    }

    /// Structural snapshot of a live actor
    pub fn snapshot(&self, id: ActorId) -> Option<serde_json::Value> {
        self.actor(id).map(|actor| actor.serialize())
    }

    pub fn stats(&self) -> RuntimeStats {
        self.metrics.stats()
    }

    /// Inbound bytes from another server
    pub fn receive(&self, sender: ActorPid, receiver: ActorPid, payload: &[u8]) {
        self.metrics.record_inbound();
        match self.lookup(&receiver) {
            Some(actor) => actor.process_serialized(sender, payload),
            None => {
                self.metrics.record_not_found();
                warn!(sender = %sender, receiver = %receiver, "Inbound message for unknown actor");
                // Only answer what might be a message; answering an error
                // could bounce between two servers forever.
                if serde_json::from_slice::<ActorError>(payload).is_err() {
                    self.dispatch::<()>(receiver.clone(), sender, ActorError::ActorNotFound { actor: receiver }.into());
                }
            }
        }
    }

    /// Drop every registered actor
    pub fn shutdown(&self) {
        let retired: Vec<_> = self.actors.write().drain().collect();
        info!(
            runtime_id = %self.runtime_id,
            retired = retired.len(),
            "Local actor runtime shut down"
        );
    }

    fn lookup(&self, pid: &ActorPid) -> Option<Arc<dyn ActorBase>> {
        self.actor(pid.id())
            .filter(|actor| actor.pid().database() == pid.database())
    }

    fn dispatch_remote<M: ActorMessage>(&self, sender: ActorPid, receiver: ActorPid, message: MessageOrError<M>) {
        self.metrics.record_remote_dispatch();
        let was_error = message.carries_error();

        let outcome = message
            .encode()
            .and_then(|bytes| self.transport.send(&sender, &receiver, Bytes::from(bytes)));

        if let Err(e) = outcome {
            self.metrics.record_network_error();
            warn!(
                sender = %sender,
                receiver = %receiver,
                error = %e,
                "Remote dispatch failed"
            );
            if !was_error {
                let error = ActorError::NetworkError { message: e.to_string() };
                self.dispatch::<()>(receiver, sender, error.into());
            }
        }
    }
}

impl Runtime for LocalRuntime {
    fn dispatch<M: ActorMessage>(&self, sender: ActorPid, receiver: ActorPid, message: MessageOrError<M>) {
        if receiver.server() != self.server() {
            self.dispatch_remote(sender, receiver, message);
            return;
        }

        self.metrics.record_local_dispatch();
        match self.lookup(&receiver) {
            Some(actor) => actor.process(sender, MessagePayload::from(message)),
            None => {
                self.metrics.record_not_found();
                if message.carries_error() {
                    warn!(
                        sender = %sender,
                        receiver = %receiver,
                        "Dropping error message for unknown actor"
                    );
                    return;
                }
                debug!(sender = %sender, receiver = %receiver, "Dispatch target not found");
                let error = ActorError::ActorNotFound { actor: receiver.clone() };
                self.dispatch::<()>(receiver, sender, error.into());
            }
        }
    }

    fn spawn<C: ActorConfig>(&self, database: &str, initial_state: C::State, initial_message: C::Message) -> ActorId {
        self.spawn_actor::<C>(database, initial_state, Some(initial_message))
    }

    fn finish(&self, pid: &ActorPid) {
        if pid.server() != self.server() {
            warn!(actor = %pid, "Ignoring finish request for a remote actor");
            return;
        }
        if self.actors.write().remove(&pid.id()).is_some() {
            self.metrics.record_finish();
            debug!(actor = %pid, "Actor retired");
        } else {
            debug!(actor = %pid, "Finish requested for an actor that is already gone");
        }
    }

    fn schedule(&self, job: Job) {
        self.scheduler.schedule(job);
    }
}

impl fmt::Debug for LocalRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalRuntime")
            .field("runtime_id", &self.runtime_id)
            .field("server", &self.settings.server)
            .field("actors", &self.actor_count())
            .finish()
    }
}
