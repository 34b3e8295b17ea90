//! Inter-Server Transport
//!
//! The kernel only needs "hand these bytes to that server". How they travel
//! is up to the [`Transport`] implementation; the receiving side feeds them
//! into [`LocalRuntime::receive`].

use crate::error::{KernelError, Result};
use crate::identity::ActorPid;
use crate::local::LocalRuntime;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

/// Outbound path to other servers
pub trait Transport: Send + Sync + 'static {
    /// Hand `payload` to the server owning `receiver`
    ///
    /// `Ok` means accepted for delivery, not delivered.
    fn send(&self, sender: &ActorPid, receiver: &ActorPid, payload: Bytes) -> Result<()>;
}

/// Transport for single-server deployments: every remote send fails
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTransport;

impl Transport for NoTransport {
    fn send(&self, _sender: &ActorPid, receiver: &ActorPid, _payload: Bytes) -> Result<()> {
        Err(KernelError::transport(receiver.server(), "no transport configured"))
    }
}

/// Routes between runtimes living in the same process, by server name
///
/// Runtimes are held weakly; a dropped runtime simply becomes unreachable.
#[derive(Debug, Default)]
pub struct InProcessTransport {
    servers: RwLock<HashMap<String, Weak<LocalRuntime>>>,
}

impl InProcessTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `runtime` reachable under its server name
    pub fn register(&self, runtime: &Arc<LocalRuntime>) {
        debug!(server = %runtime.server(), "Registering runtime with in-process transport");
        self.servers
            .write()
            .insert(runtime.server().to_string(), Arc::downgrade(runtime));
    }

    pub fn unregister(&self, server: &str) {
        self.servers.write().remove(server);
    }
}

impl Transport for InProcessTransport {
    fn send(&self, sender: &ActorPid, receiver: &ActorPid, payload: Bytes) -> Result<()> {
        let target = self
            .servers
            .read()
            .get(receiver.server())
            .and_then(Weak::upgrade)
            .ok_or_else(|| KernelError::transport(receiver.server(), "server unreachable"))?;

        trace!(
            sender = %sender,
            receiver = %receiver,
            payload_len = payload.len(),
            "Forwarding payload in process"
        );
        target.receive(sender.clone(), receiver.clone(), &payload);
        Ok(())
    }
}
