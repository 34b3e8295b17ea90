//! Actor Identity
//!
//! Addressing primitives shared by local and remote delivery. An [`ActorPid`]
//! does not say whether the actor lives in this process; the runtime decides
//! that by looking at the server component.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque actor handle, unique within one runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(u64);

impl ActorId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw value, for wire formats and logging only
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl From<u64> for ActorId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fully qualified actor address: `{server, database, id}`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActorPid {
    server: String,
    database: String,
    id: ActorId,
}

impl ActorPid {
    pub fn new(server: impl Into<String>, database: impl Into<String>, id: ActorId) -> Self {
        Self {
            server: server.into(),
            database: database.into(),
            id,
        }
    }

    /// Logical server namespace
    pub fn server(&self) -> &str {
        &self.server
    }

    /// Logical database namespace within the server
    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn id(&self) -> ActorId {
        self.id
    }
}

impl fmt::Display for ActorPid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.server, self.database, self.id)
    }
}
