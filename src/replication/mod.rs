//! Replication bookkeeping shared by both roles, and the replica's link to
//! its master.

mod handshake;

pub use handshake::{run_replica_link, ReplicationError};

use crate::config::Role;

/// Role, replication id and byte offset of this server.
///
/// On a master the offset counts every byte propagated to replicas. On a
/// replica it counts every byte of commands received from the master since
/// the last full resync.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplicationState {
    role: Role,
    replication_id: String,
    offset: u64,
}

impl ReplicationState {
    pub fn new(role: Role, replication_id: impl Into<String>) -> Self {
        Self {
            role,
            replication_id: replication_id.into(),
            offset: 0,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn replication_id(&self) -> &str {
        &self.replication_id
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn advance(&mut self, bytes: usize) {
        self.offset += bytes as u64;
    }

    /// A full resync starts the replica's count over.
    pub fn reset(&mut self) {
        self.offset = 0;
    }
}
