//! Snapshot files: reading the keys they seed the store with, and the fixed
//! empty snapshot a master ships during a full resync.

mod encoding;
mod opcode;

use std::{collections::HashMap, path::PathBuf};

use thiserror::Error;
use tracing::{info, warn};

pub use opcode::parse_snapshot;

/// Snapshot sent to every replica on PSYNC. The server never writes
/// snapshots of its own, so replicas always start from an empty keyspace.
pub const EMPTY_RDB: &[u8] = &[
    0x52, 0x45, 0x44, 0x49, 0x53, 0x30, 0x30, 0x31, 0x31, 0xfa, 0x09, 0x72, 0x65, 0x64, 0x69,
    0x73, 0x2d, 0x76, 0x65, 0x72, 0x05, 0x37, 0x2e, 0x32, 0x2e, 0x30, 0xfa, 0x0a, 0x72, 0x65,
    0x64, 0x69, 0x73, 0x2d, 0x62, 0x69, 0x74, 0x73, 0xc0, 0x40, 0xfa, 0x05, 0x63, 0x74, 0x69,
    0x6d, 0x65, 0xc2, 0x6d, 0x08, 0xbc, 0x65, 0xfa, 0x08, 0x75, 0x73, 0x65, 0x64, 0x2d, 0x6d,
    0x65, 0x6d, 0xc2, 0xb0, 0xc4, 0x10, 0x00, 0xfa, 0x08, 0x61, 0x6f, 0x66, 0x2d, 0x62, 0x61,
    0x73, 0x65, 0xc0, 0x00, 0xff, 0xf0, 0x6e, 0x3b, 0xfe, 0xc0, 0xff, 0x5a, 0xa2,
];

#[derive(Error, Debug, PartialEq)]
pub enum SnapshotError {
    #[error("failed to read snapshot file: {0}")]
    Io(String),
    #[error("unexpected end of snapshot")]
    UnexpectedEof,
    #[error("invalid magic string")]
    InvalidMagic,
    #[error("invalid snapshot version")]
    InvalidVersion,
    #[error("unknown opcode 0x{0:02X}")]
    UnknownOpcode(u8),
    #[error("unsupported value encoding 0x{0:02X}")]
    UnsupportedEncoding(u8),
    #[error("expected a length encoded integer")]
    ExpectedLength,
    #[error("invalid UTF-8 in snapshot string")]
    InvalidUtf8,
    #[error("invalid expiration timestamp: {0}")]
    InvalidExpiration(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotEntry {
    pub value: String,
    /// Unix time in milliseconds.
    pub expires_at: Option<u64>,
}

impl SnapshotEntry {
    pub fn new(value: String, expires_at: Option<u64>) -> Self {
        Self { value, expires_at }
    }
}

/// Source of the keys a server starts with. Consulted on cache misses; any
/// failure yields an empty mapping.
pub trait SnapshotReader: Send {
    fn read(&self) -> HashMap<String, SnapshotEntry>;
}

/// Reads `<dir>/<dbfilename>` in the RDB format.
#[derive(Debug, Clone)]
pub struct RdbSnapshotReader {
    path: PathBuf,
}

impl RdbSnapshotReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn try_read(&self) -> Result<HashMap<String, SnapshotEntry>, SnapshotError> {
        let bytes = std::fs::read(&self.path).map_err(|e| SnapshotError::Io(e.to_string()))?;
        parse_snapshot(&bytes)
    }
}

impl SnapshotReader for RdbSnapshotReader {
    fn read(&self) -> HashMap<String, SnapshotEntry> {
        match self.try_read() {
            Ok(entries) => {
                info!(path = %self.path.display(), keys = entries.len(), "loaded snapshot");
                entries
            }
            Err(SnapshotError::Io(e)) => {
                info!(path = %self.path.display(), error = %e, "no snapshot loaded");
                HashMap::new()
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring unreadable snapshot");
                HashMap::new()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EmptySnapshot;

impl SnapshotReader for EmptySnapshot {
    fn read(&self) -> HashMap<String, SnapshotEntry> {
        HashMap::new()
    }
}
