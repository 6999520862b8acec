//! PSYNC command implementation for Redis replication synchronization.
//!
//! Only full resynchronization is offered: whatever the replica asks for, it
//! receives `+FULLRESYNC <replid> 0` followed by an empty snapshot.

use bytes::{BufMut, Bytes, BytesMut};
use tracing::debug;

use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    config::Role,
    engine::Engine,
    rdb::EMPTY_RDB,
    resp::RespValue,
};

/// Represents the parsed arguments for the PSYNC command.
///
/// PSYNC is used by replicas to request synchronization with the master,
/// providing the replication id they last followed and their offset.
#[derive(Debug, PartialEq)]
pub struct PsyncArguments {
    /// The replication id of the master (or "?" for full resync)
    master_repl_id: String,
    /// The current replication offset (or -1 for full resync)
    offset: i64,
}

impl PsyncArguments {
    /// Parses and validates arguments for the PSYNC command.
    ///
    /// # Returns
    ///
    /// * `Ok(PsyncArguments)` - Successfully parsed arguments
    /// * `Err(CommandError::WrongNumberOfArguments)` - If not exactly 2 arguments
    /// * `Err(CommandError::NotAnInteger)` - If offset is not a valid integer
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 2 {
            return Err(CommandError::wrong_arguments("psync"));
        }

        let offset = arguments[1]
            .parse::<i64>()
            .map_err(|_| CommandError::NotAnInteger)?;

        Ok(Self {
            master_repl_id: arguments[0].clone(),
            offset,
        })
    }
}

/// Builds the full resync payload: the FULLRESYNC line, then the snapshot
/// framed as a bulk string without a trailing CRLF.
pub fn full_resync_payload(replication_id: &str) -> Bytes {
    let header = RespValue::SimpleString(format!("FULLRESYNC {} 0", replication_id)).encode();

    let mut payload = BytesMut::with_capacity(header.len() + EMPTY_RDB.len() + 8);
    payload.put_slice(&header);
    payload.put_slice(format!("${}\r\n", EMPTY_RDB.len()).as_bytes());
    payload.put_slice(EMPTY_RDB);

    payload.freeze()
}

/// Handles the Redis PSYNC command.
///
/// The engine turns the returned [`CommandResult::Sync`] into raw bytes on
/// the wire and registers the connection as a replica, after which every
/// write is propagated to it.
///
/// # Returns
///
/// * `Ok(CommandResult::Sync)` - FULLRESYNC line and snapshot payload
/// * `Err(CommandError::NotAMaster)` - If this server is itself a replica
/// * `Err(CommandError::WrongNumberOfArguments)` - If argument parsing fails
///
/// # Protocol Response
///
/// `+FULLRESYNC <repl_id> 0\r\n$88\r\n<88 snapshot bytes>`
pub fn psync(engine: &mut Engine, arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    let psync_arguments = PsyncArguments::parse(arguments)?;

    if engine.replication.role() != Role::Master {
        return Err(CommandError::NotAMaster);
    }

    debug!(
        requested_id = %psync_arguments.master_repl_id,
        requested_offset = psync_arguments.offset,
        "full resync requested"
    );

    Ok(CommandResult::Sync(full_resync_payload(
        engine.replication.replication_id(),
    )))
}
