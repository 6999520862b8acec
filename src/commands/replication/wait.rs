use std::collections::HashSet;

use crate::{
    blocking::PendingWait,
    commands::{command_error::CommandError, command_handler::CommandResult},
    engine::Engine,
    resp::RespValue,
    session::ClientId,
    store::now_millis,
};

/// Represents the parsed arguments for the WAIT command
#[derive(Debug, PartialEq)]
pub struct WaitArguments {
    number_of_replicas: usize,
    /// Milliseconds; `0` waits until enough replicas answered.
    timeout_ms: u64,
}

impl WaitArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 2 {
            return Err(CommandError::wrong_arguments("wait"));
        }

        let number_of_replicas = arguments[0]
            .parse::<usize>()
            .map_err(|_| CommandError::NotAnInteger)?;
        let timeout_ms = arguments[1]
            .parse::<u64>()
            .map_err(|_| CommandError::NotAnInteger)?;

        Ok(Self {
            number_of_replicas,
            timeout_ms,
        })
    }
}

/// The probe a master sends to make every replica report its offset.
pub fn getack_probe() -> RespValue {
    RespValue::bulk_string_array(["REPLCONF", "GETACK", "*"])
}

/// Handles the Redis WAIT command.
///
/// WAIT only has something to wait for right after a SET on a master with
/// replicas attached. In every other case it replies at once with the number
/// of connected replicas.
///
/// Otherwise the master offset reached so far becomes the target, a
/// `REPLCONF GETACK *` probe is propagated, and the session is suspended
/// until `max(numreplicas, connected replicas)` replicas acknowledged the
/// target or the timeout passed. The reply is the number of acknowledgments
/// actually received.
///
/// # Examples
///
/// ```ignore
/// // SET a 1, then WAIT 1 500 with one replica attached
/// // Returns: Blocked, later Integer(1)
///
/// // WAIT 3 500 with no replica attached
/// // Returns: Response(Integer(0))
/// ```
pub fn wait(
    engine: &mut Engine,
    client_id: ClientId,
    arguments: Vec<String>,
    allow_blocking: bool,
) -> Result<CommandResult, CommandError> {
    let wait_arguments = WaitArguments::parse(arguments)?;

    let replica_count = engine.registry.replicas().count();
    let follows_set = engine
        .registry
        .get(client_id)
        .and_then(|session| session.last_command.as_deref())
        == Some("SET");

    if !follows_set || !allow_blocking || replica_count == 0 {
        return Ok(CommandResult::Response(RespValue::Integer(
            replica_count as i64,
        )));
    }

    let target_offset = engine.replication.offset();
    engine.propagate(&getack_probe());

    let deadline =
        (wait_arguments.timeout_ms > 0).then(|| now_millis().saturating_add(wait_arguments.timeout_ms));
    engine.waiters.start_wait(PendingWait {
        client_id,
        required_acks: wait_arguments.number_of_replicas.max(replica_count),
        acked: HashSet::new(),
        target_offset,
        deadline,
    });

    Ok(CommandResult::Blocked)
}

/// Replies to every WAIT that has enough acknowledgments or ran out of time.
pub fn finish_waits(engine: &mut Engine, now: u64) {
    for wait in engine.waiters.take_finished_waits(now) {
        engine.complete_blocked(
            wait.client_id,
            RespValue::Integer(wait.received_acks() as i64),
        );
    }
}
