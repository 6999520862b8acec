use tracing::debug;

use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult, CommandHandler},
    engine::Engine,
    resp::RespValue,
    session::{ClientId, ClientSession},
};

pub struct ExecArguments;

impl ExecArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if !arguments.is_empty() {
            return Err(CommandError::wrong_arguments("exec"));
        }

        Ok(Self)
    }
}

/// Handles the Redis EXEC command.
///
/// Closes the transaction and hands its queued commands back to the engine,
/// which replays them through [`run_transaction`]. An empty transaction
/// replies with an empty array straight away.
///
/// # Returns
///
/// * `Ok(CommandResult::Batch)` - The queued commands, in the order they were sent
/// * `Ok(CommandResult::Response)` - `*0\r\n` for an empty transaction
/// * `Err(CommandError::ExecWithoutMulti)` - If no transaction is open
pub fn exec(
    session: Option<&mut ClientSession>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    ExecArguments::parse(arguments)?;

    let Some(session) = session else {
        return Ok(CommandResult::NoResponse);
    };

    let Some(transaction) = session.transaction.take() else {
        return Err(CommandError::ExecWithoutMulti);
    };

    if transaction.is_empty() {
        Ok(CommandResult::Response(RespValue::Array(Vec::new())))
    } else {
        Ok(CommandResult::Batch(transaction))
    }
}

/// Runs queued commands one after another and collects one reply per
/// command. A failing command contributes its error reply and does not stop
/// the ones after it. Nothing inside a transaction blocks.
pub fn run_transaction(
    engine: &mut Engine,
    client_id: ClientId,
    commands: Vec<CommandHandler>,
) -> RespValue {
    let mut responses = Vec::with_capacity(commands.len());

    for command in commands {
        match command.handle(engine, client_id, false) {
            Ok(CommandResult::Response(response)) => responses.push(response),
            Ok(CommandResult::Replies(replies)) => responses.extend(replies),
            Ok(other) => {
                debug!(client_id, command = %command.name, result = ?other, "no reply inside transaction");
                responses.push(RespValue::NullBulkString);
            }
            Err(e) => responses.push(e.as_resp()),
        }
    }

    RespValue::Array(responses)
}
