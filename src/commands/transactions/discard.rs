use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    resp::RespValue,
    session::ClientSession,
};

pub struct DiscardArguments;

impl DiscardArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if !arguments.is_empty() {
            return Err(CommandError::wrong_arguments("discard"));
        }

        Ok(Self)
    }
}

/// Drops the queued commands and leaves the transaction.
pub fn discard(
    session: Option<&mut ClientSession>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    DiscardArguments::parse(arguments)?;

    let Some(session) = session else {
        return Ok(CommandResult::NoResponse);
    };

    match session.transaction.take() {
        Some(_) => Ok(CommandResult::Response(RespValue::SimpleString(
            "OK".to_string(),
        ))),
        None => Err(CommandError::DiscardWithoutMulti),
    }
}
