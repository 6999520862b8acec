use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    resp::RespValue,
    session::ClientSession,
};

pub struct MultiArguments;

impl MultiArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if !arguments.is_empty() {
            return Err(CommandError::wrong_arguments("multi"));
        }

        Ok(Self)
    }
}

/// Opens a transaction. Until EXEC or DISCARD, every other command from this
/// session is queued and answered with `+QUEUED`.
pub fn multi(
    session: Option<&mut ClientSession>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    MultiArguments::parse(arguments)?;

    let Some(session) = session else {
        return Ok(CommandResult::NoResponse);
    };

    if session.transaction.is_some() {
        return Err(CommandError::NestedMulti);
    }

    session.transaction = Some(Vec::new());

    Ok(CommandResult::Response(RespValue::SimpleString(
        "OK".to_string(),
    )))
}
