use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    resp::RespValue,
};

/// PING from a subscribed session replies `["pong", message]`, the message
/// defaulting to an empty string.
pub fn ping(arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    if arguments.len() > 1 {
        return Err(CommandError::wrong_arguments("ping"));
    }

    let message = arguments.into_iter().next().unwrap_or_default();

    Ok(CommandResult::Response(RespValue::bulk_string_array([
        "pong".to_string(),
        message,
    ])))
}
