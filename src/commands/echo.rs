use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    resp::RespValue,
};

pub struct EchoArguments {
    message: String,
}

impl EchoArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::wrong_arguments("echo"));
        }

        Ok(Self {
            message: arguments[0].clone(),
        })
    }
}

/// Handles the Redis ECHO command.
///
/// Returns the exact string provided as an argument.
///
/// # Examples
///
/// ```ignore
/// // ECHO "hello world"
/// let result = echo(vec!["hello world".to_string()]);
/// // Returns: BulkString("hello world"), "$11\r\nhello world\r\n" on the wire
/// ```
pub fn echo(arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    let echo_arguments = EchoArguments::parse(arguments)?;

    Ok(CommandResult::Response(RespValue::BulkString(
        echo_arguments.message,
    )))
}
