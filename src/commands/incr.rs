use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    resp::RespValue,
    store::Store,
};

pub struct IncrArguments {
    key: String,
}

impl IncrArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::wrong_arguments("incr"));
        }

        Ok(Self {
            key: arguments[0].clone(),
        })
    }
}

/// Handles the Redis INCR command.
///
/// Adds one to the integer stored at the key and replies with the new value.
/// A missing key starts from 0, so the first INCR replies 1. A value that does
/// not parse as a 64-bit integer, or would overflow, is rejected with
/// `ERR value is not an integer or out of range`.
pub fn incr(store: &mut Store, arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    let incr_arguments = IncrArguments::parse(arguments)?;
    let value = store.incr(&incr_arguments.key)?;

    Ok(CommandResult::Response(RespValue::Integer(value)))
}
