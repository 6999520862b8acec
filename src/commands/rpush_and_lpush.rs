use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    resp::RespValue,
    store::Store,
};

pub struct PushArguments {
    key: String,
    values: Vec<String>,
}

impl PushArguments {
    pub fn parse(command: &str, arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() < 2 {
            return Err(CommandError::wrong_arguments(command));
        }

        Ok(Self {
            key: arguments[0].clone(),
            values: arguments[1..].to_vec(),
        })
    }
}

/// Handles the Redis RPUSH command.
///
/// Appends every value to the tail of the list, creating the list when the key
/// is missing, and replies with the list length after the push. Clients blocked
/// in BLPOP on this key are served by the engine once the command returns.
///
/// # Examples
///
/// ```ignore
/// // RPUSH fruits apple banana
/// let result = rpush(&mut store, vec!["fruits".into(), "apple".into(), "banana".into()]);
/// // Returns: Integer(2)
/// ```
pub fn rpush(store: &mut Store, arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    let push_arguments = PushArguments::parse("rpush", arguments)?;
    let length = store.push_back(&push_arguments.key, push_arguments.values)?;

    Ok(CommandResult::Response(RespValue::Integer(length as i64)))
}

/// Handles the Redis LPUSH command.
///
/// Prepends the values one after another, so `LPUSH fruits a b c` leaves
/// `c` at the head.
pub fn lpush(store: &mut Store, arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    let push_arguments = PushArguments::parse("lpush", arguments)?;
    let length = store.push_front(&push_arguments.key, push_arguments.values)?;

    Ok(CommandResult::Response(RespValue::Integer(length as i64)))
}
