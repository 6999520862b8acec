use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    resp::RespValue,
    store::Store,
};

pub struct LpopArguments {
    key: String,
    /// `None` for the single-element form, which replies with a bulk string.
    count: Option<usize>,
}

impl LpopArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.is_empty() || arguments.len() > 2 {
            return Err(CommandError::wrong_arguments("lpop"));
        }

        let count = match arguments.get(1) {
            Some(count) => Some(
                count
                    .parse::<usize>()
                    .map_err(|_| CommandError::NotAnInteger)?,
            ),
            None => None,
        };

        Ok(Self {
            key: arguments[0].clone(),
            count,
        })
    }
}

/// Handles the Redis LPOP command.
///
/// # Returns
///
/// * `LPOP key` - The head element as a bulk string, or a null bulk string
///   when the list is missing
/// * `LPOP key count` - An array with up to `count` elements from the head,
///   or a null bulk string when the list is missing
///
/// A list emptied by the pop is removed from the keyspace.
pub fn lpop(store: &mut Store, arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    let lpop_arguments = LpopArguments::parse(arguments)?;
    let popped = store.pop_front(&lpop_arguments.key, lpop_arguments.count.unwrap_or(1))?;

    let response = match (lpop_arguments.count, popped.is_empty()) {
        (_, true) => RespValue::NullBulkString,
        (Some(_), false) => RespValue::bulk_string_array(popped),
        (None, false) => popped
            .into_iter()
            .next()
            .map(RespValue::BulkString)
            .unwrap_or(RespValue::NullBulkString),
    };

    Ok(CommandResult::Response(response))
}
