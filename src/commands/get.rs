use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    resp::RespValue,
    store::Store,
};

pub struct GetArguments {
    key: String,
}

impl GetArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::wrong_arguments("get"));
        }

        Ok(Self {
            key: arguments[0].clone(),
        })
    }
}

/// Handles the Redis GET command.
///
/// Retrieves the string stored at a key. Expired keys are dropped on access
/// and keys missing from memory are looked up in the startup snapshot.
///
/// # Arguments
///
/// * `store` - The keyspace
/// * `arguments` - Exactly one element: the key to retrieve
///
/// # Returns
///
/// * `Ok(CommandResult::Response)` - A bulk string with the value, or a null
///   bulk string when the key is missing or expired
/// * `Err(CommandError::WrongType)` - If the key holds a list, stream or sorted set
/// * `Err(CommandError::WrongNumberOfArguments)` - If the number of arguments is not exactly 1
///
/// # Examples
///
/// ```ignore
/// // GET mykey
/// let result = get(&mut store, vec!["mykey".to_string()]);
/// // Returns: "$5\r\nhello\r\n" or "$-1\r\n"
/// ```
pub fn get(store: &mut Store, arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    let get_arguments = GetArguments::parse(arguments)?;

    let response = match store.get_string(&get_arguments.key)? {
        Some(value) => RespValue::BulkString(value),
        None => RespValue::NullBulkString,
    };

    Ok(CommandResult::Response(response))
}
