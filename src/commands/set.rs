use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    resp::RespValue,
    store::{now_millis, DataType, Store},
};

/// Represents the parsed arguments for the SET command
pub struct SetArguments {
    /// The key name to store the value under
    key: String,
    /// The value to be stored under the given key
    value: String,
    /// Time to live in milliseconds
    ttl_millis: Option<u64>,
}

impl SetArguments {
    /// Parses command arguments into a SetArguments structure.
    ///
    /// Two shapes are accepted: a plain key-value pair, and a key-value pair
    /// followed by an expiration option.
    ///
    /// # Arguments
    ///
    /// * `arguments` - A vector of strings representing the command arguments:
    ///   - Format 1: `[key, value]` - For permanent storage
    ///   - Format 2: `[key, value, "PX", milliseconds]` - Expires after the given milliseconds
    ///   - Format 3: `[key, value, "EX", seconds]` - Expires after the given seconds
    ///
    /// # Returns
    ///
    /// * `Ok(SetArguments)` - Successfully parsed arguments
    /// * `Err(CommandError::WrongNumberOfArguments)` - If the number of arguments is not 2 or 4
    /// * `Err(CommandError::SyntaxError)` - If the expiration option is neither "PX" nor "EX"
    /// * `Err(CommandError::NotAnInteger)` - If the expiration time is not a valid integer
    /// * `Err(CommandError::InvalidExpireTime)` - If the expiration time is zero
    ///
    /// # Examples
    ///
    /// ```ignore
    /// // SET with expiration (expires in 1000ms)
    /// let result = SetArguments::parse(vec![
    ///     "mykey".to_string(),
    ///     "hello".to_string(),
    ///     "PX".to_string(),
    ///     "1000".to_string()
    /// ]);
    /// // Returns: Ok(SetArguments { key: "mykey", value: "hello", ttl_millis: Some(1000) })
    ///
    /// // Invalid expiration option
    /// let result = SetArguments::parse(vec![
    ///     "mykey".to_string(),
    ///     "hello".to_string(),
    ///     "KEEP".to_string(),
    ///     "1000".to_string()
    /// ]);
    /// // Returns: Err(CommandError::SyntaxError)
    /// ```
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 2 && arguments.len() != 4 {
            return Err(CommandError::wrong_arguments("set"));
        }

        let mut ttl_millis = None;

        if arguments.len() == 4 {
            let unit = match arguments[2].to_uppercase().as_str() {
                "PX" => 1,
                "EX" => 1_000,
                _ => return Err(CommandError::SyntaxError),
            };

            let Ok(amount) = arguments[3].parse::<u64>() else {
                return Err(CommandError::NotAnInteger);
            };

            if amount == 0 {
                return Err(CommandError::InvalidExpireTime);
            }

            ttl_millis = Some(amount.saturating_mul(unit));
        }

        Ok(Self {
            key: arguments[0].clone(),
            value: arguments[1].clone(),
            ttl_millis,
        })
    }
}

/// Handles the Redis SET command.
///
/// Stores a string under a key, replacing whatever the key held before,
/// whatever its type. With PX or EX the key expires after the given time.
///
/// # Returns
///
/// * `Ok(CommandResult::Response)` - `+OK`
/// * `Err(CommandError)` - See [`SetArguments::parse`]
pub fn set(store: &mut Store, arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    let set_arguments = SetArguments::parse(arguments)?;

    let expires_at = set_arguments
        .ttl_millis
        .map(|ttl| now_millis().saturating_add(ttl));

    store.put(
        &set_arguments.key,
        DataType::String(set_arguments.value),
        expires_at,
    );

    Ok(CommandResult::Response(RespValue::SimpleString(
        "OK".to_string(),
    )))
}
