use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    resp::RespValue,
    store::Store,
};

/// Represents the parsed arguments for the LRANGE command.
///
/// Holds the key and the raw start and end indices. Negative indices count
/// from the end of the list and are normalized against its length when the
/// command runs.
pub struct LrangeArguments {
    /// The key name to retrieve from the store
    key: String,
    /// The starting index for the range (can be negative to count from the end)
    start_index: i64,
    /// The ending index for the range (can be negative to count from the end)
    end_index: i64,
}

impl LrangeArguments {
    /// Parses and validates the arguments for the LRANGE command.
    ///
    /// # Arguments
    ///
    /// * `arguments` - A vector of command arguments: [key, start_index, end_index]
    ///
    /// # Returns
    ///
    /// * `Ok(LrangeArguments)` - If the arguments are valid
    /// * `Err(CommandError::WrongNumberOfArguments)` - If the number of arguments is not exactly 3
    /// * `Err(CommandError::NotAnInteger)` - If start or end index is not a valid integer
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let args = LrangeArguments::parse(vec!["mylist".to_string(), "0".to_string(), "2".to_string()]).unwrap();
    /// assert_eq!(args.start_index, 0);
    /// assert_eq!(args.end_index, 2);
    ///
    /// let err = LrangeArguments::parse(vec!["mylist".to_string(), "a".to_string(), "2".to_string()]);
    /// assert!(err.is_err());
    /// ```
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 3 {
            return Err(CommandError::wrong_arguments("lrange"));
        }

        let Ok(start_index) = arguments[1].parse::<i64>() else {
            return Err(CommandError::NotAnInteger);
        };

        let Ok(end_index) = arguments[2].parse::<i64>() else {
            return Err(CommandError::NotAnInteger);
        };

        Ok(Self {
            key: arguments[0].clone(),
            start_index,
            end_index,
        })
    }
}

/// Handles the Redis LRANGE command.
///
/// Returns the elements between the two inclusive indices. An index more
/// negative than the list length clamps to the head, an end past the tail
/// clamps to the tail, and a missing key or empty selection yields an empty
/// array.
///
/// # Examples
///
/// ```ignore
/// // LRANGE mylist -2 -1  (last 2 elements)
/// let result = lrange(&mut store, vec!["mylist".to_string(), "-2".to_string(), "-1".to_string()]);
/// // Returns: "*2\r\n$4\r\nval4\r\n$4\r\nval5\r\n"
/// ```
pub fn lrange(store: &mut Store, arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    let lrange_arguments = LrangeArguments::parse(arguments)?;

    let range = store.list_range(
        &lrange_arguments.key,
        lrange_arguments.start_index,
        lrange_arguments.end_index,
    )?;

    Ok(CommandResult::Response(RespValue::bulk_string_array(range)))
}
