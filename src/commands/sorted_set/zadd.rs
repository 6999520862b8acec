use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    resp::RespValue,
    store::Store,
};

pub struct ZaddArguments {
    key: String,
    members: Vec<(f64, String)>,
}

impl ZaddArguments {
    /// Parses `ZADD key score member [score member ...]`.
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() < 3 || arguments.len() % 2 == 0 {
            return Err(CommandError::wrong_arguments("zadd"));
        }

        let members = arguments[1..]
            .chunks(2)
            .map(|pair| {
                let score = pair[0]
                    .parse::<f64>()
                    .ok()
                    .filter(|score| !score.is_nan())
                    .ok_or(CommandError::NotAFloat)?;
                Ok((score, pair[1].clone()))
            })
            .collect::<Result<Vec<_>, CommandError>>()?;

        Ok(Self {
            key: arguments[0].clone(),
            members,
        })
    }
}

/// Handles the Redis ZADD command.
///
/// Sets the score of every given member, creating the sorted set if needed.
/// Replies with the number of members that were not in the set before, so
/// re-adding an existing member replies 0 and only updates its score.
///
/// # Examples
///
/// ```ignore
/// // ZADD racers 1 alice 2 bob
/// // Returns: Integer(2)
///
/// // ZADD racers 5 alice
/// // Returns: Integer(0)
/// ```
pub fn zadd(store: &mut Store, arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    let zadd_arguments = ZaddArguments::parse(arguments)?;
    let added = store.zadd(&zadd_arguments.key, zadd_arguments.members)?;

    Ok(CommandResult::Response(RespValue::Integer(added as i64)))
}
