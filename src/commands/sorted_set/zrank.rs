use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    resp::RespValue,
    store::Store,
};

pub struct ZrankArguments {
    key: String,
    member: String,
}

impl ZrankArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 2 {
            return Err(CommandError::wrong_arguments("zrank"));
        }

        Ok(Self {
            key: arguments[0].clone(),
            member: arguments[1].clone(),
        })
    }
}

/// Zero-based position of the member by ascending score, ties ordered by
/// member. Null bulk string when the member or the set is missing.
pub fn zrank(store: &mut Store, arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    let zrank_arguments = ZrankArguments::parse(arguments)?;

    let rank = store
        .sorted_set(&zrank_arguments.key)?
        .and_then(|set| set.rank(&zrank_arguments.member));

    let response = match rank {
        Some(rank) => RespValue::Integer(rank as i64),
        None => RespValue::NullBulkString,
    };

    Ok(CommandResult::Response(response))
}
