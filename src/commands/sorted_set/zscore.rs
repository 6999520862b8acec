use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    resp::RespValue,
    store::Store,
};

pub struct ZscoreArguments {
    key: String,
    member: String,
}

impl ZscoreArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 2 {
            return Err(CommandError::wrong_arguments("zscore"));
        }

        Ok(Self {
            key: arguments[0].clone(),
            member: arguments[1].clone(),
        })
    }
}

/// The member's score as a bulk string, e.g. `"1.5"` or `"2"`.
pub fn zscore(store: &mut Store, arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    let zscore_arguments = ZscoreArguments::parse(arguments)?;

    let score = store
        .sorted_set(&zscore_arguments.key)?
        .and_then(|set| set.score(&zscore_arguments.member));

    let response = match score {
        Some(score) => RespValue::BulkString(score.to_string()),
        None => RespValue::NullBulkString,
    };

    Ok(CommandResult::Response(response))
}
