use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    resp::RespValue,
    store::Store,
};

pub struct ZremArguments {
    key: String,
    members: Vec<String>,
}

impl ZremArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() < 2 {
            return Err(CommandError::wrong_arguments("zrem"));
        }

        Ok(Self {
            key: arguments[0].clone(),
            members: arguments[1..].to_vec(),
        })
    }
}

/// Removes the members and replies with how many existed. An emptied set is
/// deleted.
pub fn zrem(store: &mut Store, arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    let zrem_arguments = ZremArguments::parse(arguments)?;
    let removed = store.zrem(&zrem_arguments.key, &zrem_arguments.members)?;

    Ok(CommandResult::Response(RespValue::Integer(removed as i64)))
}
