use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    resp::RespValue,
    store::Store,
};

pub struct LlenArguments {
    key: String,
}

impl LlenArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::wrong_arguments("llen"));
        }

        Ok(Self {
            key: arguments[0].clone(),
        })
    }
}

/// Length of the list, 0 when the key is missing.
pub fn llen(store: &mut Store, arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    let llen_arguments = LlenArguments::parse(arguments)?;
    let length = store.list_len(&llen_arguments.key)?;

    Ok(CommandResult::Response(RespValue::Integer(length as i64)))
}
