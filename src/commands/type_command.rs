use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    resp::RespValue,
    store::Store,
};

pub struct TypeArguments {
    key: String,
}

impl TypeArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::wrong_arguments("type"));
        }

        Ok(Self {
            key: arguments[0].clone(),
        })
    }
}

/// Replies with `string`, `list`, `stream`, `zset` or `none`.
pub fn type_command(
    store: &mut Store,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let type_arguments = TypeArguments::parse(arguments)?;
    let type_name = store.type_of(&type_arguments.key);

    Ok(CommandResult::Response(RespValue::SimpleString(
        type_name.to_string(),
    )))
}
