use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    resp::RespValue,
    store::Store,
};

pub struct ZcardArguments {
    key: String,
}

impl ZcardArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::wrong_arguments("zcard"));
        }

        Ok(Self {
            key: arguments[0].clone(),
        })
    }
}

pub fn zcard(store: &mut Store, arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    let zcard_arguments = ZcardArguments::parse(arguments)?;
    let cardinality = store
        .sorted_set(&zcard_arguments.key)?
        .map(|set| set.len())
        .unwrap_or(0);

    Ok(CommandResult::Response(RespValue::Integer(cardinality as i64)))
}
