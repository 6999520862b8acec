use globset::Glob;

use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    resp::RespValue,
    store::Store,
};

pub struct KeysArguments {
    pattern: String,
}

impl KeysArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::wrong_arguments("keys"));
        }

        Ok(Self {
            pattern: arguments[0].clone(),
        })
    }
}

/// Lists the live and snapshot keys matching a glob pattern, sorted.
pub fn keys(store: &mut Store, arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    let keys_arguments = KeysArguments::parse(arguments)?;

    let glob = Glob::new(&keys_arguments.pattern)
        .map_err(|e| CommandError::InvalidPattern(e.to_string()))?
        .compile_matcher();

    let matching = store
        .keys()
        .into_iter()
        .filter(|key| glob.is_match(key))
        .map(RespValue::BulkString)
        .collect();

    Ok(CommandResult::Response(RespValue::Array(matching)))
}
