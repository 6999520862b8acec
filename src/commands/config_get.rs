use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    config::ConfigSource,
    resp::RespValue,
};

pub struct ConfigGetArguments {
    parameters: Vec<String>,
}

impl ConfigGetArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.is_empty() {
            return Err(CommandError::wrong_arguments("config|get"));
        }

        Ok(ConfigGetArguments {
            parameters: arguments,
        })
    }
}

/// Replies with a flat `[name, value, ...]` array for every known parameter
/// requested. `dir` and `dbfilename` are the only known ones; others are
/// skipped.
pub fn config_get(
    config: &dyn ConfigSource,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let config_get_arguments = ConfigGetArguments::parse(arguments)?;
    let mut response = Vec::new();

    for parameter in config_get_arguments.parameters {
        let value = match parameter.to_lowercase().as_str() {
            "dir" => config.dir().display().to_string(),
            "dbfilename" => config.dbfilename().to_string(),
            _ => continue,
        };

        response.push(RespValue::BulkString(parameter.to_lowercase()));
        response.push(RespValue::BulkString(value));
    }

    Ok(CommandResult::Response(RespValue::Array(response)))
}
