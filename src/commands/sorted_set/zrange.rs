use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    resp::RespValue,
    store::Store,
};

pub struct ZrangeArguments {
    key: String,
    start: i64,
    end: i64,
}

impl ZrangeArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 3 {
            return Err(CommandError::wrong_arguments("zrange"));
        }

        let (Ok(start), Ok(end)) = (arguments[1].parse::<i64>(), arguments[2].parse::<i64>())
        else {
            return Err(CommandError::NotAnInteger);
        };

        Ok(Self {
            key: arguments[0].clone(),
            start,
            end,
        })
    }
}

/// Members between two ranks, lowest score first. Ranks follow the same
/// negative-index rules as LRANGE.
pub fn zrange(store: &mut Store, arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    let zrange_arguments = ZrangeArguments::parse(arguments)?;

    let members = store
        .sorted_set(&zrange_arguments.key)?
        .map(|set| set.range(zrange_arguments.start, zrange_arguments.end))
        .unwrap_or_default()
        .into_iter()
        .map(|(member, _)| member);

    Ok(CommandResult::Response(RespValue::bulk_string_array(members)))
}
