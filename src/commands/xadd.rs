use crate::{
    commands::{
        command_error::CommandError, command_handler::CommandResult,
        stream_utils::parse_field_pairs,
    },
    resp::RespValue,
    store::{Store, StreamIdRequest},
};

pub struct XaddArguments {
    key: String,
    id: StreamIdRequest,
    fields: Vec<(String, String)>,
}

impl XaddArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() < 4 {
            return Err(CommandError::wrong_arguments("xadd"));
        }

        Ok(Self {
            key: arguments[0].clone(),
            id: arguments[1].parse()?,
            fields: parse_field_pairs(&arguments[2..])?,
        })
    }
}

/// Handles the Redis XADD command.
///
/// Appends an entry to the stream, creating the stream if needed, and replies
/// with the id the entry was stored under.
///
/// # Id forms
///
/// * `*` - Current time in milliseconds, sequence continuing from the last
///   entry of that millisecond
/// * `<ms>-*` - The given millisecond with the next free sequence
/// * `<ms>-<seq>` - Used as given, it must be greater than the stream top
///
/// # Errors
///
/// * `ERR The ID specified in XADD must be greater than 0-0`
/// * `ERR The ID specified in XADD is equal or smaller than the target stream top item`
/// * `WRONGTYPE ...` when the key holds something other than a stream
pub fn xadd(store: &mut Store, arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    let xadd_arguments = XaddArguments::parse(arguments)?;

    let id = store.stream_append(&xadd_arguments.key, xadd_arguments.id, xadd_arguments.fields)?;

    Ok(CommandResult::Response(RespValue::BulkString(id.to_string())))
}
