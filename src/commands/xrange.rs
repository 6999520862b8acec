use crate::{
    commands::{
        command_error::CommandError, command_handler::CommandResult,
        stream_utils::entries_to_resp,
    },
    store::{Store, StreamId},
};

pub struct XrangeArguments {
    key: String,
    start: StreamId,
    end: StreamId,
}

impl XrangeArguments {
    /// `XRANGE key [start [end]]`. Missing bounds default to `-` and `+`.
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.is_empty() || arguments.len() > 3 {
            return Err(CommandError::wrong_arguments("xrange"));
        }

        let start = match arguments.get(1) {
            Some(start) => StreamId::parse_bound(start, false)?,
            None => StreamId::MIN,
        };
        let end = match arguments.get(2) {
            Some(end) => StreamId::parse_bound(end, true)?,
            None => StreamId::MAX,
        };

        Ok(Self {
            key: arguments[0].clone(),
            start,
            end,
        })
    }
}

/// Entries with ids in the inclusive range, oldest first. A bare millisecond
/// bound covers every sequence of that millisecond.
pub fn xrange(store: &mut Store, arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    let xrange_arguments = XrangeArguments::parse(arguments)?;

    let entries = store.stream_range(
        &xrange_arguments.key,
        xrange_arguments.start,
        xrange_arguments.end,
    )?;

    Ok(CommandResult::Response(entries_to_resp(&entries)))
}
