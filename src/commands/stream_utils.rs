use crate::{
    commands::command_error::CommandError,
    resp::RespValue,
    store::{StreamEntry, StreamError, StreamId},
};

/// Converts a stream entry to the RESP shape clients expect: a 2-element
/// array of the id and the flattened field/value list.
///
/// # Examples
///
/// ```ignore
/// // entry 1526919030474-0 with temperature=36 and humidity=95
/// // becomes ["1526919030474-0", ["temperature", "36", "humidity", "95"]]
/// ```
pub fn entry_to_resp(entry: &StreamEntry) -> RespValue {
    let fields = entry
        .fields
        .iter()
        .flat_map(|(field, value)| [field.clone(), value.clone()]);

    RespValue::Array(vec![
        RespValue::BulkString(entry.id.to_string()),
        RespValue::bulk_string_array(fields),
    ])
}

pub fn entries_to_resp(entries: &[StreamEntry]) -> RespValue {
    RespValue::Array(entries.iter().map(entry_to_resp).collect())
}

/// Parses the field/value pairs of XADD.
pub fn parse_field_pairs(arguments: &[String]) -> Result<Vec<(String, String)>, CommandError> {
    if arguments.is_empty() || arguments.len() % 2 != 0 {
        return Err(CommandError::wrong_arguments("xadd"));
    }

    Ok(arguments
        .chunks(2)
        .map(|pair| (pair[0].clone(), pair[1].clone()))
        .collect())
}

/// Validates an id given to XREAD, where `$` stands for the stream's last
/// entry at the time the command runs.
pub fn validate_read_id(id: &str) -> Result<(), StreamError> {
    if id == "$" {
        return Ok(());
    }

    id.parse::<StreamId>().map(|_| ())
}
