use crate::{
    blocking::{is_past, StreamWaiter},
    commands::{
        command_error::CommandError,
        command_handler::CommandResult,
        stream_utils::{entries_to_resp, validate_read_id},
    },
    engine::Engine,
    resp::RespValue,
    session::ClientId,
    store::{now_millis, Store, StoreError, StreamId},
};

/// Represents the parsed arguments for the XREAD command
#[derive(Debug, PartialEq)]
pub struct XreadArguments {
    /// Milliseconds to block for; `Some(0)` blocks forever
    block_millis: Option<u64>,
    /// Maximum number of entries returned per stream
    count: Option<usize>,
    /// Stream keys paired with the id entries must come after, `$` unresolved
    streams: Vec<(String, String)>,
}

impl XreadArguments {
    /// Parses `XREAD [COUNT n] [BLOCK ms] STREAMS key [key ...] id [id ...]`.
    ///
    /// # Returns
    ///
    /// * `Ok(XreadArguments)` - Successfully parsed arguments
    /// * `Err(CommandError::SyntaxError)` - If STREAMS is missing, an option is
    ///   unknown, or the keys and ids do not pair up
    /// * `Err(CommandError::NotAnInteger)` - If COUNT or BLOCK is not a number
    /// * `Err(CommandError::Stream)` - If an id is neither `$` nor a stream id
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        let mut block_millis = None;
        let mut count = None;
        let mut position = 0;

        loop {
            let Some(option) = arguments.get(position) else {
                return Err(CommandError::SyntaxError);
            };

            match option.to_uppercase().as_str() {
                "BLOCK" => {
                    let value = arguments.get(position + 1).ok_or(CommandError::SyntaxError)?;
                    block_millis = Some(
                        value
                            .parse::<u64>()
                            .map_err(|_| CommandError::NotAnInteger)?,
                    );
                    position += 2;
                }
                "COUNT" => {
                    let value = arguments.get(position + 1).ok_or(CommandError::SyntaxError)?;
                    count = Some(
                        value
                            .parse::<usize>()
                            .map_err(|_| CommandError::NotAnInteger)?,
                    );
                    position += 2;
                }
                "STREAMS" => {
                    position += 1;
                    break;
                }
                _ => return Err(CommandError::SyntaxError),
            }
        }

        let rest = &arguments[position..];
        if rest.is_empty() || rest.len() % 2 != 0 {
            return Err(CommandError::SyntaxError);
        }

        let (keys, ids) = rest.split_at(rest.len() / 2);
        for id in ids {
            validate_read_id(id)?;
        }

        Ok(Self {
            block_millis,
            count,
            streams: keys.iter().cloned().zip(ids.iter().cloned()).collect(),
        })
    }
}

/// Reads every stream past its id. `None` when no stream has new entries.
fn read_streams(
    store: &mut Store,
    streams: &[(String, StreamId)],
    count: Option<usize>,
) -> Result<Option<RespValue>, StoreError> {
    let mut response = Vec::new();

    for (key, after) in streams {
        let mut entries = store.stream_entries_after(key, *after)?;
        if let Some(count) = count {
            entries.truncate(count);
        }

        if !entries.is_empty() {
            response.push(RespValue::Array(vec![
                RespValue::BulkString(key.clone()),
                entries_to_resp(&entries),
            ]));
        }
    }

    Ok((!response.is_empty()).then_some(RespValue::Array(response)))
}

/// Handles the Redis XREAD command.
///
/// Replies with `[[key, [entry, ...]], ...]` for every stream holding entries
/// newer than the given id. When none do and BLOCK was given, the session is
/// suspended until an XADD reaches one of the streams or the block time
/// passes. `$` means "only entries added from now on" and is resolved to the
/// stream's current top id here, not when the client is later served.
///
/// Nothing to read, or a block that timed out, replies with a null bulk
/// string.
///
/// # Examples
///
/// ```ignore
/// // XREAD BLOCK 1000 STREAMS sensor $
/// // Returns: Blocked, later [["sensor", [["1-1", ["temp", "36"]]]]] or "$-1\r\n"
/// ```
pub fn xread(
    engine: &mut Engine,
    client_id: ClientId,
    arguments: Vec<String>,
    allow_blocking: bool,
) -> Result<CommandResult, CommandError> {
    let xread_arguments = XreadArguments::parse(arguments)?;

    let mut streams = Vec::with_capacity(xread_arguments.streams.len());
    for (key, id) in xread_arguments.streams {
        let after = match id.as_str() {
            "$" => engine.store.stream_last_id(&key)?,
            _ => id.parse::<StreamId>()?,
        };
        streams.push((key, after));
    }

    if let Some(response) = read_streams(&mut engine.store, &streams, xread_arguments.count)? {
        return Ok(CommandResult::Response(response));
    }

    let Some(block_millis) = xread_arguments.block_millis.filter(|_| allow_blocking) else {
        return Ok(CommandResult::Response(RespValue::NullBulkString));
    };

    let deadline = (block_millis > 0).then(|| now_millis().saturating_add(block_millis));
    engine.waiters.block_on_streams(StreamWaiter {
        client_id,
        streams,
        count: xread_arguments.count,
        deadline,
    });

    Ok(CommandResult::Blocked)
}

/// Serves blocked XREAD clients whose streams received entries, in the order
/// they blocked, and times out the rest once their deadline passes.
pub fn serve_stream_waiters(engine: &mut Engine, now: u64) {
    let mut waiting = engine.waiters.take_stream_waiters();
    let mut still_waiting = std::collections::VecDeque::with_capacity(waiting.len());

    while let Some(waiter) = waiting.pop_front() {
        let response = match read_streams(&mut engine.store, &waiter.streams, waiter.count) {
            Ok(response) => response,
            Err(e) => Some(CommandError::from(e).as_resp()),
        };

        match response {
            Some(response) => engine.complete_blocked(waiter.client_id, response),
            None if is_past(waiter.deadline, now) => {
                engine.complete_blocked(waiter.client_id, RespValue::NullBulkString)
            }
            None => still_waiting.push_back(waiter),
        }
    }

    engine.waiters.restore_stream_waiters(still_waiting);
}
