use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    resp::RespValue,
    session::ClientSession,
};

pub struct SubscribeArguments {
    channels: Vec<String>,
}

impl SubscribeArguments {
    /// SUBSCRIBE needs at least one channel; UNSUBSCRIBE without channels
    /// leaves every channel.
    pub fn parse(command: &str, arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.is_empty() && command.eq_ignore_ascii_case("subscribe") {
            return Err(CommandError::wrong_arguments(command));
        }

        Ok(Self {
            channels: arguments,
        })
    }
}

fn confirmation(kind: &str, channel: &str, count: usize) -> RespValue {
    RespValue::Array(vec![
        RespValue::BulkString(kind.to_string()),
        RespValue::BulkString(channel.to_string()),
        RespValue::Integer(count as i64),
    ])
}

/// Handles the Redis SUBSCRIBE command.
///
/// Adds each channel to the session's subscriptions and replies once per
/// channel with `["subscribe", channel, subscription count]`. Once subscribed
/// the session may only run SUBSCRIBE, UNSUBSCRIBE, PING and QUIT.
///
/// # Examples
///
/// ```ignore
/// // SUBSCRIBE news sports
/// // Returns: Replies([["subscribe", "news", 1], ["subscribe", "sports", 2]])
/// ```
pub fn subscribe(
    session: Option<&mut ClientSession>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let subscribe_arguments = SubscribeArguments::parse("subscribe", arguments)?;

    let Some(session) = session else {
        return Ok(CommandResult::NoResponse);
    };

    let replies = subscribe_arguments
        .channels
        .into_iter()
        .map(|channel| {
            session.subscriptions.insert(channel.clone());
            confirmation("subscribe", &channel, session.subscriptions.len())
        })
        .collect();

    Ok(CommandResult::Replies(replies))
}

/// Handles the Redis UNSUBSCRIBE command.
///
/// Replies once per channel with `["unsubscribe", channel, remaining count]`.
/// Without arguments every subscription is dropped, and a session with none
/// gets a single reply with a null channel.
pub fn unsubscribe(
    session: Option<&mut ClientSession>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let unsubscribe_arguments = SubscribeArguments::parse("unsubscribe", arguments)?;

    let Some(session) = session else {
        return Ok(CommandResult::NoResponse);
    };

    let channels = match unsubscribe_arguments.channels.is_empty() {
        true => session.subscriptions.iter().cloned().collect(),
        false => unsubscribe_arguments.channels,
    };

    if channels.is_empty() {
        return Ok(CommandResult::Response(RespValue::Array(vec![
            RespValue::BulkString("unsubscribe".to_string()),
            RespValue::NullBulkString,
            RespValue::Integer(0),
        ])));
    }

    let replies = channels
        .into_iter()
        .map(|channel| {
            session.subscriptions.remove(&channel);
            confirmation("unsubscribe", &channel, session.subscriptions.len())
        })
        .collect();

    Ok(CommandResult::Replies(replies))
}
