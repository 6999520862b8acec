use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    resp::RespValue,
    session::ConnectionRegistry,
};

pub struct PublishArguments {
    channel: String,
    message: String,
}

impl PublishArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 2 {
            return Err(CommandError::wrong_arguments("publish"));
        }

        Ok(Self {
            channel: arguments[0].clone(),
            message: arguments[1].clone(),
        })
    }
}

/// Sends `["message", channel, message]` to every session subscribed to the
/// channel and replies with how many received it.
pub fn publish(
    registry: &ConnectionRegistry,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let publish_arguments = PublishArguments::parse(arguments)?;

    let message = RespValue::bulk_string_array([
        "message",
        publish_arguments.channel.as_str(),
        publish_arguments.message.as_str(),
    ]);

    let mut receivers = 0;
    for session in registry.subscribers_of(&publish_arguments.channel) {
        session.send(&message);
        receivers += 1;
    }

    Ok(CommandResult::Response(RespValue::Integer(receivers)))
}
