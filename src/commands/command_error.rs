use thiserror::Error;

use crate::{
    resp::RespValue,
    store::{StoreError, StreamError},
};

#[derive(Error, Debug, PartialEq, Clone)]
pub enum CommandError {
    #[error("Invalid command")]
    InvalidCommand,
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("wrong number of arguments for '{0}' command")]
    WrongNumberOfArguments(String),
    #[error("syntax error")]
    SyntaxError,
    #[error("value is not an integer or out of range")]
    NotAnInteger,
    #[error("value is not a valid float")]
    NotAFloat,
    #[error("timeout is not a float or out of range")]
    InvalidTimeout,
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),
    #[error("invalid expire time in 'set' command")]
    InvalidExpireTime,
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,
    #[error(transparent)]
    Stream(#[from] StreamError),
    #[error("MULTI calls can not be nested")]
    NestedMulti,
    #[error("EXEC without MULTI")]
    ExecWithoutMulti,
    #[error("DISCARD without MULTI")]
    DiscardWithoutMulti,
    #[error(
        "Can't execute '{0}': only (P|S)SUBSCRIBE / (P|S)UNSUBSCRIBE / PING / QUIT / RESET are allowed in this context"
    )]
    NotAllowedWhileSubscribed(String),
    #[error("You can't write against a read only replica.")]
    ReadOnlyReplica,
    #[error("Replication commands are not accepted by a replica")]
    NotAMaster,
}

impl CommandError {
    /// Wire reply for this error. Everything but WRONGTYPE carries the
    /// generic `ERR` prefix.
    pub fn as_resp(&self) -> RespValue {
        match self {
            CommandError::WrongType => RespValue::Error(self.to_string()),
            _ => RespValue::Error(format!("ERR {}", self)),
        }
    }

    pub fn wrong_arguments(command: &str) -> Self {
        CommandError::WrongNumberOfArguments(command.to_lowercase())
    }
}

impl From<StoreError> for CommandError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::WrongType => CommandError::WrongType,
            StoreError::NotAnInteger => CommandError::NotAnInteger,
            StoreError::Stream(e) => CommandError::Stream(e),
        }
    }
}
