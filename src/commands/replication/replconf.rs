//! REPLCONF command implementation for Redis replication configuration.
//!
//! REPLCONF carries the replica's half of the handshake (`listening-port`,
//! `capa`), the master's offset probe (`GETACK *`) and the replica's answer
//! to it (`ACK <offset>`).

use tracing::debug;

use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    engine::Engine,
    resp::RespValue,
    session::ClientId,
};

#[derive(Debug, PartialEq)]
enum ReplconfConfiguration {
    ListeningPort,
    Capabilities,
    GetAck,
    Ack(u64),
}

/// Represents the parsed arguments for the REPLCONF command.
#[derive(Debug, PartialEq)]
pub struct ReplconfArguments {
    configuration: ReplconfConfiguration,
}

impl ReplconfArguments {
    /// Parses and validates arguments for the REPLCONF command.
    ///
    /// # Arguments
    ///
    /// * `arguments` - Vector containing [option, value]
    ///
    /// # Returns
    ///
    /// * `Ok(ReplconfArguments)` - Successfully parsed arguments
    /// * `Err(CommandError::WrongNumberOfArguments)` - If not exactly 2 arguments
    /// * `Err(CommandError::NotAnInteger)` - If a port or offset is not a number
    /// * `Err(CommandError::SyntaxError)` - If the option is unknown
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 2 {
            return Err(CommandError::wrong_arguments("replconf"));
        }

        let configuration = match arguments[0].to_lowercase().as_str() {
            "listening-port" => {
                arguments[1]
                    .parse::<u16>()
                    .map_err(|_| CommandError::NotAnInteger)?;

                ReplconfConfiguration::ListeningPort
            }
            "capa" => ReplconfConfiguration::Capabilities,
            "getack" => {
                if arguments[1] != "*" {
                    return Err(CommandError::SyntaxError);
                }

                ReplconfConfiguration::GetAck
            }
            "ack" => ReplconfConfiguration::Ack(
                arguments[1]
                    .parse::<u64>()
                    .map_err(|_| CommandError::NotAnInteger)?,
            ),
            _ => return Err(CommandError::SyntaxError),
        };

        Ok(Self { configuration })
    }
}

/// Handles the Redis REPLCONF command.
///
/// # Returns
///
/// * `+OK` for `listening-port` and `capa`
/// * `["REPLCONF", "ACK", <offset>]` for `GETACK *`, where the offset counts
///   the bytes this server has processed from its master
/// * No reply for `ACK <offset>`; the acknowledgment is counted toward any
///   WAIT in progress
///
/// # Examples
///
/// ```ignore
/// // REPLCONF GETACK * on a replica that processed 37 bytes
/// // Returns: Response(["REPLCONF", "ACK", "37"])
/// ```
pub fn replconf(
    engine: &mut Engine,
    client_id: ClientId,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let replconf_arguments = ReplconfArguments::parse(arguments)?;

    match replconf_arguments.configuration {
        ReplconfConfiguration::ListeningPort | ReplconfConfiguration::Capabilities => Ok(
            CommandResult::Response(RespValue::SimpleString("OK".to_string())),
        ),
        ReplconfConfiguration::GetAck => Ok(CommandResult::Response(
            RespValue::bulk_string_array([
                "REPLCONF".to_string(),
                "ACK".to_string(),
                engine.replication.offset().to_string(),
            ]),
        )),
        ReplconfConfiguration::Ack(offset) => {
            let base = engine
                .registry
                .get(client_id)
                .filter(|session| session.is_replica)
                .map(|session| session.replica_offset_base);

            match base {
                Some(base) => engine.waiters.record_ack(client_id, base + offset),
                None => debug!(client_id, "ignoring ACK from a non-replica connection"),
            }

            Ok(CommandResult::NoResponse)
        }
    }
}
