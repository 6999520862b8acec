use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    replication::ReplicationState,
    resp::RespValue,
};

enum InfoSection {
    Default,
    Replication,
    Unknown,
}

pub struct InfoArguments {
    section: InfoSection,
}

impl InfoArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() > 1 {
            return Err(CommandError::wrong_arguments("info"));
        }

        let section = match arguments.first().map(|s| s.to_lowercase()) {
            None => InfoSection::Default,
            Some(section) if section == "replication" || section == "all" => {
                InfoSection::Replication
            }
            Some(_) => InfoSection::Unknown,
        };

        Ok(InfoArguments { section })
    }
}

/// Handles the Redis INFO command.
///
/// Only the replication section exists. It is returned for `INFO`,
/// `INFO replication` and `INFO all`; any other section yields an empty
/// bulk string.
///
/// # Examples
///
/// ```ignore
/// // INFO replication
/// let result = info(&replication, vec!["replication".to_string()]);
/// // Returns: BulkString("role:master\r\nmaster_replid:8371b4fb...\r\nmaster_repl_offset:0")
/// ```
pub fn info(
    replication: &ReplicationState,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let info_arguments = InfoArguments::parse(arguments)?;

    let body = match info_arguments.section {
        InfoSection::Default | InfoSection::Replication => [
            format!("role:{}", replication.role()),
            format!("master_replid:{}", replication.replication_id()),
            format!("master_repl_offset:{}", replication.offset()),
        ]
        .join("\r\n"),
        InfoSection::Unknown => String::new(),
    };

    Ok(CommandResult::Response(RespValue::BulkString(body)))
}
