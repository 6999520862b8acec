use bytes::Bytes;

use crate::{
    commands::{
        blpop::{blpop, BlpopArguments},
        command_error::CommandError,
        config_get::{config_get, ConfigGetArguments},
        echo::{echo, EchoArguments},
        get::{get, GetArguments},
        incr::{incr, IncrArguments},
        info::{info, InfoArguments},
        keys::{keys, KeysArguments},
        llen::{llen, LlenArguments},
        lpop::{lpop, LpopArguments},
        lrange::{lrange, LrangeArguments},
        ping::{ping, PingArguments},
        pub_sub::{self, publish, subscribe, unsubscribe, PublishArguments, SubscribeArguments},
        replication::{psync, replconf, wait, PsyncArguments, ReplconfArguments, WaitArguments},
        rpush_and_lpush::{lpush, rpush, PushArguments},
        set::{set, SetArguments},
        sorted_set::{
            zadd, zcard, zrange, zrank, zrem, zscore, ZaddArguments, ZcardArguments,
            ZrangeArguments, ZrankArguments, ZremArguments, ZscoreArguments,
        },
        transactions::{discard, exec, multi},
        type_command::{type_command, TypeArguments},
        xadd::{xadd, XaddArguments},
        xrange::{xrange, XrangeArguments},
        xread::{xread, XreadArguments},
    },
    engine::Engine,
    resp::RespValue,
    session::ClientId,
};

/// Commands a session may still run once it has subscribed to a channel.
pub const SUBSCRIBED_MODE_COMMANDS: [&str; 4] = ["SUBSCRIBE", "UNSUBSCRIBE", "PING", "QUIT"];

/// Commands that change the keyspace. They are refused on a replica unless
/// they arrive over the master link, and propagated when run on a master.
pub const WRITE_COMMANDS: [&str; 9] = [
    "SET", "INCR", "RPUSH", "LPUSH", "LPOP", "BLPOP", "XADD", "ZADD", "ZREM",
];

#[derive(Debug, PartialEq)]
pub enum CommandResult {
    Response(RespValue),
    /// Several replies for one request, e.g. SUBSCRIBE with many channels.
    Replies(Vec<RespValue>),
    NoResponse,
    /// The session is suspended until a waiter resolves it.
    Blocked,
    /// Raw bytes of a full resync; the session becomes a replica.
    Sync(Bytes),
    /// Commands queued by MULTI, to be replayed by EXEC.
    Batch(Vec<CommandHandler>),
    /// Reply, then close the connection.
    Quit,
}

#[derive(Debug, PartialEq, Clone)]
pub struct CommandHandler {
    pub name: String,
    pub arguments: Vec<String>,
    pub input: RespValue,
}

impl CommandHandler {
    pub fn new(input: RespValue) -> Result<Self, CommandError> {
        let RespValue::Array(elements) = &input else {
            return Err(CommandError::InvalidCommand);
        };

        let name = match elements.first() {
            Some(RespValue::BulkString(s)) => s.to_uppercase(),
            _ => return Err(CommandError::InvalidCommand),
        };

        let (name, rest_of_data) = match name.as_str() {
            "CONFIG" => {
                let sub_command = match elements.get(1) {
                    Some(RespValue::BulkString(s)) => s.to_uppercase(),
                    _ => return Err(CommandError::wrong_arguments("config")),
                };

                if sub_command != "GET" {
                    return Err(CommandError::UnknownCommand(format!("CONFIG {}", sub_command)));
                }

                ("CONFIG GET".to_string(), &elements[2..])
            }
            _ => (name, &elements[1..]),
        };

        let arguments = rest_of_data
            .iter()
            .map(|element| match element {
                RespValue::BulkString(s) => Ok(s.clone()),
                _ => Err(CommandError::InvalidCommand),
            })
            .collect::<Result<Vec<String>, CommandError>>()?;

        Ok(Self {
            name,
            arguments,
            input,
        })
    }

    /// Builds a handler from plain tokens, as if a client had sent them.
    pub fn from_parts<I, S>(parts: I) -> Result<Self, CommandError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(RespValue::bulk_string_array(parts))
    }

    pub fn is_write(&self) -> bool {
        WRITE_COMMANDS.contains(&self.name.as_str())
    }

    pub fn allowed_while_subscribed(&self) -> bool {
        SUBSCRIBED_MODE_COMMANDS.contains(&self.name.as_str())
    }

    /// Argument check run before a command is queued inside MULTI.
    pub fn validate_command_arguments(&self) -> Option<CommandError> {
        let arguments = self.arguments.clone();

        match self.name.as_str() {
            "PING" => PingArguments::parse(arguments).err(),
            "ECHO" => EchoArguments::parse(arguments).err(),
            "GET" => GetArguments::parse(arguments).err(),
            "SET" => SetArguments::parse(arguments).err(),
            "INCR" => IncrArguments::parse(arguments).err(),
            "TYPE" => TypeArguments::parse(arguments).err(),
            "KEYS" => KeysArguments::parse(arguments).err(),
            "INFO" => InfoArguments::parse(arguments).err(),
            "CONFIG GET" => ConfigGetArguments::parse(arguments).err(),
            "RPUSH" => PushArguments::parse("RPUSH", arguments).err(),
            "LPUSH" => PushArguments::parse("LPUSH", arguments).err(),
            "LPOP" => LpopArguments::parse(arguments).err(),
            "LLEN" => LlenArguments::parse(arguments).err(),
            "LRANGE" => LrangeArguments::parse(arguments).err(),
            "BLPOP" => BlpopArguments::parse(arguments).err(),
            "XADD" => XaddArguments::parse(arguments).err(),
            "XRANGE" => XrangeArguments::parse(arguments).err(),
            "XREAD" => XreadArguments::parse(arguments).err(),
            "ZADD" => ZaddArguments::parse(arguments).err(),
            "ZRANK" => ZrankArguments::parse(arguments).err(),
            "ZRANGE" => ZrangeArguments::parse(arguments).err(),
            "ZCARD" => ZcardArguments::parse(arguments).err(),
            "ZSCORE" => ZscoreArguments::parse(arguments).err(),
            "ZREM" => ZremArguments::parse(arguments).err(),
            "SUBSCRIBE" | "UNSUBSCRIBE" => SubscribeArguments::parse(&self.name, arguments).err(),
            "PUBLISH" => PublishArguments::parse(arguments).err(),
            "REPLCONF" => ReplconfArguments::parse(arguments).err(),
            "PSYNC" => PsyncArguments::parse(arguments).err(),
            "WAIT" => WaitArguments::parse(arguments).err(),
            "MULTI" | "EXEC" | "DISCARD" | "QUIT" => None,
            _ => Some(CommandError::UnknownCommand(self.name.clone())),
        }
    }

    /// Runs the command against the engine. Writes that succeed on a master
    /// are propagated before the caller sends the reply.
    ///
    /// `allow_blocking` is false inside EXEC, where BLPOP, XREAD BLOCK and
    /// WAIT answer immediately instead of suspending the session.
    pub fn handle(
        &self,
        engine: &mut Engine,
        client_id: ClientId,
        allow_blocking: bool,
    ) -> Result<CommandResult, CommandError> {
        let arguments = self.arguments.clone();

        let result = match self.name.as_str() {
            "PING" => {
                let subscribed = engine
                    .registry
                    .get(client_id)
                    .is_some_and(|session| session.is_subscribed());

                if subscribed {
                    pub_sub::ping(arguments)
                } else {
                    ping(arguments)
                }
            }
            "ECHO" => echo(arguments),
            "GET" => get(&mut engine.store, arguments),
            "SET" => set(&mut engine.store, arguments),
            "INCR" => incr(&mut engine.store, arguments),
            "TYPE" => type_command(&mut engine.store, arguments),
            "KEYS" => keys(&mut engine.store, arguments),
            "INFO" => info(&engine.replication, arguments),
            "CONFIG GET" => config_get(engine.config.as_ref(), arguments),
            "RPUSH" => rpush(&mut engine.store, arguments),
            "LPUSH" => lpush(&mut engine.store, arguments),
            "LPOP" => lpop(&mut engine.store, arguments),
            "LLEN" => llen(&mut engine.store, arguments),
            "LRANGE" => lrange(&mut engine.store, arguments),
            "BLPOP" => return blpop(engine, client_id, arguments, allow_blocking),
            "XADD" => xadd(&mut engine.store, arguments),
            "XRANGE" => xrange(&mut engine.store, arguments),
            "XREAD" => xread(engine, client_id, arguments, allow_blocking),
            "ZADD" => zadd(&mut engine.store, arguments),
            "ZRANK" => zrank(&mut engine.store, arguments),
            "ZRANGE" => zrange(&mut engine.store, arguments),
            "ZCARD" => zcard(&mut engine.store, arguments),
            "ZSCORE" => zscore(&mut engine.store, arguments),
            "ZREM" => zrem(&mut engine.store, arguments),
            "MULTI" => multi(engine.registry.get_mut(client_id), arguments),
            "EXEC" => exec(engine.registry.get_mut(client_id), arguments),
            "DISCARD" => discard(engine.registry.get_mut(client_id), arguments),
            "SUBSCRIBE" => subscribe(engine.registry.get_mut(client_id), arguments),
            "UNSUBSCRIBE" => unsubscribe(engine.registry.get_mut(client_id), arguments),
            "PUBLISH" => publish(&engine.registry, arguments),
            "REPLCONF" => replconf(engine, client_id, arguments),
            "PSYNC" => psync(engine, arguments),
            "WAIT" => wait(engine, client_id, arguments, allow_blocking),
            "QUIT" => Ok(CommandResult::Quit),
            _ => Err(CommandError::UnknownCommand(self.name.clone())),
        }?;

        if self.is_write() {
            engine.propagate(&self.input);
        }

        Ok(result)
    }
}
