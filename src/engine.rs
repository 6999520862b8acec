//! The command engine: the single owner of the keyspace, the sessions, the
//! waiter queues and the replication offset.
//!
//! Connection tasks never touch any of that state. They forward decoded
//! requests as [`Event`]s and drain the outbound queue the engine fills, so
//! the engine can run every command to completion without locks.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::mpsc::UnboundedReceiver,
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::{
    blocking::Waiters,
    commands::{
        finish_waits, run_transaction, serve_list_waiters, serve_stream_waiters, CommandError,
        CommandHandler, CommandResult,
    },
    config::{ConfigSource, Role},
    replication::ReplicationState,
    resp::{RespError, RespValue},
    session::{ClientId, ClientSession, ConnectionRegistry, Outbound},
    store::{now_millis, Store},
};

/// How often deadlines are checked when no event arrives.
const TICK: Duration = Duration::from_millis(10);

/// Commands that keep their meaning while a transaction is open.
const TRANSACTION_CONTROL: [&str; 4] = ["MULTI", "EXEC", "DISCARD", "QUIT"];

#[derive(Debug)]
pub enum Event {
    Connected {
        client_id: ClientId,
        outbound: Outbound,
        /// The replica's connection to its master.
        is_master_link: bool,
    },
    Input {
        client_id: ClientId,
        value: RespValue,
        /// Bytes the request occupied on the wire.
        wire_len: usize,
    },
    ProtocolError {
        client_id: ClientId,
        error: RespError,
    },
    /// The peer stopped sending. Queued replies are still delivered.
    EndOfStream { client_id: ClientId },
    /// The socket failed; nothing more can be delivered.
    Disconnected { client_id: ClientId },
}

pub struct Engine {
    pub(crate) config: Arc<dyn ConfigSource>,
    pub(crate) store: Store,
    pub(crate) registry: ConnectionRegistry,
    pub(crate) waiters: Waiters,
    pub(crate) replication: ReplicationState,
    /// Sessions whose wait resolved and may have deferred requests to run.
    resumed: Vec<ClientId>,
}

impl Engine {
    pub fn new(config: Arc<dyn ConfigSource>, store: Store) -> Self {
        let replication = ReplicationState::new(config.role(), config.replication_id());

        Self {
            config,
            store,
            registry: ConnectionRegistry::new(),
            waiters: Waiters::new(),
            replication,
            resumed: Vec::new(),
        }
    }

    pub fn replication(&self) -> &ReplicationState {
        &self.replication
    }

    pub fn session(&self, client_id: ClientId) -> Option<&ClientSession> {
        self.registry.get(client_id)
    }

    pub fn waiters(&self) -> &Waiters {
        &self.waiters
    }

    /// Processes events until every sender is gone.
    pub async fn run(mut self, mut events: UnboundedReceiver<Event>) {
        let mut ticker = interval(TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => break,
                },
                _ = ticker.tick() => self.tick(),
            }
        }

        info!("engine stopped");
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Connected {
                client_id,
                outbound,
                is_master_link,
            } => {
                if is_master_link {
                    self.replication.reset();
                    self.store.clear();
                    info!(client_id, "streaming from master");
                } else {
                    debug!(client_id, "client connected");
                }

                self.registry
                    .register(ClientSession::new(client_id, outbound, is_master_link));
            }
            Event::Input {
                client_id,
                value,
                wire_len,
            } => self.handle_input(client_id, value, wire_len),
            Event::ProtocolError { client_id, error } => {
                debug!(client_id, %error, "protocol error");
                self.registry.send(client_id, &error.as_resp());
            }
            Event::EndOfStream { client_id } => {
                let awaiting = match self.registry.get_mut(client_id) {
                    Some(session) if session.awaiting => {
                        session.closing = true;
                        true
                    }
                    Some(_) => false,
                    None => return,
                };

                if !awaiting {
                    self.teardown(client_id);
                }
            }
            Event::Disconnected { client_id } => self.teardown(client_id),
        }

        self.settle(now_millis());
    }

    pub fn tick(&mut self) {
        self.tick_at(now_millis());
    }

    /// Resolves waiters as if the clock read `now`.
    pub fn tick_at(&mut self, now: u64) {
        self.settle(now);
    }

    /// Serves waiters until no resolved session has deferred input left
    /// that could queue new ones.
    fn settle(&mut self, now: u64) {
        loop {
            finish_waits(self, now);
            serve_list_waiters(self, now);
            serve_stream_waiters(self, now);

            let resumed = std::mem::take(&mut self.resumed);
            if resumed.is_empty() {
                break;
            }

            for client_id in resumed {
                self.replay_deferred(client_id);
            }
        }
    }

    fn replay_deferred(&mut self, client_id: ClientId) {
        loop {
            let Some(session) = self.registry.get_mut(client_id) else {
                return;
            };

            if session.awaiting {
                return;
            }

            match session.deferred.pop_front() {
                Some((value, wire_len)) => self.handle_input(client_id, value, wire_len),
                None if session.closing => {
                    self.teardown(client_id);
                    return;
                }
                None => return,
            }
        }
    }

    fn handle_input(&mut self, client_id: ClientId, value: RespValue, wire_len: usize) {
        let Some(session) = self.registry.get_mut(client_id) else {
            return;
        };

        if session.awaiting {
            session.deferred.push_back((value, wire_len));
            return;
        }

        if session.is_master_link {
            self.apply_from_master(client_id, value, wire_len);
        } else {
            self.handle_client_command(client_id, value);
        }
    }

    /// Applies a command streamed by the master. Only GETACK is answered, and
    /// it reports the offset before the probe itself is counted.
    fn apply_from_master(&mut self, client_id: ClientId, value: RespValue, wire_len: usize) {
        match CommandHandler::new(value) {
            Ok(handler) => match handler.handle(self, client_id, false) {
                Ok(CommandResult::Response(response)) if handler.name == "REPLCONF" => {
                    self.registry.send(client_id, &response)
                }
                Ok(_) => {}
                Err(e) => debug!(client_id, command = %handler.name, error = %e, "master command failed"),
            },
            Err(e) => debug!(client_id, error = %e, "unreadable command from master"),
        }

        self.replication.advance(wire_len);
    }

    fn handle_client_command(&mut self, client_id: ClientId, value: RespValue) {
        let handler = match CommandHandler::new(value) {
            Ok(handler) => handler,
            Err(e) => {
                self.registry.send(client_id, &e.as_resp());
                return;
            }
        };

        if let Some(error) = self.gate(client_id, &handler) {
            self.registry.send(client_id, &error.as_resp());
            return;
        }

        let Some(session) = self.registry.get_mut(client_id) else {
            return;
        };

        if let Some(queue) = session.transaction.as_mut() {
            if !TRANSACTION_CONTROL.contains(&handler.name.as_str()) {
                match handler.validate_command_arguments() {
                    Some(error) => session.send(&error.as_resp()),
                    None => {
                        queue.push(handler);
                        session.send(&RespValue::SimpleString("QUEUED".to_string()));
                    }
                }
                return;
            }
        }

        let result = handler.handle(self, client_id, true);

        if let Some(session) = self.registry.get_mut(client_id) {
            session.last_command = Some(handler.name.clone());
        }

        match result {
            Ok(result) => self.deliver(client_id, result),
            Err(e) => self.registry.send(client_id, &e.as_resp()),
        }
    }

    /// Refusals that apply before a command runs or is queued.
    fn gate(&self, client_id: ClientId, handler: &CommandHandler) -> Option<CommandError> {
        let session = self.registry.get(client_id)?;

        if session.is_subscribed() && !handler.allowed_while_subscribed() {
            return Some(CommandError::NotAllowedWhileSubscribed(
                handler.name.to_lowercase(),
            ));
        }

        if self.replication.role() == Role::Slave && handler.is_write() {
            return Some(CommandError::ReadOnlyReplica);
        }

        None
    }

    fn deliver(&mut self, client_id: ClientId, result: CommandResult) {
        match result {
            CommandResult::Response(response) => self.registry.send(client_id, &response),
            CommandResult::Replies(replies) => {
                for reply in &replies {
                    self.registry.send(client_id, reply);
                }
            }
            CommandResult::NoResponse => {}
            CommandResult::Blocked => {
                if let Some(session) = self.registry.get_mut(client_id) {
                    session.awaiting = true;
                }
            }
            CommandResult::Sync(payload) => {
                let offset = self.replication.offset();

                if let Some(session) = self.registry.get_mut(client_id) {
                    session.send_raw(payload);
                    session.is_replica = true;
                    session.replica_offset_base = offset;
                    info!(client_id, offset, "replica attached");
                }
            }
            CommandResult::Batch(commands) => {
                let response = run_transaction(self, client_id, commands);
                self.registry.send(client_id, &response);
            }
            CommandResult::Quit => {
                self.registry
                    .send(client_id, &RespValue::SimpleString("OK".to_string()));
                self.teardown(client_id);
            }
        }
    }

    /// Sends a write to every replica and advances the master offset by its
    /// encoded length. Does nothing on a replica.
    pub(crate) fn propagate(&mut self, command: &RespValue) {
        if self.replication.role() != Role::Master {
            return;
        }

        let bytes = command.encode();
        for replica in self.registry.replicas() {
            replica.send_raw(bytes.clone());
        }

        self.replication.advance(bytes.len());
    }

    /// Delivers the reply a suspended session was waiting for.
    pub(crate) fn complete_blocked(&mut self, client_id: ClientId, reply: RespValue) {
        let Some(session) = self.registry.get_mut(client_id) else {
            return;
        };

        session.send(&reply);
        session.awaiting = false;
        self.resumed.push(client_id);
    }

    fn teardown(&mut self, client_id: ClientId) {
        self.waiters.purge_client(client_id);

        match self.registry.remove(client_id) {
            Some(session) if session.is_master_link => {
                warn!(client_id, "master link closed")
            }
            Some(session) if session.is_replica => info!(client_id, "replica detached"),
            Some(_) => debug!(client_id, "client disconnected"),
            None => {}
        }
    }
}
