use std::{
    collections::{BTreeSet, HashMap, VecDeque},
    sync::atomic::{AtomicU64, Ordering},
};

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::debug;

use crate::{commands::CommandHandler, resp::RespValue};

pub type ClientId = u64;

static CLIENT_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Ids are shared by accepted clients and the replica's master link.
pub fn next_client_id() -> ClientId {
    CLIENT_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Queue drained by a connection's socket writer.
pub type Outbound = mpsc::UnboundedSender<Bytes>;

#[derive(Debug)]
pub struct ClientSession {
    pub id: ClientId,
    outbound: Outbound,
    /// Suspended on a blocking read or a WAIT.
    pub awaiting: bool,
    /// Peer half-closed while the session was awaiting.
    pub closing: bool,
    /// Requests that arrived while awaiting, with their wire lengths.
    pub deferred: VecDeque<(RespValue, usize)>,
    pub transaction: Option<Vec<CommandHandler>>,
    pub subscriptions: BTreeSet<String>,
    /// The link a replica keeps to its master.
    pub is_master_link: bool,
    /// A replica registered through PSYNC.
    pub is_replica: bool,
    /// Master offset when this replica synced. Its ACKs count from here.
    pub replica_offset_base: u64,
    pub last_command: Option<String>,
}

impl ClientSession {
    pub fn new(id: ClientId, outbound: Outbound, is_master_link: bool) -> Self {
        Self {
            id,
            outbound,
            awaiting: false,
            closing: false,
            deferred: VecDeque::new(),
            transaction: None,
            subscriptions: BTreeSet::new(),
            is_master_link,
            is_replica: false,
            replica_offset_base: 0,
            last_command: None,
        }
    }

    pub fn send(&self, value: &RespValue) {
        self.send_raw(value.encode());
    }

    pub fn send_raw(&self, bytes: Bytes) {
        if self.outbound.send(bytes).is_err() {
            debug!(client_id = self.id, "dropping reply for closed connection");
        }
    }

    pub fn is_subscribed(&self) -> bool {
        !self.subscriptions.is_empty()
    }
}

/// Every live session, keyed by client id.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    sessions: HashMap<ClientId, ClientSession>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, session: ClientSession) {
        self.sessions.insert(session.id, session);
    }

    /// Dropping the session drops its outbound sender, which ends the
    /// connection once the queued replies are flushed.
    pub fn remove(&mut self, id: ClientId) -> Option<ClientSession> {
        self.sessions.remove(&id)
    }

    pub fn get(&self, id: ClientId) -> Option<&ClientSession> {
        self.sessions.get(&id)
    }

    pub fn get_mut(&mut self, id: ClientId) -> Option<&mut ClientSession> {
        self.sessions.get_mut(&id)
    }

    pub fn contains(&self, id: ClientId) -> bool {
        self.sessions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn send(&self, id: ClientId, value: &RespValue) {
        if let Some(session) = self.sessions.get(&id) {
            session.send(value);
        }
    }

    pub fn subscribers_of<'a>(&'a self, channel: &'a str) -> impl Iterator<Item = &'a ClientSession> {
        self.sessions
            .values()
            .filter(move |session| session.subscriptions.contains(channel))
    }

    pub fn replicas(&self) -> impl Iterator<Item = &ClientSession> {
        self.sessions.values().filter(|session| session.is_replica)
    }
}
