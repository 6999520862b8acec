//! Suspended requests: BLPOP and blocking XREAD waiters, and in-flight WAITs.
//!
//! Nothing here wakes anything up. The engine re-checks every queue after each
//! event and on every tick, resolving waiters whose condition became true or
//! whose deadline passed.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::{session::ClientId, store::StreamId};

#[derive(Debug, Clone, PartialEq)]
pub struct ListWaiter {
    pub client_id: ClientId,
    /// Unix milliseconds; `None` waits forever.
    pub deadline: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamWaiter {
    pub client_id: ClientId,
    /// Each key with the id entries must come after. `$` is resolved to the
    /// stream's last id when the waiter is created.
    pub streams: Vec<(String, StreamId)>,
    /// Entries returned per stream at most.
    pub count: Option<usize>,
    pub deadline: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingWait {
    pub client_id: ClientId,
    pub required_acks: usize,
    /// Replicas that acknowledged `target_offset`.
    pub acked: HashSet<ClientId>,
    /// Replica offset that counts as caught up: the master offset right
    /// before the GETACK probe was sent.
    pub target_offset: u64,
    pub deadline: Option<u64>,
}

impl PendingWait {
    pub fn received_acks(&self) -> usize {
        self.acked.len()
    }

    pub fn is_satisfied(&self) -> bool {
        self.received_acks() >= self.required_acks
    }
}

pub fn is_past(deadline: Option<u64>, now: u64) -> bool {
    deadline.is_some_and(|deadline| now >= deadline)
}

#[derive(Debug, Default)]
pub struct Waiters {
    lists: HashMap<String, VecDeque<ListWaiter>>,
    streams: VecDeque<StreamWaiter>,
    waits: HashMap<ClientId, PendingWait>,
}

impl Waiters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block_on_list(&mut self, key: &str, waiter: ListWaiter) {
        self.lists.entry(key.to_string()).or_default().push_back(waiter);
    }

    pub fn block_on_streams(&mut self, waiter: StreamWaiter) {
        self.streams.push_back(waiter);
    }

    pub fn start_wait(&mut self, wait: PendingWait) {
        self.waits.insert(wait.client_id, wait);
    }

    pub fn list_keys(&self) -> Vec<String> {
        self.lists.keys().cloned().collect()
    }

    pub fn front_list_waiter(&self, key: &str) -> Option<&ListWaiter> {
        self.lists.get(key).and_then(VecDeque::front)
    }

    pub fn pop_list_waiter(&mut self, key: &str) -> Option<ListWaiter> {
        let queue = self.lists.get_mut(key)?;
        let waiter = queue.pop_front();

        if queue.is_empty() {
            self.lists.remove(key);
        }

        waiter
    }

    /// Removes and returns list waiters whose deadline passed, in queue order.
    pub fn take_expired_list_waiters(&mut self, now: u64) -> Vec<(String, ListWaiter)> {
        let mut expired = Vec::new();

        self.lists.retain(|key, queue| {
            queue.retain(|waiter| {
                if is_past(waiter.deadline, now) {
                    expired.push((key.clone(), waiter.clone()));
                    false
                } else {
                    true
                }
            });
            !queue.is_empty()
        });

        expired
    }

    pub fn take_stream_waiters(&mut self) -> VecDeque<StreamWaiter> {
        std::mem::take(&mut self.streams)
    }

    /// Puts unserved waiters back ahead of any that blocked in the meantime.
    pub fn restore_stream_waiters(&mut self, mut waiters: VecDeque<StreamWaiter>) {
        waiters.append(&mut self.streams);
        self.streams = waiters;
    }

    /// Counts an ACK from `replica` toward every WAIT it satisfies.
    pub fn record_ack(&mut self, replica: ClientId, offset: u64) {
        for wait in self.waits.values_mut() {
            if offset >= wait.target_offset {
                wait.acked.insert(replica);
            }
        }
    }

    /// Removes WAITs that are satisfied or past their deadline.
    pub fn take_finished_waits(&mut self, now: u64) -> Vec<PendingWait> {
        let finished = self
            .waits
            .iter()
            .filter(|(_, wait)| wait.is_satisfied() || is_past(wait.deadline, now))
            .map(|(client_id, _)| *client_id)
            .collect::<Vec<_>>();

        finished
            .into_iter()
            .filter_map(|client_id| self.waits.remove(&client_id))
            .collect()
    }

    pub fn has_wait(&self, client_id: ClientId) -> bool {
        self.waits.contains_key(&client_id)
    }

    /// Drops every record that belongs to `client_id`.
    pub fn purge_client(&mut self, client_id: ClientId) {
        self.lists.retain(|_, queue| {
            queue.retain(|waiter| waiter.client_id != client_id);
            !queue.is_empty()
        });
        self.streams.retain(|waiter| waiter.client_id != client_id);
        self.waits.remove(&client_id);

        for wait in self.waits.values_mut() {
            wait.acked.remove(&client_id);
        }
    }

    pub fn is_waiting(&self, client_id: ClientId) -> bool {
        self.lists
            .values()
            .flatten()
            .any(|waiter| waiter.client_id == client_id)
            || self.streams.iter().any(|waiter| waiter.client_id == client_id)
            || self.waits.contains_key(&client_id)
    }
}
