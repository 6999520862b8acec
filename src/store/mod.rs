//! Typed, lazily expiring keyspace.
//!
//! Entries are checked for expiry when they are touched, never by a sweep.
//! Keys missing from the live map fall back to the snapshot, which is loaded
//! on first use and never written back by reads.

mod sorted_set;
mod stream;

use std::{
    collections::{HashMap, VecDeque},
    time::{SystemTime, UNIX_EPOCH},
};

use thiserror::Error;

use crate::rdb::SnapshotReader;

pub use sorted_set::SortedSet;
pub use stream::{Stream, StreamEntry, StreamError, StreamId, StreamIdRequest};

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

/// Turns an inclusive `[start, end]` pair that may count from the end into
/// bounds within `0..len`. `None` when the range selects nothing.
pub fn normalize_range(start: i64, end: i64, len: usize) -> Option<(usize, usize)> {
    let len = len as i64;
    let normalize = |index: i64| if index < 0 { (len + index).max(0) } else { index };

    let start = normalize(start);
    let end = normalize(end).min(len - 1);

    if len == 0 || start > end || start >= len {
        return None;
    }

    Some((start as usize, end as usize))
}

#[derive(Error, Debug, PartialEq, Clone)]
pub enum StoreError {
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,
    #[error("value is not an integer or out of range")]
    NotAnInteger,
    #[error(transparent)]
    Stream(#[from] StreamError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataType {
    String(String),
    List(VecDeque<String>),
    Stream(Stream),
    SortedSet(SortedSet),
}

impl DataType {
    pub fn type_name(&self) -> &'static str {
        match self {
            DataType::String(_) => "string",
            DataType::List(_) => "list",
            DataType::Stream(_) => "stream",
            DataType::SortedSet(_) => "zset",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub data: DataType,
    /// Unix time in milliseconds.
    pub expires_at: Option<u64>,
}

impl CacheEntry {
    pub fn new(data: DataType, expires_at: Option<u64>) -> Self {
        Self { data, expires_at }
    }

    pub fn is_expired(&self, now: u64) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

pub struct Store {
    entries: HashMap<String, CacheEntry>,
    snapshot: Box<dyn SnapshotReader>,
    snapshot_entries: Option<HashMap<String, CacheEntry>>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

impl Store {
    pub fn new(snapshot: Box<dyn SnapshotReader>) -> Self {
        Self {
            entries: HashMap::new(),
            snapshot,
            snapshot_entries: None,
        }
    }

    /// Drops every live key and the cached snapshot, so reads see only the
    /// snapshot as it is on disk now. A replica does this on each full resync.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.snapshot_entries = None;
    }

    fn snapshot_entries(&mut self) -> &HashMap<String, CacheEntry> {
        self.snapshot_entries.get_or_insert_with(|| {
            self.snapshot
                .read()
                .into_iter()
                .map(|(key, entry)| {
                    (
                        key,
                        CacheEntry::new(DataType::String(entry.value), entry.expires_at),
                    )
                })
                .collect()
        })
    }

    fn purge_if_expired(&mut self, key: &str, now: u64) {
        if self.entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
            self.entries.remove(key);
        }
    }

    pub fn get(&mut self, key: &str) -> Option<&CacheEntry> {
        let now = now_millis();
        self.purge_if_expired(key, now);

        if self.entries.contains_key(key) {
            return self.entries.get(key);
        }

        self.snapshot_entries()
            .get(key)
            .filter(|entry| !entry.is_expired(now))
    }

    /// Live entry for in-place mutation. A key only present in the snapshot is
    /// copied into the live map first.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut CacheEntry> {
        let now = now_millis();
        self.purge_if_expired(key, now);

        if !self.entries.contains_key(key) {
            let seeded = self
                .snapshot_entries()
                .get(key)
                .filter(|entry| !entry.is_expired(now))
                .cloned()?;
            self.entries.insert(key.to_string(), seeded);
        }

        self.entries.get_mut(key)
    }

    pub fn put(&mut self, key: &str, data: DataType, expires_at: Option<u64>) {
        self.entries
            .insert(key.to_string(), CacheEntry::new(data, expires_at));
    }

    pub fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        self.entries.remove(key)
    }

    /// Live keys plus snapshot keys, without duplicates or expired entries.
    pub fn keys(&mut self) -> Vec<String> {
        let now = now_millis();
        self.entries.retain(|_, entry| !entry.is_expired(now));

        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        let live = self.entries.keys().cloned().collect::<std::collections::HashSet<_>>();

        keys.extend(
            self.snapshot_entries()
                .iter()
                .filter(|(key, entry)| !entry.is_expired(now) && !live.contains(*key))
                .map(|(key, _)| key.clone()),
        );
        keys.sort();
        keys
    }

    pub fn type_of(&mut self, key: &str) -> &'static str {
        self.get(key)
            .map(|entry| entry.data.type_name())
            .unwrap_or("none")
    }

    pub fn get_string(&mut self, key: &str) -> Result<Option<String>, StoreError> {
        match self.get(key) {
            Some(CacheEntry {
                data: DataType::String(value),
                ..
            }) => Ok(Some(value.clone())),
            Some(_) => Err(StoreError::WrongType),
            None => Ok(None),
        }
    }

    /// Increments the integer stored at `key`, creating it as 1 when missing.
    pub fn incr(&mut self, key: &str) -> Result<i64, StoreError> {
        match self.get_mut(key) {
            Some(entry) => {
                let DataType::String(ref mut value) = entry.data else {
                    return Err(StoreError::WrongType);
                };

                let next = value
                    .parse::<i64>()
                    .ok()
                    .and_then(|current| current.checked_add(1))
                    .ok_or(StoreError::NotAnInteger)?;
                *value = next.to_string();
                Ok(next)
            }
            None => {
                self.put(key, DataType::String("1".to_string()), None);
                Ok(1)
            }
        }
    }

    fn list_mut(&mut self, key: &str) -> Result<Option<&mut VecDeque<String>>, StoreError> {
        match self.get_mut(key) {
            Some(CacheEntry {
                data: DataType::List(list),
                ..
            }) => Ok(Some(list)),
            Some(_) => Err(StoreError::WrongType),
            None => Ok(None),
        }
    }

    fn list(&mut self, key: &str) -> Result<Option<&VecDeque<String>>, StoreError> {
        match self.get(key) {
            Some(CacheEntry {
                data: DataType::List(list),
                ..
            }) => Ok(Some(list)),
            Some(_) => Err(StoreError::WrongType),
            None => Ok(None),
        }
    }

    /// Appends `values` in order and returns the new length.
    pub fn push_back(&mut self, key: &str, values: Vec<String>) -> Result<usize, StoreError> {
        match self.list_mut(key)? {
            Some(list) => {
                list.extend(values);
                Ok(list.len())
            }
            None => {
                let len = values.len();
                self.put(key, DataType::List(VecDeque::from(values)), None);
                Ok(len)
            }
        }
    }

    /// Prepends each value in turn, so the last one ends up first.
    pub fn push_front(&mut self, key: &str, values: Vec<String>) -> Result<usize, StoreError> {
        match self.list_mut(key)? {
            Some(list) => {
                for value in values {
                    list.push_front(value);
                }
                Ok(list.len())
            }
            None => {
                let list = values.into_iter().rev().collect::<VecDeque<_>>();
                let len = list.len();
                self.put(key, DataType::List(list), None);
                Ok(len)
            }
        }
    }

    /// Removes up to `count` values from the head. A list left empty is
    /// deleted.
    pub fn pop_front(&mut self, key: &str, count: usize) -> Result<Vec<String>, StoreError> {
        let Some(list) = self.list_mut(key)? else {
            return Ok(Vec::new());
        };

        let take = count.min(list.len());
        let popped = list.drain(..take).collect::<Vec<_>>();

        if list.is_empty() {
            self.remove(key);
        }

        Ok(popped)
    }

    pub fn list_len(&mut self, key: &str) -> Result<usize, StoreError> {
        Ok(self.list(key)?.map(VecDeque::len).unwrap_or(0))
    }

    pub fn list_range(&mut self, key: &str, start: i64, end: i64) -> Result<Vec<String>, StoreError> {
        let Some(list) = self.list(key)? else {
            return Ok(Vec::new());
        };

        match normalize_range(start, end, list.len()) {
            Some((start, end)) => Ok(list.range(start..=end).cloned().collect()),
            None => Ok(Vec::new()),
        }
    }

    pub fn list_has_items(&mut self, key: &str) -> bool {
        matches!(self.list(key), Ok(Some(list)) if !list.is_empty())
    }

    fn sorted_set_mut(&mut self, key: &str) -> Result<Option<&mut SortedSet>, StoreError> {
        match self.get_mut(key) {
            Some(CacheEntry {
                data: DataType::SortedSet(set),
                ..
            }) => Ok(Some(set)),
            Some(_) => Err(StoreError::WrongType),
            None => Ok(None),
        }
    }

    pub fn sorted_set(&mut self, key: &str) -> Result<Option<&SortedSet>, StoreError> {
        match self.get(key) {
            Some(CacheEntry {
                data: DataType::SortedSet(set),
                ..
            }) => Ok(Some(set)),
            Some(_) => Err(StoreError::WrongType),
            None => Ok(None),
        }
    }

    /// Returns how many of `members` were not in the set before.
    pub fn zadd(&mut self, key: &str, members: Vec<(f64, String)>) -> Result<usize, StoreError> {
        if self.sorted_set_mut(key)?.is_none() {
            self.put(key, DataType::SortedSet(SortedSet::new()), None);
        }

        let set = self.sorted_set_mut(key)?.ok_or(StoreError::WrongType)?;
        Ok(members
            .into_iter()
            .filter(|(score, member)| set.add(member, *score))
            .count())
    }

    pub fn zrem(&mut self, key: &str, members: &[String]) -> Result<usize, StoreError> {
        let Some(set) = self.sorted_set_mut(key)? else {
            return Ok(0);
        };

        let removed = members.iter().filter(|member| set.remove(member)).count();

        if set.is_empty() {
            self.remove(key);
        }

        Ok(removed)
    }

    fn stream(&mut self, key: &str) -> Result<Option<&Stream>, StoreError> {
        match self.get(key) {
            Some(CacheEntry {
                data: DataType::Stream(stream),
                ..
            }) => Ok(Some(stream)),
            Some(_) => Err(StoreError::WrongType),
            None => Ok(None),
        }
    }

    pub fn stream_append(
        &mut self,
        key: &str,
        request: StreamIdRequest,
        fields: Vec<(String, String)>,
    ) -> Result<StreamId, StoreError> {
        let now = now_millis();

        match self.get_mut(key) {
            Some(CacheEntry {
                data: DataType::Stream(stream),
                ..
            }) => Ok(stream.append(request, fields, now)?),
            Some(_) => Err(StoreError::WrongType),
            None => {
                let mut stream = Stream::new();
                let id = stream.append(request, fields, now)?;
                self.put(key, DataType::Stream(stream), None);
                Ok(id)
            }
        }
    }

    pub fn stream_range(
        &mut self,
        key: &str,
        start: StreamId,
        end: StreamId,
    ) -> Result<Vec<StreamEntry>, StoreError> {
        Ok(self
            .stream(key)?
            .map(|stream| stream.range(start, end))
            .unwrap_or_default())
    }

    pub fn stream_entries_after(
        &mut self,
        key: &str,
        after: StreamId,
    ) -> Result<Vec<StreamEntry>, StoreError> {
        Ok(self
            .stream(key)?
            .map(|stream| stream.entries_after(after))
            .unwrap_or_default())
    }

    /// Id of the newest entry, `0-0` for a missing or empty stream.
    pub fn stream_last_id(&mut self, key: &str) -> Result<StreamId, StoreError> {
        Ok(self
            .stream(key)?
            .and_then(Stream::last_id)
            .unwrap_or(StreamId::MIN))
    }
}
