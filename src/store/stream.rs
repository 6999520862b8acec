use std::{
    collections::BTreeMap,
    fmt,
    ops::Bound::{Excluded, Included},
    str::FromStr,
};

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Clone)]
pub enum StreamError {
    #[error("The ID specified in XADD must be greater than 0-0")]
    ZeroId,
    #[error("The ID specified in XADD is equal or smaller than the target stream top item")]
    NotGreaterThanTop,
    #[error("Invalid stream ID specified as stream command argument")]
    InvalidId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StreamId {
    pub ms: u64,
    pub seq: u64,
}

impl StreamId {
    pub const MIN: StreamId = StreamId { ms: 0, seq: 0 };
    pub const MAX: StreamId = StreamId {
        ms: u64::MAX,
        seq: u64::MAX,
    };

    pub fn new(ms: u64, seq: u64) -> Self {
        Self { ms, seq }
    }

    /// Parses a range bound. A bare millisecond value expands to the first or
    /// last sequence of that millisecond depending on which end it bounds.
    pub fn parse_bound(input: &str, is_end: bool) -> Result<Self, StreamError> {
        match input {
            "-" => Ok(StreamId::MIN),
            "+" => Ok(StreamId::MAX),
            _ => match input.split_once('-') {
                Some(_) => input.parse(),
                None => {
                    let ms = input.parse::<u64>().map_err(|_| StreamError::InvalidId)?;
                    Ok(StreamId::new(ms, if is_end { u64::MAX } else { 0 }))
                }
            },
        }
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.ms, self.seq)
    }
}

impl FromStr for StreamId {
    type Err = StreamError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (ms, seq) = match input.split_once('-') {
            Some((ms, seq)) => (ms, seq),
            None => (input, "0"),
        };

        let ms = ms.parse::<u64>().map_err(|_| StreamError::InvalidId)?;
        let seq = seq.parse::<u64>().map_err(|_| StreamError::InvalidId)?;

        Ok(StreamId::new(ms, seq))
    }
}

/// The id argument of XADD.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StreamIdRequest {
    /// `*`
    Auto,
    /// `<ms>-*`
    AutoSequence(u64),
    Explicit(StreamId),
}

impl FromStr for StreamIdRequest {
    type Err = StreamError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if input == "*" {
            return Ok(StreamIdRequest::Auto);
        }

        match input.split_once('-') {
            Some((ms, "*")) => {
                let ms = ms.parse::<u64>().map_err(|_| StreamError::InvalidId)?;
                Ok(StreamIdRequest::AutoSequence(ms))
            }
            _ => Ok(StreamIdRequest::Explicit(input.parse()?)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamEntry {
    pub id: StreamId,
    pub fields: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Stream {
    entries: BTreeMap<StreamId, Vec<(String, String)>>,
    min_id: Option<StreamId>,
    max_id: Option<StreamId>,
}

impl Stream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last_id(&self) -> Option<StreamId> {
        self.max_id
    }

    pub fn first_id(&self) -> Option<StreamId> {
        self.min_id
    }

    /// Resolves the id a new entry would get, without appending it.
    pub fn next_id(&self, request: StreamIdRequest, now_ms: u64) -> Result<StreamId, StreamError> {
        let top = self.max_id;

        let id = match request {
            StreamIdRequest::Explicit(id) => {
                if id == StreamId::MIN {
                    return Err(StreamError::ZeroId);
                }
                id
            }
            StreamIdRequest::AutoSequence(ms) => match top {
                Some(top) if top.ms == ms => StreamId::new(ms, next_seq(top)?),
                Some(top) if top.ms > ms => return Err(StreamError::NotGreaterThanTop),
                _ => StreamId::new(ms, if ms == 0 { 1 } else { 0 }),
            },
            StreamIdRequest::Auto => match top {
                Some(top) if top.ms >= now_ms => StreamId::new(top.ms, next_seq(top)?),
                _ => StreamId::new(now_ms, if now_ms == 0 { 1 } else { 0 }),
            },
        };

        match top {
            Some(top) if id <= top => Err(StreamError::NotGreaterThanTop),
            _ => Ok(id),
        }
    }

    pub fn append(
        &mut self,
        request: StreamIdRequest,
        fields: Vec<(String, String)>,
        now_ms: u64,
    ) -> Result<StreamId, StreamError> {
        let id = self.next_id(request, now_ms)?;

        self.entries.insert(id, fields);
        self.max_id = Some(id);
        if self.min_id.is_none() {
            self.min_id = Some(id);
        }

        Ok(id)
    }

    /// Entries with `start <= id <= end`.
    pub fn range(&self, start: StreamId, end: StreamId) -> Vec<StreamEntry> {
        let (Some(min_id), Some(max_id)) = (self.min_id, self.max_id) else {
            return Vec::new();
        };

        let start = start.max(min_id);
        let end = end.min(max_id);
        if start > end {
            return Vec::new();
        }

        self.entries
            .range(start..=end)
            .map(|(id, fields)| StreamEntry {
                id: *id,
                fields: fields.clone(),
            })
            .collect()
    }

    /// Entries with an id strictly greater than `after`.
    pub fn entries_after(&self, after: StreamId) -> Vec<StreamEntry> {
        match self.max_id {
            Some(max_id) if max_id > after => self
                .entries
                .range((Excluded(after), Included(max_id)))
                .map(|(id, fields)| StreamEntry {
                    id: *id,
                    fields: fields.clone(),
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// A top id whose sequence is already `u64::MAX` has no successor in its
/// millisecond.
fn next_seq(top: StreamId) -> Result<u64, StreamError> {
    top.seq.checked_add(1).ok_or(StreamError::NotGreaterThanTop)
}
