//! RESP2/RESP3 values and the incremental decoder used by every connection.
//!
//! A [`RespDecoder`] owns the bytes read from a socket so far. Complete
//! top-level values are split off the front of the buffer as they are decoded;
//! an incomplete value stays in place until more bytes arrive.

use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;

const CRLF: &[u8] = b"\r\n";

/// Largest payload a single bulk frame may declare, matching Redis's default
/// `proto-max-bulk-len`.
pub const MAX_BULK_LEN: usize = 512 * 1024 * 1024;

/// Malformed wire bytes.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum RespError {
    #[error("unknown type byte '{0}'")]
    UnknownType(char),
    #[error("invalid length '{0}'")]
    InvalidLength(String),
    #[error("expected CRLF terminator")]
    MissingCrlf,
    #[error("invalid UTF-8 sequence")]
    InvalidUtf8,
    #[error("invalid integer '{0}'")]
    InvalidInteger(String),
    #[error("invalid double '{0}'")]
    InvalidDouble(String),
    #[error("invalid boolean '{0}'")]
    InvalidBoolean(String),
    #[error("invalid big number '{0}'")]
    InvalidBigNumber(String),
    #[error("invalid null")]
    InvalidNull,
    #[error("invalid verbatim string")]
    InvalidVerbatimString,
    #[error("expected bulk payload, got '{0}'")]
    InvalidSnapshotFrame(char),
}

impl RespError {
    pub fn as_resp(&self) -> RespValue {
        RespValue::Error(format!("ERR Protocol error: {}", self))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RespValue {
    SimpleString(String),
    Error(String),
    Integer(i64),
    /// Payloads are text. A frame whose bytes are not UTF-8 is rejected with
    /// [`RespError::InvalidUtf8`] rather than stored.
    BulkString(String),
    NullBulkString,
    Array(Vec<RespValue>),
    NullArray,
    Null,
    Boolean(bool),
    Double(f64),
    BigNumber(String),
    BulkError(String),
    VerbatimString { encoding: String, text: String },
    Map(Vec<(RespValue, RespValue)>),
    Set(Vec<RespValue>),
    Attribute {
        attributes: Vec<(RespValue, RespValue)>,
        value: Box<RespValue>,
    },
    Push(Vec<RespValue>),
}

impl RespValue {
    pub fn encode(&self) -> Bytes {
        let mut buffer = BytesMut::new();
        self.encode_into(&mut buffer);
        buffer.freeze()
    }

    /// Number of bytes [`RespValue::encode`] produces for this value.
    pub fn encoded_len(&self) -> usize {
        match self {
            RespValue::SimpleString(s) | RespValue::Error(s) => 1 + s.len() + 2,
            RespValue::Integer(i) => 1 + i.to_string().len() + 2,
            RespValue::BulkString(s) | RespValue::BulkError(s) => {
                1 + s.len().to_string().len() + 2 + s.len() + 2
            }
            RespValue::NullBulkString | RespValue::NullArray => 5,
            RespValue::Null => 3,
            RespValue::Boolean(_) => 4,
            RespValue::Double(d) => 1 + format_double(*d).len() + 2,
            RespValue::BigNumber(n) => 1 + n.len() + 2,
            RespValue::VerbatimString { encoding, text } => {
                let payload = encoding.len() + 1 + text.len();
                1 + payload.to_string().len() + 2 + payload + 2
            }
            RespValue::Array(items) | RespValue::Set(items) | RespValue::Push(items) => {
                1 + items.len().to_string().len()
                    + 2
                    + items.iter().map(RespValue::encoded_len).sum::<usize>()
            }
            RespValue::Map(pairs) => 1 + pairs.len().to_string().len() + 2 + pairs_len(pairs),
            RespValue::Attribute { attributes, value } => {
                1 + attributes.len().to_string().len()
                    + 2
                    + pairs_len(attributes)
                    + value.encoded_len()
            }
        }
    }

    pub fn encode_into(&self, buffer: &mut BytesMut) {
        match self {
            RespValue::SimpleString(s) => put_line(buffer, b'+', s.as_bytes()),
            RespValue::Error(s) => put_line(buffer, b'-', s.as_bytes()),
            RespValue::Integer(i) => put_line(buffer, b':', i.to_string().as_bytes()),
            RespValue::BulkString(s) => put_blob(buffer, b'$', s.as_bytes()),
            RespValue::NullBulkString => buffer.put_slice(b"$-1\r\n"),
            RespValue::NullArray => buffer.put_slice(b"*-1\r\n"),
            RespValue::Null => buffer.put_slice(b"_\r\n"),
            RespValue::Boolean(true) => buffer.put_slice(b"#t\r\n"),
            RespValue::Boolean(false) => buffer.put_slice(b"#f\r\n"),
            RespValue::Double(d) => put_line(buffer, b',', format_double(*d).as_bytes()),
            RespValue::BigNumber(n) => put_line(buffer, b'(', n.as_bytes()),
            RespValue::BulkError(s) => put_blob(buffer, b'!', s.as_bytes()),
            RespValue::VerbatimString { encoding, text } => {
                let payload = format!("{}:{}", encoding, text);
                put_blob(buffer, b'=', payload.as_bytes());
            }
            RespValue::Array(items) => put_collection(buffer, b'*', items),
            RespValue::Set(items) => put_collection(buffer, b'~', items),
            RespValue::Push(items) => put_collection(buffer, b'>', items),
            RespValue::Map(pairs) => put_pairs(buffer, b'%', pairs),
            RespValue::Attribute { attributes, value } => {
                put_pairs(buffer, b'|', attributes);
                value.encode_into(buffer);
            }
        }
    }

    pub fn bulk_string_array<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RespValue::Array(
            items
                .into_iter()
                .map(|s| RespValue::BulkString(s.into()))
                .collect(),
        )
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            RespValue::BulkString(s) | RespValue::SimpleString(s) => Some(s),
            _ => None,
        }
    }
}

fn pairs_len(pairs: &[(RespValue, RespValue)]) -> usize {
    pairs
        .iter()
        .map(|(k, v)| k.encoded_len() + v.encoded_len())
        .sum()
}

fn format_double(d: f64) -> String {
    if d.is_nan() {
        "nan".to_string()
    } else if d.is_infinite() {
        let text = if d.is_sign_positive() { "inf" } else { "-inf" };
        text.to_string()
    } else {
        d.to_string()
    }
}

fn put_line(buffer: &mut BytesMut, prefix: u8, body: &[u8]) {
    buffer.put_u8(prefix);
    buffer.put_slice(body);
    buffer.put_slice(CRLF);
}

fn put_blob(buffer: &mut BytesMut, prefix: u8, body: &[u8]) {
    put_line(buffer, prefix, body.len().to_string().as_bytes());
    buffer.put_slice(body);
    buffer.put_slice(CRLF);
}

fn put_collection(buffer: &mut BytesMut, prefix: u8, items: &[RespValue]) {
    put_line(buffer, prefix, items.len().to_string().as_bytes());
    for item in items {
        item.encode_into(buffer);
    }
}

fn put_pairs(buffer: &mut BytesMut, prefix: u8, pairs: &[(RespValue, RespValue)]) {
    put_line(buffer, prefix, pairs.len().to_string().as_bytes());
    for (key, value) in pairs {
        key.encode_into(buffer);
        value.encode_into(buffer);
    }
}

/// Restartable decoder over an accumulating read buffer.
#[derive(Debug, Default)]
pub struct RespDecoder {
    buffer: BytesMut,
}

impl RespDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Drops everything buffered. Used after a protocol error, since the
    /// position of the next frame boundary is unknown.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Decodes the next complete value, returning it with the number of wire
    /// bytes it occupied. `Ok(None)` means more bytes are needed.
    pub fn next_value(&mut self) -> Result<Option<(RespValue, usize)>, RespError> {
        match parse_value(&self.buffer, 0)? {
            Some((value, consumed)) => {
                let _ = self.buffer.split_to(consumed);
                Ok(Some((value, consumed)))
            }
            None => Ok(None),
        }
    }

    /// Decodes a `$<len>\r\n<bytes>` frame with no trailing CRLF, the shape a
    /// master uses to ship its snapshot during a full resync.
    pub fn next_snapshot(&mut self) -> Result<Option<Bytes>, RespError> {
        let Some(&prefix) = self.buffer.first() else {
            return Ok(None);
        };

        if prefix != b'$' {
            return Err(RespError::InvalidSnapshotFrame(prefix as char));
        }

        let Some((line, body_start)) = read_line(&self.buffer, 1) else {
            return Ok(None);
        };
        let length = parse_length(line)?;
        let end = blob_end(body_start, length)?;

        if self.buffer.len() < end {
            return Ok(None);
        }

        let _ = self.buffer.split_to(body_start);
        Ok(Some(self.buffer.split_to(length).freeze()))
    }
}

fn read_line(buffer: &[u8], start: usize) -> Option<(&[u8], usize)> {
    let rest = buffer.get(start..)?;
    let position = rest.windows(2).position(|window| window == CRLF)?;

    Some((&rest[..position], start + position + 2))
}

fn as_text(bytes: &[u8]) -> Result<String, RespError> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|_| RespError::InvalidUtf8)
}

fn parse_length(line: &[u8]) -> Result<usize, RespError> {
    if line.is_empty() || !line.iter().all(u8::is_ascii_digit) {
        return Err(RespError::InvalidLength(
            String::from_utf8_lossy(line).to_string(),
        ));
    }

    as_text(line)?
        .parse::<usize>()
        .map_err(|_| RespError::InvalidLength(String::from_utf8_lossy(line).to_string()))
}

/// Length header that may be `-1` for the null forms of `$` and `*`.
fn parse_nullable_length(line: &[u8]) -> Result<Option<usize>, RespError> {
    if line == b"-1" {
        return Ok(None);
    }

    parse_length(line).map(Some)
}

type Parsed = Option<(RespValue, usize)>;

fn parse_value(buffer: &[u8], start: usize) -> Result<Parsed, RespError> {
    let Some(&prefix) = buffer.get(start) else {
        return Ok(None);
    };

    let Some((line, next)) = read_line(buffer, start + 1) else {
        return Ok(None);
    };

    let parsed = match prefix {
        b'+' => (RespValue::SimpleString(as_text(line)?), next),
        b'-' => (RespValue::Error(as_text(line)?), next),
        b':' => {
            let text = as_text(line)?;
            let value = text
                .parse::<i64>()
                .map_err(|_| RespError::InvalidInteger(text.clone()))?;
            (RespValue::Integer(value), next)
        }
        b'_' => {
            if !line.is_empty() {
                return Err(RespError::InvalidNull);
            }
            (RespValue::Null, next)
        }
        b'#' => match line {
            b"t" => (RespValue::Boolean(true), next),
            b"f" => (RespValue::Boolean(false), next),
            other => {
                return Err(RespError::InvalidBoolean(
                    String::from_utf8_lossy(other).to_string(),
                ));
            }
        },
        b',' => {
            let text = as_text(line)?;
            let value = text
                .parse::<f64>()
                .map_err(|_| RespError::InvalidDouble(text.clone()))?;
            (RespValue::Double(value), next)
        }
        b'(' => {
            let text = as_text(line)?;
            let digits = text.strip_prefix(['-', '+']).unwrap_or(&text);
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(RespError::InvalidBigNumber(text));
            }
            (RespValue::BigNumber(text), next)
        }
        b'$' => match parse_nullable_length(line)? {
            None => (RespValue::NullBulkString, next),
            Some(length) => match read_blob(buffer, next, length)? {
                Some((body, end)) => (RespValue::BulkString(as_text(body)?), end),
                None => return Ok(None),
            },
        },
        b'!' => match read_blob(buffer, next, parse_length(line)?)? {
            Some((body, end)) => (RespValue::BulkError(as_text(body)?), end),
            None => return Ok(None),
        },
        b'=' => match read_blob(buffer, next, parse_length(line)?)? {
            Some((body, end)) => {
                let payload = as_text(body)?;
                let Some((encoding, text)) = payload.split_once(':') else {
                    return Err(RespError::InvalidVerbatimString);
                };
                if encoding.len() != 3 {
                    return Err(RespError::InvalidVerbatimString);
                }
                (
                    RespValue::VerbatimString {
                        encoding: encoding.to_string(),
                        text: text.to_string(),
                    },
                    end,
                )
            }
            None => return Ok(None),
        },
        b'*' => match parse_nullable_length(line)? {
            None => (RespValue::NullArray, next),
            Some(count) => match parse_items(buffer, next, count)? {
                Some((items, end)) => (RespValue::Array(items), end),
                None => return Ok(None),
            },
        },
        b'~' => match parse_items(buffer, next, parse_length(line)?)? {
            Some((items, end)) => (RespValue::Set(items), end),
            None => return Ok(None),
        },
        b'>' => match parse_items(buffer, next, parse_length(line)?)? {
            Some((items, end)) => (RespValue::Push(items), end),
            None => return Ok(None),
        },
        b'%' => match parse_pairs(buffer, next, parse_length(line)?)? {
            Some((pairs, end)) => (RespValue::Map(pairs), end),
            None => return Ok(None),
        },
        b'|' => {
            let Some((attributes, end)) = parse_pairs(buffer, next, parse_length(line)?)? else {
                return Ok(None);
            };
            let Some((value, consumed)) = parse_value(buffer, end)? else {
                return Ok(None);
            };
            (
                RespValue::Attribute {
                    attributes,
                    value: Box::new(value),
                },
                end + consumed,
            )
        }
        other => return Err(RespError::UnknownType(other as char)),
    };

    let (value, end) = parsed;
    Ok(Some((value, end - start)))
}

fn read_blob(
    buffer: &[u8],
    start: usize,
    length: usize,
) -> Result<Option<(&[u8], usize)>, RespError> {
    let end = blob_end(start, length)?;

    if buffer.len() < end + 2 {
        return Ok(None);
    }

    if &buffer[end..end + 2] != CRLF {
        return Err(RespError::MissingCrlf);
    }

    Ok(Some((&buffer[start..end], end + 2)))
}

/// Offset one past a `length`-byte payload starting at `start`.
fn blob_end(start: usize, length: usize) -> Result<usize, RespError> {
    if length > MAX_BULK_LEN {
        return Err(RespError::InvalidLength(length.to_string()));
    }

    start
        .checked_add(length)
        .ok_or_else(|| RespError::InvalidLength(length.to_string()))
}

fn parse_items(
    buffer: &[u8],
    mut cursor: usize,
    count: usize,
) -> Result<Option<(Vec<RespValue>, usize)>, RespError> {
    let mut items = Vec::with_capacity(count.min(1024));

    for _ in 0..count {
        let Some((item, consumed)) = parse_value(buffer, cursor)? else {
            return Ok(None);
        };
        cursor += consumed;
        items.push(item);
    }

    Ok(Some((items, cursor)))
}

fn parse_pairs(
    buffer: &[u8],
    cursor: usize,
    count: usize,
) -> Result<Option<(Vec<(RespValue, RespValue)>, usize)>, RespError> {
    let items_count = count
        .checked_mul(2)
        .ok_or_else(|| RespError::InvalidLength(count.to_string()))?;
    let Some((items, end)) = parse_items(buffer, cursor, items_count)? else {
        return Ok(None);
    };

    let mut pairs = Vec::with_capacity(count);
    let mut items = items.into_iter();
    while let (Some(key), Some(value)) = (items.next(), items.next()) {
        pairs.push((key, value));
    }

    Ok(Some((pairs, end)))
}
