use std::collections::HashMap;

use jiff::Timestamp;
use tracing::debug;

use crate::rdb::{SnapshotEntry, SnapshotError, encoding::RdbCursor};

const METADATA_OPCODE: u8 = 0xFA;
const RESIZE_DB_OPCODE: u8 = 0xFB;
const EXPIRATION_MILLISECONDS_OPCODE: u8 = 0xFC;
const EXPIRATION_SECONDS_OPCODE: u8 = 0xFD;
const DATABASE_OPCODE: u8 = 0xFE;
const END_OF_FILE_OPCODE: u8 = 0xFF;
const STRING_VALUE_TYPE: u8 = 0x00;

/// Parses a whole snapshot file into its string keys.
pub fn parse_snapshot(bytes: &[u8]) -> Result<HashMap<String, SnapshotEntry>, SnapshotError> {
    let mut cursor = RdbCursor::new(bytes);
    let version = parse_header(&mut cursor)?;
    debug!(version, "parsing snapshot");

    let mut entries = HashMap::new();

    while !cursor.is_at_end() {
        match cursor.read_u8()? {
            METADATA_OPCODE => {
                let key = cursor.read_string()?;
                let value = cursor.read_string()?;
                debug!(%key, %value, "snapshot metadata");
            }
            DATABASE_OPCODE => {
                cursor.read_length()?;
            }
            RESIZE_DB_OPCODE => {
                cursor.read_length()?;
                cursor.read_length()?;
            }
            EXPIRATION_SECONDS_OPCODE => {
                let seconds = cursor.read_u32_le()?;
                let expires_at = Timestamp::from_second(seconds as i64)
                    .map_err(|e| SnapshotError::InvalidExpiration(e.to_string()))?
                    .as_millisecond();
                let (key, value) = parse_key_value(&mut cursor)?;
                entries.insert(key, SnapshotEntry::new(value, Some(expires_at as u64)));
            }
            EXPIRATION_MILLISECONDS_OPCODE => {
                let millis = cursor.read_u64_le()?;
                let expires_at = i64::try_from(millis)
                    .ok()
                    .and_then(|millis| Timestamp::from_millisecond(millis).ok())
                    .ok_or_else(|| SnapshotError::InvalidExpiration(millis.to_string()))?
                    .as_millisecond();
                let (key, value) = parse_key_value(&mut cursor)?;
                entries.insert(key, SnapshotEntry::new(value, Some(expires_at as u64)));
            }
            STRING_VALUE_TYPE => {
                let key = cursor.read_string()?;
                let value = cursor.read_string()?;
                entries.insert(key, SnapshotEntry::new(value, None));
            }
            END_OF_FILE_OPCODE => break,
            opcode => return Err(SnapshotError::UnknownOpcode(opcode)),
        }
    }

    Ok(entries)
}

fn parse_header(cursor: &mut RdbCursor<'_>) -> Result<u32, SnapshotError> {
    if cursor.take(5)? != b"REDIS" {
        return Err(SnapshotError::InvalidMagic);
    }

    let version = std::str::from_utf8(cursor.take(4)?)
        .ok()
        .and_then(|version| version.parse::<u32>().ok())
        .ok_or(SnapshotError::InvalidVersion)?;

    if !(1..=12).contains(&version) {
        return Err(SnapshotError::InvalidVersion);
    }

    Ok(version)
}

fn parse_key_value(cursor: &mut RdbCursor<'_>) -> Result<(String, String), SnapshotError> {
    match cursor.read_u8()? {
        STRING_VALUE_TYPE => Ok((cursor.read_string()?, cursor.read_string()?)),
        value_type => Err(SnapshotError::UnknownOpcode(value_type)),
    }
}
