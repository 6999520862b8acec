use crate::rdb::SnapshotError;

/// How the next value in the file is stored, decided by the top two bits of
/// its first byte.
#[derive(Debug, PartialEq)]
enum ValueEncoding {
    Length(usize),
    Int8,
    Int16,
    Int32,
    LzfCompressedString,
}

/// Byte cursor over a snapshot file.
pub struct RdbCursor<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> RdbCursor<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    pub fn is_at_end(&self) -> bool {
        self.position >= self.bytes.len()
    }

    pub fn take(&mut self, len: usize) -> Result<&'a [u8], SnapshotError> {
        let end = self.position + len;
        let slice = self
            .bytes
            .get(self.position..end)
            .ok_or(SnapshotError::UnexpectedEof)?;
        self.position = end;

        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, SnapshotError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u32_le(&mut self) -> Result<u32, SnapshotError> {
        let bytes: [u8; 4] = self
            .take(4)?
            .try_into()
            .map_err(|_| SnapshotError::UnexpectedEof)?;
        Ok(u32::from_le_bytes(bytes))
    }

    pub fn read_u64_le(&mut self) -> Result<u64, SnapshotError> {
        let bytes: [u8; 8] = self
            .take(8)?
            .try_into()
            .map_err(|_| SnapshotError::UnexpectedEof)?;
        Ok(u64::from_le_bytes(bytes))
    }

    fn read_encoding(&mut self) -> Result<ValueEncoding, SnapshotError> {
        let first = self.read_u8()?;

        match first >> 6 {
            0b00 => Ok(ValueEncoding::Length((first & 0b0011_1111) as usize)),
            0b01 => {
                // 14-bit length: low six bits of the first byte, then the whole second byte.
                let high = ((first & 0b0011_1111) as usize) << 8;
                let low = self.read_u8()? as usize;
                Ok(ValueEncoding::Length(high | low))
            }
            0b10 => match first {
                0x80 => {
                    let bytes: [u8; 4] = self
                        .take(4)?
                        .try_into()
                        .map_err(|_| SnapshotError::UnexpectedEof)?;
                    Ok(ValueEncoding::Length(u32::from_be_bytes(bytes) as usize))
                }
                0x81 => {
                    let bytes: [u8; 8] = self
                        .take(8)?
                        .try_into()
                        .map_err(|_| SnapshotError::UnexpectedEof)?;
                    Ok(ValueEncoding::Length(u64::from_be_bytes(bytes) as usize))
                }
                _ => Err(SnapshotError::UnsupportedEncoding(first)),
            },
            _ => match first & 0b0011_1111 {
                0 => Ok(ValueEncoding::Int8),
                1 => Ok(ValueEncoding::Int16),
                2 => Ok(ValueEncoding::Int32),
                3 => Ok(ValueEncoding::LzfCompressedString),
                _ => Err(SnapshotError::UnsupportedEncoding(first)),
            },
        }
    }

    /// Reads a plain length, as used by database selectors and resize hints.
    pub fn read_length(&mut self) -> Result<usize, SnapshotError> {
        match self.read_encoding()? {
            ValueEncoding::Length(length) => Ok(length),
            _ => Err(SnapshotError::ExpectedLength),
        }
    }

    /// Reads a string, expanding integer encodings to their decimal form.
    pub fn read_string(&mut self) -> Result<String, SnapshotError> {
        match self.read_encoding()? {
            ValueEncoding::Length(length) => String::from_utf8(self.take(length)?.to_vec())
                .map_err(|_| SnapshotError::InvalidUtf8),
            ValueEncoding::Int8 => Ok((self.read_u8()? as i8).to_string()),
            ValueEncoding::Int16 => {
                let bytes: [u8; 2] = self
                    .take(2)?
                    .try_into()
                    .map_err(|_| SnapshotError::UnexpectedEof)?;
                Ok(i16::from_le_bytes(bytes).to_string())
            }
            ValueEncoding::Int32 => Ok((self.read_u32_le()? as i32).to_string()),
            ValueEncoding::LzfCompressedString => Err(SnapshotError::UnsupportedEncoding(0xC3)),
        }
    }
}
