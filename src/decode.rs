use crate::tags;
use crate::value::{Float, FloatWidth, Map, Value};
use num_bigint::BigInt;
use thiserror::Error;

/// Default nesting budget for containers.
pub const DEFAULT_MAX_DEPTH: usize = 1000;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Not enough data for encoded item")]
    NotEnoughData,

    #[error("Reserved additional-information value {0}")]
    ReservedInfo(u8),

    #[error("Invalid simple value {0}")]
    InvalidSimpleType(u8),

    #[error("Indefinite-length string contains an invalid chunk")]
    InvalidChunk,

    #[error("Tag {0} expects a two-element array of integers")]
    InvalidTagPayload(u64),

    #[error(transparent)]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("Text is not a valid RFC 3339 date-time")]
    InvalidDate(#[from] time::error::Parse),

    #[error("Epoch timestamp out of range")]
    TimestampRange,

    #[error("Maximum recursion depth reached")]
    MaxRecursion,

    #[error("Trailing bytes after a complete item")]
    TrailingBytes,
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn peek(&self) -> Result<u8, Error> {
        self.data.get(self.pos).copied().ok_or(Error::NotEnoughData)
    }

    fn u8(&mut self) -> Result<u8, Error> {
        let b = self.peek()?;
        self.pos += 1;
        Ok(b)
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], Error> {
        let end = self.pos.checked_add(len).ok_or(Error::NotEnoughData)?;
        if end > self.data.len() {
            return Err(Error::NotEnoughData);
        }
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], Error> {
        self.take(N).map(|s| s.try_into().unwrap())
    }

    /// Argument of an initial byte: immediate below 24, then 1/2/4/8
    /// big-endian follow-on bytes. Info 31 never reaches here; callers
    /// treat it as the indefinite sentinel.
    fn argument(&mut self, info: u8) -> Result<u64, Error> {
        match info {
            val if val < 24 => Ok(val as u64),
            24 => Ok(self.u8()? as u64),
            25 => Ok(u16::from_be_bytes(self.array()?) as u64),
            26 => Ok(u32::from_be_bytes(self.array()?) as u64),
            27 => Ok(u64::from_be_bytes(self.array()?)),
            _ => Err(Error::ReservedInfo(info)),
        }
    }

    /// A length argument narrowed to `usize`.
    fn length(&mut self, info: u8) -> Result<usize, Error> {
        usize::try_from(self.argument(info)?).map_err(|_| Error::NotEnoughData)
    }
}

/// Tree decoder with a configurable nesting budget and strictness.
#[derive(Clone, Copy, Debug)]
pub struct Decoder {
    max_depth: usize,
}

impl Default for Decoder {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the container nesting budget.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Decode one item from the front of `data`, ignoring trailing bytes.
    pub fn decode(&self, data: &[u8]) -> Result<Value, Error> {
        self.decode_with_len(data).map(|(value, _)| value)
    }

    /// Decode one item, returning it with the number of bytes consumed.
    pub fn decode_with_len(&self, data: &[u8]) -> Result<(Value, usize), Error> {
        let mut cursor = Cursor::new(data);
        let value = self.item(&mut cursor, self.max_depth)?;
        Ok((value, cursor.pos))
    }

    /// Decode one item that must span the whole buffer.
    pub fn decode_exact(&self, data: &[u8]) -> Result<Value, Error> {
        let (value, len) = self.decode_with_len(data)?;
        if len != data.len() {
            return Err(Error::TrailingBytes);
        }
        Ok(value)
    }

    fn item(&self, c: &mut Cursor, depth: usize) -> Result<Value, Error> {
        // Absorb the run of tags (major 6) in front of the item.
        let mut pending = Vec::new();
        let initial = loop {
            let initial = c.u8()?;
            if initial >> 5 == 6 {
                pending.push(c.argument(initial & 0x1F)?);
            } else {
                break initial;
            }
        };

        let value = match (initial >> 5, initial & 0x1F) {
            (0, info) => {
                let n = c.argument(info)?;
                if n <= i64::MAX as u64 {
                    Value::Unsigned(n)
                } else {
                    Value::BigInt(n.into())
                }
            }
            (1, info) => {
                let n = c.argument(info)?;
                if n <= i64::MAX as u64 {
                    Value::Negative(-1 - n as i64)
                } else {
                    Value::BigInt(-BigInt::from(n) - 1)
                }
            }
            (2, 31) => {
                let chunks = self.chunks(c, 2)?;
                Value::ByteStream(chunks.into_iter().map(<[u8]>::to_vec).collect())
            }
            (2, info) => {
                let len = c.length(info)?;
                Value::Bytes(c.take(len)?.to_vec())
            }
            (3, 31) => {
                let mut chunks = Vec::new();
                for chunk in self.chunks(c, 3)? {
                    chunks.push(std::str::from_utf8(chunk)?.to_owned());
                }
                Value::TextStream(chunks)
            }
            (3, info) => {
                let len = c.length(info)?;
                Value::Text(std::str::from_utf8(c.take(len)?)?.to_owned())
            }
            (4, 31) => {
                let mut items = Vec::new();
                while c.peek()? != 0xFF {
                    items.push(self.nested(c, depth)?);
                }
                c.u8()?;
                Value::Array(items, false)
            }
            (4, info) => {
                let count = c.length(info)?;
                let mut items = Vec::new();
                for _ in 0..count {
                    items.push(self.nested(c, depth)?);
                }
                Value::Array(items, true)
            }
            (5, 31) => {
                let mut map = Map::new(false);
                while c.peek()? != 0xFF {
                    let key = self.nested(c, depth)?;
                    let value = self.nested(c, depth)?;
                    map.insert(key, value);
                }
                c.u8()?;
                Value::Map(map)
            }
            (5, info) => {
                let count = c.length(info)?;
                let mut map = Map::new(true);
                for _ in 0..count {
                    let key = self.nested(c, depth)?;
                    let value = self.nested(c, depth)?;
                    map.insert(key, value);
                }
                Value::Map(map)
            }
            (6, _) => unreachable!(),
            (7, 20) => Value::Bool(false),
            (7, 21) => Value::Bool(true),
            (7, 22) => Value::Null,
            (7, 23) => Value::Undefined,
            (7, 25) => {
                let v = half::f16::from_be_bytes(c.array()?);
                Value::Float(Float::new(v.into(), FloatWidth::Half))
            }
            (7, 26) => {
                let v = f32::from_be_bytes(c.array()?);
                Value::Float(Float::new(v.into(), FloatWidth::Single))
            }
            (7, 27) => {
                let v = f64::from_be_bytes(c.array()?);
                Value::Float(Float::new(v, FloatWidth::Double))
            }
            // Unassigned simple values, and a break byte in item position.
            (7, info) => return Err(Error::InvalidSimpleType(info)),
            (8.., _) => unreachable!(),
        };

        tags::apply(pending, value)
    }

    fn nested(&self, c: &mut Cursor, depth: usize) -> Result<Value, Error> {
        if depth == 0 {
            return Err(Error::MaxRecursion);
        }
        self.item(c, depth - 1)
    }

    /// Definite chunks of an indefinite-length string, up to the break.
    /// Each chunk must be a definite string of the same major type.
    fn chunks<'a>(&self, c: &mut Cursor<'a>, major: u8) -> Result<Vec<&'a [u8]>, Error> {
        let mut chunks = Vec::new();
        loop {
            let initial = c.u8()?;
            if initial == 0xFF {
                return Ok(chunks);
            }
            if initial >> 5 != major || initial & 0x1F == 31 {
                return Err(Error::InvalidChunk);
            }
            let len = c.length(initial & 0x1F)?;
            chunks.push(c.take(len)?);
        }
    }
}

/// Decode one CBOR item from the front of `data`, ignoring trailing bytes.
pub fn decode(data: &[u8]) -> Result<Value, Error> {
    Decoder::new().decode(data)
}

/// Decode one CBOR item, returning it with the number of bytes consumed.
pub fn decode_with_len(data: &[u8]) -> Result<(Value, usize), Error> {
    Decoder::new().decode_with_len(data)
}

/// Decode one CBOR item that must span the whole buffer.
pub fn decode_exact(data: &[u8]) -> Result<Value, Error> {
    Decoder::new().decode_exact(data)
}
