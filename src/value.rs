use num_bigint::BigInt;
use num_traits::ToPrimitive;
use time::OffsetDateTime;

/// Precision a float was encoded with on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FloatWidth {
    Half,
    Single,
    Double,
}

/// An IEEE-754 value widened to `f64`, remembering its encoded width.
#[derive(Clone, Copy, Debug)]
pub struct Float {
    pub value: f64,
    pub width: FloatWidth,
}

impl Float {
    pub fn new(value: f64, width: FloatWidth) -> Self {
        Self { value, width }
    }
}

// Bit-pattern equality, so NaN compares equal to itself and -0.0 differs
// from 0.0. Re-decoding the same bytes yields an equal tree.
impl PartialEq for Float {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width && self.value.to_bits() == other.value.to_bits()
    }
}

impl Eq for Float {}

impl From<Float> for f64 {
    fn from(f: Float) -> f64 {
        f.value
    }
}

/// Base encoding named by tags 21..=23 (expected later conversion of a byte
/// string) and tags 33/34 (a text string already in that encoding).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Encoding {
    Base64Url,
    Base64,
    Base16,
}

/// A native or arbitrary-precision integer, as found in the payload of a
/// decimal fraction or big-float.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Number {
    Int(i64),
    Big(BigInt),
}

impl Number {
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Number::Int(n) => Some(*n),
            Number::Big(n) => n.to_i64(),
        }
    }
}

/// Exponent/mantissa pair of a decimal fraction (tag 4) or big-float
/// (tag 5). The represented value is `mantissa * base^exponent`, base 10
/// for decimal fractions and base 2 for big-floats.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fraction {
    pub exponent: Number,
    pub mantissa: Number,
}

/// An ordered map of CBOR values.
///
/// Keys keep the position of their first insertion; inserting an existing
/// key overwrites its value in place. Whether the map was encoded with a
/// definite length is kept as metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Map {
    entries: Vec<(Value, Value)>,
    definite: bool,
}

impl Map {
    pub fn new(definite: bool) -> Self {
        Self {
            entries: Vec::new(),
            definite,
        }
    }

    /// Last write wins: an existing key keeps its position but takes the
    /// new value.
    pub fn insert(&mut self, key: Value, value: Value) {
        if let Some((_, v)) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            *v = value;
        } else {
            self.entries.push((key, value));
        }
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn entries(&self) -> &[(Value, Value)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_definite(&self) -> bool {
        self.definite
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Value, Value)> {
        self.entries.iter()
    }
}

/// A decoded CBOR item.
///
/// Containers record their definite/indefinite origin; indefinite-length
/// strings keep their chunks unjoined ([`Value::joined_bytes`] and
/// [`Value::joined_text`] give the concatenated view). Integers outside
/// `i64` range are carried as [`Value::BigInt`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    /// Major 0; always below 2^63 (larger arguments become `BigInt`).
    Unsigned(u64),
    /// Major 1; the stored value is `-1 - n`.
    Negative(i64),
    Bytes(Vec<u8>),
    /// Indefinite-length byte string, chunks in encounter order.
    ByteStream(Vec<Vec<u8>>),
    Text(String),
    /// Indefinite-length text string, each chunk validated on its own.
    TextStream(Vec<String>),
    /// Items plus a definite-length flag.
    Array(Vec<Value>, bool),
    Map(Map),
    /// Tag 258 over an array, deduplicated preserving first occurrence.
    Set(Vec<Value>),
    Bool(bool),
    Null,
    Undefined,
    Float(Float),
    /// Out-of-range integers and tag 2/3 bignums.
    BigInt(BigInt),
    /// Tag 4.
    Decimal(Fraction),
    /// Tag 5.
    BigFloat(Fraction),
    /// Tag 0 over text (offset preserved) or tag 1 over a number
    /// (millisecond resolution).
    DateTime(OffsetDateTime),
    /// Tag 32.
    Uri(String),
    /// Tag 35.
    Regexp(String),
    /// Tag 36.
    Mime(String),
    /// Tags 21..=23: a byte string expected to be base-encoded later.
    EncodedBytes(Vec<u8>, Encoding),
    /// Tags 33/34: a text string already base-encoded.
    EncodedText(String, Encoding),
    /// Tags with no recognized interpretation, in encounter order.
    Tagged(Vec<u64>, Box<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Unsigned(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Unsigned(n) => i64::try_from(*n).ok(),
            Value::Negative(n) => Some(*n),
            Value::BigInt(n) => n.to_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(f.value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items, _) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Contiguous view of a definite or chunked byte string.
    pub fn joined_bytes(&self) -> Option<Vec<u8>> {
        match self {
            Value::Bytes(b) => Some(b.clone()),
            Value::ByteStream(chunks) => Some(chunks.concat()),
            _ => None,
        }
    }

    /// Contiguous view of a definite or chunked text string.
    pub fn joined_text(&self) -> Option<String> {
        match self {
            Value::Text(s) => Some(s.clone()),
            Value::TextStream(chunks) => Some(chunks.concat()),
            _ => None,
        }
    }
}
