//! Well-known tag numbers and their interpretations.

use crate::decode::Error;
use crate::value::{Encoding, Fraction, Number, Value};
use num_bigint::{BigInt, Sign};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// RFC 3339 date-time string; see RFC 8949 §3.4.1.
pub const DATE_TIME_STRING: u64 = 0;

/// Epoch-based date-time; see RFC 8949 §3.4.2.
pub const DATE_TIME_EPOCH: u64 = 1;

/// Positive bignum; see RFC 8949 §3.4.3.
pub const POS_BIGNUM: u64 = 2;

/// Negative bignum; see RFC 8949 §3.4.3.
pub const NEG_BIGNUM: u64 = 3;

/// Decimal fraction; see RFC 8949 §3.4.4.
pub const DECIMAL_FRACTION: u64 = 4;

/// Bigfloat; see RFC 8949 §3.4.4.
pub const BIGFLOAT: u64 = 5;

/// Expected conversion to base64url; see RFC 8949 §3.4.5.2.
pub const TO_BASE64URL: u64 = 21;

/// Expected conversion to base64; see RFC 8949 §3.4.5.2.
pub const TO_BASE64: u64 = 22;

/// Expected conversion to base16; see RFC 8949 §3.4.5.2.
pub const TO_BASE16: u64 = 23;

/// URI text string; see RFC 8949 §3.4.5.3.
pub const URI: u64 = 32;

/// base64url-encoded text string; see RFC 8949 §3.4.5.3.
pub const BASE64URL: u64 = 33;

/// base64-encoded text string; see RFC 8949 §3.4.5.3.
pub const BASE64: u64 = 34;

/// Regular expression; see RFC 7049 §2.4.4.3.
pub const REGEXP: u64 = 35;

/// MIME message; see RFC 7049 §2.4.4.3.
pub const MIME_MESSAGE: u64 = 36;

/// Mathematical set; see the IANA CBOR tags registry.
pub const SET: u64 = 258;

/// Rewrite a decoded item according to the tags that preceded it.
///
/// A single pending tag over a value of the matching shape is consumed and
/// produces the refined value. Any other pending tags are preserved
/// verbatim in a [`Value::Tagged`] wrapper, in encounter order. Chains of
/// more than one tag are never interpreted, even when an inner tag would
/// match on its own.
pub(crate) fn apply(tags: Vec<u64>, value: Value) -> Result<Value, Error> {
    if tags.is_empty() {
        return Ok(value);
    }
    if tags.len() == 1 {
        let tag = tags[0];
        return refine(tag, value, tags);
    }
    Ok(Value::Tagged(tags, Box::new(value)))
}

fn refine(tag: u64, value: Value, tags: Vec<u64>) -> Result<Value, Error> {
    Ok(match (tag, value) {
        (DATE_TIME_STRING, Value::Text(text)) => {
            Value::DateTime(OffsetDateTime::parse(&text, &Rfc3339)?)
        }
        (DATE_TIME_EPOCH, Value::Unsigned(n)) => Value::DateTime(epoch_ms(n as i128 * 1000)?),
        (DATE_TIME_EPOCH, Value::Negative(n)) => Value::DateTime(epoch_ms(n as i128 * 1000)?),
        (DATE_TIME_EPOCH, Value::Float(f)) => Value::DateTime(epoch_seconds(f.value)?),
        (POS_BIGNUM, Value::Bytes(b)) => Value::BigInt(BigInt::from_bytes_be(Sign::Plus, &b)),
        (NEG_BIGNUM, Value::Bytes(b)) => {
            Value::BigInt(-BigInt::from_bytes_be(Sign::Plus, &b) - 1)
        }
        (DECIMAL_FRACTION, Value::Array(items, _)) => {
            Value::Decimal(fraction(DECIMAL_FRACTION, items)?)
        }
        (BIGFLOAT, Value::Array(items, _)) => Value::BigFloat(fraction(BIGFLOAT, items)?),
        (TO_BASE64URL, Value::Bytes(b)) => Value::EncodedBytes(b, Encoding::Base64Url),
        (TO_BASE64, Value::Bytes(b)) => Value::EncodedBytes(b, Encoding::Base64),
        (TO_BASE16, Value::Bytes(b)) => Value::EncodedBytes(b, Encoding::Base16),
        (URI, Value::Text(s)) => Value::Uri(s),
        (BASE64URL, Value::Text(s)) => Value::EncodedText(s, Encoding::Base64Url),
        (BASE64, Value::Text(s)) => Value::EncodedText(s, Encoding::Base64),
        (REGEXP, Value::Text(s)) => Value::Regexp(s),
        (MIME_MESSAGE, Value::Text(s)) => Value::Mime(s),
        (SET, Value::Array(items, _)) => Value::Set(dedup(items)),
        (_, value) => Value::Tagged(tags, Box::new(value)),
    })
}

fn epoch_ms(ms: i128) -> Result<OffsetDateTime, Error> {
    OffsetDateTime::from_unix_timestamp_nanos(ms * 1_000_000).map_err(|_| Error::TimestampRange)
}

fn epoch_seconds(seconds: f64) -> Result<OffsetDateTime, Error> {
    let ms = (seconds * 1000.0).round();
    if !ms.is_finite() || ms < i64::MIN as f64 || ms > i64::MAX as f64 {
        return Err(Error::TimestampRange);
    }
    epoch_ms(ms as i128)
}

fn fraction(tag: u64, items: Vec<Value>) -> Result<Fraction, Error> {
    let [exponent, mantissa] =
        <[Value; 2]>::try_from(items).map_err(|_| Error::InvalidTagPayload(tag))?;
    Ok(Fraction {
        exponent: number(tag, exponent)?,
        mantissa: number(tag, mantissa)?,
    })
}

fn number(tag: u64, value: Value) -> Result<Number, Error> {
    match value {
        // Range promotion keeps native unsigned values below 2^63.
        Value::Unsigned(n) => Ok(Number::Int(n as i64)),
        Value::Negative(n) => Ok(Number::Int(n)),
        Value::BigInt(n) => Ok(Number::Big(n)),
        _ => Err(Error::InvalidTagPayload(tag)),
    }
}

fn dedup(items: Vec<Value>) -> Vec<Value> {
    let mut set: Vec<Value> = Vec::new();
    for item in items {
        if !set.contains(&item) {
            set.push(item);
        }
    }
    set
}
