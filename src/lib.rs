//! RFC 8949 CBOR decoding into an owned tree of [`Value`]s.
//!
//! One self-delimiting item is parsed from the front of an in-memory byte
//! buffer. Well-known tags (date-times, bignums, decimal fractions,
//! big-floats, base-encoding hints, URI/MIME/regexp, sets) are interpreted
//! into dedicated variants; every other tag is preserved verbatim.

pub mod decode;
pub mod tags;
pub mod value;

pub use decode::{decode, decode_exact, decode_with_len, Decoder, Error};
pub use value::{Encoding, Float, FloatWidth, Fraction, Map, Number, Value};
