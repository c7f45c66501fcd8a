//! Order-preserving key encoding.
//!
//! Every value starts with a type tag so that keys of different types never
//! interleave and NULL sorts first:
//!
//! | Tag | Type | Payload |
//! |-----|------|---------|
//! | 0x01 | Null | none |
//! | 0x02 | Bool | one byte, 0 or 1 |
//! | 0x10 | Int64 | 8 bytes big-endian, sign bit flipped |
//! | 0x11 | Float64 | 8 bytes big-endian, total-order transform |
//! | 0x20 | String | escaped UTF-8, `00 00` terminator |
//! | 0x30 | Bytes | escaped bytes, `00 00` terminator |
//!
//! Escaping writes each `00` payload byte as `00 FF`, so a terminated
//! prefix always sorts before any longer value and composite keys compare
//! column by column.

use byteorder::{BigEndian, ByteOrder};
use bytes::Bytes;
use groupcost_common::Value;

const TAG_NULL: u8 = 0x01;
const TAG_BOOL: u8 = 0x02;
const TAG_INT64: u8 = 0x10;
const TAG_FLOAT64: u8 = 0x11;
const TAG_STRING: u8 = 0x20;
const TAG_BYTES: u8 = 0x30;

const ESCAPE: u8 = 0xFF;
const TERMINATOR: [u8; 2] = [0x00, 0x00];

/// Encodes literal values into lexicographically comparable byte keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyEncoder;

impl KeyEncoder {
    /// Creates an encoder.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Encodes a single-column key.
    #[must_use]
    pub fn encode_value(&self, value: &Value) -> Bytes {
        let mut buf = Vec::with_capacity(16);
        self.append(&mut buf, value);
        Bytes::from(buf)
    }

    /// Encodes a composite key, one segment per value.
    #[must_use]
    pub fn encode(&self, values: &[Value]) -> Bytes {
        let mut buf = Vec::with_capacity(16 * values.len());
        for value in values {
            self.append(&mut buf, value);
        }
        Bytes::from(buf)
    }

    /// Appends one encoded segment to `buf`.
    pub fn append(&self, buf: &mut Vec<u8>, value: &Value) {
        match value {
            Value::Null => buf.push(TAG_NULL),
            Value::Bool(b) => {
                buf.push(TAG_BOOL);
                buf.push(u8::from(*b));
            }
            Value::Int64(i) => {
                buf.push(TAG_INT64);
                let mut word = [0u8; 8];
                BigEndian::write_u64(&mut word, (*i as u64) ^ (1 << 63));
                buf.extend_from_slice(&word);
            }
            Value::Float64(x) => {
                buf.push(TAG_FLOAT64);
                let bits = x.to_bits();
                let ordered = if bits >> 63 == 1 { !bits } else { bits ^ (1 << 63) };
                let mut word = [0u8; 8];
                BigEndian::write_u64(&mut word, ordered);
                buf.extend_from_slice(&word);
            }
            Value::String(s) => {
                buf.push(TAG_STRING);
                append_escaped(buf, s.as_bytes());
            }
            Value::Bytes(b) => {
                buf.push(TAG_BYTES);
                append_escaped(buf, b);
            }
        }
    }
}

fn append_escaped(buf: &mut Vec<u8>, payload: &[u8]) {
    for &byte in payload {
        buf.push(byte);
        if byte == 0 {
            buf.push(ESCAPE);
        }
    }
    buf.extend_from_slice(&TERMINATOR);
}
