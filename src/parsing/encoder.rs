//! Wire encoder for tag/value messages
//!
//! Cold path: used by tests, benches and replay tools to produce
//! correctly escaped messages. Writes into a caller-owned buffer.

use super::decoder::{TAG_ORDER_ID, TAG_QUANTITY, TAG_SIDE, TAG_SYMBOL, TAG_TIMESTAMP};
use super::WireFormat;
use crate::core::Side;

/// Appends escaped `tag=value` fields to a byte buffer
pub struct MessageEncoder<'b> {
    buf: &'b mut Vec<u8>,
    format: WireFormat,
    fields: usize,
}

impl<'b> MessageEncoder<'b> {
    pub fn new(buf: &'b mut Vec<u8>) -> Self {
        Self::with_format(buf, WireFormat::PIPE)
    }

    pub fn with_format(buf: &'b mut Vec<u8>, format: WireFormat) -> Self {
        Self {
            buf,
            format,
            fields: 0,
        }
    }

    /// Append one field, escaping delimiter and escape bytes in the value
    pub fn field(&mut self, tag: u32, value: &[u8]) -> &mut Self {
        if self.fields > 0 {
            self.buf.push(self.format.delimiter);
        }
        self.write_u64(tag as u64);
        self.buf.push(b'=');
        for &b in value {
            if b == self.format.delimiter || b == self.format.escape {
                self.buf.push(self.format.escape);
            }
            self.buf.push(b);
        }
        self.fields += 1;
        self
    }

    /// Append a numeric field
    pub fn field_u64(&mut self, tag: u32, value: u64) -> &mut Self {
        if self.fields > 0 {
            self.buf.push(self.format.delimiter);
        }
        self.write_u64(tag as u64);
        self.buf.push(b'=');
        self.write_u64(value);
        self.fields += 1;
        self
    }

    /// Append the five required trade fields
    pub fn trade(
        &mut self,
        order_id: &[u8],
        symbol: &[u8],
        side: Side,
        quantity: u64,
        timestamp_us: u64,
    ) -> &mut Self {
        self.field(TAG_ORDER_ID, order_id)
            .field(TAG_SYMBOL, symbol)
            .field(TAG_SIDE, &[side.as_byte()])
            .field_u64(TAG_QUANTITY, quantity)
            .field_u64(TAG_TIMESTAMP, timestamp_us)
    }

    /// Number of fields written so far
    pub fn len(&self) -> usize {
        self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields == 0
    }

    fn write_u64(&mut self, mut value: u64) {
        let mut digits = [0u8; 20];
        let mut i = digits.len();
        loop {
            i -= 1;
            digits[i] = b'0' + (value % 10) as u8;
            value /= 10;
            if value == 0 {
                break;
            }
        }
        self.buf.extend_from_slice(&digits[i..]);
    }
}
