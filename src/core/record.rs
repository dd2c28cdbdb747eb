//! Trade record types
//!
//! TradeRecord is the validated projection of one wire message.
//! Created by the decoder, consumed immediately by ingestion, never stored.

use super::Symbol;
use crate::parsing::FieldValue;

/// Trade side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Side {
    Buy = 1,
    Sell = 2,
}

impl Side {
    /// Parse side from a tag 54 value: `1` = buy, `2` = sell
    #[inline]
    pub fn from_field(value: &FieldValue<'_>) -> Option<Self> {
        let mut bytes = value.bytes();
        match (bytes.next(), bytes.next()) {
            (Some(b'1'), None) => Some(Self::Buy),
            (Some(b'2'), None) => Some(Self::Sell),
            _ => None,
        }
    }

    /// Wire byte for this side
    #[inline(always)]
    pub const fn as_byte(&self) -> u8 {
        match self {
            Self::Buy => b'1',
            Self::Sell => b'2',
        }
    }

    /// Returns true if Buy
    #[inline(always)]
    pub const fn is_buy(&self) -> bool {
        matches!(self, Self::Buy)
    }

    /// Returns true if Sell
    #[inline(always)]
    pub const fn is_sell(&self) -> bool {
        matches!(self, Self::Sell)
    }
}

/// Validated trade message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeRecord<'a> {
    /// Order id (tag 11), borrowed from the message
    pub order_id: FieldValue<'a>,
    /// Trading symbol (tag 55)
    pub symbol: Symbol,
    /// Trade side (tag 54)
    pub side: Side,
    /// Quantity (tag 38)
    pub quantity: u64,
    /// Timestamp (tag 52), microseconds since epoch
    pub timestamp_us: u64,
}


// Hot path checklist:
// ✓ No heap allocations (Copy types only)
// ✓ Order id stays a borrowed view
