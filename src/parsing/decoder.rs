//! Field decoder
//!
//! Projects the scanned field sequence onto a `TradeRecord`.
//! Only the required tags are decoded; every other tag is ignored
//! once it has a valid `tag=value` shape.

use super::scanner::{FieldScanner, FieldValue, RawField, ScanError};
use super::{parse_tag, parse_u64, NumberError, WireFormat};
use crate::core::symbol::{SymbolError, MAX_SYMBOL_LEN};
use crate::core::{Side, Symbol, TradeRecord};

pub const TAG_ORDER_ID: u32 = 11;
pub const TAG_QUANTITY: u32 = 38;
pub const TAG_TIMESTAMP: u32 = 52;
pub const TAG_SIDE: u32 = 54;
pub const TAG_SYMBOL: u32 = 55;

/// Decoder failure. Every variant means "malformed message" to ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("unterminated escape at byte {offset}")]
    UnterminatedEscape { offset: usize },

    #[error("field {index} has no '=' separator")]
    MissingSeparator { index: usize },

    #[error("field {index} has an invalid tag")]
    InvalidTag { index: usize },

    #[error("required tag {0} missing")]
    MissingField(u32),

    #[error("tag {0} could not be parsed")]
    UnparseableField(u32),

    #[error("required tag {0} repeated")]
    DuplicateField(u32),

    #[error("quantity exceeds u64 range")]
    QuantityOverflow,

    #[error("symbol length {len} exceeds maximum {max}")]
    SymbolTooLong { len: usize, max: usize },
}

impl From<ScanError> for DecodeError {
    fn from(e: ScanError) -> Self {
        match e {
            ScanError::UnterminatedEscape { offset } => Self::UnterminatedEscape { offset },
        }
    }
}

/// Pipeline stage a message reached before failing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageStage {
    Received,
    Scanned,
    Decoded,
}

/// Counter bucket for a malformed message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MalformedKind {
    UnterminatedEscape = 0,
    MissingSeparator,
    InvalidTag,
    MissingField,
    UnparseableField,
    DuplicateField,
    QuantityOverflow,
    SymbolTooLong,
}

impl MalformedKind {
    pub const COUNT: usize = 8;

    pub const ALL: [Self; Self::COUNT] = [
        Self::UnterminatedEscape,
        Self::MissingSeparator,
        Self::InvalidTag,
        Self::MissingField,
        Self::UnparseableField,
        Self::DuplicateField,
        Self::QuantityOverflow,
        Self::SymbolTooLong,
    ];

    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::UnterminatedEscape => "unterminated_escape",
            Self::MissingSeparator => "missing_separator",
            Self::InvalidTag => "invalid_tag",
            Self::MissingField => "missing_field",
            Self::UnparseableField => "unparseable_field",
            Self::DuplicateField => "duplicate_field",
            Self::QuantityOverflow => "quantity_overflow",
            Self::SymbolTooLong => "symbol_too_long",
        }
    }
}

impl DecodeError {
    #[inline]
    pub const fn kind(&self) -> MalformedKind {
        match self {
            Self::UnterminatedEscape { .. } => MalformedKind::UnterminatedEscape,
            Self::MissingSeparator { .. } => MalformedKind::MissingSeparator,
            Self::InvalidTag { .. } => MalformedKind::InvalidTag,
            Self::MissingField(_) => MalformedKind::MissingField,
            Self::UnparseableField(_) => MalformedKind::UnparseableField,
            Self::DuplicateField(_) => MalformedKind::DuplicateField,
            Self::QuantityOverflow => MalformedKind::QuantityOverflow,
            Self::SymbolTooLong { .. } => MalformedKind::SymbolTooLong,
        }
    }

    /// Last stage the message completed
    ///
    /// Framing wins: a message with an unterminated escape is reported as
    /// such even when an earlier field is also invalid.
    #[inline]
    pub const fn failed_after(&self) -> MessageStage {
        match self {
            Self::UnterminatedEscape { .. } => MessageStage::Received,
            _ => MessageStage::Scanned,
        }
    }
}

/// One `tag=value` pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedField<'a> {
    pub tag: u32,
    pub value: FieldValue<'a>,
}

impl<'a> DecodedField<'a> {
    /// Split a raw field on its first unescaped `=`
    #[inline]
    pub fn parse(index: usize, field: &RawField<'a>) -> Result<Self, DecodeError> {
        let (tag, value) = field
            .split_tag()
            .ok_or(DecodeError::MissingSeparator { index })?;
        let tag = parse_tag(tag).ok_or(DecodeError::InvalidTag { index })?;
        Ok(Self { tag, value })
    }
}

/// Stateless decoder for trade messages
pub struct FieldDecoder;

impl FieldDecoder {
    /// Decode a complete message in the default wire format
    #[inline]
    pub fn decode(message: &[u8]) -> Result<TradeRecord<'_>, DecodeError> {
        Self::decode_fields(FieldScanner::new(message))
    }

    /// Decode a complete message in a custom wire format
    #[inline]
    pub fn decode_with(message: &[u8], format: WireFormat) -> Result<TradeRecord<'_>, DecodeError> {
        Self::decode_fields(FieldScanner::with_format(message, format, true))
    }

    /// Decode from any field sequence
    pub fn decode_fields<'a, I>(fields: I) -> Result<TradeRecord<'a>, DecodeError>
    where
        I: IntoIterator<Item = Result<RawField<'a>, ScanError>>,
    {
        let mut order_id = None;
        let mut symbol = None;
        let mut side = None;
        let mut quantity = None;
        let mut timestamp_us = None;

        let mut fields = fields.into_iter().enumerate();
        while let Some((index, field)) = fields.next() {
            let applied = DecodedField::parse(index, &field?).and_then(|field| match field.tag {
                TAG_ORDER_ID => {
                    set_once(&mut order_id, field.tag, Self::order_id(&field.value)?)
                }
                TAG_SYMBOL => set_once(&mut symbol, field.tag, Self::symbol(&field.value)?),
                TAG_SIDE => set_once(
                    &mut side,
                    field.tag,
                    Side::from_field(&field.value).ok_or(DecodeError::UnparseableField(TAG_SIDE))?,
                ),
                TAG_QUANTITY => {
                    set_once(&mut quantity, field.tag, Self::quantity(&field.value)?)
                }
                TAG_TIMESTAMP => set_once(
                    &mut timestamp_us,
                    field.tag,
                    parse_u64(field.value.bytes())
                        .map_err(|_| DecodeError::UnparseableField(TAG_TIMESTAMP))?,
                ),
                _ => Ok(()),
            });
            if let Err(error) = applied {
                // A message that never finished scanning fails on its framing
                return Err(Self::scan_error(fields.map(|(_, rest)| rest)).unwrap_or(error));
            }
        }

        Ok(TradeRecord {
            order_id: order_id.ok_or(DecodeError::MissingField(TAG_ORDER_ID))?,
            symbol: symbol.ok_or(DecodeError::MissingField(TAG_SYMBOL))?,
            side: side.ok_or(DecodeError::MissingField(TAG_SIDE))?,
            quantity: quantity.ok_or(DecodeError::MissingField(TAG_QUANTITY))?,
            timestamp_us: timestamp_us.ok_or(DecodeError::MissingField(TAG_TIMESTAMP))?,
        })
    }

    /// First framing error in the unread fields
    #[cold]
    fn scan_error<'a, I>(rest: I) -> Option<DecodeError>
    where
        I: Iterator<Item = Result<RawField<'a>, ScanError>>,
    {
        rest.filter_map(Result::err).next().map(DecodeError::from)
    }

    #[inline]
    fn order_id<'a>(value: &FieldValue<'a>) -> Result<FieldValue<'a>, DecodeError> {
        if value.is_empty() {
            return Err(DecodeError::UnparseableField(TAG_ORDER_ID));
        }
        Ok(*value)
    }

    #[inline]
    fn symbol(value: &FieldValue<'_>) -> Result<Symbol, DecodeError> {
        Symbol::from_field(value).map_err(|e| match e {
            SymbolError::TooLong { len } => DecodeError::SymbolTooLong {
                len,
                max: MAX_SYMBOL_LEN,
            },
            SymbolError::Empty | SymbolError::InvalidByte => {
                DecodeError::UnparseableField(TAG_SYMBOL)
            }
        })
    }

    #[inline]
    fn quantity(value: &FieldValue<'_>) -> Result<u64, DecodeError> {
        parse_u64(value.bytes()).map_err(|e| match e {
            NumberError::Overflow => DecodeError::QuantityOverflow,
            NumberError::Empty | NumberError::InvalidDigit => {
                DecodeError::UnparseableField(TAG_QUANTITY)
            }
        })
    }
}

#[inline(always)]
fn set_once<T>(slot: &mut Option<T>, tag: u32, value: T) -> Result<(), DecodeError> {
    if slot.is_some() {
        return Err(DecodeError::DuplicateField(tag));
    }
    *slot = Some(value);
    Ok(())
}
