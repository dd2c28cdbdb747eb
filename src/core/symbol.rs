//! Inline symbol key for zero-allocation string handling
//!
//! Symbols are stored as a fixed-size byte array plus length.
//! Copy type: built from borrowed (possibly escaped) wire bytes on the stack.

use std::fmt;

use crate::parsing::FieldValue;

/// Maximum symbol length in bytes (after unescaping)
pub const MAX_SYMBOL_LEN: usize = 32;

/// Bounded, inline trading symbol
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol {
    len: u8,
    bytes: [u8; MAX_SYMBOL_LEN],
}

/// Why a byte sequence is not a valid symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolError {
    Empty,
    TooLong { len: usize },
    InvalidByte,
}

impl Symbol {
    /// Build from plain bytes
    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SymbolError> {
        if bytes.is_empty() {
            return Err(SymbolError::Empty);
        }
        if bytes.len() > MAX_SYMBOL_LEN {
            return Err(SymbolError::TooLong { len: bytes.len() });
        }

        let mut symbol = Self::EMPTY;
        for (dst, &b) in symbol.bytes.iter_mut().zip(bytes) {
            if !b.is_ascii_graphic() {
                return Err(SymbolError::InvalidByte);
            }
            *dst = b;
        }
        symbol.len = bytes.len() as u8;
        Ok(symbol)
    }

    /// Build from a wire value, unescaping on the fly
    #[inline]
    pub fn from_field(value: &FieldValue<'_>) -> Result<Self, SymbolError> {
        if !value.is_escaped() {
            return Self::from_bytes(value.raw());
        }

        let mut symbol = Self::EMPTY;
        let mut len = 0usize;
        for b in value.bytes() {
            if len == MAX_SYMBOL_LEN {
                return Err(SymbolError::TooLong { len: value.unescaped_len() });
            }
            if !b.is_ascii_graphic() {
                return Err(SymbolError::InvalidByte);
            }
            symbol.bytes[len] = b;
            len += 1;
        }
        if len == 0 {
            return Err(SymbolError::Empty);
        }
        symbol.len = len as u8;
        Ok(symbol)
    }

    const EMPTY: Self = Self {
        len: 0,
        bytes: [0; MAX_SYMBOL_LEN],
    };

    /// Rebuild from bytes that were validated when first stored.
    /// `bytes[len..]` must be zero.
    #[inline(always)]
    pub(crate) const fn from_validated(bytes: [u8; MAX_SYMBOL_LEN], len: usize) -> Self {
        Self {
            len: len as u8,
            bytes,
        }
    }

    #[inline(always)]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    /// Symbol text. Always valid: only printable ASCII is admitted.
    #[inline]
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(self.as_bytes()).unwrap_or("")
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Symbol").field(&self.as_str()).finish()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::FieldScanner;

    #[test]
    fn test_from_bytes() {
        let sym = Symbol::from_bytes(b"BTCUSDT").unwrap();
        assert_eq!(sym.as_bytes(), b"BTCUSDT");
        assert_eq!(sym.as_str(), "BTCUSDT");
        assert_eq!(sym.len(), 7);
    }

    #[test]
    fn test_invalid_symbol() {
        assert_eq!(Symbol::from_bytes(b""), Err(SymbolError::Empty));
        assert_eq!(Symbol::from_bytes(b"BTC USD"), Err(SymbolError::InvalidByte));
        assert_eq!(
            Symbol::from_bytes(&[b'A'; MAX_SYMBOL_LEN + 1]),
            Err(SymbolError::TooLong { len: MAX_SYMBOL_LEN + 1 })
        );
        assert!(Symbol::from_bytes(&[b'A'; MAX_SYMBOL_LEN]).is_ok());
    }

    #[test]
    fn test_from_escaped_field() {
        let mut scanner = FieldScanner::new(br"A\|B");
        let field = scanner.next().unwrap().unwrap();
        let sym = Symbol::from_field(&field.as_value()).unwrap();
        assert_eq!(sym.as_bytes(), b"A|B");
    }

    #[test]
    fn test_escaped_too_long() {
        // 33 unescaped bytes, 34 raw bytes
        let mut raw = vec![b'X'; MAX_SYMBOL_LEN];
        raw.extend_from_slice(br"\\");
        let mut scanner = FieldScanner::new(&raw);
        let field = scanner.next().unwrap().unwrap();
        assert_eq!(
            Symbol::from_field(&field.as_value()),
            Err(SymbolError::TooLong { len: MAX_SYMBOL_LEN + 1 })
        );
    }

    #[test]
    fn test_symbol_comparison() {
        let a = Symbol::from_bytes(b"ETHUSDT").unwrap();
        let b = Symbol::from_bytes(b"ETHUSDT").unwrap();
        let c = Symbol::from_bytes(b"ETHUSD").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(format!("{}", a), "ETHUSDT");
    }
}
