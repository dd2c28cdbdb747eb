//! Escape-aware field scanner
//!
//! Splits one raw message into `tag=value` fields on the unescaped
//! delimiter. Single pass, O(n), returns borrowed ranges only.
//! Unescaping is deferred to `FieldValue` and done lazily on read.

use std::borrow::Cow;
use std::iter::FusedIterator;

use super::WireFormat;

/// Scanner failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    /// Escape byte is the last byte of a complete message
    #[error("unterminated escape at byte {offset}")]
    UnterminatedEscape { offset: usize },
}

/// One field as it appears on the wire (tag, `=`, value)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawField<'a> {
    bytes: &'a [u8],
    offset: usize,
    escaped: bool,
    escape: u8,
}

impl<'a> RawField<'a> {
    /// Raw field bytes, escapes still in place
    #[inline(always)]
    pub fn raw(&self) -> &'a [u8] {
        self.bytes
    }

    /// Byte offset of the field inside the message
    #[inline(always)]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// True when the field contains at least one escape sequence
    #[inline(always)]
    pub fn is_escaped(&self) -> bool {
        self.escaped
    }

    /// The whole field viewed as a value
    #[inline(always)]
    pub fn as_value(&self) -> FieldValue<'a> {
        FieldValue {
            raw: self.bytes,
            escaped: self.escaped,
            escape: self.escape,
        }
    }

    /// Split on the first unescaped `=`
    ///
    /// Returns `None` when the field has no separator.
    #[inline]
    pub fn split_tag(&self) -> Option<(&'a [u8], FieldValue<'a>)> {
        let bytes = self.bytes;
        let mut i = 0;
        while i < bytes.len() {
            let b = bytes[i];
            if b == self.escape {
                i += 2;
            } else if b == b'=' {
                let value = &bytes[i + 1..];
                let escaped = self.escaped && value.contains(&self.escape);
                return Some((
                    &bytes[..i],
                    FieldValue {
                        raw: value,
                        escaped,
                        escape: self.escape,
                    },
                ));
            } else {
                i += 1;
            }
        }
        None
    }
}

/// Borrowed field value with decode-on-read semantics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldValue<'a> {
    raw: &'a [u8],
    escaped: bool,
    escape: u8,
}

impl<'a> FieldValue<'a> {
    /// Value with no escape sequences
    #[inline(always)]
    pub const fn plain(raw: &'a [u8]) -> Self {
        Self {
            raw,
            escaped: false,
            escape: WireFormat::PIPE.escape,
        }
    }

    /// Raw bytes, escapes still in place
    #[inline(always)]
    pub fn raw(&self) -> &'a [u8] {
        self.raw
    }

    #[inline(always)]
    pub fn is_escaped(&self) -> bool {
        self.escaped
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Lazily unescaped bytes
    #[inline]
    pub fn bytes(&self) -> Unescaped<'a> {
        Unescaped {
            raw: self.raw,
            pos: 0,
            escape: if self.escaped { Some(self.escape) } else { None },
        }
    }

    /// Length after unescaping
    #[inline]
    pub fn unescaped_len(&self) -> usize {
        if self.escaped {
            self.bytes().count()
        } else {
            self.raw.len()
        }
    }

    /// Unescape into a caller buffer; `None` if it does not fit
    #[inline]
    pub fn unescape_into<'b>(&self, out: &'b mut [u8]) -> Option<&'b [u8]> {
        let mut len = 0;
        for b in self.bytes() {
            *out.get_mut(len)? = b;
            len += 1;
        }
        Some(&out[..len])
    }

    /// Compare the unescaped value against plain bytes
    #[inline]
    pub fn eq_unescaped(&self, other: &[u8]) -> bool {
        if !self.escaped {
            return self.raw == other;
        }
        self.bytes().eq(other.iter().copied())
    }

    /// Unescaped copy; allocates only for escaped values (cold path)
    pub fn to_cow(&self) -> Cow<'a, [u8]> {
        if self.escaped {
            Cow::Owned(self.bytes().collect())
        } else {
            Cow::Borrowed(self.raw)
        }
    }
}

/// Iterator over unescaped value bytes
#[derive(Debug, Clone)]
pub struct Unescaped<'a> {
    raw: &'a [u8],
    pos: usize,
    escape: Option<u8>,
}

impl Iterator for Unescaped<'_> {
    type Item = u8;

    #[inline]
    fn next(&mut self) -> Option<u8> {
        let b = *self.raw.get(self.pos)?;
        match self.escape {
            Some(escape) if b == escape && self.pos + 1 < self.raw.len() => {
                self.pos += 2;
                Some(self.raw[self.pos - 1])
            }
            _ => {
                self.pos += 1;
                Some(b)
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.raw.len() - self.pos;
        ((left + 1) / 2, Some(left))
    }
}

impl FusedIterator for Unescaped<'_> {}

/// Lazy, restartable field scanner over one message
///
/// An escape byte makes the following byte literal: `\|` is a `|` inside
/// the value, `\\` is a single `\`.
#[derive(Debug, Clone)]
pub struct FieldScanner<'a> {
    input: &'a [u8],
    pos: usize,
    format: WireFormat,
    complete: bool,
    finished: bool,
}

impl<'a> FieldScanner<'a> {
    /// Scan a complete message: a trailing unterminated field is the last field
    #[inline]
    pub fn new(input: &'a [u8]) -> Self {
        Self::with_format(input, WireFormat::PIPE, true)
    }

    /// Scan a message still being received: the trailing unterminated
    /// field is withheld, see `remainder_offset`
    #[inline]
    pub fn partial(input: &'a [u8]) -> Self {
        Self::with_format(input, WireFormat::PIPE, false)
    }

    #[inline]
    pub fn with_format(input: &'a [u8], format: WireFormat, complete: bool) -> Self {
        Self {
            input,
            pos: 0,
            format,
            complete,
            finished: false,
        }
    }

    /// Rewind to the first field
    #[inline]
    pub fn restart(&mut self) {
        self.pos = 0;
        self.finished = false;
    }

    /// Start of the bytes not yet yielded as fields
    #[inline(always)]
    pub fn remainder_offset(&self) -> usize {
        self.pos
    }

    #[inline(always)]
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    #[inline(always)]
    fn field(&self, start: usize, end: usize, escaped: bool) -> RawField<'a> {
        RawField {
            bytes: &self.input[start..end],
            offset: start,
            escaped,
            escape: self.format.escape,
        }
    }
}

impl<'a> Iterator for FieldScanner<'a> {
    type Item = Result<RawField<'a>, ScanError>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let input = self.input;
        let start = self.pos;
        let mut escaped = false;
        let mut i = start;

        while i < input.len() {
            let b = input[i];
            if b == self.format.escape {
                if i + 1 >= input.len() {
                    self.finished = true;
                    if self.complete {
                        return Some(Err(ScanError::UnterminatedEscape { offset: i }));
                    }
                    return None;
                }
                escaped = true;
                i += 2;
            } else if b == self.format.delimiter {
                self.pos = i + 1;
                return Some(Ok(self.field(start, i, escaped)));
            } else {
                i += 1;
            }
        }

        self.finished = true;
        if self.complete && i > start {
            self.pos = input.len();
            return Some(Ok(self.field(start, input.len(), escaped)));
        }
        None
    }
}

impl FusedIterator for FieldScanner<'_> {}
