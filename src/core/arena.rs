//! Bump-pointer arena for symbol bytes
//!
//! Allocated once at construction. Only the ingesting thread allocates;
//! readers copy bytes out of spans they obtained through an acquire load
//! of the owning slot.

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

use super::symbol::{Symbol, MAX_SYMBOL_LEN};

const PUBLISHED: u64 = 1 << 63;

/// Location of one symbol inside the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaSpan {
    offset: u32,
    len: u8,
}

impl ArenaSpan {
    #[inline(always)]
    pub fn offset(&self) -> usize {
        self.offset as usize
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Pack into one word for atomic publication; never zero
    #[inline(always)]
    pub(crate) const fn pack(self) -> u64 {
        PUBLISHED | ((self.offset as u64) << 8) | self.len as u64
    }

    /// Inverse of `pack`; zero means "not published"
    #[inline(always)]
    pub(crate) const fn unpack(word: u64) -> Option<Self> {
        if word & PUBLISHED == 0 {
            return None;
        }
        Some(Self {
            offset: (word >> 8) as u32,
            len: word as u8,
        })
    }
}

/// Fixed-capacity symbol byte arena
pub struct SymbolArena {
    bytes: Box<[AtomicU8]>,
    head: AtomicUsize,
}

impl SymbolArena {
    /// Largest supported arena (offsets are packed as u32)
    pub const MAX_CAPACITY: usize = u32::MAX as usize;

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.min(Self::MAX_CAPACITY);
        Self {
            bytes: (0..capacity).map(|_| AtomicU8::new(0)).collect(),
            head: AtomicUsize::new(0),
        }
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    /// Bytes handed out so far
    #[inline(always)]
    pub fn used(&self) -> usize {
        self.head.load(Ordering::Relaxed)
    }

    #[inline(always)]
    pub fn remaining(&self) -> usize {
        self.capacity() - self.used()
    }

    /// Copy `symbol` into the arena. Single writer only.
    ///
    /// The returned span must be published with a release store before
    /// any reader may use it.
    #[inline]
    pub(crate) fn alloc(&self, symbol: &[u8]) -> Option<ArenaSpan> {
        let offset = self.head.load(Ordering::Relaxed);
        let end = offset.checked_add(symbol.len())?;
        if end > self.capacity() || symbol.len() > MAX_SYMBOL_LEN {
            return None;
        }

        for (cell, &b) in self.bytes[offset..end].iter().zip(symbol) {
            cell.store(b, Ordering::Relaxed);
        }
        self.head.store(end, Ordering::Relaxed);

        Some(ArenaSpan {
            offset: offset as u32,
            len: symbol.len() as u8,
        })
    }

    /// Copy a published span out as a `Symbol`
    #[inline]
    pub(crate) fn read(&self, span: ArenaSpan) -> Symbol {
        let mut buf = [0u8; MAX_SYMBOL_LEN];
        let src = &self.bytes[span.offset()..span.offset() + span.len()];
        for (dst, cell) in buf.iter_mut().zip(src) {
            *dst = cell.load(Ordering::Relaxed);
        }
        Symbol::from_validated(buf, span.len())
    }

    /// Compare a published span against plain bytes
    #[inline]
    pub(crate) fn eq_bytes(&self, span: ArenaSpan, other: &[u8]) -> bool {
        if span.len() != other.len() {
            return false;
        }
        self.bytes[span.offset()..span.offset() + span.len()]
            .iter()
            .zip(other)
            .all(|(cell, &b)| cell.load(Ordering::Relaxed) == b)
    }
}
