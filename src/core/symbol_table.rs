//! Fixed-capacity, open-addressed symbol table
//!
//! Single writer (the ingestion pipeline), any number of readers.
//! Slots are claimed once with a compare-and-swap on the key hash, their
//! arena span is published with a release store, and they are never
//! deleted or reused. Readers treat a slot as live only after an acquire
//! load observes the published span.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use super::arena::{ArenaSpan, SymbolArena};
use super::symbol::Symbol;

/// Key hash of a slot that was never claimed
const EMPTY_HASH: u64 = 0;

/// Table insertion failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    #[error("symbol table capacity exceeded ({capacity} slots)")]
    CapacityExceeded { capacity: usize },

    #[error("symbol arena exhausted ({capacity} bytes)")]
    ArenaExhausted { capacity: usize },
}

/// Handle to a claimed slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotHandle(u32);

impl SlotHandle {
    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Point-in-time read of one live slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolStats {
    pub symbol: Symbol,
    pub count: u64,
    pub volume: u64,
}

#[repr(C, align(32))]
struct SymbolSlot {
    key_hash: AtomicU64,
    span: AtomicU64,
    count: AtomicU64,
    volume: AtomicU64,
}

impl SymbolSlot {
    fn new() -> Self {
        Self {
            key_hash: AtomicU64::new(EMPTY_HASH),
            span: AtomicU64::new(0),
            count: AtomicU64::new(0),
            volume: AtomicU64::new(0),
        }
    }
}

/// Symbol -> (count, volume) table
pub struct SymbolTable {
    slots: Box<[SymbolSlot]>,
    arena: SymbolArena,
    live: AtomicUsize,
    /// Longest distance from home slot of any claimed slot
    max_distance: AtomicUsize,
}

impl SymbolTable {
    /// Pre-allocate `slot_capacity` slots and an `arena_bytes` symbol arena
    pub fn new(slot_capacity: usize, arena_bytes: usize) -> Self {
        Self {
            slots: (0..slot_capacity).map(|_| SymbolSlot::new()).collect(),
            arena: SymbolArena::with_capacity(arena_bytes),
            live: AtomicUsize::new(0),
            max_distance: AtomicUsize::new(0),
        }
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of published slots
    #[inline(always)]
    pub fn live_slots(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    /// Longest linear-probing run any lookup needs to walk
    #[inline(always)]
    pub fn max_distance(&self) -> usize {
        self.max_distance.load(Ordering::Acquire)
    }

    #[inline(always)]
    pub fn arena_used(&self) -> usize {
        self.arena.used()
    }

    #[inline(always)]
    pub fn arena_capacity(&self) -> usize {
        self.arena.capacity()
    }

    /// Find or claim the slot for `symbol`. Ingestion thread only.
    pub(crate) fn get_or_create_slot(&self, symbol: &Symbol) -> Result<SlotHandle, TableError> {
        let capacity = self.slots.len();
        if capacity == 0 {
            return Err(TableError::CapacityExceeded { capacity });
        }

        let bytes = symbol.as_bytes();
        let hash = hash_symbol(bytes);
        let mut index = (hash % capacity as u64) as usize;

        // A full table has no empty slot to end the chain: every stored
        // symbol sits within `max_distance` of its home slot.
        let steps = if self.live.load(Ordering::Acquire) >= capacity {
            self.max_distance() + 1
        } else {
            capacity
        };

        for distance in 0..steps.min(capacity) {
            let slot = &self.slots[index];
            let current = slot.key_hash.load(Ordering::Acquire);

            if current == EMPTY_HASH {
                // An empty slot ends the probe chain: the symbol is new.
                if self.arena.remaining() < bytes.len() {
                    return Err(TableError::ArenaExhausted {
                        capacity: self.arena.capacity(),
                    });
                }
                match slot.key_hash.compare_exchange(
                    EMPTY_HASH,
                    hash,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                ) {
                    Ok(_) => return self.publish(slot, index, distance, bytes),
                    Err(actual) => {
                        if actual == hash && self.slot_matches(slot, bytes) {
                            return Ok(SlotHandle(index as u32));
                        }
                    }
                }
            } else if current == hash && self.slot_matches(slot, bytes) {
                return Ok(SlotHandle(index as u32));
            }

            index += 1;
            if index == capacity {
                index = 0;
            }
        }

        Err(TableError::CapacityExceeded { capacity })
    }

    fn publish(
        &self,
        slot: &SymbolSlot,
        index: usize,
        distance: usize,
        bytes: &[u8],
    ) -> Result<SlotHandle, TableError> {
        let Some(span) = self.arena.alloc(bytes) else {
            slot.key_hash.store(EMPTY_HASH, Ordering::Release);
            return Err(TableError::ArenaExhausted {
                capacity: self.arena.capacity(),
            });
        };
        // Raised before the span is published so readers never stop short
        self.max_distance.fetch_max(distance, Ordering::Release);
        slot.span.store(span.pack(), Ordering::Release);
        self.live.fetch_add(1, Ordering::Release);
        Ok(SlotHandle(index as u32))
    }

    #[inline]
    fn slot_matches(&self, slot: &SymbolSlot, bytes: &[u8]) -> bool {
        match ArenaSpan::unpack(slot.span.load(Ordering::Acquire)) {
            Some(span) => self.arena.eq_bytes(span, bytes),
            None => false,
        }
    }

    /// Count one trade on a claimed slot. Ingestion thread only.
    #[inline(always)]
    pub(crate) fn record_trade(&self, handle: SlotHandle, quantity: u64) {
        let slot = &self.slots[handle.index()];
        slot.count.fetch_add(1, Ordering::Relaxed);
        slot.volume.fetch_add(quantity, Ordering::Relaxed);
    }

    #[inline]
    fn read_slot(&self, slot: &SymbolSlot) -> Option<SymbolStats> {
        if slot.key_hash.load(Ordering::Acquire) == EMPTY_HASH {
            return None;
        }
        let span = ArenaSpan::unpack(slot.span.load(Ordering::Acquire))?;
        Some(SymbolStats {
            symbol: self.arena.read(span),
            count: slot.count.load(Ordering::Relaxed),
            volume: slot.volume.load(Ordering::Relaxed),
        })
    }

    /// Visit every published slot. Safe from any thread, never blocks.
    pub fn for_each_live_slot<F>(&self, mut visitor: F)
    where
        F: FnMut(SymbolStats),
    {
        for slot in self.slots.iter() {
            if let Some(stats) = self.read_slot(slot) {
                visitor(stats);
            }
        }
    }

    /// Like `for_each_live_slot`, stopping at the first visitor error
    pub fn try_for_each_live_slot<F, E>(&self, mut visitor: F) -> Result<(), E>
    where
        F: FnMut(SymbolStats) -> Result<(), E>,
    {
        for slot in self.slots.iter() {
            if let Some(stats) = self.read_slot(slot) {
                visitor(stats)?;
            }
        }
        Ok(())
    }

    /// Ad-hoc lookup from any thread
    pub fn lookup(&self, symbol: &[u8]) -> Option<SymbolStats> {
        let capacity = self.slots.len();
        if capacity == 0 || symbol.is_empty() {
            return None;
        }

        let hash = hash_symbol(symbol);
        let mut index = (hash % capacity as u64) as usize;
        let steps = (self.max_distance() + 1).min(capacity);

        for _ in 0..steps {
            let slot = &self.slots[index];
            let current = slot.key_hash.load(Ordering::Acquire);
            if current == EMPTY_HASH {
                return None;
            }
            if current == hash && self.slot_matches(slot, symbol) {
                return self.read_slot(slot);
            }
            index += 1;
            if index == capacity {
                index = 0;
            }
        }
        None
    }
}

/// FNV-1a with a final avalanche; never returns `EMPTY_HASH`
#[inline(always)]
fn hash_symbol(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &byte in bytes {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    // splitmix64 finalizer spreads FNV's weak low bits before `% capacity`
    hash ^= hash >> 30;
    hash = hash.wrapping_mul(0xbf58_476d_1ce4_e5b9);
    hash ^= hash >> 27;
    hash = hash.wrapping_mul(0x94d0_49bb_1331_11eb);
    hash ^= hash >> 31;

    if hash == EMPTY_HASH {
        1
    } else {
        hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(s: &str) -> Symbol {
        Symbol::from_bytes(s.as_bytes()).unwrap()
    }

    #[test]
    fn test_hash_symbol() {
        assert_ne!(hash_symbol(b"BTCUSDT"), EMPTY_HASH);
        assert_eq!(hash_symbol(b"BTCUSDT"), hash_symbol(b"BTCUSDT"));
        assert_ne!(hash_symbol(b"BTCUSDT"), hash_symbol(b"ETHUSDT"));
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let table = SymbolTable::new(8, 64);
        let a = table.get_or_create_slot(&sym("BTCUSDT")).unwrap();
        let b = table.get_or_create_slot(&sym("BTCUSDT")).unwrap();
        let c = table.get_or_create_slot(&sym("ETHUSDT")).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(table.live_slots(), 2);
        assert_eq!(table.arena_used(), 14);
    }

    #[test]
    fn test_record_and_lookup() {
        let table = SymbolTable::new(8, 64);
        let h = table.get_or_create_slot(&sym("SOL")).unwrap();
        table.record_trade(h, 10);
        table.record_trade(h, 32);

        let stats = table.lookup(b"SOL").unwrap();
        assert_eq!(stats.symbol, sym("SOL"));
        assert_eq!(stats.count, 2);
        assert_eq!(stats.volume, 42);
        assert!(table.lookup(b"DOGE").is_none());
    }

    #[test]
    fn test_capacity_exceeded() {
        let table = SymbolTable::new(3, 64);
        for s in ["A", "B", "C"] {
            table.get_or_create_slot(&sym(s)).unwrap();
        }
        assert_eq!(
            table.get_or_create_slot(&sym("D")),
            Err(TableError::CapacityExceeded { capacity: 3 })
        );
        // Existing symbols still resolve when full
        assert!(table.get_or_create_slot(&sym("B")).is_ok());
        assert_eq!(table.live_slots(), 3);
    }

    #[test]
    fn test_arena_exhausted_leaves_slot_empty() {
        let table = SymbolTable::new(8, 6);
        table.get_or_create_slot(&sym("ABCD")).unwrap();
        assert_eq!(
            table.get_or_create_slot(&sym("EFG")),
            Err(TableError::ArenaExhausted { capacity: 6 })
        );
        assert_eq!(table.live_slots(), 1);
        let mut seen = 0;
        table.for_each_live_slot(|_| seen += 1);
        assert_eq!(seen, 1);
        // Shorter symbol still fits
        assert!(table.get_or_create_slot(&sym("EF")).is_ok());
    }

    #[test]
    fn test_probing_wraps_around() {
        // Capacity 1 forces every symbol onto the same home slot
        let table = SymbolTable::new(1, 16);
        table.get_or_create_slot(&sym("X")).unwrap();
        assert!(table.get_or_create_slot(&sym("Y")).is_err());

        let table = SymbolTable::new(5, 64);
        let names = ["A1", "B2", "C3", "D4", "E5"];
        for n in names {
            table.get_or_create_slot(&sym(n)).unwrap();
        }
        for n in names {
            assert_eq!(table.lookup(n.as_bytes()).unwrap().symbol, sym(n));
        }
    }

    #[test]
    fn test_full_table_walks_only_longest_run() {
        let table = SymbolTable::new(64, 1024);
        let names: Vec<String> = (0..64).map(|i| format!("S{i}")).collect();
        let mut longest = 0;
        for n in &names {
            let handle = table.get_or_create_slot(&sym(n)).unwrap();
            let home = (hash_symbol(n.as_bytes()) % 64) as usize;
            longest = longest.max((handle.index() + 64 - home) % 64);
        }
        assert_eq!(table.live_slots(), 64);
        assert_eq!(table.max_distance(), longest);

        assert_eq!(
            table.get_or_create_slot(&sym("NEW")),
            Err(TableError::CapacityExceeded { capacity: 64 })
        );
        assert!(table.lookup(b"NEW").is_none());
        for n in &names {
            let handle = table.get_or_create_slot(&sym(n)).unwrap();
            table.record_trade(handle, 1);
            assert_eq!(table.lookup(n.as_bytes()).unwrap().count, 1);
        }
    }

    #[test]
    fn test_try_for_each_stops_on_error() {
        let table = SymbolTable::new(8, 64);
        for s in ["A", "B", "C"] {
            table.get_or_create_slot(&sym(s)).unwrap();
        }
        let mut visited = 0;
        let result: Result<(), ()> = table.try_for_each_live_slot(|_| {
            visited += 1;
            if visited == 2 {
                Err(())
            } else {
                Ok(())
            }
        });
        assert!(result.is_err());
        assert_eq!(visited, 2);
    }

    #[test]
    fn test_zero_capacity_table() {
        let table = SymbolTable::new(0, 64);
        assert_eq!(
            table.get_or_create_slot(&sym("A")),
            Err(TableError::CapacityExceeded { capacity: 0 })
        );
        assert!(table.lookup(b"A").is_none());
    }
}
