//! Global ingestion counters
//!
//! Lock-free counters using atomic operations.
//! Written only by the ingestion pipeline, read from any thread.

use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_utils::CachePadded;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::{Side, TableError};
use crate::parsing::MalformedKind;

/// Global counters
///
/// Outcome counters are bumped before `total`, and `total` is released
/// last; `snapshot` acquires `total` first. Any snapshot therefore has
/// `accepted + malformed >= total`.
pub struct GlobalCounters {
    total: CachePadded<AtomicU64>,
    accepted: CachePadded<AtomicU64>,
    malformed: CachePadded<AtomicU64>,
    buy: CachePadded<AtomicU64>,
    sell: CachePadded<AtomicU64>,
    capacity_exceeded: CachePadded<AtomicU64>,
    arena_exhausted: CachePadded<AtomicU64>,
    latest_timestamp_us: CachePadded<AtomicU64>,
    malformed_by_kind: [AtomicU64; MalformedKind::COUNT],
}

/// Counter values read in one pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
    pub total: u64,
    pub accepted: u64,
    pub malformed: u64,
    pub buy: u64,
    pub sell: u64,
    pub capacity_exceeded: u64,
    pub arena_exhausted: u64,
    pub latest_timestamp_us: u64,
    pub malformed_by_kind: MalformedBreakdown,
}

/// Malformed counts per `MalformedKind`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MalformedBreakdown([u64; MalformedKind::COUNT]);

impl MalformedBreakdown {
    #[inline]
    pub fn get(&self, kind: MalformedKind) -> u64 {
        self.0[kind.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (MalformedKind, u64)> + '_ {
        MalformedKind::ALL.iter().map(move |&k| (k, self.0[k.index()]))
    }
}

impl Serialize for MalformedBreakdown {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(MalformedKind::COUNT))?;
        for (kind, count) in self.iter() {
            map.serialize_entry(kind.name(), &count)?;
        }
        map.end()
    }
}

impl GlobalCounters {
    pub fn new() -> Self {
        Self {
            total: CachePadded::new(AtomicU64::new(0)),
            accepted: CachePadded::new(AtomicU64::new(0)),
            malformed: CachePadded::new(AtomicU64::new(0)),
            buy: CachePadded::new(AtomicU64::new(0)),
            sell: CachePadded::new(AtomicU64::new(0)),
            capacity_exceeded: CachePadded::new(AtomicU64::new(0)),
            arena_exhausted: CachePadded::new(AtomicU64::new(0)),
            latest_timestamp_us: CachePadded::new(AtomicU64::new(0)),
            malformed_by_kind: Default::default(),
        }
    }

    /// Record an accepted message
    #[inline]
    pub(crate) fn record_accepted(&self, side: Side, timestamp_us: u64) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
        match side {
            Side::Buy => self.buy.fetch_add(1, Ordering::Relaxed),
            Side::Sell => self.sell.fetch_add(1, Ordering::Relaxed),
        };
        self.latest_timestamp_us
            .fetch_max(timestamp_us, Ordering::Relaxed);
    }

    /// Record an accepted message that has no per-symbol row
    #[inline]
    pub(crate) fn record_untracked(&self, error: TableError) {
        match error {
            TableError::CapacityExceeded { .. } => {
                self.capacity_exceeded.fetch_add(1, Ordering::Relaxed)
            }
            TableError::ArenaExhausted { .. } => {
                self.arena_exhausted.fetch_add(1, Ordering::Relaxed)
            }
        };
    }

    /// Record a malformed message
    #[inline]
    pub(crate) fn record_malformed(&self, kind: MalformedKind) {
        self.malformed.fetch_add(1, Ordering::Relaxed);
        self.malformed_by_kind[kind.index()].fetch_add(1, Ordering::Relaxed);
    }

    /// Close out one message; must follow its outcome counters
    #[inline]
    pub(crate) fn finish_message(&self) {
        self.total.fetch_add(1, Ordering::Release);
    }

    #[inline]
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Acquire)
    }

    #[inline]
    pub fn malformed(&self) -> u64 {
        self.malformed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn capacity_exceeded(&self) -> u64 {
        self.capacity_exceeded.load(Ordering::Relaxed)
    }

    /// Read every counter, `total` first
    pub fn snapshot(&self) -> CounterSnapshot {
        let total = self.total.load(Ordering::Acquire);

        let mut by_kind = [0u64; MalformedKind::COUNT];
        for (dst, src) in by_kind.iter_mut().zip(self.malformed_by_kind.iter()) {
            *dst = src.load(Ordering::Relaxed);
        }

        CounterSnapshot {
            total,
            accepted: self.accepted.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            buy: self.buy.load(Ordering::Relaxed),
            sell: self.sell.load(Ordering::Relaxed),
            capacity_exceeded: self.capacity_exceeded.load(Ordering::Relaxed),
            arena_exhausted: self.arena_exhausted.load(Ordering::Relaxed),
            latest_timestamp_us: self.latest_timestamp_us.load(Ordering::Relaxed),
            malformed_by_kind: MalformedBreakdown(by_kind),
        }
    }
}

impl Default for GlobalCounters {
    fn default() -> Self {
        Self::new()
    }
}
