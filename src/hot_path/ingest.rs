//! Ingestion pipeline (Hot Path)
//!
//! The single writer of the symbol table and global counters.
//! Per message: Received -> Scanned -> Decoded -> {Accepted | Malformed}.
//! Messages are processed strictly in arrival order; a bad message is
//! counted and skipped, never fatal.
//!
//! HFT: no heap allocation, no locks, no per-message logging.

use std::sync::Arc;

use crate::core::{GlobalCounters, SlotHandle, SymbolTable, TableError, TradeRecord};
use crate::parsing::{DecodeError, FieldDecoder, MessageStage, WireFormat};
use crate::report::StatsReader;

/// Result of ingesting one message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    /// Counted in totals and in the symbol's row
    Accepted(SlotHandle),
    /// Counted in totals; the symbol has no row (table or arena full)
    AcceptedUntracked(TableError),
    /// Counted as malformed only
    Malformed(DecodeError),
}

impl MessageOutcome {
    #[inline]
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Self::Malformed(_))
    }

    /// Last stage the message completed
    #[inline]
    pub fn stage(&self) -> MessageStage {
        match self {
            Self::Malformed(e) => e.failed_after(),
            _ => MessageStage::Decoded,
        }
    }
}

/// Per-call tallies from `ingest_all`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub messages: u64,
    pub accepted: u64,
    pub untracked: u64,
    pub malformed: u64,
}

/// Single-writer ingestion pipeline
///
/// Only `StatsEngine::build` creates one; it is not `Clone`, and every
/// mutating entry point takes `&mut self`.
pub struct Ingestor {
    table: Arc<SymbolTable>,
    counters: Arc<GlobalCounters>,
    format: WireFormat,
    table_full_logged: bool,
    arena_full_logged: bool,
}

impl Ingestor {
    pub(crate) fn new(
        table: Arc<SymbolTable>,
        counters: Arc<GlobalCounters>,
        format: WireFormat,
    ) -> Self {
        Self {
            table,
            counters,
            format,
            table_full_logged: false,
            arena_full_logged: false,
        }
    }

    /// Ingest one complete message
    #[inline]
    pub fn ingest(&mut self, message: &[u8]) -> MessageOutcome {
        let outcome = match FieldDecoder::decode_with(message, self.format) {
            Ok(record) => self.accept(&record),
            Err(error) => {
                self.counters.record_malformed(error.kind());
                MessageOutcome::Malformed(error)
            }
        };
        self.counters.finish_message();
        outcome
    }

    /// Ingest a batch in order
    pub fn ingest_all<'m, I>(&mut self, messages: I) -> IngestSummary
    where
        I: IntoIterator<Item = &'m [u8]>,
    {
        let mut summary = IngestSummary::default();
        for message in messages {
            summary.messages += 1;
            match self.ingest(message) {
                MessageOutcome::Accepted(_) => summary.accepted += 1,
                MessageOutcome::AcceptedUntracked(_) => summary.untracked += 1,
                MessageOutcome::Malformed(_) => summary.malformed += 1,
            }
        }
        summary
    }

    #[inline]
    fn accept(&mut self, record: &TradeRecord<'_>) -> MessageOutcome {
        self.counters.record_accepted(record.side, record.timestamp_us);

        match self.table.get_or_create_slot(&record.symbol) {
            Ok(handle) => {
                self.table.record_trade(handle, record.quantity);
                MessageOutcome::Accepted(handle)
            }
            Err(error) => {
                self.counters.record_untracked(error);
                self.warn_first_overflow(error, record);
                MessageOutcome::AcceptedUntracked(error)
            }
        }
    }

    #[cold]
    fn warn_first_overflow(&mut self, error: TableError, record: &TradeRecord<'_>) {
        let logged = match error {
            TableError::CapacityExceeded { .. } => &mut self.table_full_logged,
            TableError::ArenaExhausted { .. } => &mut self.arena_full_logged,
        };
        if !*logged {
            *logged = true;
            crate::log_ingest!(
                tracing::Level::WARN,
                symbol = %record.symbol,
                live_slots = self.table.live_slots(),
                "{}; further new symbols are counted in totals only",
                error
            );
        }
    }

    /// Read-side handle over the same table and counters
    pub fn reader(&self) -> StatsReader {
        StatsReader::new(self.table.clone(), self.counters.clone())
    }

    #[inline]
    pub fn format(&self) -> WireFormat {
        self.format
    }
}
