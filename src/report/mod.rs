//! Read side (Cold Path)
//!
//! `StatsReader` is a cloneable handle any number of threads can use to
//! query counters and symbol rows or to stream reports, concurrently with
//! ingestion and without locks.

pub mod writer;

pub use writer::{ReportFormat, ReportSummary, ReportWriter};

use std::sync::Arc;

use crate::core::{CounterSnapshot, GlobalCounters, SymbolStats, SymbolTable};

/// Shared read-only view of ingestion state
#[derive(Clone)]
pub struct StatsReader {
    table: Arc<SymbolTable>,
    counters: Arc<GlobalCounters>,
}

impl StatsReader {
    pub(crate) fn new(table: Arc<SymbolTable>, counters: Arc<GlobalCounters>) -> Self {
        Self { table, counters }
    }

    /// Current global counters
    #[inline]
    pub fn counters(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }

    /// Current row for one symbol
    #[inline]
    pub fn lookup(&self, symbol: &str) -> Option<SymbolStats> {
        self.table.lookup(symbol.as_bytes())
    }

    /// Visit every live symbol row
    pub fn for_each_symbol<F>(&self, visitor: F)
    where
        F: FnMut(SymbolStats),
    {
        self.table.for_each_live_slot(visitor)
    }

    #[inline]
    pub fn live_symbols(&self) -> usize {
        self.table.live_slots()
    }

    /// Read-only access to the table
    #[inline]
    pub fn table(&self) -> &SymbolTable {
        &self.table
    }

    /// New report writer over this state
    pub fn report_writer(&self, format: ReportFormat) -> ReportWriter {
        ReportWriter::new(self.clone(), format)
    }
}

#[cfg(test)]
mod tests {
    use crate::core::Side;
    use crate::engine::StatsEngine;
    use crate::infrastructure::config::EngineConfig;
    use crate::test_utils::trade_message;

    #[test]
    fn test_reader_sees_ingested_rows() {
        let (mut ingestor, reader) = StatsEngine::build(&EngineConfig::default()).unwrap();
        let other = reader.clone();

        ingestor.ingest(&trade_message("1", "AAPL", Side::Buy, 100, 1));
        ingestor.ingest(&trade_message("2", "MSFT", Side::Sell, 50, 2));

        assert_eq!(other.live_symbols(), 2);
        assert_eq!(other.lookup("AAPL").unwrap().volume, 100);
        assert!(other.lookup("GOOG").is_none());

        let mut symbols = Vec::new();
        other.for_each_symbol(|row| symbols.push(row.symbol.as_str().to_string()));
        symbols.sort();
        assert_eq!(symbols, vec!["AAPL", "MSFT"]);
        assert_eq!(other.table().capacity(), EngineConfig::default().slot_capacity);
    }
}
