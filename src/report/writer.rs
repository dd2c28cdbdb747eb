//! Streaming report writer
//!
//! Reads the global counters, then every live slot, writing each row to
//! the sink as it is read. Nothing is collected in memory.
//!
//! A report is not a transactional snapshot: rows may reflect slightly
//! different ingestion instants. It never shows a partially published
//! slot, and its counters always satisfy `accepted + malformed >= total`.

use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use super::StatsReader;
use crate::core::{CounterSnapshot, SymbolStats};
use crate::Result;

/// Report encoding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// `key=value` lines
    #[default]
    Text,
    /// JSON Lines, one object per row
    Json,
}

/// What one `write_report` call emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportSummary {
    pub seq: u64,
    pub rows: u64,
    pub counters: CounterSnapshot,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum JsonLine<'a> {
    Totals {
        seq: u64,
        counters: &'a CounterSnapshot,
    },
    Symbol {
        seq: u64,
        symbol: &'a str,
        count: u64,
        volume: u64,
    },
    End {
        seq: u64,
        symbols: u64,
    },
}

/// Serializes reports from a `StatsReader`
pub struct ReportWriter {
    reader: StatsReader,
    format: ReportFormat,
    seq: AtomicU64,
}

impl ReportWriter {
    pub fn new(reader: StatsReader, format: ReportFormat) -> Self {
        Self {
            reader,
            format,
            seq: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn format(&self) -> ReportFormat {
        self.format
    }

    /// Number of reports started so far
    #[inline]
    pub fn reports_written(&self) -> u64 {
        self.seq.load(Ordering::Relaxed)
    }

    /// Stream one report into `sink`
    ///
    /// Sink errors are returned to the caller; ingestion is unaffected.
    pub fn write_report<W: Write + ?Sized>(&self, sink: &mut W) -> Result<ReportSummary> {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
        let counters = self.reader.counters();
        let mut rows = 0u64;

        match self.format {
            ReportFormat::Text => {
                Self::write_text_totals(sink, seq, &counters)?;
                self.reader.table().try_for_each_live_slot(|row| {
                    rows += 1;
                    Self::write_text_row(sink, &row)
                })?;
                writeln!(sink, "end seq={} symbols={}", seq, rows)?;
            }
            ReportFormat::Json => {
                Self::write_json_line(
                    sink,
                    &JsonLine::Totals {
                        seq,
                        counters: &counters,
                    },
                )?;
                self.reader.table().try_for_each_live_slot(|row| {
                    rows += 1;
                    Self::write_json_line(
                        sink,
                        &JsonLine::Symbol {
                            seq,
                            symbol: row.symbol.as_str(),
                            count: row.count,
                            volume: row.volume,
                        },
                    )
                })?;
                Self::write_json_line(sink, &JsonLine::End { seq, symbols: rows })?;
            }
        }

        Ok(ReportSummary {
            seq,
            rows,
            counters,
        })
    }

    fn write_text_totals<W: Write + ?Sized>(
        sink: &mut W,
        seq: u64,
        c: &CounterSnapshot,
    ) -> std::io::Result<()> {
        writeln!(
            sink,
            "report seq={} total={} accepted={} malformed={} buy={} sell={} \
             capacity_exceeded={} arena_exhausted={} latest_timestamp_us={}",
            seq,
            c.total,
            c.accepted,
            c.malformed,
            c.buy,
            c.sell,
            c.capacity_exceeded,
            c.arena_exhausted,
            c.latest_timestamp_us
        )?;
        sink.write_all(b"malformed")?;
        for (kind, count) in c.malformed_by_kind.iter() {
            write!(sink, " {}={}", kind.name(), count)?;
        }
        sink.write_all(b"\n")
    }

    /// `symbol <name> count=N volume=N`
    ///
    /// Names holding `=`, `"` or `\` are double-quoted with `"` and `\`
    /// backslash-escaped, so a row always splits on `=` unambiguously.
    fn write_text_row<W: Write + ?Sized>(sink: &mut W, row: &SymbolStats) -> std::io::Result<()> {
        let name = row.symbol.as_bytes();
        sink.write_all(b"symbol ")?;
        if name.iter().any(|b| matches!(b, b'=' | b'"' | b'\\')) {
            sink.write_all(b"\"")?;
            for &byte in name {
                if matches!(byte, b'"' | b'\\') {
                    sink.write_all(b"\\")?;
                }
                sink.write_all(&[byte])?;
            }
            sink.write_all(b"\"")?;
        } else {
            sink.write_all(name)?;
        }
        writeln!(sink, " count={} volume={}", row.count, row.volume)
    }

    fn write_json_line<W: Write + ?Sized>(sink: &mut W, line: &JsonLine<'_>) -> Result<()> {
        serde_json::to_writer(&mut *sink, line)?;
        sink.write_all(b"\n")?;
        Ok(())
    }
}
