//! Core Application Engine
//!
//! Wires the single ingestion writer to the report writer. Ingestion runs
//! on a blocking task; a tokio interval streams periodic reports from the
//! same shared state while it runs.

use std::future::Future;
use std::io::{BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::Level;

use crate::core::{CounterSnapshot, GlobalCounters, SymbolTable};
use crate::hot_path::Ingestor;
use crate::infrastructure::config::{Config, EngineConfig};
use crate::infrastructure::source::MessageSource;
use crate::parsing::WireFormat;
use crate::report::{ReportSummary, ReportWriter, StatsReader};
use crate::{Result, StatsError};

/// Outcome of one `StatsEngine::run`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Reports written, final one included
    pub reports: u64,
    /// Periodic reports that failed on the sink
    pub report_errors: u64,
    /// Stopped by a shutdown signal before the input ended
    pub interrupted: bool,
    /// Counters after the last report
    pub counters: CounterSnapshot,
}

/// Main engine managing the ingestion lifecycle
pub struct StatsEngine {
    config: Config,
}

impl StatsEngine {
    /// Create engine from a validated configuration
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Allocate the table and counters and hand out the single writer
    ///
    /// All memory is reserved here; ingestion never grows it.
    pub fn build(config: &EngineConfig) -> Result<(Ingestor, StatsReader)> {
        config.validate()?;

        let table = Arc::new(SymbolTable::new(config.slot_capacity, config.arena_bytes));
        let counters = Arc::new(GlobalCounters::new());
        let ingestor = Ingestor::new(table, counters, WireFormat::PIPE);
        let reader = ingestor.reader();

        tracing::info!(
            slot_capacity = config.slot_capacity,
            arena_bytes = config.arena_bytes,
            "Symbol table allocated"
        );

        Ok((ingestor, reader))
    }

    /// Ingest a newline-framed stream until it ends or Ctrl-C
    pub async fn run<R, W>(&self, source: R, sink: W) -> Result<RunSummary>
    where
        R: BufRead + Send + 'static,
        W: Write + Send + 'static,
    {
        self.run_until(source, sink, async {
            if tokio::signal::ctrl_c().await.is_err() {
                // No signal handler available: run to end of input
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Ingest a newline-framed stream until it ends or `shutdown` resolves
    ///
    /// Periodic reports go to `sink` every `report.interval_ms`. A failed
    /// periodic report is logged and counted; a failed final report is
    /// returned as an error.
    pub async fn run_until<R, W, F>(&self, source: R, sink: W, shutdown: F) -> Result<RunSummary>
    where
        R: BufRead + Send + 'static,
        W: Write + Send + 'static,
        F: Future<Output = ()>,
    {
        let (mut ingestor, reader) = Self::build(&self.config.engine)?;
        let writer = Arc::new(reader.report_writer(self.config.report.format));

        let stop = Arc::new(AtomicBool::new(false));
        let ingest_stop = stop.clone();
        let mut ingest = tokio::task::spawn_blocking(move || -> std::io::Result<u64> {
            let mut source = MessageSource::new(source);
            while !ingest_stop.load(Ordering::Relaxed) {
                match source.next_frame()? {
                    Some(frame) => {
                        ingestor.ingest(frame);
                    }
                    None => break,
                }
            }
            Ok(source.frames())
        });

        let mut interval =
            tokio::time::interval(Duration::from_millis(self.config.report.interval_ms));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        interval.tick().await;

        tokio::pin!(shutdown);

        let mut sink = sink;
        let mut reports = 0u64;
        let mut report_errors = 0u64;
        let mut interrupted = false;

        loop {
            tokio::select! {
                biased;

                joined = &mut ingest => {
                    let frames = joined.map_err(|e| StatsError::Task(e.to_string()))??;
                    tracing::info!(frames, "Input ended");
                    break;
                }
                _ = &mut shutdown => {
                    stop.store(true, Ordering::Relaxed);
                    interrupted = true;
                    tracing::warn!("Shutdown requested, stopping ingestion");
                    break;
                }
                _ = interval.tick() => {
                    let (returned, result) = Self::emit(writer.clone(), sink).await?;
                    sink = returned;
                    match result {
                        Ok(summary) => {
                            reports += 1;
                            crate::log_report!(
                                Level::DEBUG,
                                seq = summary.seq,
                                rows = summary.rows,
                                total = summary.counters.total,
                                "Report written"
                            );
                        }
                        Err(e) => {
                            report_errors += 1;
                            crate::log_report!(Level::WARN, error = %e, "Report failed");
                        }
                    }
                }
            }
        }

        if self.config.report.final_report {
            let (_, result) = Self::emit(writer.clone(), sink).await?;
            let summary = result?;
            reports += 1;
            crate::log_report!(
                Level::INFO,
                seq = summary.seq,
                rows = summary.rows,
                total = summary.counters.total,
                "Final report written"
            );
        }

        Ok(RunSummary {
            reports,
            report_errors,
            interrupted,
            counters: reader.counters(),
        })
    }

    /// Write one report off the async workers; the sink is handed back
    async fn emit<W>(writer: Arc<ReportWriter>, mut sink: W) -> Result<(W, Result<ReportSummary>)>
    where
        W: Write + Send + 'static,
    {
        tokio::task::spawn_blocking(move || {
            let result = writer
                .write_report(&mut sink)
                .and_then(|summary| sink.flush().map(|_| summary).map_err(StatsError::from));
            (sink, result)
        })
        .await
        .map_err(|e| StatsError::Task(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Side;
    use crate::report::ReportFormat;
    use crate::test_utils::{trade_message, trade_stream};
    use std::io::{self, Cursor};
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let result = StatsEngine::build(&EngineConfig {
            slot_capacity: 0,
            arena_bytes: 1024,
        });
        assert!(matches!(result, Err(StatsError::Config(_))));
    }

    #[test]
    fn test_build_shares_state() {
        let (mut ingestor, reader) = StatsEngine::build(&EngineConfig::default()).unwrap();
        ingestor.ingest(&trade_message("1", "AAPL", Side::Buy, 10, 1));
        assert_eq!(reader.counters().total, 1);
        assert_eq!(ingestor.reader().lookup("AAPL").unwrap().volume, 10);
    }

    #[tokio::test]
    async fn test_run_to_end_of_input() {
        let mut input = trade_stream(&["AAPL", "MSFT", "GOOG"], 300);
        input.extend_from_slice(b"garbage\n\n");
        let sink = SharedBuf::default();

        let engine = StatsEngine::new(Config::default()).unwrap();
        let summary = engine
            .run_until(Cursor::new(input), sink.clone(), std::future::pending())
            .await
            .unwrap();

        assert!(!summary.interrupted);
        assert_eq!(summary.counters.total, 301);
        assert_eq!(summary.counters.accepted, 300);
        assert_eq!(summary.counters.malformed, 1);
        assert!(summary.reports >= 1);

        let text = sink.text();
        let last_report = text.rsplit("report seq=").next().unwrap();
        assert!(last_report.contains("total=301"));
        assert!(last_report.contains("symbol AAPL count=100 volume=100"));
    }

    #[tokio::test]
    async fn test_run_json_without_final_report() {
        let mut config = Config::default();
        config.report.format = ReportFormat::Json;
        config.report.final_report = false;
        let sink = SharedBuf::default();

        let engine = StatsEngine::new(config).unwrap();
        let summary = engine
            .run_until(
                Cursor::new(trade_stream(&["AAPL"], 10)),
                sink.clone(),
                std::future::pending(),
            )
            .await
            .unwrap();

        assert_eq!(summary.counters.total, 10);
        assert_eq!(summary.reports, 0);
        assert!(sink.text().is_empty());
    }

    /// Repeats one framed message forever
    struct EndlessTrades {
        line: Vec<u8>,
        pos: usize,
    }

    impl io::Read for EndlessTrades {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let mut written = 0;
            while written < buf.len() {
                buf[written] = self.line[self.pos];
                self.pos = (self.pos + 1) % self.line.len();
                written += 1;
            }
            Ok(written)
        }
    }

    #[tokio::test]
    async fn test_shutdown_stops_ingestion() {
        let mut line = trade_message("1", "AAPL", Side::Buy, 1, 1);
        line.push(b'\n');
        let source = io::BufReader::new(EndlessTrades { line, pos: 0 });
        let sink = SharedBuf::default();

        let engine = StatsEngine::new(Config::default()).unwrap();
        let summary = engine
            .run_until(source, sink.clone(), std::future::ready(()))
            .await
            .unwrap();

        assert!(summary.interrupted);
        assert_eq!(summary.reports, 1);
        assert!(sink.text().starts_with("report seq=1 "));
    }

    #[test]
    fn test_new_validates() {
        let mut config = Config::default();
        config.report.interval_ms = 0;
        assert!(StatsEngine::new(config).is_err());
    }
}
