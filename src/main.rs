//! Trade statistics over a stream of tag/value messages
//!
//! # Architecture
//! - **core**: Zero-allocation types (Symbol, SymbolTable, GlobalCounters)
//! - **parsing**: Escape-aware scanner and field decoder
//! - **hot_path**: Single-writer ingestion pipeline
//! - **report**: Concurrent streaming reports
//! - **infrastructure**: Cold path (config, logging, input framing)
//!
//! Reads one message per line from `source.path` or stdin and writes
//! reports to stdout. Logs go to stderr and the log directory.

use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::time::Duration;

use anyhow::Context;
use fix_stats::infrastructure::init_logging;
use fix_stats::{log_main, Config, StatsEngine};
use tracing::Level;

fn main() -> anyhow::Result<()> {
    // Load config or use defaults
    let config = Config::load().context("Failed to load configuration")?;
    let _guards = init_logging(&config.logging).context("Failed to initialize logging")?;

    log_main!(
        Level::INFO,
        slot_capacity = config.engine.slot_capacity,
        arena_bytes = config.engine.arena_bytes,
        interval_ms = config.report.interval_ms,
        "Starting fix-stats"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    let source_path = config.source.path.clone();
    let engine = StatsEngine::new(config)?;
    let sink = BufWriter::new(io::stdout());

    let result = match source_path {
        Some(path) => {
            let file = File::open(&path)
                .with_context(|| format!("Failed to open source {}", path.display()))?;
            log_main!(Level::INFO, source = %path.display(), "Reading messages");
            runtime.block_on(engine.run(BufReader::with_capacity(1 << 16, file), sink))
        }
        None => {
            log_main!(Level::INFO, "Reading messages from stdin");
            runtime.block_on(engine.run(BufReader::with_capacity(1 << 16, io::stdin()), sink))
        }
    };

    // A reader blocked on stdin is not waited for
    runtime.shutdown_timeout(Duration::from_secs(1));

    let summary = result?;
    log_main!(
        Level::INFO,
        total = summary.counters.total,
        accepted = summary.counters.accepted,
        malformed = summary.counters.malformed,
        reports = summary.reports,
        report_errors = summary.report_errors,
        interrupted = summary.interrupted,
        "Finished"
    );

    Ok(())
}
