//! Symbol table overflow: a full table or arena never loses totals

use fix_stats::core::TableError;
use fix_stats::infrastructure::config::EngineConfig;
use fix_stats::{MessageEncoder, MessageOutcome, Side, StatsEngine};

fn trade(symbol: &str, side: Side, quantity: u64) -> Vec<u8> {
    let mut buf = Vec::new();
    MessageEncoder::new(&mut buf).trade(b"ORD", symbol.as_bytes(), side, quantity, 1);
    buf
}

#[test]
fn test_k_plus_one_symbols() {
    const K: usize = 64;
    let (mut ingestor, reader) = StatsEngine::build(&EngineConfig {
        slot_capacity: K,
        arena_bytes: 4096,
    })
    .unwrap();

    for i in 0..K {
        let outcome = ingestor.ingest(&trade(&format!("SYM{i}"), Side::Buy, 10));
        assert!(matches!(outcome, MessageOutcome::Accepted(_)), "symbol {i}");
    }
    assert_eq!(reader.live_symbols(), K);

    let outcome = ingestor.ingest(&trade("OVERFLOW", Side::Sell, 7));
    assert_eq!(
        outcome,
        MessageOutcome::AcceptedUntracked(TableError::CapacityExceeded { capacity: K })
    );

    let counters = reader.counters();
    assert_eq!(counters.total, K as u64 + 1);
    assert_eq!(counters.accepted, K as u64 + 1);
    assert_eq!(counters.malformed, 0);
    assert_eq!(counters.capacity_exceeded, 1);
    assert_eq!(counters.buy, K as u64);
    assert_eq!(counters.sell, 1);
    assert!(reader.lookup("OVERFLOW").is_none());

    // Existing symbols keep updating after the table is full
    let outcome = ingestor.ingest(&trade("SYM3", Side::Sell, 5));
    assert!(matches!(outcome, MessageOutcome::Accepted(_)));
    let row = reader.lookup("SYM3").unwrap();
    assert_eq!(row.count, 2);
    assert_eq!(row.volume, 15);

    let mut rows = 0;
    reader.for_each_symbol(|_| rows += 1);
    assert_eq!(rows, K);
}

#[test]
fn test_arena_exhaustion() {
    let (mut ingestor, reader) = StatsEngine::build(&EngineConfig {
        slot_capacity: 16,
        arena_bytes: 32,
    })
    .unwrap();

    let long = "L".repeat(30);
    assert!(matches!(
        ingestor.ingest(&trade(&long, Side::Buy, 1)),
        MessageOutcome::Accepted(_)
    ));
    assert!(matches!(
        ingestor.ingest(&trade("AB", Side::Buy, 1)),
        MessageOutcome::Accepted(_)
    ));
    assert_eq!(
        ingestor.ingest(&trade("C", Side::Sell, 1)),
        MessageOutcome::AcceptedUntracked(TableError::ArenaExhausted { capacity: 32 })
    );

    let counters = reader.counters();
    assert_eq!(counters.total, 3);
    assert_eq!(counters.accepted, 3);
    assert_eq!(counters.arena_exhausted, 1);
    assert_eq!(reader.live_symbols(), 2);
    assert_eq!(reader.table().arena_used(), 32);
}

#[test]
fn test_report_after_overflow_lists_only_tracked_symbols() {
    let (mut ingestor, reader) = StatsEngine::build(&EngineConfig {
        slot_capacity: 2,
        arena_bytes: 1024,
    })
    .unwrap();
    for symbol in ["AAA", "BBB", "CCC", "DDD"] {
        ingestor.ingest(&trade(symbol, Side::Buy, 1));
    }

    let mut out = Vec::new();
    let summary = reader
        .report_writer(fix_stats::ReportFormat::Text)
        .write_report(&mut out)
        .unwrap();
    assert_eq!(summary.rows, 2);
    assert_eq!(summary.counters.total, 4);
    assert_eq!(summary.counters.capacity_exceeded, 2);

    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.lines().filter(|l| l.starts_with("symbol ")).count(), 2);
}
