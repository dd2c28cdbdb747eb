//! Benchmarks for the full ingestion pipeline
//!
//! Target: >5M messages/sec on a single writer

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};

use fix_stats::infrastructure::config::EngineConfig;
use fix_stats::{MessageEncoder, ReportFormat, Side, StatsEngine};

fn messages(symbols: usize) -> Vec<Vec<u8>> {
    (0..symbols)
        .map(|i| {
            let mut buf = Vec::new();
            let side = if i % 2 == 0 { Side::Buy } else { Side::Sell };
            MessageEncoder::new(&mut buf).trade(
                format!("ORD-{i}").as_bytes(),
                format!("SYM{i:04}").as_bytes(),
                side,
                100 + i as u64,
                1_704_067_200_000_000 + i as u64,
            );
            buf
        })
        .collect()
}

fn bench_ingest(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingest");

    for symbols in [1usize, 64, 1024] {
        let batch = messages(symbols);
        let (mut ingestor, _reader) = StatsEngine::build(&EngineConfig {
            slot_capacity: 4096,
            arena_bytes: 65_536,
        })
        .unwrap();
        for message in &batch {
            ingestor.ingest(message);
        }

        group.throughput(Throughput::Elements(batch.len() as u64));
        group.bench_function(format!("{symbols}_symbols"), |b| {
            b.iter(|| {
                let summary = ingestor.ingest_all(batch.iter().map(|m| black_box(m.as_slice())));
                black_box(summary);
            })
        });
    }

    group.finish();
}

fn bench_report(c: &mut Criterion) {
    let mut group = c.benchmark_group("report");

    let (mut ingestor, reader) = StatsEngine::build(&EngineConfig::default()).unwrap();
    for message in &messages(1024) {
        ingestor.ingest(message);
    }

    for format in [ReportFormat::Text, ReportFormat::Json] {
        let writer = reader.report_writer(format);
        group.bench_function(format!("{format:?}_1024_symbols"), |b| {
            b.iter_batched_ref(
                || Vec::with_capacity(128 * 1024),
                |sink| {
                    let summary = writer.write_report(sink).unwrap();
                    black_box(summary.rows);
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(benches, bench_ingest, bench_report);

criterion_main!(benches);
