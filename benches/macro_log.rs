//! Benchmarks for macro log persistence
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use macrokey_rs::session::{ButtonId, Event, KeySymbol, MacroLog, MacroMetadata};

/// A plausible recording: mostly sampled moves with clicks and keys mixed in
fn sample_log(len: usize) -> MacroLog {
    let events = (0..len)
        .map(|i| {
            let time = i as f64 * 0.016;
            match i % 20 {
                5 => Event::Click {
                    time,
                    x: i as i32,
                    y: i as i32,
                    button: ButtonId::left(),
                    pressed: true,
                },
                6 => Event::Click {
                    time,
                    x: i as i32,
                    y: i as i32,
                    button: ButtonId::left(),
                    pressed: false,
                },
                10 => Event::KeyPress {
                    time,
                    key: KeySymbol::new("a"),
                },
                11 => Event::KeyRelease {
                    time,
                    key: KeySymbol::new("a"),
                },
                _ => Event::Move {
                    time,
                    x: (i % 1920) as i32,
                    y: (i % 1080) as i32,
                },
            }
        })
        .collect();
    MacroLog::from_events(events).unwrap()
}

fn bench_serialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("macro_log_serialize");

    for size in [1_000, 10_000, 100_000].iter() {
        let log = sample_log(*size);
        let metadata = MacroMetadata::describe(&log, 0.016);
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &log, |b, log| {
            b.iter(|| black_box(log.to_json(&metadata).unwrap()));
        });
    }

    group.finish();
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("macro_log_parse");

    for size in [1_000, 10_000, 100_000].iter() {
        let log = sample_log(*size);
        let json = log.to_json(&MacroMetadata::describe(&log, 0.016)).unwrap();
        let bare = serde_json::to_string(log.events()).unwrap();
        group.throughput(Throughput::Elements(*size as u64));

        group.bench_with_input(BenchmarkId::new("wrapped", size), &json, |b, json| {
            b.iter(|| black_box(MacroLog::from_json_str(json).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("bare_list", size), &bare, |b, json| {
            b.iter(|| black_box(MacroLog::from_json_str(json).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_serialize, bench_parse);
criterion_main!(benches);
