use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use watchlens::config;
use watchlens::normalize::{TimestampFormats, normalize};
use watchlens::sessions::segment;
use watchlens::source::{RawRow, read_rows};
use watchlens::stats::Analysis;

fn synthetic_csv(rows: usize) -> String {
    let mut text = String::from("Title,Date,Profile Name\n");
    for i in 0..rows {
        let day = 1 + (i / 12) % 28;
        let month = 1 + (i / (12 * 28)) % 12;
        let hour = 8 + (i % 12);
        if i % 7 == 0 {
            text.push_str(&format!("Feature {i} (2019),2023-{month:02}-{day:02} {hour:02}:00:00,Sam\n"));
        } else {
            text.push_str(&format!(
                "\"Series {}: Episode {i}\",2023-{month:02}-{day:02} {hour:02}:30:00,Sam\n",
                i % 40
            ));
        }
    }
    text
}

fn load_rows(rows: usize) -> Vec<RawRow> {
    let text = synthetic_csv(rows);
    let (_, rows) = read_rows(text.as_bytes()).expect("rows");
    rows
}

fn bench_normalize(c: &mut Criterion) {
    let cfg = config::load_config(None).expect("config").config;
    let formats = TimestampFormats::from_config(&cfg);
    let mut group = c.benchmark_group("normalize");
    for size in [1_000usize, 10_000] {
        let rows = load_rows(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &rows, |b, rows| {
            b.iter(|| normalize(rows, &formats).expect("normalize"));
        });
    }
    group.finish();
}

fn bench_segment(c: &mut Criterion) {
    let cfg = config::load_config(None).expect("config").config;
    let formats = TimestampFormats::from_config(&cfg);
    let mut group = c.benchmark_group("segment");
    for size in [1_000usize, 10_000] {
        let records = normalize(&load_rows(size), &formats).expect("normalize");
        group.bench_with_input(BenchmarkId::from_parameter(size), &records, |b, records| {
            b.iter(|| segment(records, cfg.gap_threshold()));
        });
    }
    group.finish();
}

fn bench_analysis(c: &mut Criterion) {
    let cfg = config::load_config(None).expect("config").config;
    let formats = TimestampFormats::from_config(&cfg);
    let records = normalize(&load_rows(10_000), &formats).expect("normalize");
    c.bench_function("analysis_10k", |b| {
        b.iter(|| Analysis::build(records.clone(), cfg.gap_threshold(), cfg.top_titles));
    });
}

criterion_group!(benches, bench_normalize, bench_segment, bench_analysis);
criterion_main!(benches);
