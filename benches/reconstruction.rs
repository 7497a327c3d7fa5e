//! Benchmarks for MBP-10 reconstruction performance.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use mbp10_reconstructor::{Mbp10Reconstructor, Replayer, VecSource};

/// Adds on both sides around 100.00 with periodic cancels, trades and
/// Trade/Fill/Cancel executions.
fn create_test_lines(count: usize) -> Vec<String> {
    let mut lines = Vec::with_capacity(count);
    let mut i = 0usize;

    while lines.len() < count {
        let order_id = i + 1;
        let is_bid = i % 2 == 0;
        let tick = (i % 20) as u32;
        let (side, cents) = if is_bid { ('B', 10_000 - tick) } else { ('A', 10_001 + tick) };
        let price = format!("{}.{:02}", cents / 100, cents % 100);
        let size = (i % 100) + 1;

        lines.push(row(i, 'A', side, &price, size, order_id));
        match i % 7 {
            3 => lines.push(row(i, 'C', side, &price, size / 2, order_id)),
            5 => {
                lines.push(row(i, 'T', if is_bid { 'A' } else { 'B' }, &price, 1, 0));
                lines.push(row(i, 'F', side, &price, 1, order_id));
                lines.push(row(i, 'C', side, &price, 1, order_id));
            }
            _ => {}
        }
        i += 1;
    }

    lines.truncate(count);
    lines
}

fn row(seq: usize, action: char, side: char, price: &str, size: usize, order_id: usize) -> String {
    format!(
        "2025-07-17T08:05:03.{seq:09}Z,2025-07-17T08:05:03.{seq:09}Z,160,2,1108,{action},{side},{price},{size},0,{order_id},130,165200,{seq},ARL"
    )
}

fn bench_reconstruction(c: &mut Criterion) {
    let lines = create_test_lines(10_000);

    let mut group = c.benchmark_group("reconstruction");
    group.throughput(Throughput::Elements(lines.len() as u64));

    group.bench_function("process_lines", |b| {
        b.iter(|| {
            let mut lob = Mbp10Reconstructor::new();
            for line in &lines {
                black_box(lob.process_line(line));
            }
        })
    });

    group.bench_function("process_and_encode", |b| {
        let mut row = String::with_capacity(512);
        b.iter(|| {
            let mut lob = Mbp10Reconstructor::new();
            for (index, line) in lines.iter().enumerate() {
                if let Some(snapshot) = lob.process_line(line) {
                    row.clear();
                    let _ = snapshot.write_csv(index as u64, &mut row);
                    black_box(&row);
                }
            }
        })
    });

    group.bench_function("replay_collapsed", |b| {
        b.iter(|| {
            let mut source = VecSource::new(lines.clone());
            let mut rows: Vec<String> = Vec::with_capacity(lines.len());
            let summary = Replayer::default().run(&mut source, &mut rows);
            black_box(summary.map(|s| s.rows_written))
        })
    });

    group.finish();
}

criterion_group!(benches, bench_reconstruction);
criterion_main!(benches);
