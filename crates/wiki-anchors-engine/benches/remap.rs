use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use wiki_anchors_engine::remap::{
    EditOp, EditScript, Interval, Remapper, remap, remap_op_major,
};

// A page of `ops` alternating equal runs and small edits, with anchors spread
// evenly across it
fn generate_workload(ops: usize, anchors: usize) -> (EditScript, Vec<Interval>) {
    let (mut i, mut j) = (0i64, 0i64);
    let mut script = Vec::with_capacity(ops);
    for n in 0..ops {
        let op = match n % 4 {
            0 | 2 => EditOp::equal(i, i + 40, j, j + 40),
            1 => EditOp::insert(i, j, j + 3),
            _ => EditOp::replace(i, i + 5, j, j + 2),
        };
        i = op.i2;
        j = op.j2;
        script.push(op);
    }

    let step = (i / anchors.max(1) as i64).max(1);
    let intervals = (0..anchors as i64)
        .map(|k| Interval::new(k * step, k * step + 12))
        .collect();
    (EditScript::new(script), intervals)
}

fn bench_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("remap");
    group.sample_size(20);

    for ops in [100, 1_000, 10_000] {
        let (script, intervals) = generate_workload(ops, 500);
        group.throughput(Throughput::Elements(intervals.len() as u64));

        group.bench_with_input(BenchmarkId::new("interval_major", ops), &ops, |b, _| {
            b.iter(|| remap(std::hint::black_box(&intervals), &script))
        });
        group.bench_with_input(BenchmarkId::new("op_major", ops), &ops, |b, _| {
            b.iter(|| remap_op_major(std::hint::black_box(&intervals), &script))
        });
        group.bench_with_input(BenchmarkId::new("prepared", ops), &ops, |b, _| {
            b.iter(|| {
                let remapper = Remapper::new(&script).unwrap();
                remapper.remap(std::hint::black_box(&intervals))
            })
        });
    }

    group.finish();
}

fn bench_diff(c: &mut Criterion) {
    let mut group = c.benchmark_group("diff_chars");
    group.sample_size(10);

    let old = "A paragraph of wiki text that reviewers comment on.\n".repeat(200);
    let new = old.replacen("reviewers", "readers", 50);

    group.bench_function("edited_page", |b| {
        b.iter(|| EditScript::diff_chars(std::hint::black_box(&old), &new))
    });

    group.finish();
}

criterion_group!(benches, bench_strategies, bench_diff);
criterion_main!(benches);
