use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lochist::engine::{fold, fold_all};
use lochist::parse::RecordReader;
use lochist::taxonomy::builtin;
use lochist::BoundaryFormat;

fn synthetic_log(commits: usize) -> Vec<String> {
    let files = ["src/a.cc", "src/b.h", "java/A.java", "py/gen.py", "docs/x.md"];
    let mut lines = Vec::with_capacity(commits * 8);
    for i in 0..commits {
        lines.push(format!(
            "date 2015-{:02}-{:02} 00:00:00 +0000",
            i % 12 + 1,
            i % 28 + 1
        ));
        for (j, f) in files.iter().enumerate() {
            lines.push(format!("{}\t{}\t{f}", (i + j) % 40, (i * j) % 17));
        }
        if i % 10 == 0 {
            lines.push("-\t-\tassets/logo.png".to_string());
        }
        lines.push(String::new());
    }
    lines
}

fn bench_fold(c: &mut Criterion) {
    let lines = synthetic_log(20_000);
    let records: Vec<_> = RecordReader::new(lines.iter(), BoundaryFormat::Dated).collect();
    let languages = builtin("languages").unwrap();
    let taxonomies = vec![languages.clone(), builtin("source").unwrap()];

    c.bench_function("parse 20k commits", |b| {
        b.iter(|| RecordReader::new(black_box(&lines).iter(), BoundaryFormat::Dated).count())
    });
    c.bench_function("fold languages", |b| {
        b.iter(|| fold(black_box(&records), &languages).unwrap())
    });
    c.bench_function("fold two taxonomies", |b| {
        b.iter(|| fold_all(black_box(&records), &taxonomies).unwrap())
    });
}

criterion_group!(benches, bench_fold);
criterion_main!(benches);
