use chrono::{TimeZone, Utc};
use lochist::engine::{fold, fold_all};
use lochist::model::Axis;
use lochist::parse::RecordReader;
use lochist::{
    Aggregator, BoundaryFormat, Category, CommitBoundary, FileDelta, LocError, LogRecord,
    PatternSpec, StepSeriesBuilder, Taxonomy, Terminal, XCoord,
};
use pretty_assertions::assert_eq;

// ── fixtures ─────────────────────────────────────────────────────────────────

fn exts(list: &[&str]) -> PatternSpec {
    PatternSpec::Extensions(list.iter().map(|s| s.to_string()).collect())
}

fn globs(list: &[&str]) -> PatternSpec {
    PatternSpec::Globs(list.iter().map(|s| s.to_string()).collect())
}

fn cpp_only() -> Taxonomy {
    Taxonomy::new("cpp", vec![Category::new("cpp", &globs(&["*.cc"])).unwrap()]).unwrap()
}

fn records(lines: &[&str]) -> Vec<LogRecord> {
    RecordReader::new(lines.iter(), BoundaryFormat::Dated).collect()
}

fn boundary(ordinal: u64) -> LogRecord {
    LogRecord::Boundary(CommitBoundary {
        ordinal,
        timestamp: None,
        id: None,
    })
}

fn delta(path: &str, added: u64, removed: u64) -> LogRecord {
    LogRecord::Delta(FileDelta {
        added,
        removed,
        path: path.to_string(),
    })
}

const SCENARIO: &[&str] = &[
    "date 2020-01-01 10:00:00 +0000",
    "10\t0\ta.cc",
    "",
    "date 2020-01-02 10:00:00 +0000",
    "0\t3\ta.cc",
    "",
    "date 2020-01-03 10:00:00 +0000",
    "-\t-\tb.bin",
];

fn mixed_log() -> Vec<LogRecord> {
    vec![
        boundary(0),
        delta("src/a.cc", 120, 0),
        delta("src/A.java", 40, 0),
        delta("README.md", 10, 0),
        boundary(1),
        delta("src/a.cc", 5, 25),
        delta("tools/gen.py", 30, 0),
        LogRecord::Binary {
            path: "docs/logo.png".to_string(),
        },
        boundary(2),
        delta("src/A.java", 0, 40),
        delta("include/a.h", 17, 2),
        boundary(3),
    ]
}

fn languages() -> Taxonomy {
    lochist::taxonomy::builtin("languages").unwrap()
}

// ── the worked scenario ──────────────────────────────────────────────────────

#[test]
fn scenario_counters_and_series() {
    let recs = records(SCENARIO);
    let run = fold(&recs, &cpp_only()).unwrap();
    assert_eq!(run.totals.get("cpp"), Some(7));
    assert_eq!(run.stats.binary, 1);

    let pre = run.builder.clone().build();
    assert_eq!(pre.x.len(), 6);
    assert_eq!(pre.values("cpp").unwrap(), &[0, 10, 10, 7, 7, 7]);

    let day = |d| XCoord::Time(Utc.with_ymd_and_hms(2020, 1, d, 10, 0, 0).unwrap());
    assert_eq!(pre.x, vec![day(1), day(1), day(2), day(2), day(3), day(3)]);

    let done = run.into_series(Terminal::Last).unwrap();
    assert_eq!(done.x.len(), 8);
    assert_eq!(done.values("cpp").unwrap(), &[0, 10, 10, 7, 7, 7, 7, 7]);
    assert_eq!(done.x[7], day(3));
}

#[test]
fn snapshots_per_commit_follow_the_log() {
    let taxonomy = cpp_only();
    let mut agg = Aggregator::new(&taxonomy);
    let mut after = Vec::new();
    for r in records(SCENARIO) {
        if let LogRecord::Boundary(_) = r {
            if agg.stats().commits > 0 {
                after.push(agg.snapshot().get("cpp").unwrap());
            }
        }
        agg.feed(&r).unwrap();
    }
    after.push(agg.snapshot().get("cpp").unwrap());
    assert_eq!(after, vec![10, 7, 7]);
}

// ── invariants ───────────────────────────────────────────────────────────────

#[test]
fn totals_equal_sum_of_matched_deltas() {
    let log = mixed_log();
    let taxonomy = languages();
    let run = fold(&log, &taxonomy).unwrap();

    let expected: i64 = log
        .iter()
        .filter_map(|r| match r {
            LogRecord::Delta(d) if taxonomy.classify(&d.path).is_some() => d.net(),
            _ => None,
        })
        .sum();
    assert_eq!(run.totals.total(), expected);
    assert_eq!(run.stats.unmatched, 1);
    assert_eq!(run.stats.matched, 6);
}

#[test]
fn series_length_is_two_per_commit_plus_terminal_pair() {
    let log = mixed_log();
    let run = fold(&log, &languages()).unwrap();
    assert_eq!(run.builder.len(), 2 * 4);
    let series = run.into_series(Terminal::Last).unwrap();
    assert_eq!(series.len(), 2 * 4 + 2);
    for c in &series.categories {
        assert_eq!(c.values.len(), series.x.len());
    }
}

#[test]
fn pairs_hold_before_and_after_values() {
    let log = mixed_log();
    let series = fold(&log, &languages())
        .unwrap()
        .into_series(Terminal::Open)
        .unwrap();

    let cpp = series.values("C++").unwrap();
    assert_eq!(cpp, &[0, 120, 120, 100, 100, 115, 115, 115]);
    let java = series.values("Java").unwrap();
    assert_eq!(java, &[0, 40, 40, 40, 40, 0, 0, 0]);

    for i in (0..series.len()).step_by(2) {
        assert_eq!(series.x[i], series.x[i + 1]);
        if i >= 2 {
            for c in &series.categories {
                assert_eq!(c.values[i], c.values[i - 1], "pair {i} of {}", c.name);
            }
        }
    }
}

#[test]
fn folding_twice_is_identical() {
    let log = mixed_log();
    let taxonomy = languages();
    let a = fold(&log, &taxonomy).unwrap();
    let b = fold(&log, &taxonomy).unwrap();
    assert_eq!(a.totals, b.totals);
    assert_eq!(
        a.into_series(Terminal::Last).unwrap(),
        b.into_series(Terminal::Last).unwrap()
    );
}

// ── categorization ───────────────────────────────────────────────────────────

#[test]
fn first_match_wins_regardless_of_unrelated_order() {
    let headers = || Category::new("headers", &exts(&["h"])).unwrap();
    let native = || Category::new("native", &globs(&["src/native/**"])).unwrap();
    let java = || Category::new("java", &exts(&["java"])).unwrap();
    let python = || Category::new("python", &exts(&["py"])).unwrap();

    let orders = vec![
        vec![java(), headers(), python(), native()],
        vec![headers(), java(), native(), python()],
        vec![python(), headers(), native(), java()],
    ];
    for cats in orders {
        let t = Taxonomy::new("t", cats).unwrap();
        assert_eq!(t.classify("src/native/include/a.h"), Some("headers"));
        assert_eq!(t.classify("src/native/a.cpp"), Some("native"));
    }

    let swapped = Taxonomy::new("t", vec![native(), headers()]).unwrap();
    assert_eq!(swapped.classify("src/native/include/a.h"), Some("native"));
}

#[test]
fn unmatched_paths_are_dropped_without_error() {
    let log = vec![boundary(0), delta("docs/guide.md", 500, 0)];
    let run = fold(&log, &cpp_only()).unwrap();
    assert_eq!(run.totals.get("cpp"), Some(0));
    assert_eq!(run.stats.unmatched, 1);
}

// ── error handling ───────────────────────────────────────────────────────────

#[test]
fn log_must_open_with_a_boundary() {
    let log = vec![delta("a.cc", 1, 0), boundary(0)];
    match fold(&log, &cpp_only()) {
        Err(LocError::DeltaBeforeBoundary { path }) => assert_eq!(path, "a.cc"),
        other => panic!("expected DeltaBeforeBoundary, got {other:?}"),
    }
}

#[test]
fn noise_before_first_boundary_is_fine() {
    let recs = records(&["warning: inexact rename detection", "", SCENARIO[0], SCENARIO[1]]);
    let run = fold(&recs, &cpp_only()).unwrap();
    assert_eq!(run.totals.get("cpp"), Some(10));
}

#[test]
fn huge_counts_never_wrap() {
    let recs = records(&[SCENARIO[0], "18446744073709551615\t0\ta.cc", "4\t0\ta.cc"]);
    let run = fold(&recs, &cpp_only()).unwrap();
    assert_eq!(run.totals.get("cpp"), Some(4));

    let recs = records(&[SCENARIO[0], "9223372036854775807\t0\ta.cc", "1\t0\tb.cc"]);
    match fold(&recs, &cpp_only()) {
        Err(LocError::CountOverflow { path }) => assert_eq!(path, "b.cc"),
        other => panic!("expected CountOverflow, got {other:?}"),
    }
}

// ── parallel taxonomies ──────────────────────────────────────────────────────

#[test]
fn parallel_runs_match_sequential_runs_in_order() {
    let log = mixed_log();
    let taxonomies = vec![
        languages(),
        lochist::taxonomy::builtin("source").unwrap(),
        cpp_only(),
    ];
    let parallel = fold_all(&log, &taxonomies).unwrap();
    assert_eq!(parallel.len(), 3);
    for (run, taxonomy) in parallel.into_iter().zip(&taxonomies) {
        let sequential = fold(&log, taxonomy).unwrap();
        assert_eq!(run.taxonomy, taxonomy.name());
        assert_eq!(run.totals, sequential.totals);
    }
}

// ── builder edges ────────────────────────────────────────────────────────────

#[test]
fn empty_builder_finalize_is_noop() {
    let mut b = StepSeriesBuilder::new(vec!["a".to_string()]);
    b.finalize();
    assert!(b.is_empty());
    assert!(b.finalize_at(XCoord::Ordinal(3)).is_ok());
    assert!(b.build().is_empty());
}

#[test]
fn finalize_at_rejects_earlier_edge() {
    let log = vec![boundary(0), delta("a.cc", 1, 0), boundary(5)];
    let run = fold(&log, &cpp_only()).unwrap();
    assert!(matches!(
        run.clone().into_series(Terminal::At(XCoord::Ordinal(2))),
        Err(LocError::FinalizeBeforeEnd)
    ));
    let s = run.into_series(Terminal::At(XCoord::Ordinal(9))).unwrap();
    assert_eq!(s.x.last(), Some(&XCoord::Ordinal(9)));
}

#[test]
fn year_end_terminal_lands_on_next_january() {
    let recs = records(SCENARIO);
    let series = fold(&recs, &cpp_only())
        .unwrap()
        .into_series(Terminal::YearEnd)
        .unwrap();
    let edge = XCoord::Time(Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap());
    assert_eq!(&series.x[6..], &[edge, edge]);
    assert_eq!(series.axis(), Some(Axis::Time));
}
