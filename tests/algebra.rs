//! Set-algebra properties and reference cases for the interval operations.

use grange::prelude::*;

fn bare(records: Vec<Record>) -> IntervalTable {
    IntervalTable::new(Schema::empty(), records, false).unwrap()
}

fn spans(table: &IntervalTable) -> Vec<(String, i64, i64)> {
    table
        .records()
        .iter()
        .map(|r| (r.chrom.clone(), r.start, r.end))
        .collect()
}

#[test]
fn join_reports_exactly_the_overlapping_pair() {
    let a = bare(vec![Record::new("chr1", 1, 10)]);
    let b = bare(vec![
        Record::new("chr1", 5, 15),
        Record::new("chr1", 20, 30),
    ]);

    let out = join(&a, &b, &JoinConfig::default(), &WorkerPool::sequential()).unwrap();

    assert_eq!(out.len(), 1);
    let row = &out.records()[0];
    assert_eq!((row.chrom.as_str(), row.start, row.end), ("chr1", 1, 10));
    assert_eq!(row.values, vec![Value::Int(5), Value::Int(15)]);
}

#[test]
fn subtract_splits_around_the_removed_span() {
    let a = bare(vec![Record::new("chr1", 0, 100)]);
    let b = bare(vec![Record::new("chr1", 40, 60)]);

    let out = subtract(&a, &b, &SubtractConfig::default(), &WorkerPool::sequential()).unwrap();

    assert_eq!(
        spans(&out),
        vec![("chr1".into(), 0, 40), ("chr1".into(), 60, 100)]
    );
}

#[test]
fn nearest_tie_goes_to_the_smaller_start() {
    let a = bare(vec![Record::new("chr1", 50, 51)]);
    let b = bare(vec![
        Record::new("chr1", 40, 41),
        Record::new("chr1", 60, 61),
    ]);

    let out = nearest(&a, &b, &NearestConfig::default(), &WorkerPool::sequential()).unwrap();

    assert_eq!(out.len(), 1);
    let row = &out.records()[0];
    assert_eq!(row.values[0], Value::Int(40));
    assert_eq!(row.values[1], Value::Int(41));
    assert_eq!(row.values[2], Value::Int(9));
}

#[test]
fn merge_slack_controls_gap_tolerance() {
    let t = bare(vec![
        Record::new("chr1", 0, 10),
        Record::new("chr1", 12, 20),
    ]);

    let plain = merge(&t, &MergeConfig::default(), &WorkerPool::sequential()).unwrap();
    assert_eq!(plain.len(), 2);

    let relaxed = MergeConfig {
        slack: 2,
        ..MergeConfig::default()
    };
    let merged = merge(&t, &relaxed, &WorkerPool::sequential()).unwrap();
    assert_eq!(spans(&merged), vec![("chr1".into(), 0, 20)]);
}

#[test]
fn merge_is_idempotent() {
    let t = bare(vec![
        Record::new("chr2", 5, 25),
        Record::new("chr1", 0, 10),
        Record::new("chr1", 8, 30),
        Record::new("chr1", 29, 35),
        Record::new("chr1", 100, 200),
        Record::new("chr10", 0, 5),
    ]);

    let once = merge(&t, &MergeConfig::default(), &WorkerPool::sequential()).unwrap();
    let twice = merge(&once, &MergeConfig::default(), &WorkerPool::sequential()).unwrap();

    assert_eq!(spans(&once), spans(&twice));
}

#[test]
fn union_is_commutative() {
    let a = bare(vec![
        Record::new("chr1", 0, 50),
        Record::new("chr2", 100, 150),
    ]);
    let b = bare(vec![
        Record::new("chr1", 40, 80),
        Record::new("chr10", 0, 10),
    ]);

    let ab = union(&a, &b, &UnionConfig::default(), &WorkerPool::sequential()).unwrap();
    let ba = union(&b, &a, &UnionConfig::default(), &WorkerPool::sequential()).unwrap();

    assert_eq!(ab, ba);
    assert_eq!(
        spans(&ab),
        vec![
            ("chr1".into(), 0, 80),
            ("chr2".into(), 100, 150),
            ("chr10".into(), 0, 10),
        ]
    );
}

#[test]
fn coverage_round_trips_to_interval_depth() {
    let t = bare(vec![
        Record::new("chr1", 3, 17),
        Record::new("chr1", 10, 22),
        Record::new("chr1", 10, 11),
        Record::new("chr1", 40, 55),
    ]);

    let tracks = coverage(&t, &CoverageConfig::default(), &WorkerPool::sequential()).unwrap();
    let track = &tracks[0].1;

    for pos in 0..60 {
        let depth = t
            .records()
            .iter()
            .filter(|r| r.start <= pos && pos < r.end)
            .count() as f64;
        assert_eq!(track.value_at(pos), depth, "depth mismatch at {pos}");
    }

    // Coverage of the merged table is the flattened footprint.
    let merged = merge(&t, &MergeConfig::default(), &WorkerPool::sequential()).unwrap();
    let flat = coverage(&merged, &CoverageConfig::default(), &WorkerPool::sequential()).unwrap();
    for pos in 0..60 {
        let expected = if track.value_at(pos) > 0.0 { 1.0 } else { 0.0 };
        assert_eq!(flat[0].1.value_at(pos), expected);
    }
}

#[test]
fn set_intersect_equals_subtract_complement() {
    // (A ∩ B) and (A \ B) partition A's footprint.
    let a = bare(vec![
        Record::new("chr1", 0, 100),
        Record::new("chr1", 150, 220),
    ]);
    let b = bare(vec![
        Record::new("chr1", 50, 170),
        Record::new("chr1", 200, 300),
    ]);

    let inside = set_intersect(&a, &b, StrandMode::Ignore, &WorkerPool::sequential()).unwrap();
    let outside = subtract(&a, &b, &SubtractConfig::default(), &WorkerPool::sequential()).unwrap();

    let covered = |table: &IntervalTable, pos: i64| {
        table
            .records()
            .iter()
            .any(|r| r.start <= pos && pos < r.end)
    };

    for pos in 0..320 {
        let in_a = covered(&a, pos);
        let in_b = covered(&b, pos);
        assert_eq!(covered(&inside, pos), in_a && in_b, "position {pos}");
        assert_eq!(covered(&outside, pos), in_a && !in_b, "position {pos}");
    }
}

#[test]
fn stranded_mode_on_unstranded_table_fails_before_work() {
    let a = bare(vec![Record::new("chr1", 0, 10)]);
    let b = bare(vec![Record::new("chr1", 5, 15)]);

    let config = JoinConfig {
        mode: StrandMode::Opposite,
        ..JoinConfig::default()
    };
    let err = join(&a, &b, &config, &WorkerPool::sequential()).unwrap_err();
    assert!(matches!(err, grange::EngineError::StrandConfig(_)));
}

#[test]
fn empty_inputs_yield_empty_results_not_errors() {
    let empty = IntervalTable::empty(Schema::empty(), false);
    let t = bare(vec![Record::new("chr1", 0, 10)]);
    let pool = WorkerPool::sequential();

    assert!(join(&empty, &t, &JoinConfig::default(), &pool).unwrap().is_empty());
    assert!(join(&t, &empty, &JoinConfig::default(), &pool).unwrap().is_empty());
    assert!(merge(&empty, &MergeConfig::default(), &pool).unwrap().is_empty());
    assert!(coverage(&empty, &CoverageConfig::default(), &pool).unwrap().is_empty());

    // Subtracting nothing passes A through.
    let untouched = subtract(&t, &empty, &SubtractConfig::default(), &pool).unwrap();
    assert_eq!(spans(&untouched), vec![("chr1".into(), 0, 10)]);
}

#[test]
fn cluster_groups_match_merge_spans() {
    let t = bare(vec![
        Record::new("chr1", 0, 10),
        Record::new("chr1", 5, 20),
        Record::new("chr1", 50, 60),
        Record::new("chr2", 0, 5),
    ]);
    let pool = WorkerPool::sequential();

    let merged = merge(&t, &MergeConfig::default(), &pool).unwrap();
    let clustered = cluster(&t, &MergeConfig::default(), &pool).unwrap();

    let max_id = clustered
        .records()
        .iter()
        .filter_map(|r| r.values.last().and_then(Value::as_int))
        .max()
        .unwrap();
    assert_eq!(max_id as usize, merged.len());
}

#[test]
fn window_pieces_tile_each_interval() {
    let t = bare(vec![Record::new("chr1", 20, 135)]);

    let config = WindowConfig {
        size: 40,
        anchor: Anchor::IntervalStart,
        partial: PartialWindows::Keep,
    };
    let out = window(&t, &config, &WorkerPool::sequential()).unwrap();

    assert_eq!(
        spans(&out),
        vec![
            ("chr1".into(), 20, 60),
            ("chr1".into(), 60, 100),
            ("chr1".into(), 100, 135),
        ]
    );
}

#[test]
fn count_and_filter_agree() {
    let a = bare(vec![
        Record::new("chr1", 0, 10),
        Record::new("chr1", 50, 60),
        Record::new("chr1", 90, 95),
    ]);
    let b = bare(vec![
        Record::new("chr1", 5, 55),
        Record::new("chr1", 52, 58),
    ]);
    let pool = WorkerPool::sequential();

    let counted = count_overlaps(&a, &b, &CountConfig::default(), &pool).unwrap();
    let kept = filter_overlaps(&a, &b, &OverlapConfig::default(), &pool).unwrap();

    let positive = counted
        .records()
        .iter()
        .filter(|r| r.values[0] != Value::Int(0))
        .count();
    assert_eq!(positive, kept.len());
    assert_eq!(counted.records()[0].values[0], Value::Int(1));
    assert_eq!(counted.records()[1].values[0], Value::Int(2));
    assert_eq!(counted.records()[2].values[0], Value::Int(0));
}
