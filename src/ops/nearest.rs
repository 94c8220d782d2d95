//! Nearest and k-nearest neighbor queries between two tables.

use crate::engine::{apply_binary, BinaryOp, EmptyRight, WorkerPool};
use crate::error::{EngineError, Result};
use crate::index::{Direction, IntervalIndex};
use crate::ops::join::{push_right_values, right_side_schema};
use crate::ops::{StrandMode, TiePolicy};
use crate::record::{ColumnType, Record, Schema, Value};
use crate::table::{IntervalTable, Partition};

/// Nearest-neighbor configuration.
#[derive(Debug, Clone)]
pub struct NearestConfig {
    pub mode: StrandMode,
    /// Number of neighbors per A row.
    pub k: usize,
    /// Tie resolution among equally-distant candidates.
    pub how: TiePolicy,
    /// Which side of the query neighbors may come from.
    pub direction: Direction,
    /// Suffix for right-side column names that collide.
    pub suffix: String,
    /// Discard candidates farther than this.
    pub max_distance: Option<i64>,
}

impl Default for NearestConfig {
    fn default() -> Self {
        Self {
            mode: StrandMode::Ignore,
            k: 1,
            how: TiePolicy::First,
            direction: Direction::Any,
            suffix: "_b".to_string(),
            max_distance: None,
        }
    }
}

struct NearestOp<'c> {
    config: &'c NearestConfig,
    b_stranded: bool,
    /// Width of the right-side value block, for Null fill rows.
    right_width: usize,
}

impl NearestOp<'_> {
    fn push_fill_row(&self, a_rec: &Record, out: &mut Vec<Record>) {
        let mut values = a_rec.values.clone();
        values.extend(std::iter::repeat(Value::Null).take(self.right_width + 1));
        out.push(
            Record::new(a_rec.chrom.clone(), a_rec.start, a_rec.end)
                .with_strand(a_rec.strand)
                .with_values(values),
        );
    }
}

impl BinaryOp for NearestOp<'_> {
    fn output_schema(&self, a: &IntervalTable, b: &IntervalTable) -> Result<Schema> {
        let right = right_side_schema(b, &self.config.suffix);
        Ok(a.schema()
            .concat_suffixed(&right, &self.config.suffix)
            .with_column("distance", ColumnType::Int))
    }

    fn empty_right(&self) -> EmptyRight {
        EmptyRight::Fill
    }

    fn apply(
        &self,
        a: &Partition<'_>,
        b: Option<&Partition<'_>>,
        out: &mut Vec<Record>,
    ) -> Result<()> {
        let index = b.map(IntervalIndex::build);

        for a_rec in a.iter() {
            let candidates = match (&index, b) {
                (Some(index), Some(b_part)) => {
                    let mut hits = index.query_nearest(
                        a_rec.start,
                        a_rec.end,
                        self.config.direction,
                        self.config.k,
                    );
                    if let Some(max) = self.config.max_distance {
                        hits.retain(|&(_, d)| d <= max);
                    }
                    resolve_ties(hits, self.config.k, self.config.how)
                        .into_iter()
                        .map(|(pos, d)| (b_part.record(pos), d))
                        .collect()
                }
                _ => Vec::new(),
            };

            if candidates.is_empty() {
                self.push_fill_row(a_rec, out);
                continue;
            }

            for (b_rec, distance) in candidates {
                let mut values = a_rec.values.clone();
                push_right_values(&mut values, b_rec, self.b_stranded);
                values.push(Value::Int(distance));
                out.push(
                    Record::new(a_rec.chrom.clone(), a_rec.start, a_rec.end)
                        .with_strand(a_rec.strand)
                        .with_values(values),
                );
            }
        }
        Ok(())
    }
}

/// Apply a tie policy to candidates already in (distance, start, end, input)
/// order, holding k plus the k-th distance's tie overflow.
fn resolve_ties(
    candidates: Vec<(usize, i64)>,
    k: usize,
    how: TiePolicy,
) -> Vec<(usize, i64)> {
    match how {
        TiePolicy::All => candidates,
        TiePolicy::First => {
            let mut candidates = candidates;
            candidates.truncate(k);
            candidates
        }
        TiePolicy::Last => {
            // Reverse order inside each equal-distance group, then cut.
            let mut reversed = Vec::with_capacity(candidates.len());
            let mut group_start = 0;
            while group_start < candidates.len() {
                let d = candidates[group_start].1;
                let group_end = group_start
                    + candidates[group_start..]
                        .iter()
                        .take_while(|&&(_, cd)| cd == d)
                        .count();
                reversed.extend(candidates[group_start..group_end].iter().rev().copied());
                group_start = group_end;
            }
            reversed.truncate(k);
            reversed
        }
    }
}

/// For each A row, find its nearest B neighbor(s). Output rows carry A's
/// coordinates, both sides' attributes, and a `distance` column; rows with
/// no qualifying neighbor carry Null neighbor columns and Null distance.
pub fn nearest(
    a: &IntervalTable,
    b: &IntervalTable,
    config: &NearestConfig,
    pool: &WorkerPool,
) -> Result<IntervalTable> {
    if config.k == 0 {
        return Err(EngineError::Config(
            "nearest requires k >= 1".to_string(),
        ));
    }
    let op = NearestOp {
        config,
        b_stranded: b.stranded(),
        right_width: 2 + usize::from(b.stranded()) + b.schema().len(),
    };
    apply_binary(&op, a, b, config.mode, pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare(records: Vec<Record>) -> IntervalTable {
        IntervalTable::new(Schema::empty(), records, false).unwrap()
    }

    fn run(a: &IntervalTable, b: &IntervalTable, config: &NearestConfig) -> IntervalTable {
        nearest(a, b, config, &WorkerPool::sequential()).unwrap()
    }

    #[test]
    fn test_nearest_basic() {
        let a = bare(vec![Record::new("chr1", 100, 200)]);
        let b = bare(vec![
            Record::new("chr1", 300, 400),
            Record::new("chr1", 500, 600),
        ]);

        let out = run(&a, &b, &NearestConfig::default());

        assert_eq!(out.len(), 1);
        let row = &out.records()[0];
        assert_eq!(row.values, vec![Value::Int(300), Value::Int(400), Value::Int(100)]);
    }

    #[test]
    fn test_nearest_tie_break_prefers_smaller_start() {
        let a = bare(vec![Record::new("chr1", 50, 51)]);
        let b = bare(vec![
            Record::new("chr1", 40, 41),
            Record::new("chr1", 60, 61),
        ]);

        let out = run(&a, &b, &NearestConfig::default());

        assert_eq!(out.len(), 1);
        let row = &out.records()[0];
        assert_eq!(row.values[0], Value::Int(40));
        assert_eq!(row.values[2], Value::Int(9));
    }

    #[test]
    fn test_nearest_tie_policies() {
        let a = bare(vec![Record::new("chr1", 50, 51)]);
        let b = bare(vec![
            Record::new("chr1", 40, 41),
            Record::new("chr1", 60, 61),
        ]);

        let all = NearestConfig {
            how: TiePolicy::All,
            ..NearestConfig::default()
        };
        assert_eq!(run(&a, &b, &all).len(), 2);

        let last = NearestConfig {
            how: TiePolicy::Last,
            ..NearestConfig::default()
        };
        let out = run(&a, &b, &last);
        assert_eq!(out.len(), 1);
        assert_eq!(out.records()[0].values[0], Value::Int(60));
    }

    #[test]
    fn test_nearest_direction_restriction() {
        let a = bare(vec![Record::new("chr1", 100, 110)]);
        let b = bare(vec![
            Record::new("chr1", 0, 10),
            Record::new("chr1", 200, 210),
        ]);

        let upstream = NearestConfig {
            direction: Direction::Upstream,
            ..NearestConfig::default()
        };
        let out = run(&a, &b, &upstream);
        assert_eq!(out.records()[0].values[0], Value::Int(0));

        let downstream = NearestConfig {
            direction: Direction::Downstream,
            ..NearestConfig::default()
        };
        let out = run(&a, &b, &downstream);
        assert_eq!(out.records()[0].values[0], Value::Int(200));
    }

    #[test]
    fn test_nearest_missing_partition_fills_nulls() {
        let a = bare(vec![Record::new("chr5", 0, 10)]);
        let b = bare(vec![Record::new("chr1", 0, 10)]);

        let out = run(&a, &b, &NearestConfig::default());

        assert_eq!(out.len(), 1);
        assert_eq!(
            out.records()[0].values,
            vec![Value::Null, Value::Null, Value::Null]
        );
    }

    #[test]
    fn test_nearest_max_distance_cutoff() {
        let a = bare(vec![Record::new("chr1", 0, 10)]);
        let b = bare(vec![Record::new("chr1", 100, 110)]);

        let config = NearestConfig {
            max_distance: Some(50),
            ..NearestConfig::default()
        };
        let out = run(&a, &b, &config);

        assert_eq!(out.records()[0].values, vec![Value::Null, Value::Null, Value::Null]);
    }

    #[test]
    fn test_k_nearest_emits_k_rows() {
        let a = bare(vec![Record::new("chr1", 0, 10)]);
        let b = bare(vec![
            Record::new("chr1", 20, 30),
            Record::new("chr1", 40, 50),
            Record::new("chr1", 60, 70),
        ]);

        let config = NearestConfig {
            k: 2,
            ..NearestConfig::default()
        };
        let out = run(&a, &b, &config);

        let starts: Vec<_> = out.records().iter().map(|r| r.values[0].clone()).collect();
        assert_eq!(starts, vec![Value::Int(20), Value::Int(40)]);
    }
}
