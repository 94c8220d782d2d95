//! Overlap join: one output row per overlapping (A, B) pair.

use crate::engine::{apply_binary, BinaryOp, WorkerPool};
use crate::error::Result;
use crate::index::IntervalIndex;
use crate::ops::StrandMode;
use crate::record::{ColumnType, Record, Schema, Value};
use crate::table::{IntervalTable, Partition};

/// Join configuration.
#[derive(Debug, Clone)]
pub struct JoinConfig {
    /// Strand pairing mode.
    pub mode: StrandMode,
    /// Extra distance still counted as a match; negative slack demands a
    /// minimum overlap instead.
    pub slack: i64,
    /// Suffix appended to right-side column names that collide.
    pub suffix: String,
    /// Emit a `distance` column (0 for true overlaps).
    pub report_distance: bool,
    /// Emit an `overlap_fraction` column (overlap length / A length).
    pub report_overlap_fraction: bool,
}

impl Default for JoinConfig {
    fn default() -> Self {
        Self {
            mode: StrandMode::Ignore,
            slack: 0,
            suffix: "_b".to_string(),
            report_distance: false,
            report_overlap_fraction: false,
        }
    }
}

/// Schema for the B side of a pair row: coordinate columns, strand when the
/// B table is stranded, then B's own attributes.
pub(crate) fn right_side_schema(b: &IntervalTable, suffix: &str) -> Schema {
    let mut right = Schema::empty()
        .with_column(format!("start{suffix}"), ColumnType::Int)
        .with_column(format!("end{suffix}"), ColumnType::Int);
    if b.stranded() {
        right = right.with_column(format!("strand{suffix}"), ColumnType::Text);
    }
    for (name, ty) in b.schema().iter() {
        right = right.with_column(name, ty);
    }
    right
}

/// Append the B side of a pair row to `values`.
pub(crate) fn push_right_values(values: &mut Vec<Value>, b: &Record, b_stranded: bool) {
    values.push(Value::Int(b.start));
    values.push(Value::Int(b.end));
    if b_stranded {
        values.push(Value::Text(b.strand.to_string()));
    }
    values.extend(b.values.iter().cloned());
}

struct JoinOp<'c> {
    config: &'c JoinConfig,
    b_stranded: bool,
}

impl BinaryOp for JoinOp<'_> {
    fn output_schema(&self, a: &IntervalTable, b: &IntervalTable) -> Result<Schema> {
        let right = right_side_schema(b, &self.config.suffix);
        let mut schema = a.schema().concat_suffixed(&right, &self.config.suffix);
        if self.config.report_distance {
            schema = schema.with_column("distance", ColumnType::Int);
        }
        if self.config.report_overlap_fraction {
            schema = schema.with_column("overlap_fraction", ColumnType::Float);
        }
        Ok(schema)
    }

    fn apply(
        &self,
        a: &Partition<'_>,
        b: Option<&Partition<'_>>,
        out: &mut Vec<Record>,
    ) -> Result<()> {
        let Some(b) = b else { return Ok(()) };
        let index = IntervalIndex::build(b);

        for a_rec in a.iter() {
            let qs = a_rec.start - self.config.slack;
            let qe = a_rec.end + self.config.slack;
            if qs >= qe {
                continue;
            }
            for pos in index.query_overlaps(qs, qe) {
                let b_rec = b.record(pos);
                let mut values = a_rec.values.clone();
                push_right_values(&mut values, b_rec, self.b_stranded);
                if self.config.report_distance {
                    values.push(Value::Int(a_rec.distance_to(b_rec).unwrap_or(0)));
                }
                if self.config.report_overlap_fraction {
                    let fraction = a_rec.overlap_length(b_rec) as f64 / a_rec.len() as f64;
                    values.push(Value::Float(fraction));
                }
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

/// Join two tables on interval overlap.
///
/// Output rows carry A's coordinates and strand; columns are A's
/// attributes, the B coordinates, B's attributes (suffixed on collision),
/// and any requested derived columns. Keys absent on the B side contribute
/// nothing.
pub fn join(
    a: &IntervalTable,
    b: &IntervalTable,
    config: &JoinConfig,
    pool: &WorkerPool,
) -> Result<IntervalTable> {
    let op = JoinOp {
        config,
        b_stranded: b.stranded(),
    };
    apply_binary(&op, a, b, config.mode, pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Strand;

    fn bare(records: Vec<Record>, stranded: bool) -> IntervalTable {
        IntervalTable::new(Schema::empty(), records, stranded).unwrap()
    }

    #[test]
    fn test_join_basic_pairing() {
        let a = bare(vec![Record::new("chr1", 1, 10)], false);
        let b = bare(
            vec![Record::new("chr1", 5, 15), Record::new("chr1", 20, 30)],
            false,
        );

        let out = join(&a, &b, &JoinConfig::default(), &WorkerPool::sequential()).unwrap();

        assert_eq!(out.len(), 1);
        let row = &out.records()[0];
        assert_eq!((row.start, row.end), (1, 10));
        assert_eq!(row.values, vec![Value::Int(5), Value::Int(15)]);
    }

    #[test]
    fn test_join_emits_all_pairs_in_order() {
        let a = bare(vec![Record::new("chr1", 0, 100)], false);
        let b = bare(
            vec![
                Record::new("chr1", 50, 60),
                Record::new("chr1", 10, 20),
                Record::new("chr1", 200, 300),
            ],
            false,
        );

        let out = join(&a, &b, &JoinConfig::default(), &WorkerPool::sequential()).unwrap();

        let starts: Vec<_> = out.records().iter().map(|r| r.values[0].clone()).collect();
        assert_eq!(starts, vec![Value::Int(10), Value::Int(50)]);
    }

    #[test]
    fn test_join_column_suffixing() {
        let schema = Schema::empty().with_column("name", ColumnType::Text);
        let a = IntervalTable::new(
            schema.clone(),
            vec![Record::new("chr1", 0, 10).with_values(vec![Value::Text("a1".into())])],
            false,
        )
        .unwrap();
        let b = IntervalTable::new(
            schema,
            vec![Record::new("chr1", 5, 15).with_values(vec![Value::Text("b1".into())])],
            false,
        )
        .unwrap();

        let out = join(&a, &b, &JoinConfig::default(), &WorkerPool::sequential()).unwrap();

        let names: Vec<_> = out.schema().iter().map(|(n, _)| n.to_string()).collect();
        assert_eq!(names, vec!["name", "start_b", "end_b", "name_b"]);
        assert_eq!(out.records()[0].values[3], Value::Text("b1".into()));
    }

    #[test]
    fn test_join_derived_columns() {
        let config = JoinConfig {
            report_distance: true,
            report_overlap_fraction: true,
            ..JoinConfig::default()
        };
        let a = bare(vec![Record::new("chr1", 0, 100)], false);
        let b = bare(vec![Record::new("chr1", 50, 150)], false);

        let out = join(&a, &b, &config, &WorkerPool::sequential()).unwrap();

        let row = &out.records()[0];
        assert_eq!(row.values[2], Value::Int(0));
        assert_eq!(row.values[3], Value::Float(0.5));
    }

    #[test]
    fn test_join_with_slack() {
        let config = JoinConfig {
            slack: 10,
            report_distance: true,
            ..JoinConfig::default()
        };
        let a = bare(vec![Record::new("chr1", 0, 100)], false);
        let b = bare(
            vec![Record::new("chr1", 105, 110), Record::new("chr1", 120, 130)],
            false,
        );

        let out = join(&a, &b, &config, &WorkerPool::sequential()).unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out.records()[0].values[2], Value::Int(5));
    }

    #[test]
    fn test_join_same_strand() {
        let a = bare(
            vec![Record::new("chr1", 0, 100).with_strand(Strand::Forward)],
            true,
        );
        let b = bare(
            vec![
                Record::new("chr1", 10, 20).with_strand(Strand::Forward),
                Record::new("chr1", 30, 40).with_strand(Strand::Reverse),
            ],
            true,
        );

        let config = JoinConfig {
            mode: StrandMode::Same,
            ..JoinConfig::default()
        };
        let out = join(&a, &b, &config, &WorkerPool::sequential()).unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out.records()[0].values[0], Value::Int(10));
    }

    #[test]
    fn test_join_missing_chromosome_contributes_nothing() {
        let a = bare(vec![Record::new("chr9", 0, 10)], false);
        let b = bare(vec![Record::new("chr1", 0, 10)], false);

        let out = join(&a, &b, &JoinConfig::default(), &WorkerPool::sequential()).unwrap();
        assert!(out.is_empty());
    }
}
