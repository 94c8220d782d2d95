//! Overlap filtering and counting: keep or annotate A rows by their B hits.

use crate::engine::{apply_binary, BinaryOp, EmptyRight, WorkerPool};
use crate::error::Result;
use crate::index::IntervalIndex;
use crate::ops::StrandMode;
use crate::record::{ColumnType, Record, Schema, Value};
use crate::table::{IntervalTable, Partition};

/// Overlap filter configuration.
#[derive(Debug, Clone, Default)]
pub struct OverlapConfig {
    pub mode: StrandMode,
    /// Extra distance still counted as a match.
    pub slack: i64,
    /// Keep rows with no overlap instead of rows with one.
    pub invert: bool,
}

/// Overlap count configuration.
#[derive(Debug, Clone, Default)]
pub struct CountConfig {
    pub mode: StrandMode,
    pub slack: i64,
}

struct FilterOp<'c> {
    config: &'c OverlapConfig,
}

impl BinaryOp for FilterOp<'_> {
    fn output_schema(&self, a: &IntervalTable, _b: &IntervalTable) -> Result<Schema> {
        Ok(a.schema().clone())
    }

    fn empty_right(&self) -> EmptyRight {
        // With no B partition nothing overlaps: inverted filters keep
        // everything, plain filters keep nothing.
        if self.config.invert {
            EmptyRight::CopyLeft
        } else {
            EmptyRight::Skip
        }
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
            let hit = qs < qe && index.has_overlap(qs, qe);
            if hit != self.config.invert {
                out.push(a_rec.clone());
            }
        }
        Ok(())
    }
}

struct CountOp<'c> {
    config: &'c CountConfig,
}

impl BinaryOp for CountOp<'_> {
    fn output_schema(&self, a: &IntervalTable, _b: &IntervalTable) -> Result<Schema> {
        Ok(a.schema().clone().with_column("count", ColumnType::Int))
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
            let qs = a_rec.start - self.config.slack;
            let qe = a_rec.end + self.config.slack;
            let count = match &index {
                Some(index) if qs < qe => index.count_overlaps(qs, qe),
                _ => 0,
            };
            let mut row = a_rec.clone();
            row.values.push(Value::Int(count as i64));
            out.push(row);
        }
        Ok(())
    }
}

/// Keep the A rows that overlap at least one B interval (or, with
/// `invert`, the rows that overlap none). Output schema equals A's.
pub fn filter_overlaps(
    a: &IntervalTable,
    b: &IntervalTable,
    config: &OverlapConfig,
    pool: &WorkerPool,
) -> Result<IntervalTable> {
    let op = FilterOp { config };
    apply_binary(&op, a, b, config.mode, pool)
}

/// Annotate every A row with the number of overlapping B intervals.
pub fn count_overlaps(
    a: &IntervalTable,
    b: &IntervalTable,
    config: &CountConfig,
    pool: &WorkerPool,
) -> Result<IntervalTable> {
    let op = CountOp { config };
    apply_binary(&op, a, b, config.mode, pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare(records: Vec<Record>) -> IntervalTable {
        IntervalTable::new(Schema::empty(), records, false).unwrap()
    }

    #[test]
    fn test_filter_keeps_overlapping_rows() {
        let a = bare(vec![
            Record::new("chr1", 0, 10),
            Record::new("chr1", 50, 60),
            Record::new("chr1", 100, 110),
        ]);
        let b = bare(vec![Record::new("chr1", 5, 55)]);

        let out =
            filter_overlaps(&a, &b, &OverlapConfig::default(), &WorkerPool::sequential()).unwrap();

        let starts: Vec<_> = out.records().iter().map(|r| r.start).collect();
        assert_eq!(starts, vec![0, 50]);
    }

    #[test]
    fn test_filter_invert() {
        let a = bare(vec![Record::new("chr1", 0, 10), Record::new("chr1", 50, 60)]);
        let b = bare(vec![Record::new("chr1", 5, 8)]);

        let config = OverlapConfig {
            invert: true,
            ..OverlapConfig::default()
        };
        let out = filter_overlaps(&a, &b, &config, &WorkerPool::sequential()).unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out.records()[0].start, 50);
    }

    #[test]
    fn test_filter_invert_keeps_all_when_b_missing() {
        let a = bare(vec![Record::new("chr2", 0, 10)]);
        let b = bare(vec![Record::new("chr1", 0, 10)]);

        let config = OverlapConfig {
            invert: true,
            ..OverlapConfig::default()
        };
        let out = filter_overlaps(&a, &b, &config, &WorkerPool::sequential()).unwrap();
        assert_eq!(out.len(), 1);

        let plain =
            filter_overlaps(&a, &b, &OverlapConfig::default(), &WorkerPool::sequential()).unwrap();
        assert!(plain.is_empty());
    }

    #[test]
    fn test_count_overlaps() {
        let a = bare(vec![
            Record::new("chr1", 0, 100),
            Record::new("chr2", 0, 100),
        ]);
        let b = bare(vec![
            Record::new("chr1", 10, 20),
            Record::new("chr1", 30, 40),
            Record::new("chr1", 200, 210),
        ]);

        let out = count_overlaps(&a, &b, &CountConfig::default(), &WorkerPool::sequential())
            .unwrap();

        assert_eq!(out.records()[0].values[0], Value::Int(2));
        // chr2 has no B partition: count 0, not an error.
        assert_eq!(out.records()[1].values[0], Value::Int(0));
    }
}
