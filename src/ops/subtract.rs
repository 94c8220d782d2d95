//! Subtract: remove the union of overlapping B spans from each A interval.

use crate::engine::{apply_binary, BinaryOp, EmptyRight, WorkerPool};
use crate::error::Result;
use crate::index::IntervalIndex;
use crate::ops::StrandMode;
use crate::record::{Record, Schema};
use crate::table::{IntervalTable, Partition};

/// Subtract configuration.
#[derive(Debug, Clone, Default)]
pub struct SubtractConfig {
    pub mode: StrandMode,
}

struct SubtractOp;

impl BinaryOp for SubtractOp {
    fn output_schema(&self, a: &IntervalTable, _b: &IntervalTable) -> Result<Schema> {
        Ok(a.schema().clone())
    }

    fn empty_right(&self) -> EmptyRight {
        // Nothing to remove: A passes through unchanged.
        EmptyRight::CopyLeft
    }

    fn apply(
        &self,
        a: &Partition<'_>,
        b: Option<&Partition<'_>>,
        out: &mut Vec<Record>,
    ) -> Result<()> {
        let Some(b) = b else {
            out.extend(a.iter().cloned());
            return Ok(());
        };
        let index = IntervalIndex::build(b);

        for a_rec in a.iter() {
            let hits = index.query_overlaps(a_rec.start, a_rec.end);
            if hits.is_empty() {
                out.push(a_rec.clone());
                continue;
            }

            // Hits arrive in ascending start order; one left-to-right pass
            // emits the uncovered pieces.
            let mut cursor = a_rec.start;
            for pos in hits {
                let b_rec = b.record(pos);
                if b_rec.start > cursor {
                    out.push(piece(a_rec, cursor, b_rec.start));
                }
                cursor = cursor.max(b_rec.end);
                if cursor >= a_rec.end {
                    break;
                }
            }
            if cursor < a_rec.end {
                out.push(piece(a_rec, cursor, a_rec.end));
            }
        }
        Ok(())
    }
}

fn piece(a_rec: &Record, start: i64, end: i64) -> Record {
    Record::new(a_rec.chrom.clone(), start, end)
        .with_strand(a_rec.strand)
        .with_values(a_rec.values.clone())
}

/// Remove every B-covered base from each A interval, splitting A intervals
/// around the removed spans. A's attributes are preserved on every piece.
pub fn subtract(
    a: &IntervalTable,
    b: &IntervalTable,
    config: &SubtractConfig,
    pool: &WorkerPool,
) -> Result<IntervalTable> {
    apply_binary(&SubtractOp, a, b, config.mode, pool)
}
