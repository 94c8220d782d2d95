//! Intersect: emit the clipped span of each overlapping (A, B) pair.

use crate::engine::{apply_binary, BinaryOp, WorkerPool};
use crate::error::{EngineError, Result};
use crate::index::IntervalIndex;
use crate::ops::merge::{merge, MergeConfig};
use crate::ops::StrandMode;
use crate::record::{Record, Schema};
use crate::table::{IntervalTable, Partition};

/// Intersect configuration.
#[derive(Debug, Clone)]
pub struct IntersectConfig {
    pub mode: StrandMode,
    /// Suffix for right-side attribute names that collide.
    pub suffix: String,
}

impl Default for IntersectConfig {
    fn default() -> Self {
        Self {
            mode: StrandMode::Ignore,
            suffix: "_b".to_string(),
        }
    }
}

struct IntersectOp<'c> {
    config: &'c IntersectConfig,
}

impl BinaryOp for IntersectOp<'_> {
    fn output_schema(&self, a: &IntervalTable, b: &IntervalTable) -> Result<Schema> {
        Ok(a.schema().concat_suffixed(b.schema(), &self.config.suffix))
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
            for pos in index.query_overlaps(a_rec.start, a_rec.end) {
                let b_rec = b.record(pos);
                let (start, end) = (
                    a_rec.start.max(b_rec.start),
                    a_rec.end.min(b_rec.end),
                );
                let mut values = a_rec.values.clone();
                values.extend(b_rec.values.iter().cloned());
                out.push(
                    Record::new(a_rec.chrom.clone(), start, end)
                        .with_strand(a_rec.strand)
                        .with_values(values),
                );
            }
        }
        Ok(())
    }
}

/// Intersect two tables: one output row per overlapping pair, carrying the
/// shared span `[max(starts), min(ends))` and both sides' attributes.
pub fn intersect(
    a: &IntervalTable,
    b: &IntervalTable,
    config: &IntersectConfig,
    pool: &WorkerPool,
) -> Result<IntervalTable> {
    let op = IntersectOp { config };
    apply_binary(&op, a, b, config.mode, pool)
}

/// Set intersection: merge each side's own overlaps first, then intersect
/// the flattened spans. Output carries no attribute columns.
pub fn set_intersect(
    a: &IntervalTable,
    b: &IntervalTable,
    mode: StrandMode,
    pool: &WorkerPool,
) -> Result<IntervalTable> {
    if mode != StrandMode::Ignore && !(a.stranded() && b.stranded()) {
        return Err(EngineError::StrandConfig(format!(
            "{mode:?} pairing requires both tables stranded"
        )));
    }

    let by_strand = mode != StrandMode::Ignore;
    let flatten = MergeConfig {
        slack: 0,
        by_strand: Some(by_strand),
    };
    let a_flat = merge(a, &flatten, pool)?.without_attributes();
    let b_flat = merge(b, &flatten, pool)?.without_attributes();

    let config = IntersectConfig {
        mode,
        ..IntersectConfig::default()
    };
    intersect(&a_flat, &b_flat, &config, pool)
}
