//! Concatenation and coordinate union of two tables.

use crate::engine::WorkerPool;
use crate::error::{EngineError, Result};
use crate::ops::merge::{merge, MergeConfig};
use crate::table::IntervalTable;

/// Union configuration.
#[derive(Debug, Clone, Default)]
pub struct UnionConfig {
    /// Merge slack applied to the concatenated spans.
    pub slack: i64,
    /// Partition by strand; `None` keeps strand when both inputs are
    /// stranded.
    pub by_strand: Option<bool>,
}

/// Concatenate two tables row-wise (A's rows, then B's).
///
/// Requires identical schemas and strandedness flags; anything else is a
/// `SchemaMismatch` error.
pub fn concat(a: &IntervalTable, b: &IntervalTable) -> Result<IntervalTable> {
    if a.schema() != b.schema() {
        return Err(EngineError::SchemaMismatch(
            "concat requires identical attribute columns".to_string(),
        ));
    }
    if a.stranded() != b.stranded() {
        return Err(EngineError::SchemaMismatch(format!(
            "concat requires matching strandedness flags (left: {}, right: {})",
            a.stranded(),
            b.stranded()
        )));
    }

    let mut records = a.records().to_vec();
    records.extend(b.records().iter().cloned());
    IntervalTable::new(a.schema().clone(), records, a.stranded())
}

/// Coordinate union: concatenate both tables' spans and merge the result.
///
/// Attributes are dropped before merging, so the inputs' schemas need not
/// match; the output is commutative up to canonical key order.
pub fn union(
    a: &IntervalTable,
    b: &IntervalTable,
    config: &UnionConfig,
    pool: &WorkerPool,
) -> Result<IntervalTable> {
    let stranded = a.stranded() && b.stranded();

    let mut records = a.without_attributes().into_parts().1;
    records.extend(b.without_attributes().into_parts().1);
    let combined = IntervalTable::new(crate::record::Schema::empty(), records, stranded)?;

    let merge_config = MergeConfig {
        slack: config.slack,
        by_strand: Some(config.by_strand.unwrap_or(stranded)),
    };
    merge(&combined, &merge_config, pool)
}
