//! Merge and cluster: single-pass sweep-line span merging.

use crate::engine::{apply_unary, UnaryOp, WorkerPool};
use crate::error::Result;
use crate::record::{ColumnType, Record, Schema, Strand, Value};
use crate::table::{IntervalTable, Partition};

/// Merge/cluster configuration.
#[derive(Debug, Clone, Default)]
pub struct MergeConfig {
    /// Maximum gap still merged (default 0 merges abutting intervals).
    /// Negative slack requires `-slack` overlapping bases instead.
    pub slack: i64,
    /// Partition by strand; `None` follows the table's strandedness flag.
    pub by_strand: Option<bool>,
}

#[inline]
fn should_merge(current_end: i64, next_start: i64, slack: i64) -> bool {
    next_start - current_end <= slack
}

struct MergeOp<'c> {
    config: &'c MergeConfig,
}

impl UnaryOp for MergeOp<'_> {
    fn output_schema(&self, _table: &IntervalTable) -> Result<Schema> {
        Ok(Schema::empty().with_column("count", ColumnType::Int))
    }

    fn apply(&self, partition: &Partition<'_>, out: &mut Vec<Record>) -> Result<()> {
        let strand = partition.key.strand.unwrap_or(Strand::Unstranded);
        let chrom = &partition.key.chrom;

        let mut rows = partition.iter();
        let first = match rows.next() {
            Some(r) => r,
            None => return Ok(()),
        };
        let mut span_start = first.start;
        let mut span_end = first.end;
        let mut count: i64 = 1;

        for record in rows {
            if should_merge(span_end, record.start, self.config.slack) {
                span_end = span_end.max(record.end);
                count += 1;
            } else {
                out.push(
                    Record::new(chrom.clone(), span_start, span_end)
                        .with_strand(strand)
                        .with_values(vec![Value::Int(count)]),
                );
                span_start = record.start;
                span_end = record.end;
                count = 1;
            }
        }

        out.push(
            Record::new(chrom.clone(), span_start, span_end)
                .with_strand(strand)
                .with_values(vec![Value::Int(count)]),
        );
        Ok(())
    }
}

struct ClusterOp<'c> {
    config: &'c MergeConfig,
}

impl UnaryOp for ClusterOp<'_> {
    fn output_schema(&self, table: &IntervalTable) -> Result<Schema> {
        Ok(table
            .schema()
            .clone()
            .with_column("cluster_id", ColumnType::Int))
    }

    fn apply(&self, partition: &Partition<'_>, out: &mut Vec<Record>) -> Result<()> {
        let mut span_end = i64::MIN;
        let mut local_id: i64 = 0;

        for record in partition.iter() {
            if local_id == 0 || !should_merge(span_end, record.start, self.config.slack) {
                local_id += 1;
                span_end = record.end;
            } else {
                span_end = span_end.max(record.end);
            }
            let mut row = record.clone();
            row.values.push(Value::Int(local_id));
            out.push(row);
        }
        Ok(())
    }
}

/// Merge intervals whose gap is at most `slack` into spanning intervals.
/// Output rows carry a `count` column with the number of merged records.
pub fn merge(
    table: &IntervalTable,
    config: &MergeConfig,
    pool: &WorkerPool,
) -> Result<IntervalTable> {
    let by_strand = config.by_strand.unwrap_or(table.stranded());
    let op = MergeOp { config };
    apply_unary(&op, table, by_strand, by_strand, pool)
}

/// Like [`merge`], but keep every input row and append a `cluster_id`
/// column numbering merged groups sequentially (1-based) across the whole
/// output in canonical order.
pub fn cluster(
    table: &IntervalTable,
    config: &MergeConfig,
    pool: &WorkerPool,
) -> Result<IntervalTable> {
    let by_strand = config.by_strand.unwrap_or(table.stranded());
    let op = ClusterOp { config };
    let out = apply_unary(&op, table, by_strand, table.stranded(), pool)?;

    // Renumber partition-local ids into one global sequence. Rows arrive
    // grouped by partition with non-decreasing local ids, so a group
    // boundary is any change of key or local id.
    let (schema, mut records, stranded) = out.into_parts();
    let id_col = schema.len() - 1;
    let mut previous: Option<(String, Strand, i64)> = None;
    let mut global: i64 = 0;

    for record in &mut records {
        let local = match &record.values[id_col] {
            Value::Int(v) => *v,
            _ => unreachable!("cluster_id written as Int above"),
        };
        let group = (
            record.chrom.clone(),
            if by_strand { record.strand } else { Strand::Unstranded },
            local,
        );
        if previous.as_ref() != Some(&group) {
            global += 1;
            previous = Some(group);
        }
        record.values[id_col] = Value::Int(global);
    }

    IntervalTable::new(schema, records, stranded)
}
