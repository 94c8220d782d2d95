//! Run-length encoded coverage tracks.
//!
//! A track encodes per-position depth (or a per-position value sum) as
//! maximal runs anchored at coordinate 0: no zero-length runs, no equal
//! adjacent values. Tracks over the same partition share a coordinate
//! system, so arithmetic combination needs no offset bookkeeping.

use crate::engine::WorkerPool;
use crate::error::{EngineError, Result};
use crate::record::ColumnType;
use crate::table::{IntervalTable, PartitionKey};

/// One run: `length` consecutive positions holding `value`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Run {
    pub length: i64,
    pub value: f64,
}

/// A maximal run-length encoding of per-position values from coordinate 0.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CoverageTrack {
    runs: Vec<Run>,
}

impl CoverageTrack {
    /// Build a track from (length, value) pairs, dropping non-positive
    /// lengths and coalescing equal adjacent values.
    pub fn from_runs(runs: impl IntoIterator<Item = (i64, f64)>) -> Self {
        let mut out: Vec<Run> = Vec::new();
        for (length, value) in runs {
            if length <= 0 {
                continue;
            }
            match out.last_mut() {
                Some(last) if last.value == value => last.length += length,
                _ => out.push(Run { length, value }),
            }
        }
        Self { runs: out }
    }

    #[inline]
    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Total length covered by the encoding.
    pub fn span(&self) -> i64 {
        self.runs.iter().map(|r| r.length).sum()
    }

    /// The value at an absolute position; 0 outside the encoded span.
    pub fn value_at(&self, pos: i64) -> f64 {
        if pos < 0 {
            return 0.0;
        }
        let mut cursor = 0;
        for run in &self.runs {
            cursor += run.length;
            if pos < cursor {
                return run.value;
            }
        }
        0.0
    }

    /// Expand into (start, end, value) segments.
    pub fn segments(&self) -> Vec<(i64, i64, f64)> {
        let mut out = Vec::with_capacity(self.runs.len());
        let mut cursor = 0;
        for run in &self.runs {
            out.push((cursor, cursor + run.length, run.value));
            cursor += run.length;
        }
        out
    }

    /// Combine two tracks position-wise. Both are walked in lockstep over
    /// the merged breakpoints; the shorter track is zero-padded to the
    /// longer span, and the result is re-coalesced.
    pub fn combine(&self, other: &CoverageTrack, op: CombineOp) -> CoverageTrack {
        let (a, b) = (&self.runs, &other.runs);
        let (mut i, mut j) = (0usize, 0usize);
        let mut remaining_a = a.first().map(|r| r.length).unwrap_or(0);
        let mut remaining_b = b.first().map(|r| r.length).unwrap_or(0);
        let mut out = Vec::new();

        loop {
            let step = match (i < a.len(), j < b.len()) {
                (true, true) => remaining_a.min(remaining_b),
                (true, false) => remaining_a,
                (false, true) => remaining_b,
                (false, false) => break,
            };
            let va = if i < a.len() { a[i].value } else { 0.0 };
            let vb = if j < b.len() { b[j].value } else { 0.0 };
            out.push((step, op.apply(va, vb)));

            if i < a.len() {
                remaining_a -= step;
                if remaining_a == 0 {
                    i += 1;
                    remaining_a = a.get(i).map(|r| r.length).unwrap_or(0);
                }
            }
            if j < b.len() {
                remaining_b -= step;
                if remaining_b == 0 {
                    j += 1;
                    remaining_b = b.get(j).map(|r| r.length).unwrap_or(0);
                }
            }
        }

        CoverageTrack::from_runs(out)
    }
}

/// Position-wise arithmetic for [`CoverageTrack::combine`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CombineOp {
    Add,
    Subtract,
    Multiply,
    /// Division with an explicit result for zero denominators.
    Divide { zero_default: f64 },
}

impl CombineOp {
    #[inline]
    fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            CombineOp::Add => a + b,
            CombineOp::Subtract => a - b,
            CombineOp::Multiply => a * b,
            CombineOp::Divide { zero_default } => {
                if b == 0.0 {
                    zero_default
                } else {
                    a / b
                }
            }
        }
    }
}

/// Coverage configuration.
#[derive(Debug, Clone, Default)]
pub struct CoverageConfig {
    /// Weight each record by this numeric column instead of depth 1.
    pub value_column: Option<String>,
}

/// Compute one coverage track per partition, in canonical key order.
///
/// Each track sweeps the partition's intervals with a running counter,
/// starting a new run at every depth change. Reconstructed depth at any
/// position equals the number (or value sum) of records covering it.
pub fn coverage(
    table: &IntervalTable,
    config: &CoverageConfig,
    pool: &WorkerPool,
) -> Result<Vec<(PartitionKey, CoverageTrack)>> {
    let value_col = match &config.value_column {
        Some(name) => {
            let pos = table.schema().position(name).ok_or_else(|| {
                EngineError::SchemaMismatch(format!("no column '{name}' to weight coverage by"))
            })?;
            let (_, ty) = table.schema().column(pos).ok_or_else(|| {
                EngineError::SchemaMismatch(format!("no column '{name}' to weight coverage by"))
            })?;
            if !matches!(ty, ColumnType::Int | ColumnType::Float) {
                return Err(EngineError::SchemaMismatch(format!(
                    "coverage weight column '{name}' must be numeric, found {ty}"
                )));
            }
            Some(pos)
        }
        None => None,
    };

    let parts = table.partition(table.stranded());
    let keys: Vec<PartitionKey> = parts.keys().cloned().collect();

    let tracks = pool.run(parts.len(), |slot| {
        let partition = parts.at(slot);

        // Boundary events: +weight at starts, -weight at ends.
        let mut events: Vec<(i64, f64)> = Vec::with_capacity(partition.len() * 2);
        for record in partition.iter() {
            let weight = match value_col {
                Some(pos) => record.values[pos].as_float().unwrap_or(0.0),
                None => 1.0,
            };
            events.push((record.start, weight));
            events.push((record.end, -weight));
        }
        events.sort_unstable_by_key(|&(pos, _)| pos);

        let mut runs: Vec<(i64, f64)> = Vec::new();
        let mut depth = 0.0;
        let mut prev = 0i64;
        for (pos, delta) in events {
            if pos > prev {
                runs.push((pos - prev, depth));
                prev = pos;
            }
            depth += delta;
        }

        Ok(CoverageTrack::from_runs(runs))
    })?;

    Ok(keys.into_iter().zip(tracks).collect())
}
