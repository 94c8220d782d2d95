//! Parallel execution of partition-level operations.
//!
//! One operation call partitions its input table(s), dispatches independent
//! per-key work units to a worker pool, and concatenates the results in
//! canonical key order. Output is identical for any worker count because
//! collection is positional, never completion-ordered.

use crate::error::{EngineError, Result};
use crate::ops::StrandMode;
use crate::record::{Record, Schema};
use crate::table::{IntervalTable, Partition, PartitionKey};
use rayon::prelude::*;
use std::sync::OnceLock;

/// A fixed-size worker pool handle.
///
/// A pool with one worker executes on the caller thread and must produce
/// output identical to any parallel pool. The process-wide default is
/// lazily built on first use via [`WorkerPool::global`]; engine entry
/// points always take the pool explicitly.
pub struct WorkerPool {
    pool: Option<rayon::ThreadPool>,
    workers: usize,
}

impl WorkerPool {
    /// Build a pool with the given worker count. A count of 0 or 1 yields
    /// the sequential pool.
    pub fn new(workers: usize) -> Result<Self> {
        if workers <= 1 {
            return Ok(Self::sequential());
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("grange-worker-{i}"))
            .build()
            .map_err(|e| EngineError::Pool(e.to_string()))?;
        log::debug!("worker pool initialized with {workers} threads");
        Ok(Self {
            pool: Some(pool),
            workers,
        })
    }

    /// A pool that runs every unit on the caller thread.
    pub fn sequential() -> Self {
        Self {
            pool: None,
            workers: 1,
        }
    }

    /// The process-wide default pool, sized to available parallelism.
    /// Initialized once on first call; torn down at process exit.
    pub fn global() -> &'static WorkerPool {
        static GLOBAL: OnceLock<WorkerPool> = OnceLock::new();
        GLOBAL.get_or_init(|| {
            let workers = std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1);
            WorkerPool::new(workers).unwrap_or_else(|_| WorkerPool::sequential())
        })
    }

    #[inline]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `jobs` independent units, returning their results in unit order.
    /// The first failing unit's error is returned; sibling results are
    /// discarded.
    pub fn run<T, F>(&self, jobs: usize, job: F) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(usize) -> Result<T> + Sync,
    {
        match &self.pool {
            None => (0..jobs).map(job).collect(),
            Some(pool) => pool.install(|| (0..jobs).into_par_iter().map(&job).collect()),
        }
    }
}

/// How a binary operation treats an A partition whose key has no B-side
/// counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyRight {
    /// Contribute nothing (join, intersect, overlap filter).
    Skip,
    /// Copy the A partition through unchanged; requires the operation's
    /// output schema to equal A's schema (subtract).
    CopyLeft,
    /// Invoke the operation with no B partition so it can emit fill rows
    /// (nearest, count-overlaps).
    Fill,
}

/// A partition-level operation over one table.
pub trait UnaryOp: Sync {
    fn output_schema(&self, table: &IntervalTable) -> Result<Schema>;

    /// Produce output rows for one partition. Rows must come out in the
    /// operation's deterministic order.
    fn apply(&self, partition: &Partition<'_>, out: &mut Vec<Record>) -> Result<()>;
}

/// A partition-level operation over two tables, B side indexed.
pub trait BinaryOp: Sync {
    fn output_schema(&self, a: &IntervalTable, b: &IntervalTable) -> Result<Schema>;

    fn empty_right(&self) -> EmptyRight {
        EmptyRight::Skip
    }

    fn apply(
        &self,
        a: &Partition<'_>,
        b: Option<&Partition<'_>>,
        out: &mut Vec<Record>,
    ) -> Result<()>;
}

/// Execute a unary operation across a table's partitions.
///
/// `by_strand` controls partitioning; `stranded_out` the output table's
/// strandedness flag.
pub fn apply_unary(
    op: &impl UnaryOp,
    table: &IntervalTable,
    by_strand: bool,
    stranded_out: bool,
    pool: &WorkerPool,
) -> Result<IntervalTable> {
    let schema = op.output_schema(table)?;
    let parts = table.partition(by_strand);

    log::debug!(
        "dispatching {} partitions across {} workers",
        parts.len(),
        pool.workers()
    );

    let chunks = pool.run(parts.len(), |slot| {
        let partition = parts.at(slot);
        let mut out = Vec::new();
        op.apply(&partition, &mut out)?;
        Ok(out)
    })?;

    let records = chunks.into_iter().flatten().collect();
    IntervalTable::new(schema, records, stranded_out)
}

/// Execute a binary operation across paired partitions of two tables.
///
/// Pairing is by chromosome, plus strand when `mode` is `Same` or
/// `Opposite` (which require both tables stranded). Keys missing on the B
/// side are resolved per the operation's [`EmptyRight`] behavior before
/// any work unit is submitted.
pub fn apply_binary(
    op: &impl BinaryOp,
    a: &IntervalTable,
    b: &IntervalTable,
    mode: StrandMode,
    pool: &WorkerPool,
) -> Result<IntervalTable> {
    if mode != StrandMode::Ignore && !(a.stranded() && b.stranded()) {
        return Err(EngineError::StrandConfig(format!(
            "{:?} pairing requires both tables stranded (left: {}, right: {})",
            mode,
            a.stranded(),
            b.stranded()
        )));
    }

    let schema = op.output_schema(a, b)?;
    let by_strand = mode != StrandMode::Ignore;
    let a_parts = a.partition(by_strand);
    let b_parts = b.partition(by_strand);

    // Resolve each A key before dispatch: keys without a B counterpart are
    // pruned (or copied through) without building an index.
    enum Unit {
        Empty,
        Copy(usize),
        Run { a_slot: usize, b_key: Option<PartitionKey> },
    }

    let mut units = Vec::with_capacity(a_parts.len());
    let mut submitted = 0usize;
    for (slot, key) in a_parts.keys().enumerate() {
        let b_key = match mode {
            StrandMode::Opposite => key.opposite(),
            _ => key.clone(),
        };
        let unit = if b_parts.contains(&b_key) {
            submitted += 1;
            Unit::Run {
                a_slot: slot,
                b_key: Some(b_key),
            }
        } else {
            match op.empty_right() {
                EmptyRight::Skip => Unit::Empty,
                EmptyRight::CopyLeft => Unit::Copy(slot),
                EmptyRight::Fill => {
                    submitted += 1;
                    Unit::Run {
                        a_slot: slot,
                        b_key: None,
                    }
                }
            }
        };
        units.push(unit);
    }

    log::debug!(
        "dispatching {} of {} partition pairs across {} workers",
        submitted,
        a_parts.len(),
        pool.workers()
    );

    let chunks = pool.run(units.len(), |i| {
        let mut out = Vec::new();
        match &units[i] {
            Unit::Empty => {}
            Unit::Copy(slot) => out.extend(a_parts.at(*slot).iter().cloned()),
            Unit::Run { a_slot, b_key } => {
                let a_partition = a_parts.at(*a_slot);
                let b_partition = b_key.as_ref().and_then(|k| b_parts.get(k));
                op.apply(&a_partition, b_partition.as_ref(), &mut out)?;
            }
        }
        Ok(out)
    })?;

    let records = chunks.into_iter().flatten().collect();
    IntervalTable::new(schema, records, a.stranded())
}
