//! Window/tile: slice each interval into fixed-size consecutive pieces.

use crate::engine::{apply_unary, UnaryOp, WorkerPool};
use crate::error::{EngineError, Result};
use crate::record::{Record, Schema};
use crate::table::{IntervalTable, Partition};

/// Where window boundaries are anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    /// Windows start at each interval's own start.
    #[default]
    IntervalStart,
    /// Windows align to multiples of the window size from coordinate 0;
    /// the first and last pieces of an interval may be partial.
    Genome,
}

/// What happens to pieces shorter than the window size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PartialWindows {
    #[default]
    Keep,
    Drop,
}

/// Window configuration.
#[derive(Debug, Clone)]
pub struct WindowConfig {
    pub size: i64,
    pub anchor: Anchor,
    pub partial: PartialWindows,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            size: 50,
            anchor: Anchor::IntervalStart,
            partial: PartialWindows::Keep,
        }
    }
}

struct WindowOp<'c> {
    config: &'c WindowConfig,
}

impl WindowOp<'_> {
    fn emit(&self, record: &Record, start: i64, end: i64, out: &mut Vec<Record>) {
        if end - start < self.config.size && self.config.partial == PartialWindows::Drop {
            return;
        }
        out.push(
            Record::new(record.chrom.clone(), start, end)
                .with_strand(record.strand)
                .with_values(record.values.clone()),
        );
    }
}

impl UnaryOp for WindowOp<'_> {
    fn output_schema(&self, table: &IntervalTable) -> Result<Schema> {
        Ok(table.schema().clone())
    }

    fn apply(&self, partition: &Partition<'_>, out: &mut Vec<Record>) -> Result<()> {
        let size = self.config.size;

        for record in partition.iter() {
            match self.config.anchor {
                Anchor::IntervalStart => {
                    let mut pos = record.start;
                    while pos < record.end {
                        let end = (pos + size).min(record.end);
                        self.emit(record, pos, end, out);
                        pos = end;
                    }
                }
                Anchor::Genome => {
                    let mut boundary = record.start / size * size;
                    while boundary < record.end {
                        let start = record.start.max(boundary);
                        let end = record.end.min(boundary + size);
                        self.emit(record, start, end, out);
                        boundary += size;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Slice every interval into consecutive windows of `config.size` bases.
/// Attributes are copied onto every piece.
pub fn window(
    table: &IntervalTable,
    config: &WindowConfig,
    pool: &WorkerPool,
) -> Result<IntervalTable> {
    if config.size <= 0 {
        return Err(EngineError::Config(format!(
            "window size must be positive, got {}",
            config.size
        )));
    }
    let op = WindowOp { config };
    apply_unary(&op, table, false, table.stranded(), pool)
}
