//! grange: a genomic interval algebra engine.
//!
//! This library stores large collections of genomic intervals in typed,
//! immutable tables and answers set-algebraic and proximity queries over
//! them with fully deterministic output ordering.
//!
//! # Features
//!
//! - **Partitioned execution**: operations fan out per chromosome (and
//!   strand) across a Rayon worker pool and merge in canonical key order,
//!   so results are identical for any worker count
//! - **Indexed search**: overlap and nearest queries run against a
//!   max-end-augmented interval index built per partition
//! - **Exact tie-breaks**: nearest-neighbor ties resolve by (distance,
//!   start, end, input order), reproducibly
//!
//! # Example
//!
//! ```rust
//! use grange::prelude::*;
//!
//! let a = IntervalTable::new(
//!     Schema::empty(),
//!     vec![Record::new("chr1", 1, 10)],
//!     false,
//! )
//! .unwrap();
//! let b = IntervalTable::new(
//!     Schema::empty(),
//!     vec![Record::new("chr1", 5, 15), Record::new("chr1", 20, 30)],
//!     false,
//! )
//! .unwrap();
//!
//! let pairs = join(&a, &b, &JoinConfig::default(), WorkerPool::global()).unwrap();
//! assert_eq!(pairs.len(), 1);
//! ```

pub mod coverage;
pub mod engine;
pub mod error;
pub mod index;
pub mod ops;
pub mod record;
pub mod table;

// Re-export commonly used types
pub use coverage::{coverage, CombineOp, CoverageConfig, CoverageTrack};
pub use engine::WorkerPool;
pub use error::{EngineError, Result};
pub use index::{Direction, IntervalIndex};
pub use record::{ColumnType, Record, Schema, Strand, Value};
pub use table::{IntervalTable, PartitionKey, ZeroLengthPolicy};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::coverage::{coverage, CombineOp, CoverageConfig, CoverageTrack};
    pub use crate::engine::WorkerPool;
    pub use crate::index::Direction;
    pub use crate::ops::{
        cluster, concat, count_overlaps, filter_overlaps, intersect, join, merge, nearest,
        set_intersect, subtract, union, window,
    };
    pub use crate::ops::{
        Anchor, CountConfig, IntersectConfig, JoinConfig, MergeConfig, NearestConfig,
        OverlapConfig, PartialWindows, StrandMode, SubtractConfig, TiePolicy, UnionConfig,
        WindowConfig,
    };
    pub use crate::record::{ColumnType, Record, Schema, Strand, Value};
    pub use crate::table::{IntervalTable, ZeroLengthPolicy};
}
