//! Interval algebra operations.
//!
//! Each operation pairs a configuration struct with a partition-level
//! implementation of [`crate::engine::UnaryOp`] or [`crate::engine::BinaryOp`]
//! and a top-level entry function that runs it through the apply engine.

pub mod intersect;
pub mod join;
pub mod merge;
pub mod nearest;
pub mod overlap;
pub mod subtract;
pub mod union;
pub mod window;

pub use intersect::{intersect, set_intersect, IntersectConfig};
pub use join::{join, JoinConfig};
pub use merge::{cluster, merge, MergeConfig};
pub use nearest::{nearest, NearestConfig};
pub use overlap::{count_overlaps, filter_overlaps, CountConfig, OverlapConfig};
pub use subtract::{subtract, SubtractConfig};
pub use union::{concat, union, UnionConfig};
pub use window::{window, Anchor, PartialWindows, WindowConfig};

/// How strand participates in partition pairing for binary operations.
///
/// `Same` and `Opposite` require both tables stranded and are rejected
/// before any partition work otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrandMode {
    Same,
    Opposite,
    #[default]
    Ignore,
}

/// Tie resolution for single-result queries over equally-distant candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TiePolicy {
    /// Keep the first candidate(s) in (distance, start, end, input) order.
    #[default]
    First,
    /// Keep the last candidate(s) of each equal-distance group.
    Last,
    /// Keep every candidate tied with the k-th distance.
    All,
}
