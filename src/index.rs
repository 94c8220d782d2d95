//! Per-partition interval index for overlap and nearest queries.
//!
//! Built once per partition per operation over rows already sorted by
//! (start, end, input order). The start-sorted array is treated as an
//! implicit balanced search tree; every node carries the maximum end within
//! its subtree, so an overlap query prunes any subtree that ends at or
//! before the query start. Build is O(n), each overlap query O(log n + k).

use crate::table::Partition;

/// Which side of the query interval nearest candidates may come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Entirely before the query (candidate end <= query start).
    Upstream,
    /// Entirely after the query (candidate start >= query end).
    Downstream,
    /// Either side; overlapping candidates qualify at distance 0.
    #[default]
    Any,
}

/// A search structure over one sorted partition.
///
/// Query results are positions into the sorted partition; callers map them
/// back to records (and original row order) through [`Partition`].
pub struct IntervalIndex {
    starts: Vec<i64>,
    ends: Vec<i64>,
    /// Max end within the implicit subtree rooted at each position.
    max_ends: Vec<i64>,
    /// Positions ordered by (end, start, position), for upstream scans.
    by_end: Vec<usize>,
}

impl IntervalIndex {
    /// Build an index over a partition's sorted rows.
    pub fn build(partition: &Partition<'_>) -> Self {
        let n = partition.len();
        let mut starts = Vec::with_capacity(n);
        let mut ends = Vec::with_capacity(n);
        for record in partition.iter() {
            starts.push(record.start);
            ends.push(record.end);
        }

        let mut max_ends = vec![i64::MIN; n];
        fill_max_ends(&ends, &mut max_ends, 0, n);

        let mut by_end: Vec<usize> = (0..n).collect();
        by_end.sort_unstable_by_key(|&p| (ends[p], starts[p], p));

        Self {
            starts,
            ends,
            max_ends,
            by_end,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.starts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    /// All positions overlapping `[qs, qe)`, ascending.
    pub fn query_overlaps(&self, qs: i64, qe: i64) -> Vec<usize> {
        let mut hits = Vec::new();
        self.collect_overlaps(0, self.len(), qs, qe, &mut hits);
        hits
    }

    /// Number of positions overlapping `[qs, qe)`.
    pub fn count_overlaps(&self, qs: i64, qe: i64) -> usize {
        self.query_overlaps(qs, qe).len()
    }

    /// Whether any position overlaps `[qs, qe)`.
    pub fn has_overlap(&self, qs: i64, qe: i64) -> bool {
        self.probe_overlap(0, self.len(), qs, qe)
    }

    fn collect_overlaps(&self, lo: usize, hi: usize, qs: i64, qe: i64, hits: &mut Vec<usize>) {
        if lo >= hi {
            return;
        }
        let mid = lo + (hi - lo) / 2;
        // Nothing in this subtree reaches past the query start.
        if self.max_ends[mid] <= qs {
            return;
        }
        self.collect_overlaps(lo, mid, qs, qe, hits);
        if self.starts[mid] < qe {
            if self.ends[mid] > qs {
                hits.push(mid);
            }
            self.collect_overlaps(mid + 1, hi, qs, qe, hits);
        }
    }

    fn probe_overlap(&self, lo: usize, hi: usize, qs: i64, qe: i64) -> bool {
        if lo >= hi {
            return false;
        }
        let mid = lo + (hi - lo) / 2;
        if self.max_ends[mid] <= qs {
            return false;
        }
        if self.probe_overlap(lo, mid, qs, qe) {
            return true;
        }
        if self.starts[mid] < qe {
            if self.ends[mid] > qs {
                return true;
            }
            return self.probe_overlap(mid + 1, hi, qs, qe);
        }
        false
    }

    /// Nearest positions to `[qs, qe)` with their minimal-gap distances
    /// (0 for overlaps, which qualify only under `Direction::Any`).
    ///
    /// Candidates are ordered by (distance, start, end, position); the
    /// result holds the first `k` plus every further candidate tied with
    /// the k-th distance, so callers can resolve ties by policy.
    pub fn query_nearest(
        &self,
        qs: i64,
        qe: i64,
        direction: Direction,
        k: usize,
    ) -> Vec<(usize, i64)> {
        if k == 0 || self.is_empty() {
            return Vec::new();
        }

        let mut candidates: Vec<(usize, i64)> = Vec::new();

        if matches!(direction, Direction::Downstream | Direction::Any) {
            self.gather_downstream(qe, k, &mut candidates);
        }
        if matches!(direction, Direction::Upstream | Direction::Any) {
            self.gather_upstream(qs, k, &mut candidates);
        }
        if matches!(direction, Direction::Any) {
            for pos in self.query_overlaps(qs, qe) {
                candidates.push((pos, 0));
            }
        }

        candidates.sort_unstable_by_key(|&(pos, d)| (d, self.starts[pos], self.ends[pos], pos));
        truncate_with_ties(&mut candidates, k);
        candidates
    }

    /// Downstream candidates: ascending start from the first position at or
    /// past the query end. Distances are non-decreasing along the scan, so
    /// collection stops once k are held and the tie run is exhausted.
    fn gather_downstream(&self, qe: i64, k: usize, out: &mut Vec<(usize, i64)>) {
        let first = self.starts.partition_point(|&s| s < qe);
        let mut taken = 0usize;
        let mut tie_distance = None;

        for pos in first..self.len() {
            let d = self.starts[pos] - qe;
            if taken < k {
                out.push((pos, d));
                taken += 1;
                tie_distance = Some(d);
            } else if Some(d) == tie_distance {
                out.push((pos, d));
            } else {
                break;
            }
        }
    }

    /// Upstream candidates: descending end over the by-end order, starting
    /// from the last position ending at or before the query start.
    fn gather_upstream(&self, qs: i64, k: usize, out: &mut Vec<(usize, i64)>) {
        let cutoff = self.by_end.partition_point(|&p| self.ends[p] <= qs);
        let mut taken = 0usize;
        let mut tie_distance = None;

        for rank in (0..cutoff).rev() {
            let pos = self.by_end[rank];
            let d = qs - self.ends[pos];
            if taken < k {
                out.push((pos, d));
                taken += 1;
                tie_distance = Some(d);
            } else if Some(d) == tie_distance {
                out.push((pos, d));
            } else {
                break;
            }
        }
    }
}

fn fill_max_ends(ends: &[i64], max_ends: &mut [i64], lo: usize, hi: usize) -> i64 {
    if lo >= hi {
        return i64::MIN;
    }
    let mid = lo + (hi - lo) / 2;
    let left = fill_max_ends(ends, max_ends, lo, mid);
    let right = fill_max_ends(ends, max_ends, mid + 1, hi);
    let m = ends[mid].max(left).max(right);
    max_ends[mid] = m;
    m
}

/// Keep the first `k` entries plus any further entries whose distance ties
/// the k-th. Assumes canonical candidate order.
fn truncate_with_ties(candidates: &mut Vec<(usize, i64)>, k: usize) {
    if candidates.len() <= k {
        return;
    }
    let kth = candidates[k - 1].1;
    let cut = candidates[k..]
        .iter()
        .take_while(|&&(_, d)| d == kth)
        .count();
    candidates.truncate(k + cut);
}
