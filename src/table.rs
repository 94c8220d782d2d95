//! Interval tables and chromosome/strand partitioning.
//!
//! Tables are immutable once constructed; all invariant checks happen in the
//! constructor and report the first offending row. Partitions are transient
//! views rebuilt per operation call.

use crate::error::{EngineError, Result};
use crate::record::{Record, Schema, Strand, Value};
use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::sync::OnceLock;

/// How table construction treats zero-length intervals (start == end).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZeroLengthPolicy {
    /// Reject the table with an `InvalidInterval` error.
    #[default]
    Reject,
    /// Rewrite to a 1 bp interval (end = start + 1).
    Normalize,
}

/// An ordered collection of records sharing one attribute schema.
///
/// `stranded` controls whether strand participates in partitioning and in
/// same/opposite pairing semantics.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalTable {
    schema: Schema,
    records: Vec<Record>,
    stranded: bool,
}

impl IntervalTable {
    /// Build a validated table. Zero-length intervals are rejected.
    pub fn new(schema: Schema, records: Vec<Record>, stranded: bool) -> Result<Self> {
        Self::with_policy(schema, records, stranded, ZeroLengthPolicy::Reject)
    }

    /// Build a validated table with an explicit zero-length policy.
    pub fn with_policy(
        schema: Schema,
        mut records: Vec<Record>,
        stranded: bool,
        policy: ZeroLengthPolicy,
    ) -> Result<Self> {
        for (row, record) in records.iter_mut().enumerate() {
            if record.start < 0 {
                return Err(invalid(row, record, "negative start coordinate"));
            }
            if record.start > record.end {
                return Err(invalid(row, record, "start beyond end"));
            }
            if record.start == record.end {
                match policy {
                    ZeroLengthPolicy::Reject => {
                        return Err(invalid(row, record, "zero-length interval"));
                    }
                    ZeroLengthPolicy::Normalize => record.end = record.start + 1,
                }
            }
            if record.values.len() != schema.len() {
                return Err(EngineError::SchemaMismatch(format!(
                    "row {} carries {} values but the schema has {} columns",
                    row,
                    record.values.len(),
                    schema.len()
                )));
            }
            for ((name, expected), value) in schema.iter().zip(record.values.iter()) {
                if let Some(ty) = value.column_type() {
                    if ty != expected {
                        return Err(EngineError::SchemaMismatch(format!(
                            "row {}, column '{}': expected {} but found {}",
                            row, name, expected, ty
                        )));
                    }
                }
            }
        }

        Ok(Self {
            schema,
            records,
            stranded,
        })
    }

    /// An empty table with the given schema.
    pub fn empty(schema: Schema, stranded: bool) -> Self {
        Self {
            schema,
            records: Vec::new(),
            stranded,
        }
    }

    #[inline]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    #[inline]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    #[inline]
    pub fn stranded(&self) -> bool {
        self.stranded
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// A copy of this table with every attribute column dropped.
    pub fn without_attributes(&self) -> IntervalTable {
        let records = self
            .records
            .iter()
            .map(|r| {
                let mut r = r.clone();
                r.values.clear();
                r
            })
            .collect();
        IntervalTable {
            schema: Schema::empty(),
            records,
            stranded: self.stranded,
        }
    }

    /// Decompose into schema, records, and strandedness flag.
    pub fn into_parts(self) -> (Schema, Vec<Record>, bool) {
        (self.schema, self.records, self.stranded)
    }

    /// Column values for one attribute column, by name.
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let pos = self.schema.position(name)?;
        Some(self.records.iter().map(|r| &r.values[pos]).collect())
    }

    /// Group rows by partition key, preserving input order within each group.
    /// Keys come out in canonical order (natural chromosome order, then
    /// strand). The sorted view of each partition is computed on demand.
    pub fn partition(&self, by_strand: bool) -> PartitionSet<'_> {
        let mut lookup: FxHashMap<PartitionKey, usize> = FxHashMap::default();
        let mut groups: Vec<(PartitionKey, PartitionGroup)> = Vec::new();

        for (row, record) in self.records.iter().enumerate() {
            let key = PartitionKey {
                chrom: record.chrom.clone(),
                strand: by_strand.then_some(record.strand),
            };
            match lookup.get(&key) {
                Some(&slot) => groups[slot].1.rows.push(row),
                None => {
                    lookup.insert(key.clone(), groups.len());
                    groups.push((key, PartitionGroup::single(row)));
                }
            }
        }

        groups.sort_by(|a, b| a.0.cmp(&b.0));
        let lookup = groups
            .iter()
            .enumerate()
            .map(|(slot, (key, _))| (key.clone(), slot))
            .collect();

        PartitionSet {
            table: self,
            groups,
            lookup,
        }
    }
}

fn invalid(row: usize, record: &Record, reason: &str) -> EngineError {
    EngineError::InvalidInterval {
        row,
        chrom: record.chrom.clone(),
        start: record.start,
        end: record.end,
        reason: reason.to_string(),
    }
}

/// Partition identity: chromosome, plus strand when partitioning is stranded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartitionKey {
    pub chrom: String,
    pub strand: Option<Strand>,
}

impl PartitionKey {
    /// The key this one pairs with under opposite-strand matching.
    pub fn opposite(&self) -> PartitionKey {
        PartitionKey {
            chrom: self.chrom.clone(),
            strand: self.strand.map(Strand::opposite),
        }
    }
}

impl Ord for PartitionKey {
    fn cmp(&self, other: &Self) -> Ordering {
        natural_cmp(&self.chrom, &other.chrom).then(self.strand.cmp(&other.strand))
    }
}

impl PartialOrd for PartitionKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Natural string ordering: digit runs compare numerically, so chr2 < chr10.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        if a[i].is_ascii_digit() && b[j].is_ascii_digit() {
            let ai = i + a[i..].iter().take_while(|c| c.is_ascii_digit()).count();
            let bj = j + b[j..].iter().take_while(|c| c.is_ascii_digit()).count();

            // Strip leading zeros, then compare by magnitude.
            let da = trim_zeros(&a[i..ai]);
            let db = trim_zeros(&b[j..bj]);
            let ord = da.len().cmp(&db.len()).then_with(|| da.cmp(db));
            if ord != Ordering::Equal {
                return ord;
            }
            i = ai;
            j = bj;
        } else {
            let ord = a[i].cmp(&b[j]);
            if ord != Ordering::Equal {
                return ord;
            }
            i += 1;
            j += 1;
        }
    }

    (a.len() - i).cmp(&(b.len() - j)).then_with(|| a.cmp(b))
}

fn trim_zeros(digits: &[u8]) -> &[u8] {
    let zeros = digits.iter().take_while(|&&c| c == b'0').count();
    if zeros == digits.len() {
        &digits[digits.len() - 1..]
    } else {
        &digits[zeros..]
    }
}

struct PartitionGroup {
    /// Row indices in input order.
    rows: Vec<usize>,
    /// Row indices sorted by (start, end, input order), computed once.
    sorted: OnceLock<Vec<usize>>,
}

impl PartitionGroup {
    fn single(row: usize) -> Self {
        Self {
            rows: vec![row],
            sorted: OnceLock::new(),
        }
    }
}

/// A table's rows grouped by partition key.
pub struct PartitionSet<'a> {
    table: &'a IntervalTable,
    groups: Vec<(PartitionKey, PartitionGroup)>,
    lookup: FxHashMap<PartitionKey, usize>,
}

impl<'a> PartitionSet<'a> {
    /// Keys in canonical order.
    pub fn keys(&self) -> impl Iterator<Item = &PartitionKey> {
        self.groups.iter().map(|(k, _)| k)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    #[inline]
    pub fn contains(&self, key: &PartitionKey) -> bool {
        self.lookup.contains_key(key)
    }

    /// The sorted partition for a key, if present and non-empty.
    pub fn get(&self, key: &PartitionKey) -> Option<Partition<'_>> {
        let &slot = self.lookup.get(key)?;
        Some(self.partition_at(slot))
    }

    /// The partition at canonical position `slot` (0..len).
    pub fn at(&self, slot: usize) -> Partition<'_> {
        self.partition_at(slot)
    }

    fn partition_at(&self, slot: usize) -> Partition<'_> {
        let (key, group) = &self.groups[slot];
        let rows = group.sorted.get_or_init(|| {
            let mut rows = group.rows.clone();
            let records = self.table.records();
            rows.sort_by(|&x, &y| records[x].cmp_coords(&records[y]).then(x.cmp(&y)));
            rows
        });
        Partition {
            key,
            table: self.table,
            rows,
        }
    }

    /// Iterate partitions in canonical key order.
    pub fn iter(&self) -> impl Iterator<Item = Partition<'_>> {
        (0..self.groups.len()).map(|slot| self.partition_at(slot))
    }
}

/// One partition's rows, sorted by (start, end, input order).
#[derive(Clone, Copy)]
pub struct Partition<'a> {
    pub key: &'a PartitionKey,
    table: &'a IntervalTable,
    rows: &'a [usize],
}

impl<'a> Partition<'a> {
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The record at sorted position `pos`.
    #[inline]
    pub fn record(&self, pos: usize) -> &'a Record {
        &self.table.records()[self.rows[pos]]
    }

    /// The original table row index behind sorted position `pos`.
    #[inline]
    pub fn table_row(&self, pos: usize) -> usize {
        self.rows[pos]
    }

    /// Records in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &'a Record> + 'a {
        let table = self.table;
        self.rows.iter().map(move |&r| &table.records()[r])
    }
}
