//! Core record types for genomic interval tables.

use std::cmp::Ordering;
use std::fmt;

/// Strand orientation of a genomic interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Strand {
    Forward,
    Reverse,
    Unstranded,
}

impl Strand {
    pub fn from_char(c: char) -> Self {
        match c {
            '+' => Strand::Forward,
            '-' => Strand::Reverse,
            _ => Strand::Unstranded,
        }
    }

    /// The opposite orientation. Unstranded has no opposite and maps to itself.
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Strand::Forward => Strand::Reverse,
            Strand::Reverse => Strand::Forward,
            Strand::Unstranded => Strand::Unstranded,
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strand::Forward => write!(f, "+"),
            Strand::Reverse => write!(f, "-"),
            Strand::Unstranded => write!(f, "."),
        }
    }
}

/// Type tag for an attribute column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Int,
    Float,
    Text,
    Bool,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Int => write!(f, "int"),
            ColumnType::Float => write!(f, "float"),
            ColumnType::Text => write!(f, "text"),
            ColumnType::Bool => write!(f, "bool"),
        }
    }
}

/// A scalar attribute value. `Null` is permitted in any column.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    Null,
}

impl Value {
    /// The type tag this value satisfies, or `None` for `Null`.
    pub fn column_type(&self) -> Option<ColumnType> {
        match self {
            Value::Int(_) => Some(ColumnType::Int),
            Value::Float(_) => Some(ColumnType::Float),
            Value::Text(_) => Some(ColumnType::Text),
            Value::Bool(_) => Some(ColumnType::Bool),
            Value::Null => None,
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric view of the value; integers widen to f64.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Null => write!(f, "."),
        }
    }
}

/// A fixed, ordered list of attribute columns shared by every record in a
/// table. Column order is part of the schema identity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    columns: Vec<(String, ColumnType)>,
}

impl Schema {
    /// An attribute-free schema (coordinates only).
    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
        }
    }

    pub fn from_columns(columns: Vec<(String, ColumnType)>) -> Self {
        Self { columns }
    }

    /// Append a column, builder style.
    pub fn with_column(mut self, name: impl Into<String>, ty: ColumnType) -> Self {
        self.columns.push((name.into(), ty));
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Positional index of a column by name.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|(n, _)| n == name)
    }

    pub fn column(&self, index: usize) -> Option<(&str, ColumnType)> {
        self.columns.get(index).map(|(n, t)| (n.as_str(), *t))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ColumnType)> {
        self.columns.iter().map(|(n, t)| (n.as_str(), *t))
    }

    /// Concatenate `other`'s columns after this schema's, appending `suffix`
    /// to any incoming name that would collide with a column already present.
    pub fn concat_suffixed(&self, other: &Schema, suffix: &str) -> Schema {
        let mut columns = self.columns.clone();
        for (name, ty) in other.iter() {
            let mut name = name.to_string();
            while columns.iter().any(|(n, _)| n == &name) {
                name.push_str(suffix);
            }
            columns.push((name, ty));
        }
        Schema { columns }
    }
}

/// A genomic interval with typed attribute values.
/// Uses 0-based, half-open coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub chrom: String,
    pub start: i64,
    pub end: i64,
    pub strand: Strand,
    /// Attribute values, positionally aligned with the owning table's schema.
    pub values: Vec<Value>,
}

impl Record {
    /// Create an unstranded record with no attribute values.
    #[inline]
    pub fn new(chrom: impl Into<String>, start: i64, end: i64) -> Self {
        Self {
            chrom: chrom.into(),
            start,
            end,
            strand: Strand::Unstranded,
            values: Vec::new(),
        }
    }

    pub fn with_strand(mut self, strand: Strand) -> Self {
        self.strand = strand;
        self
    }

    pub fn with_values(mut self, values: Vec<Value>) -> Self {
        self.values = values;
        self
    }

    /// Interval length in bases.
    #[inline]
    pub fn len(&self) -> i64 {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Check if this interval overlaps another on the same chromosome.
    #[inline]
    pub fn overlaps(&self, other: &Record) -> bool {
        self.chrom == other.chrom && self.start < other.end && other.start < self.end
    }

    /// The shared span `[max(starts), min(ends))`, if any.
    pub fn overlap_span(&self, other: &Record) -> Option<(i64, i64)> {
        if !self.overlaps(other) {
            return None;
        }
        Some((self.start.max(other.start), self.end.min(other.end)))
    }

    /// Number of shared bases with another interval.
    #[inline]
    pub fn overlap_length(&self, other: &Record) -> i64 {
        match self.overlap_span(other) {
            Some((s, e)) => e - s,
            None => 0,
        }
    }

    /// Minimal gap to another interval on the same chromosome.
    /// Returns 0 when overlapping, `None` across chromosomes.
    pub fn distance_to(&self, other: &Record) -> Option<i64> {
        if self.chrom != other.chrom {
            return None;
        }
        if self.start < other.end && other.start < self.end {
            return Some(0);
        }
        if self.end <= other.start {
            Some(other.start - self.end)
        } else {
            Some(self.start - other.end)
        }
    }

    /// Coordinate comparison: (start, end) ascending. Chromosome and strand
    /// are partition-level concerns and do not participate.
    #[inline]
    pub fn cmp_coords(&self, other: &Record) -> Ordering {
        self.start
            .cmp(&other.start)
            .then(self.end.cmp(&other.end))
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}\t{}", self.chrom, self.start, self.end, self.strand)?;
        for value in &self.values {
            write!(f, "\t{}", value)?;
        }
        Ok(())
    }
}
