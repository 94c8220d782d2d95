//! Error taxonomy shared across table construction and interval operations.

use thiserror::Error;

/// Errors raised by table validation, operation configuration, and the
/// parallel apply engine. Empty inputs are never errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("invalid interval at row {row}: {chrom}:{start}-{end} ({reason})")]
    InvalidInterval {
        row: usize,
        chrom: String,
        start: i64,
        end: i64,
        reason: String,
    },

    #[error("strand configuration error: {0}")]
    StrandConfig(String),

    #[error("worker pool error: {0}")]
    Pool(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
