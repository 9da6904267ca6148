use std::path::PathBuf;

use qdb_types::{CodeError, DataKind};

pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors raised by the archive layer.
///
/// Per-code problems inside a batch (an unknown code prefix, a stale
/// payload) are tallied and logged instead of aborting the batch, so
/// they never surface here. Anything that makes the store itself
/// unusable does.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store file missing: {}", .path.display())]
    StoreUnavailable { path: PathBuf },

    #[error(transparent)]
    InvalidCode(#[from] CodeError),

    #[error("no {kind} table recorded for {code}")]
    CodeNotFound { code: String, kind: DataKind },

    #[error("no codes given to extract")]
    NoInputCodes,

    #[error("row payload does not match the {kind} schema")]
    SchemaMismatch { kind: DataKind },

    #[error("timestamp {0} is outside the representable date range")]
    InvalidTimestamp(i64),

    #[error("meta row {scope} holds an unreadable value {value:?}")]
    CorruptMeta { scope: String, value: String },

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
