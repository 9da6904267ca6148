use crate::rows::{DataKind, RowBatch};
use std::path::Path;

/// One (code, rows) unit yielded by a feed source. The code is raw vendor
/// text; the append engine validates and normalizes it.
#[derive(Clone, Debug, PartialEq)]
pub struct CodeBatch {
    pub code: String,
    pub rows: RowBatch,
}

/// Turns a vendor file into a lazy sequence of per-code row batches.
///
/// `open` returns `None` when the source file cannot be read; callers log the
/// unit and move on. Dropping the returned iterator releases the underlying
/// file handle.
pub trait FeedSource {
    type Batches: Iterator<Item = CodeBatch>;

    fn open(&self, path: &Path, kind: DataKind) -> Option<Self::Batches>;
}
