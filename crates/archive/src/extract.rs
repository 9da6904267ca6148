//! Cross-store extraction.
//!
//! Copies the requested codes, across every data group, out of the open
//! store set into one freshly created standalone store. The destination is
//! created up front whether or not anything copies. Per-code and per-table
//! problems are logged and tallied, never fatal.

use qdb_types::{Code, DataKind};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, error, info};

use crate::append::insert_all;
use crate::error::{Result, StoreError};
use crate::schema;
use crate::store::{MarketStore, StoreSet};

/// Tally of one extraction run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractResult {
    /// Valid codes we tried to copy.
    pub attempted: usize,
    /// Codes with at least one table copied.
    pub copied: usize,
    /// Raw code texts that failed to parse, in input order.
    pub invalid: Vec<String>,
    /// Per-table copy failures on otherwise valid codes.
    pub failures: usize,
}

/// Copy `codes` into a new store at `dest_path`.
///
/// Fails fast with [`StoreError::NoInputCodes`] on an empty list, before
/// touching the destination. The default title is the joined code list.
/// A code absent from a group is skipped silently; codes need not exist
/// in every group.
pub fn extract(
    stores: &StoreSet,
    codes: &[String],
    dest_path: &Path,
    title: Option<&str>,
) -> Result<ExtractResult> {
    if codes.is_empty() {
        return Err(StoreError::NoInputCodes);
    }
    let joined = codes.join(",");
    let title = title.unwrap_or(&joined);
    debug!("create extract store {}", dest_path.display());
    let dest = MarketStore::create(dest_path, title)?;

    let mut result = ExtractResult::default();
    for raw in codes {
        let code = match Code::parse(raw) {
            Ok(code) => code,
            Err(e) => {
                error!("{e}");
                result.invalid.push(raw.clone());
                continue;
            }
        };
        result.attempted += 1;
        let src = match stores.get(code.market()) {
            Ok(src) => src,
            Err(e) => {
                error!("cannot extract {code}: {e}");
                result.failures += 1;
                continue;
            }
        };
        let mut copied_any = false;
        for kind in DataKind::ALL {
            match copy_table(src, &dest, kind, &code) {
                Ok(true) => {
                    debug!("copied {}", schema::table_name(kind, &code));
                    copied_any = true;
                }
                Ok(false) => {}
                Err(e) => {
                    error!("copy of {} failed: {e}", schema::table_name(kind, &code));
                    result.failures += 1;
                }
            }
        }
        if copied_any {
            result.copied += 1;
        }
    }

    dest.close()?;
    info!(
        "{} out of {} codes extracted to {}",
        result.copied,
        result.attempted,
        dest_path.display()
    );
    Ok(result)
}

/// Copy one (kind, code) table. `Ok(false)` when the source has no such
/// table; an existing destination table of the same name is replaced.
fn copy_table(src: &MarketStore, dest: &MarketStore, kind: DataKind, code: &Code) -> Result<bool> {
    let Some(rows) = src.read_rows(kind, code)? else {
        return Ok(false);
    };
    let table = schema::table_name(kind, code);
    let tx = dest.conn().unchecked_transaction()?;
    tx.execute_batch(&format!(r#"DROP TABLE IF EXISTS "{table}""#))?;
    tx.execute_batch(&schema::table_ddl(kind, &table))?;
    insert_all(&tx, &table, &rows)?;
    tx.commit()?;
    Ok(true)
}
