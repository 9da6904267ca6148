//! Table layout for a market store.
//!
//! One SQLite file per market. Every code gets its own rowid table per
//! data kind, named `GROUP_CODE` (e.g. `DAILY_SH600000`), so a bulk
//! sort or an extract can move whole tables without touching the rest
//! of the file. The `meta` table carries one bookkeeping row per scope.

use qdb_types::{Code, DataKind};

/// Applied on every open. All statements are idempotent.
pub const STORE_SCHEMA: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;
PRAGMA temp_store = MEMORY;

CREATE TABLE IF NOT EXISTS meta (
    scope       TEXT PRIMARY KEY,
    title       TEXT NOT NULL DEFAULT '',
    last_update TEXT NOT NULL DEFAULT ''
) WITHOUT ROWID;
"#;

/// Meta scope for the store as a whole.
pub const ROOT_SCOPE: &str = "ROOT";

pub fn group(kind: DataKind) -> &'static str {
    match kind {
        DataKind::Daily => "DAILY",
        DataKind::Min5 => "MIN5",
        DataKind::Splits => "SPLITS",
    }
}

pub fn group_title(kind: DataKind) -> &'static str {
    match kind {
        DataKind::Daily => "daily quote",
        DataKind::Min5 => "5-minute quote",
        DataKind::Splits => "splits & dividends",
    }
}

/// Row-count hint used to size read buffers.
pub fn expected_rows(kind: DataKind) -> usize {
    match kind {
        DataKind::Daily => 10_000,
        DataKind::Min5 => 10_000,
        DataKind::Splits => 200,
    }
}

/// Code text is validated to ASCII alphanumerics at parse time, so the
/// composed name is always safe to splice into SQL.
pub fn table_name(kind: DataKind, code: &Code) -> String {
    format!("{}_{}", group(kind), code.as_str())
}

/// Recovers the data kind from a stored table name.
pub fn kind_of_table(name: &str) -> Option<DataKind> {
    DataKind::ALL
        .into_iter()
        .find(|kind| name.strip_prefix(group(*kind)).is_some_and(|rest| rest.starts_with('_')))
}

/// Column list of a kind's row schema, in stored order.
pub fn column_list(kind: DataKind) -> &'static str {
    match kind {
        DataKind::Daily | DataKind::Min5 => "time, open, high, low, close, volume, sum",
        DataKind::Splits => "time, stock_dividend, stock_split, split_price, cash_dividend",
    }
}

/// DDL for a per-code table. Plain rowid tables: rowid keeps insertion
/// order, which the sort pass relies on as a stable tiebreak.
pub fn table_ddl(kind: DataKind, table: &str) -> String {
    match kind {
        DataKind::Daily | DataKind::Min5 => format!(
            r#"
CREATE TABLE "{table}" (
    time   INTEGER NOT NULL,
    open   REAL    NOT NULL,
    high   REAL    NOT NULL,
    low    REAL    NOT NULL,
    close  REAL    NOT NULL,
    volume INTEGER NOT NULL,
    sum    REAL    NOT NULL
)"#
        ),
        DataKind::Splits => format!(
            r#"
CREATE TABLE "{table}" (
    time           INTEGER NOT NULL,
    stock_dividend REAL    NOT NULL,
    stock_split    REAL    NOT NULL,
    split_price    REAL    NOT NULL,
    cash_dividend  REAL    NOT NULL
)"#
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qdb_types::Code;

    #[test]
    fn table_names_compose_group_and_code() {
        let code = Code::parse("sh600000").unwrap();
        assert_eq!(table_name(DataKind::Daily, &code), "DAILY_SH600000");
        assert_eq!(table_name(DataKind::Min5, &code), "MIN5_SH600000");
        assert_eq!(table_name(DataKind::Splits, &code), "SPLITS_SH600000");
    }

    #[test]
    fn kind_recovery_requires_separator() {
        assert_eq!(kind_of_table("DAILY_SH600000"), Some(DataKind::Daily));
        assert_eq!(kind_of_table("MIN5_SZ000001"), Some(DataKind::Min5));
        assert_eq!(kind_of_table("SPLITS_SH600000"), Some(DataKind::Splits));
        assert_eq!(kind_of_table("DAILYSH600000"), None);
        assert_eq!(kind_of_table("meta"), None);
    }
}
