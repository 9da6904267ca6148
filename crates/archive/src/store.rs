//! Store handles.
//!
//! * [`MarketStore`] wraps one market's SQLite file.
//! * [`StoreSet`] opens the whole directory (one file per market) and routes
//!   by instrument code.
//!
//! Watermarks live in the `meta` table as `YYYYMMDD` text, one row per
//! scope (`ROOT` plus one per data group). An empty value means the scope
//! has never been updated.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveTime};
use qdb_types::{Code, DataKind, Market, MarketMap, QuoteRow, RowBatch, SplitRow};
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use tracing::{debug, error};

use crate::error::{Result, StoreError};
use crate::schema;

/// Wire format of meta dates.
pub const DATE_FMT: &str = "%Y%m%d";

// ---- date conversions ----

/// Midnight UTC of `day` as epoch seconds. Used as the staleness cutoff, so
/// any intraday timestamp on the watermark day itself survives the filter.
#[inline]
pub fn day_to_epoch(day: NaiveDate) -> i64 {
    day.and_time(NaiveTime::MIN).and_utc().timestamp()
}

/// UTC calendar day of an epoch-seconds timestamp.
#[inline]
pub fn epoch_to_day(secs: i64) -> Result<NaiveDate> {
    DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.date_naive())
        .ok_or(StoreError::InvalidTimestamp(secs))
}

pub fn format_day(day: NaiveDate) -> String {
    day.format(DATE_FMT).to_string()
}

fn parse_day(scope: &str, value: &str) -> Result<Option<NaiveDate>> {
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, DATE_FMT)
        .map(Some)
        .map_err(|_| StoreError::CorruptMeta {
            scope: scope.to_string(),
            value: value.to_string(),
        })
}

fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let hit: Option<String> = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [name],
            |row| row.get(0),
        )
        .optional()?;
    Ok(hit.is_some())
}

fn seed_meta(conn: &Connection, root_title: &str) -> Result<()> {
    let mut stmt =
        conn.prepare("INSERT OR IGNORE INTO meta (scope, title, last_update) VALUES (?1, ?2, '')")?;
    stmt.execute(params![schema::ROOT_SCOPE, root_title])?;
    for kind in DataKind::ALL {
        stmt.execute(params![schema::group(kind), schema::group_title(kind)])?;
    }
    Ok(())
}

/// Handle on one market's store file.
pub struct MarketStore {
    path: PathBuf,
    conn: Connection,
}

impl MarketStore {
    /// Create a fresh store at `path`, replacing any existing file.
    pub fn create(path: &Path, title: &str) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        if path.exists() {
            fs::remove_file(path)?;
        }
        // a stale WAL sidecar would be replayed into the fresh file
        for suffix in ["-wal", "-shm"] {
            let mut sidecar = path.as_os_str().to_os_string();
            sidecar.push(suffix);
            let sidecar = PathBuf::from(sidecar);
            if sidecar.exists() {
                fs::remove_file(sidecar)?;
            }
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.execute_batch(schema::STORE_SCHEMA)?;
        seed_meta(&conn, title)?;
        debug!("created store {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            conn,
        })
    }

    /// Open an existing store. The file must already be there; schema
    /// statements are idempotent and bring older files up to date.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(StoreError::StoreUnavailable {
                path: path.to_path_buf(),
            });
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.execute_batch(schema::STORE_SCHEMA)?;
        seed_meta(&conn, "")?;
        Ok(Self {
            path: path.to_path_buf(),
            conn,
        })
    }

    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| StoreError::Sqlite(e))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    // ---- watermarks ----

    /// Raw `last_update` text for a meta scope, empty when never set.
    pub fn last_update_text(&self, scope: &str) -> Result<String> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT last_update FROM meta WHERE scope = ?1",
                [scope],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.unwrap_or_default())
    }

    fn watermark(&self, scope: &str) -> Result<Option<NaiveDate>> {
        parse_day(scope, &self.last_update_text(scope)?)
    }

    pub fn root_watermark(&self) -> Result<Option<NaiveDate>> {
        self.watermark(schema::ROOT_SCOPE)
    }

    pub fn group_watermark(&self, kind: DataKind) -> Result<Option<NaiveDate>> {
        self.watermark(schema::group(kind))
    }

    /// Move a scope's watermark forward to `day`. Never moves it backwards;
    /// setting it to the same day again is allowed.
    pub(crate) fn advance_watermark(&self, scope: &str, day: NaiveDate) -> Result<bool> {
        if let Some(current) = self.watermark(scope)? {
            if day < current {
                debug!("{scope} watermark {current} already past {day}, keeping it");
                return Ok(false);
            }
        }
        self.conn.execute(
            "UPDATE meta SET last_update = ?1 WHERE scope = ?2",
            params![format_day(day), scope],
        )?;
        Ok(true)
    }

    // ---- tables ----

    pub fn has_table(&self, name: &str) -> Result<bool> {
        table_exists(&self.conn, name)
    }

    pub fn table_row_count(&self, name: &str) -> Result<u64> {
        let count =
            self.conn
                .query_row(&format!(r#"SELECT count(*) FROM "{name}""#), [], |row| {
                    row.get(0)
                })?;
        Ok(count)
    }

    /// All per-code data tables, sorted by name.
    pub fn table_names(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            r#"
SELECT name FROM sqlite_master
WHERE type = 'table' AND (
       name LIKE 'DAILY\_%'  ESCAPE '\'
    OR name LIKE 'MIN5\_%'   ESCAPE '\'
    OR name LIKE 'SPLITS\_%' ESCAPE '\')
ORDER BY name
"#,
        )?;
        let mapped = stmt.query_map([], |row| row.get(0))?;
        let mut names = Vec::new();
        for name in mapped {
            names.push(name?);
        }
        Ok(names)
    }

    /// Read every row of one code's table in stored order. `None` when the
    /// code has no table of this kind.
    pub fn read_rows(&self, kind: DataKind, code: &Code) -> Result<Option<RowBatch>> {
        let table = schema::table_name(kind, code);
        if !table_exists(&self.conn, &table)? {
            debug!("{code} has no {kind} table in {}", self.path.display());
            return Ok(None);
        }
        let batch = match kind {
            DataKind::Daily | DataKind::Min5 => {
                let sql = format!(
                    r#"SELECT {} FROM "{table}" ORDER BY rowid"#,
                    schema::column_list(kind)
                );
                let mut stmt = self.conn.prepare(&sql)?;
                let mut rows = Vec::with_capacity(schema::expected_rows(kind));
                let mapped = stmt.query_map([], |row| {
                    Ok(QuoteRow {
                        time: row.get(0)?,
                        open: row.get(1)?,
                        high: row.get(2)?,
                        low: row.get(3)?,
                        close: row.get(4)?,
                        volume: row.get(5)?,
                        sum: row.get(6)?,
                    })
                })?;
                for row in mapped {
                    rows.push(row?);
                }
                RowBatch::Quote(rows)
            }
            DataKind::Splits => {
                let sql = format!(
                    r#"SELECT {} FROM "{table}" ORDER BY rowid"#,
                    schema::column_list(kind)
                );
                let mut stmt = self.conn.prepare(&sql)?;
                let mut rows = Vec::with_capacity(schema::expected_rows(kind));
                let mapped = stmt.query_map([], |row| {
                    Ok(SplitRow {
                        time: row.get(0)?,
                        stock_dividend: row.get(1)?,
                        stock_split: row.get(2)?,
                        split_price: row.get(3)?,
                        cash_dividend: row.get(4)?,
                    })
                })?;
                for row in mapped {
                    rows.push(row?);
                }
                RowBatch::Split(rows)
            }
        };
        Ok(Some(batch))
    }
}

impl std::fmt::Debug for MarketStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// All market stores under one directory.
#[derive(Debug)]
pub struct StoreSet {
    dir: PathBuf,
    stores: MarketMap<MarketStore>,
}

impl StoreSet {
    /// Open every market store found under `dir`. A missing store file is
    /// logged and skipped; whatever needs it later gets `StoreUnavailable`.
    pub fn open(dir: &Path) -> Result<Self> {
        let mut stores = MarketMap::new();
        for market in Market::ALL {
            let path = dir.join(market.store_file());
            match MarketStore::open(&path) {
                Ok(store) => {
                    stores.insert(market, store);
                }
                Err(StoreError::StoreUnavailable { path }) => {
                    error!("{market} store file missing: {}", path.display());
                }
                Err(e) => return Err(e),
            }
        }
        Ok(Self {
            dir: dir.to_path_buf(),
            stores,
        })
    }

    /// Create a fresh store file for every market, replacing existing ones.
    pub fn init(dir: &Path) -> Result<Self> {
        let mut stores = MarketMap::new();
        for market in Market::ALL {
            let path = dir.join(market.store_file());
            let store = MarketStore::create(&path, &format!("{market} quote archive"))?;
            stores.insert(market, store);
        }
        Ok(Self {
            dir: dir.to_path_buf(),
            stores,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn contains(&self, market: Market) -> bool {
        self.stores.contains(market)
    }

    pub fn get(&self, market: Market) -> Result<&MarketStore> {
        self.stores
            .get(market)
            .ok_or_else(|| StoreError::StoreUnavailable {
                path: self.dir.join(market.store_file()),
            })
    }

    /// Present stores in the fixed market order.
    pub fn iter(&self) -> impl Iterator<Item = (Market, &MarketStore)> {
        self.stores.iter()
    }

    pub fn close(mut self) -> Result<()> {
        for market in Market::ALL {
            if let Some(store) = self.stores.remove(market) {
                store.close()?;
            }
        }
        Ok(())
    }

    /// Parse `code`, route to its market's store and read the table.
    pub fn read_rows(&self, kind: DataKind, code: &str) -> Result<Option<RowBatch>> {
        let code = Code::parse(code)?;
        self.get(code.market())?.read_rows(kind, &code)
    }

    /// Human-readable last-update summary, one block per open store.
    pub fn last_update_report(&self) -> Result<String> {
        let scopes = [
            schema::ROOT_SCOPE,
            schema::group(DataKind::Daily),
            schema::group(DataKind::Min5),
            schema::group(DataKind::Splits),
        ];
        let mut out = String::new();
        for (_, store) in self.iter() {
            out.push_str(&format!(
                "last update date of {}:\n",
                store.path().display()
            ));
            for scope in scopes {
                let value = store.last_update_text(scope)?;
                let shown = if value.is_empty() { "never" } else { value.as_str() };
                out.push_str(&format!("  {scope:<7}: {shown}\n"));
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn day_epoch_round_trip() {
        let day = d(2024, 3, 15);
        let epoch = day_to_epoch(day);
        assert_eq!(epoch, 1_710_460_800);
        assert_eq!(epoch_to_day(epoch).unwrap(), day);
        // intraday timestamps map back to the same day
        assert_eq!(epoch_to_day(epoch + 9 * 3600).unwrap(), day);
    }

    #[test]
    fn meta_date_round_trip() {
        let day = d(2024, 1, 2);
        assert_eq!(format_day(day), "20240102");
        assert_eq!(parse_day("ROOT", "20240102").unwrap(), Some(day));
        assert_eq!(parse_day("ROOT", "").unwrap(), None);
        assert!(matches!(
            parse_day("ROOT", "2024-01-02"),
            Err(StoreError::CorruptMeta { .. })
        ));
    }

    #[test]
    fn create_seeds_meta_scopes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data_sh.db");
        let store = MarketStore::create(&path, "SH quote archive").unwrap();
        assert_eq!(store.root_watermark().unwrap(), None);
        for kind in DataKind::ALL {
            assert_eq!(store.group_watermark(kind).unwrap(), None);
        }
        store.close().unwrap();

        // reopen keeps the seeded rows and stays empty-watermarked
        let store = MarketStore::open(&path).unwrap();
        assert_eq!(store.root_watermark().unwrap(), None);
        store.close().unwrap();
    }

    #[test]
    fn create_truncates_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data_sz.db");
        let store = MarketStore::create(&path, "first").unwrap();
        store
            .advance_watermark(schema::ROOT_SCOPE, d(2024, 5, 6))
            .unwrap();
        store.close().unwrap();

        let store = MarketStore::create(&path, "second").unwrap();
        assert_eq!(store.root_watermark().unwrap(), None);
        store.close().unwrap();
    }

    #[test]
    fn watermark_never_regresses() {
        let dir = tempfile::tempdir().unwrap();
        let store = MarketStore::create(&dir.path().join("data_sh.db"), "t").unwrap();
        assert!(store.advance_watermark("DAILY", d(2024, 2, 2)).unwrap());
        assert!(!store.advance_watermark("DAILY", d(2024, 2, 1)).unwrap());
        assert!(store.advance_watermark("DAILY", d(2024, 2, 2)).unwrap());
        assert_eq!(
            store.group_watermark(DataKind::Daily).unwrap(),
            Some(d(2024, 2, 2))
        );
        store.close().unwrap();
    }

    #[test]
    fn open_missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = MarketStore::open(&dir.path().join("data_sh.db")).unwrap_err();
        assert!(matches!(err, StoreError::StoreUnavailable { .. }));
    }
}
