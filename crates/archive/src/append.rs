//! Append engine.
//!
//! Takes per-code row batches from a feed, routes each to its market's
//! store and appends into the code's table, creating the table on first
//! sight. With ordering checks on, rows older than the group watermark are
//! dropped before the write. Appending a market's benchmark index advances
//! the group and root watermarks to the date of the last row kept.

use chrono::Utc;
use qdb_types::{Code, CodeBatch, DataKind, RowBatch};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::error::{Result, StoreError};
use crate::schema;
use crate::store::{MarketStore, StoreSet, day_to_epoch, epoch_to_day};

/// Tally of one append pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendResult {
    /// Code batches offered, valid or not.
    pub seen: usize,
    /// Batches that wrote at least one row.
    pub appended: usize,
    /// Batches dropped because the code would not parse.
    pub invalid: usize,
    /// Batches whose rows were all older than the watermark.
    pub skipped_stale: usize,
    /// Rows written across all batches.
    pub rows_written: usize,
}

impl AppendResult {
    pub fn absorb(&mut self, other: &AppendResult) {
        self.seen += other.seen;
        self.appended += other.appended;
        self.invalid += other.invalid;
        self.skipped_stale += other.skipped_stale;
        self.rows_written += other.rows_written;
    }
}

/// Append a sequence of code batches of one data kind.
///
/// Invalid codes are logged and tallied, never fatal. A batch whose market
/// store is missing is fatal: the caller opened an incomplete store set and
/// silently dropping writes would desynchronize the markets.
///
/// For the splits kind the pass ends by stamping every open store's splits
/// watermark with today's date, batch content or not, marking the splits
/// source as consulted.
pub fn append_batch<I>(
    stores: &StoreSet,
    kind: DataKind,
    batches: I,
    check_order: bool,
) -> Result<AppendResult>
where
    I: IntoIterator<Item = CodeBatch>,
{
    let mut tally = AppendResult::default();

    for batch in batches {
        tally.seen += 1;
        let CodeBatch { code: raw, mut rows } = batch;

        let code = match Code::parse(&raw) {
            Ok(code) => code,
            Err(e) => {
                error!("{e}");
                tally.invalid += 1;
                continue;
            }
        };
        if !rows.matches(kind) {
            return Err(StoreError::SchemaMismatch { kind });
        }
        let store = stores.get(code.market())?;

        let cutoff = if check_order {
            store.group_watermark(kind)?
        } else {
            None
        };
        let had_rows = !rows.is_empty();
        if let Some(day) = cutoff {
            rows.retain_from(day_to_epoch(day));
        }
        if rows.is_empty() {
            if had_rows {
                // cutoff is Some here, retain_from is the only filter
                if let Some(day) = cutoff {
                    debug!("{code} has no rows on or after {day}");
                    tally.skipped_stale += 1;
                }
            }
            continue;
        }

        let written = append_rows(store, kind, &code, &rows)?;

        if code.is_index() {
            if let Some(last) = rows.last_time() {
                let day = epoch_to_day(last)?;
                store.advance_watermark(schema::group(kind), day)?;
                store.advance_watermark(schema::ROOT_SCOPE, day)?;
                debug!("{code} moved the {kind} watermark to {day}");
            }
        }

        tally.appended += 1;
        tally.rows_written += written;
    }

    if kind == DataKind::Splits {
        let today = Utc::now().date_naive();
        for (market, store) in stores.iter() {
            store.advance_watermark(schema::group(DataKind::Splits), today)?;
            debug!("{market} splits watermark refreshed to {today}");
        }
    }

    info!(
        kind = %kind,
        appended = tally.appended,
        seen = tally.seen,
        rows = tally.rows_written,
        "append pass finished"
    );
    Ok(tally)
}

fn append_rows(store: &MarketStore, kind: DataKind, code: &Code, rows: &RowBatch) -> Result<usize> {
    let table = schema::table_name(kind, code);
    let tx = store.conn().unchecked_transaction()?;
    if !store.has_table(&table)? {
        tx.execute_batch(&schema::table_ddl(kind, &table))?;
        debug!("created {table} in {}", store.path().display());
    }
    let written = insert_all(&tx, &table, rows)?;
    tx.commit()?;
    Ok(written)
}

/// Insert a whole batch into `table` within the caller's transaction.
pub(crate) fn insert_all(
    tx: &rusqlite::Transaction<'_>,
    table: &str,
    rows: &RowBatch,
) -> Result<usize> {
    match rows {
        RowBatch::Quote(rows) => {
            let mut stmt = tx.prepare(&format!(
                r#"INSERT INTO "{table}" (time, open, high, low, close, volume, sum)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#
            ))?;
            for r in rows {
                stmt.execute(rusqlite::params![
                    r.time, r.open, r.high, r.low, r.close, r.volume, r.sum
                ])?;
            }
        }
        RowBatch::Split(rows) => {
            let mut stmt = tx.prepare(&format!(
                r#"INSERT INTO "{table}" (time, stock_dividend, stock_split, split_price, cash_dividend)
                   VALUES (?1, ?2, ?3, ?4, ?5)"#
            ))?;
            for r in rows {
                stmt.execute(rusqlite::params![
                    r.time,
                    r.stock_dividend,
                    r.stock_split,
                    r.split_price,
                    r.cash_dividend
                ])?;
            }
        }
    }
    Ok(rows.len())
}
