//! Whole-table time sort.
//!
//! Repairs ordering after unchecked appends. Each table is rebuilt inside
//! one transaction: rows are copied time-ascending into a scratch table
//! which then replaces the original. A failure rolls the whole table back,
//! so the table is never left with fewer or duplicated rows.

use tracing::debug;

use crate::error::Result;
use crate::schema;
use crate::store::{MarketStore, StoreSet};

/// Sort every data table in one store. Returns the number of tables rebuilt.
pub fn sort_store(store: &MarketStore) -> Result<usize> {
    debug!("start sorting {}", store.path().display());
    let mut rebuilt = 0;
    for table in store.table_names()? {
        // table_names only yields group-prefixed names
        let Some(kind) = schema::kind_of_table(&table) else {
            continue;
        };
        let columns = schema::column_list(kind);
        let scratch = format!("{table}__sorted");
        let tx = store.conn().unchecked_transaction()?;
        tx.execute_batch(&format!(r#"DROP TABLE IF EXISTS "{scratch}""#))?;
        tx.execute_batch(&schema::table_ddl(kind, &scratch))?;
        // rowid tiebreak keeps equal-time rows in their stored order
        tx.execute_batch(&format!(
            r#"INSERT INTO "{scratch}" SELECT {columns} FROM "{table}" ORDER BY time ASC, rowid ASC"#
        ))?;
        tx.execute_batch(&format!(r#"DROP TABLE "{table}""#))?;
        tx.execute_batch(&format!(r#"ALTER TABLE "{scratch}" RENAME TO "{table}""#))?;
        tx.commit()?;
        debug!("sorted {table}");
        rebuilt += 1;
    }
    debug!("sort finished for {}", store.path().display());
    Ok(rebuilt)
}

/// Sort every data table in every open store.
pub fn sort_all(stores: &StoreSet) -> Result<usize> {
    let mut total = 0;
    for (_, store) in stores.iter() {
        total += sort_store(store)?;
    }
    Ok(total)
}
