//! Trading-day gap detection.
//!
//! Audits the 5-minute archive, the kind with known historical start-date
//! cutoffs, against a trading calendar. Read-only.

use chrono::NaiveDate;
use qdb_types::{Code, DataKind, Market, TradingCalendar};
use std::collections::BTreeSet;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::store::{StoreSet, epoch_to_day};

/// Expected trading days with no 5-minute rows, in calendar order.
///
/// The audit window runs from the code's first recorded day to its last,
/// both inclusive, so leading history the archive never carried is not
/// reported as missing. `code` defaults to the SH benchmark index, the
/// longest-running table. Fails with [`StoreError::CodeNotFound`] when the
/// code has no 5-minute table at all.
pub fn missing_trading_days<C: TradingCalendar>(
    stores: &StoreSet,
    calendar: &C,
    code: Option<&str>,
) -> Result<Vec<NaiveDate>> {
    let raw = code.unwrap_or(Market::SH.index_code());
    let code = Code::parse(raw)?;
    let store = stores.get(code.market())?;
    let Some(rows) = store.read_rows(DataKind::Min5, &code)? else {
        return Err(StoreError::CodeNotFound {
            code: code.as_str().to_string(),
            kind: DataKind::Min5,
        });
    };

    let mut recorded = BTreeSet::new();
    for time in rows.times() {
        recorded.insert(epoch_to_day(time)?);
    }
    let (Some(first), Some(last)) = (recorded.first(), recorded.last()) else {
        return Ok(Vec::new());
    };

    let missing: Vec<NaiveDate> = calendar
        .trading_days(*first, *last)
        .into_iter()
        .filter(|day| !recorded.contains(day))
        .collect();
    debug!(
        "{code}: {} recorded days, {} missing between {first} and {last}",
        recorded.len(),
        missing.len()
    );
    Ok(missing)
}
