//! Feed-driven catch-up.
//!
//! Walks every trading day strictly after the SH store's root watermark,
//! asking the feed for that day's daily file (`YYYYMMDD.dad`) and 5-minute
//! file (`YYYYMMDDm.dad`) and appending each with ordering checks on. An
//! unreadable feed file is logged and skipped. The run ends with the
//! consolidated splits feed (`split.pwr`), consulted even when there were
//! no catch-up days.

use chrono::Utc;
use qdb_types::{DataKind, FeedSource, Market, TradingCalendar};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{error, info, warn};

use crate::append::{AppendResult, append_batch};
use crate::error::Result;
use crate::store::{StoreSet, format_day};

/// Tally of one feed update run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateSummary {
    /// Catch-up days walked.
    pub days: usize,
    pub daily: AppendResult,
    pub min5: AppendResult,
    pub splits: AppendResult,
    /// Feed files that could not be opened.
    pub feed_errors: usize,
}

/// Bring the store set up to date from the feed files under `feed_root`.
pub fn update_from_feed<F, C>(
    stores: &StoreSet,
    feed: &F,
    feed_root: &Path,
    calendar: &C,
) -> Result<UpdateSummary>
where
    F: FeedSource,
    C: TradingCalendar,
{
    let mut summary = UpdateSummary::default();

    let days = match stores.get(Market::SH)?.root_watermark()? {
        Some(since) => {
            let today = Utc::now().date_naive();
            match since.succ_opt() {
                Some(start) if start <= today => calendar.trading_days(start, today),
                _ => Vec::new(),
            }
        }
        None => {
            warn!("SH store has no last-update date, skipping quote catch-up");
            Vec::new()
        }
    };
    if days.is_empty() {
        info!("daily and 5-minute data are up to date");
    }

    for day in days {
        summary.days += 1;
        let tag = format_day(day);
        let daily = append_file(
            stores,
            feed,
            &feed_root.join(format!("{tag}.dad")),
            DataKind::Daily,
            &mut summary.feed_errors,
        )?;
        summary.daily.absorb(&daily);
        let min5 = append_file(
            stores,
            feed,
            &feed_root.join(format!("{tag}m.dad")),
            DataKind::Min5,
            &mut summary.feed_errors,
        )?;
        summary.min5.absorb(&min5);
    }

    // splits arrive as one consolidated file, consulted on every run
    let splits = append_file(
        stores,
        feed,
        &feed_root.join("split.pwr"),
        DataKind::Splits,
        &mut summary.feed_errors,
    )?;
    summary.splits.absorb(&splits);

    info!(
        days = summary.days,
        feed_errors = summary.feed_errors,
        "feed update finished"
    );
    Ok(summary)
}

fn append_file<F: FeedSource>(
    stores: &StoreSet,
    feed: &F,
    path: &Path,
    kind: DataKind,
    feed_errors: &mut usize,
) -> Result<AppendResult> {
    let Some(batches) = feed.open(path, kind) else {
        error!("source file error {}", path.display());
        *feed_errors += 1;
        return Ok(AppendResult::default());
    };
    info!("update {}", path.display());
    append_batch(stores, kind, batches, true)
}
