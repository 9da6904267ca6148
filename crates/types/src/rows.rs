use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// What's stored (determines table group + row schema).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum DataKind {
    /// Daily bars, one row per trading day.
    Daily,
    /// 5-minute bars.
    Min5,
    /// Splits and dividends.
    Splits,
}

impl DataKind {
    pub const ALL: [DataKind; 3] = [DataKind::Daily, DataKind::Min5, DataKind::Splits];
}

/// One quote bar. `time` is seconds since the Unix epoch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuoteRow {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Volume in lots of 100 shares.
    pub volume: u32,
    /// Turnover.
    pub sum: f64,
}

/// One corporate-action event. `time` is seconds since the Unix epoch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SplitRow {
    pub time: i64,
    pub stock_dividend: f64,
    pub stock_split: f64,
    pub split_price: f64,
    pub cash_dividend: f64,
}

/// Rows for one table, tagged by schema. The variant is fixed when the batch
/// is built, so column access never needs a per-field type check.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RowBatch {
    Quote(Vec<QuoteRow>),
    Split(Vec<SplitRow>),
}

impl RowBatch {
    pub fn len(&self) -> usize {
        match self {
            RowBatch::Quote(rows) => rows.len(),
            RowBatch::Split(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether this batch's schema is the one `kind` stores.
    pub fn matches(&self, kind: DataKind) -> bool {
        matches!(
            (self, kind),
            (RowBatch::Quote(_), DataKind::Daily | DataKind::Min5)
                | (RowBatch::Split(_), DataKind::Splits)
        )
    }

    pub fn first_time(&self) -> Option<i64> {
        match self {
            RowBatch::Quote(rows) => rows.first().map(|r| r.time),
            RowBatch::Split(rows) => rows.first().map(|r| r.time),
        }
    }

    pub fn last_time(&self) -> Option<i64> {
        match self {
            RowBatch::Quote(rows) => rows.last().map(|r| r.time),
            RowBatch::Split(rows) => rows.last().map(|r| r.time),
        }
    }

    /// All row times in batch order.
    pub fn times(&self) -> Vec<i64> {
        match self {
            RowBatch::Quote(rows) => rows.iter().map(|r| r.time).collect(),
            RowBatch::Split(rows) => rows.iter().map(|r| r.time).collect(),
        }
    }

    /// Drop rows earlier than `cutoff`, keeping batch order. The boundary is
    /// inclusive: rows at exactly `cutoff` stay.
    pub fn retain_from(&mut self, cutoff: i64) {
        match self {
            RowBatch::Quote(rows) => rows.retain(|r| r.time >= cutoff),
            RowBatch::Split(rows) => rows.retain(|r| r.time >= cutoff),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quotes(times: &[i64]) -> RowBatch {
        RowBatch::Quote(
            times
                .iter()
                .map(|t| QuoteRow {
                    time: *t,
                    open: 1.0,
                    high: 1.0,
                    low: 1.0,
                    close: 1.0,
                    volume: 1,
                    sum: 1.0,
                })
                .collect(),
        )
    }

    #[test]
    fn retain_from_is_boundary_inclusive() {
        let mut batch = quotes(&[100, 200, 300, 400]);
        batch.retain_from(200);
        assert_eq!(batch.times(), vec![200, 300, 400]);
        assert_eq!(batch.first_time(), Some(200));
        assert_eq!(batch.last_time(), Some(400));
    }

    #[test]
    fn retain_from_zero_keeps_all() {
        let mut batch = quotes(&[100, 200]);
        batch.retain_from(0);
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn schema_match() {
        let batch = quotes(&[1]);
        assert!(batch.matches(DataKind::Daily));
        assert!(batch.matches(DataKind::Min5));
        assert!(!batch.matches(DataKind::Splits));
        let splits = RowBatch::Split(vec![]);
        assert!(splits.matches(DataKind::Splits));
        assert!(!splits.matches(DataKind::Daily));
    }
}
