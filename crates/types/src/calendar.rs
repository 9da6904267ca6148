use chrono::{Datelike, NaiveDate, Utc, Weekday};
use std::collections::BTreeSet;

/// Deterministic trading-day source used by gap detection and feed catch-up.
pub trait TradingCalendar {
    fn is_trading_day(&self, day: NaiveDate) -> bool;

    /// Ordered trading days in `[start, end]`, both bounds inclusive.
    fn trading_days(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        let mut out = Vec::new();
        let mut day = start;
        while day <= end {
            if self.is_trading_day(day) {
                out.push(day);
            }
            let Some(next) = day.succ_opt() else { break };
            day = next;
        }
        out
    }

    /// Ordered trading days in `[start, today]`.
    fn trading_days_from(&self, start: NaiveDate) -> Vec<NaiveDate> {
        self.trading_days(start, Utc::now().date_naive())
    }
}

/// Monday-to-Friday sessions minus a fixed holiday list.
#[derive(Debug, Clone, Default)]
pub struct WeekdayCalendar {
    holidays: BTreeSet<NaiveDate>,
}

impl WeekdayCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_holidays<I: IntoIterator<Item = NaiveDate>>(holidays: I) -> Self {
        Self {
            holidays: holidays.into_iter().collect(),
        }
    }
}

impl TradingCalendar for WeekdayCalendar {
    fn is_trading_day(&self, day: NaiveDate) -> bool {
        !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) && !self.holidays.contains(&day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn weekends_are_closed() {
        let cal = WeekdayCalendar::new();
        assert!(cal.is_trading_day(d(2024, 1, 5))); // Friday
        assert!(!cal.is_trading_day(d(2024, 1, 6))); // Saturday
        assert!(!cal.is_trading_day(d(2024, 1, 7))); // Sunday
        assert!(cal.is_trading_day(d(2024, 1, 8))); // Monday
    }

    #[test]
    fn holidays_are_closed() {
        let cal = WeekdayCalendar::with_holidays([d(2024, 1, 1)]);
        assert!(!cal.is_trading_day(d(2024, 1, 1))); // Monday, but a holiday
        assert!(cal.is_trading_day(d(2024, 1, 2)));
    }

    #[test]
    fn range_is_inclusive_and_ordered() {
        let cal = WeekdayCalendar::new();
        // Thu 2024-01-04 .. Mon 2024-01-08 spans a weekend
        let days = cal.trading_days(d(2024, 1, 4), d(2024, 1, 8));
        assert_eq!(days, vec![d(2024, 1, 4), d(2024, 1, 5), d(2024, 1, 8)]);
    }

    #[test]
    fn empty_range() {
        let cal = WeekdayCalendar::new();
        assert!(cal.trading_days(d(2024, 1, 8), d(2024, 1, 7)).is_empty());
    }
}
