//! Shared types for the quote archive.
//!
//! - `market`: the closed exchange set and an enum-indexed per-market map.
//! - `code`: validated instrument codes (market tag + symbol, fixed width).
//! - `rows`: data kinds and the quote / split row schemas.
//! - `calendar`: trading-calendar trait plus a weekday implementation.
//! - `feed`: the feed-source trait that turns vendor files into row batches.

pub mod calendar;
pub mod code;
pub mod feed;
pub mod market;
pub mod rows;

pub use calendar::{TradingCalendar, WeekdayCalendar};
pub use code::{CODE_WIDTH, Code, CodeError};
pub use feed::{CodeBatch, FeedSource};
pub use market::{Market, MarketMap};
pub use rows::{DataKind, QuoteRow, RowBatch, SplitRow};
