//! Market-partitioned quote archive on SQLite.
//!
//! * one store file per market (`data_sh.db`, `data_sz.db`)
//! * one table per (data kind, code), rows kept in append order
//! * `meta` watermarks gate order-checked appends
//!
//! [`StoreSet`] opens the per-market files. [`append_batch`] writes feed
//! batches, [`sort_all`] repairs ordering after unchecked appends,
//! [`extract`] copies codes into a standalone store, and
//! [`missing_trading_days`] audits 5-minute coverage. [`update_from_feed`]
//! drives a full catch-up from a feed directory.

pub mod append;
pub mod csv_feed;
pub mod error;
pub mod extract;
pub mod gaps;
pub mod schema;
pub mod sort;
pub mod store;
pub mod update;

pub use append::{AppendResult, append_batch};
pub use csv_feed::CsvFeed;
pub use error::{Result, StoreError};
pub use extract::{ExtractResult, extract};
pub use gaps::missing_trading_days;
pub use sort::{sort_all, sort_store};
pub use store::{MarketStore, StoreSet};
pub use update::{UpdateSummary, update_from_feed};
