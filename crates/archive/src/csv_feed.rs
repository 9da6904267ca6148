//! CSV feed reader.
//!
//! Vendor feed files are headerless CSV with consecutive rows per code.
//! Quote files (`YYYYMMDD.dad`, `YYYYMMDDm.dad`) carry
//! `code,time,open,high,low,close,volume,sum`; the splits file
//! (`split.pwr`) carries
//! `code,time,stock_dividend,stock_split,split_price,cash_dividend`.
//! Malformed records are logged and skipped; an unopenable file is the
//! `None` sentinel the orchestrator expects.

use qdb_types::{CodeBatch, DataKind, FeedSource, QuoteRow, RowBatch, SplitRow};
use serde::Deserialize;
use std::fs::File;
use std::path::Path;
use tracing::{debug, warn};

/// Reads `.dad` quote files and the `split.pwr` splits file.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvFeed;

impl CsvFeed {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug, Deserialize)]
struct QuoteWire {
    code: String,
    time: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u32,
    sum: f64,
}

impl QuoteWire {
    fn into_parts(self) -> (String, QuoteRow) {
        (
            self.code,
            QuoteRow {
                time: self.time,
                open: self.open,
                high: self.high,
                low: self.low,
                close: self.close,
                volume: self.volume,
                sum: self.sum,
            },
        )
    }
}

#[derive(Debug, Deserialize)]
struct SplitWire {
    code: String,
    time: i64,
    stock_dividend: f64,
    stock_split: f64,
    split_price: f64,
    cash_dividend: f64,
}

impl SplitWire {
    fn into_parts(self) -> (String, SplitRow) {
        (
            self.code,
            SplitRow {
                time: self.time,
                stock_dividend: self.stock_dividend,
                stock_split: self.stock_split,
                split_price: self.split_price,
                cash_dividend: self.cash_dividend,
            },
        )
    }
}

enum WireRows {
    Quote(csv::DeserializeRecordsIntoIter<File, QuoteWire>),
    Split(csv::DeserializeRecordsIntoIter<File, SplitWire>),
}

/// Lazy batch sequence over one feed file. Groups consecutive same-code
/// records; dropping it closes the file.
pub struct CsvBatches {
    rows: WireRows,
    pending: Option<(String, RowBatch)>,
}

impl Iterator for CsvBatches {
    type Item = CodeBatch;

    fn next(&mut self) -> Option<CodeBatch> {
        loop {
            match &mut self.rows {
                WireRows::Quote(iter) => match iter.next() {
                    None => {
                        return self
                            .pending
                            .take()
                            .map(|(code, rows)| CodeBatch { code, rows });
                    }
                    Some(Err(e)) => {
                        warn!("skipping malformed record: {e}");
                    }
                    Some(Ok(wire)) => {
                        let (code, row) = wire.into_parts();
                        match &mut self.pending {
                            Some((current, RowBatch::Quote(rows))) if *current == code => {
                                rows.push(row);
                            }
                            _ => {
                                let done =
                                    self.pending.replace((code, RowBatch::Quote(vec![row])));
                                if let Some((code, rows)) = done {
                                    return Some(CodeBatch { code, rows });
                                }
                            }
                        }
                    }
                },
                WireRows::Split(iter) => match iter.next() {
                    None => {
                        return self
                            .pending
                            .take()
                            .map(|(code, rows)| CodeBatch { code, rows });
                    }
                    Some(Err(e)) => {
                        warn!("skipping malformed record: {e}");
                    }
                    Some(Ok(wire)) => {
                        let (code, row) = wire.into_parts();
                        match &mut self.pending {
                            Some((current, RowBatch::Split(rows))) if *current == code => {
                                rows.push(row);
                            }
                            _ => {
                                let done =
                                    self.pending.replace((code, RowBatch::Split(vec![row])));
                                if let Some((code, rows)) = done {
                                    return Some(CodeBatch { code, rows });
                                }
                            }
                        }
                    }
                },
            }
        }
    }
}

impl FeedSource for CsvFeed {
    type Batches = CsvBatches;

    fn open(&self, path: &Path, kind: DataKind) -> Option<CsvBatches> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) => {
                debug!("cannot open {}: {e}", path.display());
                return None;
            }
        };
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .trim(csv::Trim::All)
            .from_reader(file);
        let rows = match kind {
            DataKind::Daily | DataKind::Min5 => WireRows::Quote(reader.into_deserialize()),
            DataKind::Splits => WireRows::Split(reader.into_deserialize()),
        };
        Some(CsvBatches { rows, pending: None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_feed(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn groups_consecutive_codes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_feed(
            &dir,
            "20240102.dad",
            "SH600000,100,1.0,2.0,0.5,1.5,10,15.0\n\
             SH600000,200,1.5,2.5,1.0,2.0,20,40.0\n\
             SZ000001,100,3.0,3.5,2.5,3.0,5,15.0\n",
        );
        let batches: Vec<_> = CsvFeed::new()
            .open(&path, DataKind::Daily)
            .unwrap()
            .collect();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].code, "SH600000");
        assert_eq!(batches[0].rows.times(), vec![100, 200]);
        assert_eq!(batches[1].code, "SZ000001");
        assert_eq!(batches[1].rows.len(), 1);
    }

    #[test]
    fn malformed_records_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_feed(
            &dir,
            "20240102.dad",
            "SH600000,100,1.0,2.0,0.5,1.5,10,15.0\n\
             not,a,real,record\n\
             SH600000,200,1.5,2.5,1.0,2.0,20,40.0\n",
        );
        let batches: Vec<_> = CsvFeed::new()
            .open(&path, DataKind::Daily)
            .unwrap()
            .collect();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].rows.times(), vec![100, 200]);
    }

    #[test]
    fn splits_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_feed(&dir, "split.pwr", "SH600000,100,0.0,0.5,0.0,1.2\n");
        let batches: Vec<_> = CsvFeed::new()
            .open(&path, DataKind::Splits)
            .unwrap()
            .collect();
        assert_eq!(batches.len(), 1);
        match &batches[0].rows {
            RowBatch::Split(rows) => {
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0].stock_split, 0.5);
                assert_eq!(rows[0].cash_dividend, 1.2);
            }
            other => panic!("expected splits, got {other:?}"),
        }
    }

    #[test]
    fn empty_file_yields_no_batches() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_feed(&dir, "20240102.dad", "");
        assert_eq!(CsvFeed::new().open(&path, DataKind::Daily).unwrap().count(), 0);
    }

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("20240102.dad");
        assert!(CsvFeed::new().open(&path, DataKind::Daily).is_none());
    }
}
