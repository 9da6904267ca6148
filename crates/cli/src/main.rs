//! Operator command for the quote archive.
//!
//! Opens the store directory and performs exactly one action per run:
//! feed update, last-update report, extract or sort. Every run appends to
//! `quote_db.log` inside the store directory.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result, bail};
use clap::Parser;
use qdb_archive::store::StoreSet;
use qdb_archive::{CsvFeed, extract, sort_all, update_from_feed};
use qdb_types::WeekdayCalendar;
use tracing::info;
use tracing::level_filters::LevelFilter;

#[derive(Debug, Parser)]
#[command(name = "qdb", version, about = "market quote archive maintenance")]
struct Args {
    /// Store directory holding data_sh.db and data_sz.db.
    path: PathBuf,

    /// Update the archive from a feed directory.
    #[arg(short = 'u', long = "update", value_name = "DATAPATH")]
    update: Option<PathBuf>,

    /// Print each market's last-update dates.
    #[arg(short = 'l', long = "lastupdate")]
    lastupdate: bool,

    /// Extract a comma-separated code list into a new store.
    #[arg(short = 'e', long = "extract", value_name = "CODES")]
    extract: Option<String>,

    /// Output file for --extract, defaults to "<first code>.db".
    #[arg(short = 'o', long = "out", value_name = "OUTPUT")]
    out: Option<PathBuf>,

    /// Sort every table by time.
    #[arg(short = 's', long = "sort")]
    sort: bool,

    /// Log at debug verbosity.
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

fn init_logging(args: &Args) -> Result<()> {
    let log_path = args.path.join("quote_db.log");
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("cannot open log file {}", log_path.display()))?;
    let level = if args.debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(true)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    if let Some(feed_root) = &args.update {
        let stores = StoreSet::open(&args.path)?;
        let summary =
            update_from_feed(&stores, &CsvFeed::new(), feed_root, &WeekdayCalendar::new())?;
        info!(?summary, "update done");
        println!(
            "updated {} days: daily {}/{}, 5-minute {}/{}, splits {}/{}, {} feed errors",
            summary.days,
            summary.daily.appended,
            summary.daily.seen,
            summary.min5.appended,
            summary.min5.seen,
            summary.splits.appended,
            summary.splits.seen,
            summary.feed_errors
        );
        stores.close()?;
        return Ok(());
    }

    if args.lastupdate {
        let stores = StoreSet::open(&args.path)?;
        print!("{}", stores.last_update_report()?);
        stores.close()?;
        return Ok(());
    }

    if let Some(codes) = &args.extract {
        let codes: Vec<String> = codes
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();
        let out = args.out.clone().unwrap_or_else(|| {
            let stem = codes.first().map(String::as_str).unwrap_or("extract");
            PathBuf::from(format!("{stem}.db"))
        });
        let stores = StoreSet::open(&args.path)?;
        let result = extract(&stores, &codes, &out, None)?;
        println!(
            "{} out of {} codes extracted to {} ({} invalid, {} failed)",
            result.copied,
            result.attempted,
            out.display(),
            result.invalid.len(),
            result.failures
        );
        stores.close()?;
        return Ok(());
    }

    if args.sort {
        let stores = StoreSet::open(&args.path)?;
        let tables = sort_all(&stores)?;
        println!("sorted {tables} tables by time");
        stores.close()?;
        return Ok(());
    }

    bail!("nothing to do: pass one of --update, --lastupdate, --extract or --sort")
}
