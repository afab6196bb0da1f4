//! Econ Archive CLI — mirror the published daily economy dataset.
//!
//! Commands:
//! - `backfill` — download every day from the archive start date through today
//! - `fetch` — download a single day (default yesterday), with retry
//! - `status` — report stored days, completeness, and the latest pointer

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use econ_archive_core::{
    fetch_day, run_backfill, ArchiveConfig, ArchiveStore, DateKey, DayOutcome, HttpSource, Layout,
    RetryPolicy, StdoutProgress,
};

#[derive(Parser)]
#[command(
    name = "econ-archive",
    about = "Mirror the published daily economy dataset"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download every day from the archive start date through today (UTC).
    Backfill {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Data directory. Defaults to ./data.
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// First day to consider (YYYY-MM-DD). Defaults to 2022-11-23.
        #[arg(long)]
        start: Option<String>,

        /// Last day to consider (YYYY-MM-DD). Defaults to today (UTC).
        #[arg(long)]
        end: Option<String>,

        /// Worker pool size.
        #[arg(long)]
        workers: Option<usize>,
    },
    /// Download a single day (default: yesterday, UTC), retrying on failure.
    Fetch {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Data directory. Defaults to ./data.
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Day to fetch (YYYY-MM-DD). Defaults to yesterday (UTC).
        #[arg(long)]
        date: Option<String>,

        /// Give up after the first failed attempt.
        #[arg(long, default_value_t = false)]
        no_retry: bool,

        /// Store date-suffixed files directly under the data dir.
        #[arg(long, default_value_t = false)]
        flat: bool,
    },
    /// Report stored days, completeness, and the latest pointer.
    Status {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Data directory. Defaults to ./data.
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Backfill {
            config,
            data_dir,
            start,
            end,
            workers,
        } => run_backfill_cmd(config, data_dir, start, end, workers),
        Commands::Fetch {
            config,
            data_dir,
            date,
            no_retry,
            flat,
        } => run_fetch_cmd(config, data_dir, date, no_retry, flat),
        Commands::Status { config, data_dir } => run_status_cmd(config, data_dir),
    }
}

fn load_config(path: Option<PathBuf>, data_dir: Option<PathBuf>) -> Result<ArchiveConfig> {
    let mut cfg = match path {
        Some(p) => ArchiveConfig::from_file(&p)?,
        None => ArchiveConfig::default(),
    };
    if let Some(dir) = data_dir {
        cfg.data_dir = dir;
    }
    Ok(cfg)
}

fn parse_day(s: &str) -> Result<DateKey> {
    Ok(DateKey::new(NaiveDate::parse_from_str(s, "%Y-%m-%d")?))
}

fn run_backfill_cmd(
    config: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    start: Option<String>,
    end: Option<String>,
    workers: Option<usize>,
) -> Result<()> {
    let mut cfg = load_config(config, data_dir)?;
    if let Some(w) = workers {
        cfg.workers = w;
    }

    let start_key = match start.as_deref() {
        Some(s) => parse_day(s)?,
        None => cfg.start_key(),
    };
    let end_key = match end.as_deref() {
        Some(s) => parse_day(s)?,
        None => DateKey::today_utc(),
    };

    let store = ArchiveStore::new(&cfg.data_dir, cfg.layout);
    let source = HttpSource::new(&cfg.base_url, cfg.retry.policy());

    println!(
        "Backfilling {start_key} through {end_key} ({} workers)",
        cfg.workers
    );

    // Per-day failures are expected (future and unpublished days); only
    // systemic filesystem errors exit non-zero.
    run_backfill(
        &store,
        &source,
        start_key,
        end_key,
        cfg.workers,
        &StdoutProgress,
    )?;
    Ok(())
}

fn run_fetch_cmd(
    config: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    date: Option<String>,
    no_retry: bool,
    flat: bool,
) -> Result<()> {
    let mut cfg = load_config(config, data_dir)?;
    if flat {
        cfg.layout = Layout::Flat;
    }

    let key = match date.as_deref() {
        Some(s) => parse_day(s)?,
        // Published data covers the previous 24 hours.
        None => DateKey::new(Utc::now().date_naive() - chrono::Duration::days(1)),
    };

    let retry = if no_retry {
        RetryPolicy::none()
    } else {
        RetryPolicy::daily()
    };

    let store = ArchiveStore::new(&cfg.data_dir, cfg.layout);
    let source = HttpSource::new(&cfg.base_url, retry);

    match fetch_day(&store, &source, &key)? {
        DayOutcome::Downloaded => {
            store.replace_latest(&key)?;
            println!("OK: {key}");
        }
        DayOutcome::Skipped => {
            store.replace_latest(&key)?;
            println!("SKIP: {key} (already complete)");
        }
        DayOutcome::Failed(err) => {
            eprintln!("FAIL: {key}: {err}");
            std::process::exit(1);
        }
    }
    Ok(())
}

fn run_status_cmd(config: Option<PathBuf>, data_dir: Option<PathBuf>) -> Result<()> {
    let cfg = load_config(config, data_dir)?;
    let store = ArchiveStore::new(&cfg.data_dir, cfg.layout);

    let days = store.scan()?;
    if days.is_empty() {
        println!("No data under {}", cfg.data_dir.display());
        return Ok(());
    }

    let complete = days.iter().filter(|d| d.complete).count();
    println!("Data root: {}", cfg.data_dir.display());
    println!(
        "Days stored: {} ({} complete, {} incomplete)",
        days.len(),
        complete,
        days.len() - complete
    );
    match store.read_latest() {
        Some(key) => println!("latest -> {key}"),
        None => println!("latest -> (unset)"),
    }

    let incomplete: Vec<_> = days.iter().filter(|d| !d.complete).collect();
    if !incomplete.is_empty() {
        println!("\nIncomplete days:");
        for day in incomplete {
            println!("  {}", day.key);
        }
    }

    Ok(())
}
