//! CLI definition and dispatch.

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use crate::adapters::csv_bar_cache::CsvBarCache;
use crate::adapters::csv_holding_repository::CsvHoldingRepository;
use crate::adapters::csv_price_source::CsvPriceSource;
use crate::adapters::csv_scan_store::CsvScanStore;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::text_report;
use crate::domain::analysis_cache::AnalysisCache;
use crate::domain::config_validation::validate_dashboard_config;
use crate::domain::dashboard::{self, Dashboard, FetchSettings, DEFAULT_LOOKBACK_DAYS};
use crate::domain::error::DashboardError;
use crate::domain::holding::EntryDate;
use crate::domain::portfolio;
use crate::domain::position_store::PositionStore;
use crate::domain::retry::{RetryPolicy, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY};
use crate::domain::screener::{self, DEFAULT_BUY_QUANTITY};
use crate::domain::universe::{self, TickerAliases, DEFAULT_MARKET_INDEX};
use crate::ports::config_port::ConfigPort;
use crate::ports::scan_port::ScanStore;

pub const DEFAULT_DATA_DIR: &str = "data";
/// Cache directory name under the data directory.
pub const DEFAULT_CACHE_SUBDIR: &str = ".cache";
pub const DEFAULT_HOLDINGS_FILE: &str = "portfolio.csv";
pub const DEFAULT_SCAN_DIR: &str = "scans";
pub const DEFAULT_PACING_MS: i64 = 250;
pub const DEFAULT_CACHE_TTL_MINUTES: i64 = 60;

#[derive(Parser, Debug)]
#[command(name = "tradedash", about = "Personal trading dashboard")]
pub struct Cli {
    /// INI configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the market trend for the configured index
    Market,
    /// Show indicators for one stock, by ticker or alias
    Search { query: String },
    /// Score the configured universe and save the results
    Screen {
        #[arg(long)]
        scan_id: Option<String>,
    },
    /// Add a candidate from a saved scan to the portfolio
    Buy {
        #[arg(long)]
        scan: String,
        #[arg(long)]
        ticker: String,
        #[arg(long, default_value_t = DEFAULT_BUY_QUANTITY)]
        quantity: f64,
    },
    /// Review open positions for exit signals
    Portfolio,
    /// List stored holdings with their indices
    List,
    /// Record a new open holding
    Add {
        ticker: String,
        #[arg(long)]
        price: f64,
        #[arg(long)]
        quantity: f64,
        /// YYYY-MM-DD or "Pre-existing"; defaults to today
        #[arg(long, value_parser = parse_entry_date)]
        date: Option<EntryDate>,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Change quantity, entry price and notes of a holding
    Update {
        index: usize,
        #[arg(long)]
        quantity: f64,
        #[arg(long)]
        price: f64,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Close a holding by index, or the open holding of a ticker
    Close {
        #[arg(required_unless_present = "ticker")]
        index: Option<usize>,
        #[arg(long, conflicts_with = "index")]
        ticker: Option<String>,
        /// Close date; defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Delete a holding permanently
    Remove { index: usize },
}

fn parse_entry_date(s: &str) -> Result<EntryDate, String> {
    EntryDate::parse(s).ok_or_else(|| format!("expected YYYY-MM-DD or Pre-existing, got {:?}", s))
}

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub data_dir: PathBuf,
    /// Fetched series persisted between runs for `cache_ttl`.
    pub cache_dir: PathBuf,
    pub holdings_file: PathBuf,
    pub scan_dir: PathBuf,
    pub fetch: FetchSettings,
    pub cache_ttl: Duration,
    pub market_index: String,
    pub universe: Vec<String>,
    pub aliases: TickerAliases,
}

pub fn run(cli: Cli) -> ExitCode {
    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(&e)
        }
    }
}

fn execute(cli: Cli) -> Result<(), DashboardError> {
    let adapter = load_config(cli.config.as_ref())?;
    let config = build_dashboard_config(&adapter)?;
    let today = Local::now().date_naive();

    match cli.command {
        Command::Market => run_market(&config, today),
        Command::Search { query } => run_search(&config, today, &query),
        Command::Screen { scan_id } => run_screen(&config, today, scan_id),
        Command::Buy {
            scan,
            ticker,
            quantity,
        } => run_buy(&config, today, &scan, &ticker, quantity),
        Command::Portfolio => run_portfolio(&config, today),
        Command::List => run_list(&config),
        Command::Add {
            ticker,
            price,
            quantity,
            date,
            notes,
        } => {
            let entry_date = date.unwrap_or(EntryDate::On(today));
            let repo = CsvHoldingRepository::new(config.holdings_file.clone());
            let index =
                PositionStore::new(&repo).add(&ticker, entry_date, price, quantity, &notes)?;
            println!("Added {} as holding {}", ticker.trim().to_uppercase(), index);
            Ok(())
        }
        Command::Update {
            index,
            quantity,
            price,
            notes,
        } => {
            let repo = CsvHoldingRepository::new(config.holdings_file.clone());
            PositionStore::new(&repo).update(index, quantity, price, &notes)?;
            println!("Updated holding {}", index);
            Ok(())
        }
        Command::Close {
            index,
            ticker,
            date,
        } => {
            let close_date = date.unwrap_or(today);
            let repo = CsvHoldingRepository::new(config.holdings_file.clone());
            let store = PositionStore::new(&repo);
            let closed = match (index, ticker) {
                (Some(index), _) => store.close(index, close_date).map(|_| index)?,
                (None, Some(ticker)) => store.close_open(&ticker, close_date)?,
                (None, None) => {
                    return Err(DashboardError::InvalidHolding {
                        reason: "give an index or --ticker".into(),
                    });
                }
            };
            println!("Closed holding {} on {}", closed, close_date);
            Ok(())
        }
        Command::Remove { index } => {
            let repo = CsvHoldingRepository::new(config.holdings_file.clone());
            let removed = PositionStore::new(&repo).remove(index)?;
            println!("Removed holding {} ({})", index, removed.ticker);
            Ok(())
        }
    }
}

/// Load the INI file, or an empty configuration when none was given.
pub fn load_config(path: Option<&PathBuf>) -> Result<FileConfigAdapter, DashboardError> {
    match path {
        Some(path) => {
            FileConfigAdapter::from_file(path).map_err(|e| DashboardError::ConfigParse {
                file: path.display().to_string(),
                reason: e.to_string(),
            })
        }
        None => Ok(FileConfigAdapter::empty()),
    }
}

pub fn build_dashboard_config(
    adapter: &dyn ConfigPort,
) -> Result<DashboardConfig, DashboardError> {
    validate_dashboard_config(adapter)?;

    let path = |section: &str, key: &str, default: &str| {
        PathBuf::from(
            adapter
                .get_string(section, key)
                .map(|s| s.trim().to_string())
                .unwrap_or_else(|| default.to_string()),
        )
    };

    let delay_secs =
        adapter.get_double("fetch", "retry_delay_secs", DEFAULT_RETRY_DELAY.as_secs_f64());
    let delay =
        Duration::try_from_secs_f64(delay_secs).map_err(|e| DashboardError::ConfigInvalid {
            section: "fetch".into(),
            key: "retry_delay_secs".into(),
            reason: e.to_string(),
        })?;
    let max_attempts = adapter
        .get_int("fetch", "max_attempts", DEFAULT_MAX_ATTEMPTS as i64)
        .clamp(1, u32::MAX as i64) as u32;
    let pacing_ms = adapter.get_int("fetch", "pacing_ms", DEFAULT_PACING_MS).max(0) as u64;
    let ttl_minutes = adapter
        .get_int("fetch", "cache_ttl_minutes", DEFAULT_CACHE_TTL_MINUTES)
        .max(0) as u64;

    let universe = match adapter.get_string("screener", "tickers") {
        Some(list) => universe::parse_tickers(&list).map_err(|e| DashboardError::ConfigInvalid {
            section: "screener".into(),
            key: "tickers".into(),
            reason: e.to_string(),
        })?,
        None => universe::default_universe(),
    };

    let mut aliases = TickerAliases::builtin();
    for (alias, ticker) in adapter.section_entries("aliases") {
        aliases.insert(&alias, &ticker);
    }

    let data_dir = path("data", "dir", DEFAULT_DATA_DIR);
    let cache_dir = match adapter.get_string("data", "cache_dir") {
        Some(dir) => PathBuf::from(dir.trim()),
        None => data_dir.join(DEFAULT_CACHE_SUBDIR),
    };

    Ok(DashboardConfig {
        data_dir,
        cache_dir,
        holdings_file: path("portfolio", "file", DEFAULT_HOLDINGS_FILE),
        scan_dir: path("portfolio", "scan_dir", DEFAULT_SCAN_DIR),
        fetch: FetchSettings {
            retry: RetryPolicy::new(max_attempts, delay),
            pacing: Duration::from_millis(pacing_ms),
            lookback_days: adapter.get_int("fetch", "lookback_days", DEFAULT_LOOKBACK_DAYS),
        },
        cache_ttl: Duration::from_secs(ttl_minutes.saturating_mul(60)),
        market_index: adapter
            .get_string("market", "index")
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| DEFAULT_MARKET_INDEX.to_string()),
        universe,
        aliases,
    })
}

fn new_dashboard<'a>(
    config: &DashboardConfig,
    source: &'a CsvPriceSource,
    bar_cache: &'a CsvBarCache,
    today: NaiveDate,
) -> Dashboard<'a> {
    Dashboard::new(source, config.fetch, AnalysisCache::new(config.cache_ttl), today)
        .with_bar_cache(bar_cache)
}

fn run_market(config: &DashboardConfig, today: NaiveDate) -> Result<(), DashboardError> {
    let source = CsvPriceSource::new(config.data_dir.clone());
    let bar_cache = CsvBarCache::new(config.cache_dir.clone());
    let mut dash = new_dashboard(config, &source, &bar_cache, today);
    let overview = dashboard::market_overview(&mut dash, &config.market_index);
    print!("{}", text_report::format_market(&overview));
    Ok(())
}

fn run_search(
    config: &DashboardConfig,
    today: NaiveDate,
    query: &str,
) -> Result<(), DashboardError> {
    let source = CsvPriceSource::new(config.data_dir.clone());
    let bar_cache = CsvBarCache::new(config.cache_dir.clone());
    let mut dash = new_dashboard(config, &source, &bar_cache, today);
    let details = dashboard::stock_details(&mut dash, &config.aliases, query)?;
    print!("{}", text_report::format_stock_details(&details));
    Ok(())
}

fn run_screen(
    config: &DashboardConfig,
    today: NaiveDate,
    scan_id: Option<String>,
) -> Result<(), DashboardError> {
    let scan_id = scan_id.unwrap_or_else(|| Local::now().format("%Y%m%d-%H%M%S").to_string());
    let store = CsvScanStore::new(config.scan_dir.clone());
    // Fail on a bad id before fetching anything.
    store.scan_path(&scan_id)?;

    let source = CsvPriceSource::new(config.data_dir.clone());
    let bar_cache = CsvBarCache::new(config.cache_dir.clone());
    let mut dash = new_dashboard(config, &source, &bar_cache, today);
    let overview = dashboard::market_overview(&mut dash, &config.market_index);
    print!("{}", text_report::format_market(&overview));

    let report = screener::run_screener(&mut dash, &config.universe);
    store.save(&scan_id, &report.candidates)?;
    print!("{}", text_report::format_screener(&report, &scan_id));
    Ok(())
}

fn run_buy(
    config: &DashboardConfig,
    today: NaiveDate,
    scan_id: &str,
    ticker: &str,
    quantity: f64,
) -> Result<(), DashboardError> {
    let candidates = CsvScanStore::new(config.scan_dir.clone()).load(scan_id)?;
    let repo = CsvHoldingRepository::new(config.holdings_file.clone());
    let store = PositionStore::new(&repo);
    let index =
        screener::buy_candidate(&store, &candidates, ticker, quantity, EntryDate::On(today))?;
    println!(
        "Added {} shares of {} to portfolio as holding {}",
        quantity,
        ticker.trim().to_uppercase(),
        index
    );
    Ok(())
}

fn run_portfolio(config: &DashboardConfig, today: NaiveDate) -> Result<(), DashboardError> {
    let source = CsvPriceSource::new(config.data_dir.clone());
    let bar_cache = CsvBarCache::new(config.cache_dir.clone());
    let mut dash = new_dashboard(config, &source, &bar_cache, today);
    let repo = CsvHoldingRepository::new(config.holdings_file.clone());
    let store = PositionStore::new(&repo);
    let review = portfolio::review_portfolio(&mut dash, &store)?;
    print!("{}", text_report::format_portfolio(&review));
    Ok(())
}

fn run_list(config: &DashboardConfig) -> Result<(), DashboardError> {
    let repo = CsvHoldingRepository::new(config.holdings_file.clone());
    let holdings = PositionStore::new(&repo).list()?;
    print!("{}", text_report::format_holdings(&holdings));
    Ok(())
}
