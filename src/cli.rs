//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::NaiveDate;
use tracing::info;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestResult, EndOfDataPolicy};
use crate::domain::config_validation::{parse_date, parse_key, validate_config};
use crate::domain::error::TraderError;
use crate::domain::execution::ExecutionConfig;
use crate::domain::indicator::IndicatorEngine;
use crate::domain::metrics::Metrics;
use crate::domain::strategy::StrategyParams;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "trendtrader", about = "EMA/ATR trend-following backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Overrides [data] directory
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Overrides [data] symbol
        #[arg(long)]
        symbol: Option<String>,
        /// Directory for trades.csv, equity.csv and summary.txt
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file and print the resolved parameters
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List symbols available in a data directory
    Symbols {
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

/// Where the bars for a run come from.
#[derive(Debug, Clone, PartialEq)]
pub struct DataRequest {
    pub directory: PathBuf,
    pub symbol: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            data_dir,
            symbol,
            output,
        } => run_backtest(
            &config,
            data_dir.as_deref(),
            symbol.as_deref(),
            output.as_deref(),
        ),
        Command::Validate { config } => run_validate(&config),
        Command::Symbols { data_dir, config } => run_symbols(data_dir.as_deref(), config.as_deref()),
    }
}

fn fail(err: TraderError) -> ExitCode {
    eprintln!("error: {err}");
    ExitCode::from(&err)
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, TraderError> {
    FileConfigAdapter::from_file(path).map_err(|e| TraderError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Validate the whole file, then resolve every value with its default.
pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, TraderError> {
    validate_config(config)?;

    let defaults = BacktestConfig::default();
    let sp = StrategyParams::default();
    let ec = ExecutionConfig::default();

    let strategy = StrategyParams {
        ema_fast: parse_key(config, "strategy", "ema_fast")?.unwrap_or(sp.ema_fast),
        ema_medium: parse_key(config, "strategy", "ema_medium")?.unwrap_or(sp.ema_medium),
        ema_slow: parse_key(config, "strategy", "ema_slow")?.unwrap_or(sp.ema_slow),
        atr_period: parse_key(config, "strategy", "atr_period")?.unwrap_or(sp.atr_period),
        atr_tp_factor: parse_key(config, "strategy", "atr_tp_factor")?.unwrap_or(sp.atr_tp_factor),
        atr_sl_factor: parse_key(config, "strategy", "atr_sl_factor")?.unwrap_or(sp.atr_sl_factor),
        atr_trail_factor: parse_key(config, "strategy", "atr_trail_factor")?
            .unwrap_or(sp.atr_trail_factor),
    };

    let execution = ExecutionConfig {
        commission_rate: parse_key(config, "broker", "commission_rate")?
            .unwrap_or(ec.commission_rate),
        order_size: parse_key(config, "broker", "order_size")?.unwrap_or(ec.order_size),
        margin_check: config.get_bool("broker", "margin_check", ec.margin_check),
    };

    let end_of_data = match config.get_string("backtest", "end_of_data") {
        Some(raw) => raw.parse::<EndOfDataPolicy>().map_err(|reason| {
            TraderError::ConfigInvalid {
                section: "backtest".into(),
                key: "end_of_data".into(),
                reason,
            }
        })?,
        None => defaults.end_of_data,
    };

    Ok(BacktestConfig {
        strategy,
        execution,
        initial_cash: parse_key(config, "broker", "initial_cash")?.unwrap_or(defaults.initial_cash),
        end_of_data,
    })
}

/// Resolve the data source; command-line overrides win over `[data]`.
pub fn build_data_request(
    config: &dyn ConfigPort,
    data_dir: Option<&Path>,
    symbol: Option<&str>,
) -> Result<DataRequest, TraderError> {
    let directory = match data_dir {
        Some(dir) => dir.to_path_buf(),
        None => resolve_data_dir(config)?,
    };

    let symbol = symbol
        .map(str::to_string)
        .or_else(|| config.get_string("data", "symbol"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| TraderError::ConfigMissing {
            section: "data".into(),
            key: "symbol".into(),
        })?;

    Ok(DataRequest {
        directory,
        symbol,
        start_date: parse_date(config, "start_date")?,
        end_date: parse_date(config, "end_date")?,
    })
}

fn resolve_data_dir(config: &dyn ConfigPort) -> Result<PathBuf, TraderError> {
    config
        .get_string("data", "directory")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| TraderError::ConfigMissing {
            section: "data".into(),
            key: "directory".into(),
        })
}

fn run_backtest(
    config_path: &Path,
    data_dir: Option<&Path>,
    symbol: Option<&str>,
    output: Option<&Path>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(e),
    };

    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    let request = match build_data_request(&adapter, data_dir, symbol) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };

    let data_port = CsvAdapter::new(request.directory.clone());
    let report_port = CsvReportAdapter::new();
    let report = output.map(|dir| (&report_port as &dyn ReportPort, dir));

    match run_backtest_pipeline(&data_port, &request, &bt_config, report) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => fail(e),
    }
}

/// Fetch, simulate, summarise and optionally write reports.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    request: &DataRequest,
    bt_config: &BacktestConfig,
    report: Option<(&dyn ReportPort, &Path)>,
) -> Result<(BacktestResult, Metrics), TraderError> {
    let bars = data_port.fetch_bars(&request.symbol, request.start_date, request.end_date)?;
    if bars.is_empty() {
        return Err(TraderError::NoData {
            symbol: request.symbol.clone(),
        });
    }
    info!(symbol = %request.symbol, bars = bars.len(), "bars loaded");

    eprintln!(
        "Running backtest: {}, {} bars, {} to {}",
        request.symbol,
        bars.len(),
        bars[0].timestamp.date(),
        bars[bars.len() - 1].timestamp.date(),
    );

    let result = backtest_engine::run_backtest(&bars, bt_config)?;
    let metrics = Metrics::compute(&result);

    eprintln!("\n=== Results ===");
    eprintln!("{metrics}");

    if let Some((port, dir)) = report {
        port.write(&result, &metrics, dir)?;
        eprintln!("\nReports written to: {}", dir.display());
    }

    Ok((result, metrics))
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(e),
    };

    let config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };

    let p = &config.strategy;
    let engine = IndicatorEngine::new(p.ema_fast, p.ema_medium, p.ema_slow, p.atr_period);
    let indicators: Vec<String> = engine
        .indicator_types()
        .iter()
        .map(|i| i.to_string())
        .collect();

    eprintln!("\nStrategy:");
    eprintln!("  indicators:   {}", indicators.join(", "));
    eprintln!("  warmup bars:  {}", engine.warmup_bars());
    eprintln!(
        "  ATR factors:  tp {} / sl {} / trail {}",
        p.atr_tp_factor, p.atr_sl_factor, p.atr_trail_factor
    );

    eprintln!("\nBroker:");
    eprintln!("  initial cash: {:.2}", config.initial_cash);
    eprintln!("  commission:   {}", config.execution.commission_rate);
    eprintln!("  order size:   {}", config.execution.order_size);
    eprintln!("  margin check: {}", config.execution.margin_check);
    eprintln!("  end of data:  {}", config.end_of_data);

    let symbol = adapter.get_string("data", "symbol").unwrap_or_default();
    let directory = adapter.get_string("data", "directory").unwrap_or_default();
    eprintln!("\nData:");
    eprintln!("  sections:     {}", adapter.sections().join(", "));
    eprintln!("  directory:    {}", directory);
    eprintln!("  symbol:       {}", symbol);

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_symbols(data_dir: Option<&Path>, config_path: Option<&Path>) -> ExitCode {
    let directory = match (data_dir, config_path) {
        (Some(dir), _) => dir.to_path_buf(),
        (None, Some(path)) => {
            match load_config(path).and_then(|c| resolve_data_dir(&c)) {
                Ok(dir) => dir,
                Err(e) => return fail(e),
            }
        }
        (None, None) => {
            eprintln!("error: --data-dir or --config is required for symbols");
            return ExitCode::from(2);
        }
    };

    let symbols = match CsvAdapter::new(directory.clone()).list_symbols() {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    if symbols.is_empty() {
        eprintln!("No symbols found in {}", directory.display());
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    ExitCode::SUCCESS
}
