//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_market_adapter::CsvMarketAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::paper_execution_adapter::{ExecutionStyle, PaperExecutionAdapter};
use crate::domain::config_validation::{
    validate_costs_config, validate_run_config, validate_strategy_config,
};
use crate::domain::error::QuantscreenError;
use crate::domain::runner;
use crate::domain::strategy::{self, Strategy};
use crate::domain::weights::Allocator;
use crate::ports::config_port::ConfigPort;
use crate::ports::market_port::MarketDataPort;

#[derive(Parser, Debug)]
#[command(name = "quantscreen", about = "Factor-based equity screener and rebalancer")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evaluate the configured strategy for one date and print the selection
    Screen {
        #[arg(short, long)]
        config: PathBuf,
        /// Evaluation date (YYYY-MM-DD); defaults to the last trading day
        #[arg(long)]
        date: Option<String>,
    },
    /// Run the strategy across the configured date range
    Run {
        #[arg(short, long)]
        config: PathBuf,
        /// Directory for orders.csv and metrics.csv
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List the built-in strategies
    ListStrategies,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Screen { config, date } => run_screen(&config, date.as_deref()),
        Command::Run { config, output } => run_run(&config, output.as_ref()),
        Command::Validate { config } => run_validate(&config),
        Command::ListStrategies => run_list_strategies(),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = QuantscreenError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Resolve the configured strategy and apply the [strategy] overrides.
pub fn build_strategy(adapter: &dyn ConfigPort) -> Result<Strategy, QuantscreenError> {
    let name = adapter.get_string("strategy", "name").ok_or_else(|| {
        QuantscreenError::ConfigMissing {
            section: "strategy".into(),
            key: "name".into(),
        }
    })?;
    let mut strategy = strategy::by_name(name.trim())?;

    if let Some(capacity) = positive_int(adapter, "strategy", "capacity") {
        strategy.pipeline.selection.set_capacity(capacity);
    }
    strategy.gross_leverage =
        adapter.get_double("strategy", "gross_leverage", strategy.gross_leverage);
    strategy.allocator = match strategy.allocator {
        Allocator::EqualWeight { safety_margin } => Allocator::EqualWeight {
            safety_margin: adapter.get_double("strategy", "safety_margin", safety_margin),
        },
        Allocator::CappedEqualWeight { max_position } => Allocator::CappedEqualWeight {
            max_position: adapter.get_double("strategy", "max_position_size", max_position),
        },
        Allocator::LongShort => Allocator::LongShort,
    };

    Ok(strategy)
}

pub fn build_execution_style(adapter: &dyn ConfigPort) -> ExecutionStyle {
    let defaults = ExecutionStyle::default();
    ExecutionStyle {
        slippage_bps: adapter.get_double("costs", "slippage_bps", defaults.slippage_bps),
        volume_limit: adapter.get_double("costs", "volume_limit", defaults.volume_limit),
        commission_per_share: adapter.get_double(
            "costs",
            "commission_per_share",
            defaults.commission_per_share,
        ),
        min_commission: adapter.get_double("costs", "min_commission", defaults.min_commission),
    }
}

pub fn build_run_range(
    adapter: &dyn ConfigPort,
) -> Result<(NaiveDate, NaiveDate), QuantscreenError> {
    let start = parse_config_date(adapter, "start_date")?;
    let end = parse_config_date(adapter, "end_date")?;
    Ok((start, end))
}

fn parse_config_date(
    adapter: &dyn ConfigPort,
    key: &str,
) -> Result<NaiveDate, QuantscreenError> {
    let raw = adapter.get_string("run", key).ok_or_else(|| {
        QuantscreenError::ConfigMissing {
            section: "run".into(),
            key: key.into(),
        }
    })?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| QuantscreenError::ConfigInvalid {
        section: "run".into(),
        key: key.into(),
        reason: "invalid date format (expected YYYY-MM-DD)".into(),
    })
}

fn positive_int(adapter: &dyn ConfigPort, section: &str, key: &str) -> Option<usize> {
    let value = adapter.get_int(section, key, 0);
    if value > 0 { Some(value as usize) } else { None }
}

fn open_market(adapter: &dyn ConfigPort) -> Result<CsvMarketAdapter, QuantscreenError> {
    let data_dir = adapter.get_string("run", "data_dir").ok_or_else(|| {
        QuantscreenError::ConfigMissing {
            section: "run".into(),
            key: "data_dir".into(),
        }
    })?;
    CsvMarketAdapter::open(data_dir)
}

fn run_screen(config_path: &PathBuf, date_override: Option<&str>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_run_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    if let Err(e) = validate_strategy_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let strategy = match build_strategy(&adapter) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    eprintln!("Screening with strategy: {}", strategy.name);

    let market = match open_market(&adapter) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let date = match resolve_screen_date(&adapter, &market, date_override) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let snapshot = match market.snapshot(date, strategy.kind.lookback()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let output = match strategy.evaluate(&snapshot) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("Selection for {}:", date);
    for id in &output.longs {
        println!("{}\t{:.4}", id, output.composite_of(id));
    }
    for id in &output.shorts {
        println!("{}\t{:.4}\tshort", id, output.composite_of(id));
    }
    if output.longs.is_empty() && output.shorts.is_empty() {
        eprintln!("No securities passed the screen");
    }
    ExitCode::SUCCESS
}

fn resolve_screen_date(
    adapter: &dyn ConfigPort,
    market: &CsvMarketAdapter,
    date_override: Option<&str>,
) -> Result<NaiveDate, QuantscreenError> {
    if let Some(raw) = date_override {
        return NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
            QuantscreenError::ConfigInvalid {
                section: "run".into(),
                key: "date".into(),
                reason: "invalid date format (expected YYYY-MM-DD)".into(),
            }
        });
    }
    let (start, end) = build_run_range(adapter)?;
    market
        .trading_days(start, end)?
        .last()
        .copied()
        .ok_or_else(|| QuantscreenError::Data {
            reason: format!("no trading days between {} and {}", start, end),
        })
}

fn run_run(config_path: &PathBuf, output_path: Option<&PathBuf>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    for check in [
        validate_run_config(&adapter),
        validate_strategy_config(&adapter),
        validate_costs_config(&adapter),
    ] {
        if let Err(e) = check {
            eprintln!("error: {e}");
            return (&e).into();
        }
    }

    let strategy = match build_strategy(&adapter) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let (start, end) = match build_run_range(&adapter) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let market = match open_market(&adapter) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let mut exec = PaperExecutionAdapter::new(build_execution_style(&adapter));

    eprintln!(
        "Running {} from {} to {}",
        strategy.name, start, end
    );
    let summary = match runner::run(&strategy, &market, &mut exec, start, end) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("\n=== Run Summary ===");
    eprintln!("Trading days:   {}", summary.days);
    eprintln!("Rebalances:     {}", summary.rebalances);
    eprintln!("Liquidations:   {}", summary.liquidations);
    eprintln!("Orders:         {}", exec.orders().len());
    eprintln!("Est. slippage:  {:.4}% of capital", exec.total_slippage() * 100.0);

    let output_dir = output_path
        .cloned()
        .unwrap_or_else(|| PathBuf::from("."));
    if let Err(e) = fs::create_dir_all(&output_dir) {
        eprintln!("error: failed to create {}: {}", output_dir.display(), e);
        return ExitCode::from(1);
    }
    let orders_path = output_dir.join("orders.csv");
    let metrics_path = output_dir.join("metrics.csv");
    if let Err(e) = exec.write_orders_csv(&orders_path) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    if let Err(e) = exec.write_metrics_csv(&metrics_path) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    eprintln!("\nOrders written to:  {}", orders_path.display());
    eprintln!("Metrics written to: {}", metrics_path.display());
    ExitCode::SUCCESS
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    for check in [
        validate_run_config(&adapter),
        validate_strategy_config(&adapter),
        validate_costs_config(&adapter),
    ] {
        if let Err(e) = check {
            eprintln!("error: {e}");
            return (&e).into();
        }
    }
    match build_strategy(&adapter) {
        Ok(strategy) => {
            eprintln!("\nStrategy: {}", strategy.name);
            eprintln!("  {}", strategy.description);
            eprintln!("\nConfiguration is valid.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_list_strategies() -> ExitCode {
    for strategy in strategy::all() {
        println!("{:<20} {}", strategy.name, strategy.description);
    }
    ExitCode::SUCCESS
}
