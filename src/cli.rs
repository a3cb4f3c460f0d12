//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
#[cfg(feature = "fmp")]
use crate::adapters::fmp_adapter::FmpAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{BacktestConfig, BacktestEngine, BacktestResult};
use crate::domain::config_validation::{
    data_source, strategy_name, strategy_params, validate_backtest_config, validate_data_config,
};
use crate::domain::error::BacktesterError;
use crate::domain::price_series::PriceSeries;
use crate::domain::signal::SignalStrategy;
use crate::domain::strategy::registry::StrategyRegistry;
use crate::domain::trade::TradeKind;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "cryptobt", about = "Moving-average backtester for cryptocurrency prices")]
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
        /// Overrides [backtest] symbol
        #[arg(long)]
        symbol: Option<String>,
        /// Write the annotated series as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List symbols known to the configured price source
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a configuration file without fetching data
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List registered strategies
    Strategies,
}

pub fn run(cli: Cli) -> ExitCode {
    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn execute(cli: Cli) -> Result<(), BacktesterError> {
    match cli.command {
        Command::Backtest {
            config,
            symbol,
            output,
        } => run_backtest(&config, symbol.as_deref(), output.as_deref()),
        Command::ListSymbols { config } => run_list_symbols(&config),
        Command::Validate { config } => run_validate(&config),
        Command::Strategies => {
            run_strategies();
            Ok(())
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, BacktesterError> {
    FileConfigAdapter::from_file(path)
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, BacktesterError> {
    let defaults = BacktestConfig::default();
    let starting_shares = adapter.get_int("backtest", "starting_shares", 0);
    let starting_shares = u64::try_from(starting_shares).map_err(|_| {
        BacktesterError::invalid(
            "backtest",
            "starting_shares",
            "starting_shares must be a non-negative integer",
        )
    })?;

    let config = BacktestConfig {
        initial_capital: adapter.get_double(
            "backtest",
            "initial_capital",
            defaults.initial_capital,
        ),
        in_position: adapter.get_bool("backtest", "in_position", defaults.in_position),
        starting_shares,
    };
    config.validate()?;
    Ok(config)
}

pub fn build_strategy(
    adapter: &dyn ConfigPort,
    registry: &StrategyRegistry,
) -> Result<Box<dyn SignalStrategy>, BacktesterError> {
    let name = strategy_name(adapter);
    let params = strategy_params(adapter, registry, &name)?;
    registry.create(&name, &params)
}

/// `--symbol` wins over `[backtest] symbol`.
pub fn resolve_symbol(
    symbol_override: Option<&str>,
    adapter: &dyn ConfigPort,
) -> Result<String, BacktesterError> {
    symbol_override
        .map(str::to_string)
        .or_else(|| adapter.get_string("backtest", "symbol"))
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| BacktesterError::missing("backtest", "symbol"))
}

pub fn build_data_port(adapter: &dyn ConfigPort) -> Result<Box<dyn DataPort>, BacktesterError> {
    validate_data_config(adapter)?;
    match data_source(adapter).as_str() {
        #[cfg(feature = "fmp")]
        "fmp" => Ok(Box::new(FmpAdapter::from_config(adapter)?)),
        _ => {
            let dir = adapter
                .get_string("data", "csv_dir")
                .ok_or_else(|| BacktesterError::missing("data", "csv_dir"))?;
            Ok(Box::new(CsvAdapter::new(PathBuf::from(dir.trim()))))
        }
    }
}

/// Fetch, validate and simulate. Nothing is simulated if the provider fails.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    strategy: Box<dyn SignalStrategy>,
    bt_config: BacktestConfig,
    symbol: &str,
) -> Result<BacktestResult, BacktesterError> {
    let bars = data_port.fetch_prices(symbol)?;
    let series = PriceSeries::from_unsorted(symbol, bars)?;
    info!(symbol, bars = series.len(), "price history loaded");

    let engine = BacktestEngine::new(series, strategy, bt_config)?;
    Ok(engine.run())
}

pub fn print_summary(result: &BacktestResult, initial_capital: f64) {
    let bars = result.series.bars();
    let (first, last) = (&bars[0], result.series.last());
    let total_return = (result.final_balance - initial_capital) / initial_capital;

    eprintln!("\n=== {} on {} ===", result.strategy, result.series.symbol());
    eprintln!("Period:           {} to {} ({} bars)", first.date, last.date, bars.len());
    eprintln!("Initial Capital:  {:.2}", initial_capital);
    eprintln!("Final Balance:    {:.2}", result.final_balance);
    eprintln!("Total Return:     {:.2}%", total_return * 100.0);
    eprintln!(
        "Trades:           {} buys, {} sells, {} liquidations",
        result.trades_of(TradeKind::Buy).count(),
        result.trades_of(TradeKind::Sell).count(),
        result.trades_of(TradeKind::Liquidation).count(),
    );

    if !result.trades.is_empty() {
        eprintln!("\n=== Trades ===");
        for trade in &result.trades {
            eprintln!(
                "  {}  {:<11} {:>8} @ {:.2}  balance {:.2}",
                trade.date,
                trade.kind.to_string(),
                trade.shares,
                trade.price,
                trade.balance_after,
            );
        }
    }
}

fn run_backtest(
    config_path: &Path,
    symbol_override: Option<&str>,
    output_path: Option<&Path>,
) -> Result<(), BacktesterError> {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = load_config(config_path)?;

    let registry = StrategyRegistry::with_defaults();
    validate_backtest_config(&adapter, &registry)?;
    let bt_config = build_backtest_config(&adapter)?;
    let strategy = build_strategy(&adapter, &registry)?;
    let symbol = resolve_symbol(symbol_override, &adapter)?;
    let data_port = build_data_port(&adapter)?;

    eprintln!("Running {} on {}", strategy.name(), symbol);
    let initial_capital = bt_config.initial_capital;
    let result = run_backtest_pipeline(data_port.as_ref(), strategy, bt_config, &symbol)?;

    print_summary(&result, initial_capital);

    if let Some(output) = output_path {
        CsvReportAdapter::new().write(&result, output)?;
        eprintln!("\nReport written to: {}", output.display());
    }
    Ok(())
}

fn run_list_symbols(config_path: &Path) -> Result<(), BacktesterError> {
    let adapter = load_config(config_path)?;
    let symbols = build_data_port(&adapter)?.list_symbols()?;

    if symbols.is_empty() {
        eprintln!("No symbols found");
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), BacktesterError> {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = load_config(config_path)?;

    let registry = StrategyRegistry::with_defaults();
    validate_backtest_config(&adapter, &registry)?;
    validate_data_config(&adapter)?;
    let bt_config = build_backtest_config(&adapter)?;
    let strategy = build_strategy(&adapter, &registry)?;

    eprintln!("\nStrategy: {}", strategy.name());
    eprintln!("Indicators to compute:");
    for indicator in strategy.required_indicators() {
        eprintln!("  {}", indicator);
    }
    eprintln!("\nInitial capital:  {:.2}", bt_config.initial_capital);
    eprintln!("In position:      {}", bt_config.in_position);
    eprintln!("Starting shares:  {}", bt_config.starting_shares);
    eprintln!("Data source:      {}", data_source(&adapter));
    if let Ok(symbol) = resolve_symbol(None, &adapter) {
        eprintln!("Symbol:           {}", symbol);
    }

    eprintln!("\nConfiguration is valid.");
    Ok(())
}

fn run_strategies() {
    let registry = StrategyRegistry::with_defaults();
    for name in registry.names() {
        if let Some(entry) = registry.get(name) {
            let windows: Vec<String> = entry.default_windows.iter().map(|w| w.to_string()).collect();
            println!("{:<14} windows {:<10} {}", name, windows.join(","), entry.description);
        }
    }
}
