//! FxSignal CLI: signal queries, analysis, risk and broadcast commands.
//!
//! Commands:
//! - `signal`: best trade recommendation for one symbol, or null
//! - `analyze`: multi-timeframe bias, confidence and confluences
//! - `scan`: raw results of the five setup detectors
//! - `risk`: position size, take-profit ladder and validation
//! - `kelly`: fractional Kelly risk recommendation
//! - `portfolio`: exposure, drawdown and daily report from a JSON snapshot
//! - `all`: batch signals across the universe
//! - `watch`: periodic broadcast, one JSON batch per line
//! - `config`: print the effective configuration as TOML
//!
//! Results go to stdout as JSON; logs go to stderr (`RUST_LOG` filters them).

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use fxsignal_core::data::{CircuitBreaker, CsvProvider, DataProvider, SyntheticProvider, YahooProvider};
use fxsignal_core::domain::{Direction, Interval};
use fxsignal_core::risk::{
    drawdown_metrics, kelly_sizing, portfolio_risk, risk_report, ClosedTrade, OpenPosition, RiskRequest,
};
use fxsignal_runner::{Broadcaster, Orchestrator, RunnerConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fxsignal", about = "FxSignal: forex setup detection and multi-timeframe signals")]
struct Cli {
    /// Path to a TOML runner config. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Where bars come from.
    #[arg(long, value_enum, default_value_t = Source::Yahoo, global = true)]
    source: Source,

    /// Directory of `<symbol>_<interval>.csv` files for `--source csv`.
    #[arg(long, default_value = "data", global = true)]
    data_dir: PathBuf,

    /// Seed for `--source synthetic`.
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Print single-line JSON.
    #[arg(long, default_value_t = false, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Source {
    Yahoo,
    Csv,
    Synthetic,
}

#[derive(Clone, Copy, ValueEnum)]
enum Side {
    Buy,
    Sell,
}

impl From<Side> for Direction {
    fn from(side: Side) -> Self {
        match side {
            Side::Buy => Direction::Buy,
            Side::Sell => Direction::Sell,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a trading signal for one symbol (null when nothing qualifies).
    Signal {
        symbol: String,

        /// Signal timeframe: 15m, 1h, 1d or 1wk.
        #[arg(long, default_value = "1h")]
        interval: Interval,
    },
    /// Multi-timeframe trend analysis for one symbol.
    Analyze { symbol: String },
    /// Run the five setup detectors over one symbol's history.
    Scan {
        symbol: String,

        #[arg(long, default_value = "1h")]
        interval: Interval,
    },
    /// Size a position and stage its take-profits.
    Risk {
        #[arg(long)]
        entry: f64,

        #[arg(long)]
        stop: f64,

        #[arg(long, value_enum)]
        direction: Side,

        /// Account balance. Defaults to the configured account.
        #[arg(long)]
        balance: Option<f64>,

        /// Percent of balance at risk. Defaults to the configured account.
        #[arg(long)]
        risk_pct: Option<f64>,

        /// Signal confidence to validate against the floor.
        #[arg(long)]
        confidence: Option<f64>,

        /// Force the reduced-risk week on or off instead of deriving it from today's date.
        #[arg(long)]
        reduced_risk: Option<bool>,
    },
    /// Fractional Kelly risk recommendation from trading statistics.
    Kelly {
        /// Win rate in percent.
        #[arg(long)]
        win_rate: f64,

        #[arg(long)]
        avg_win: f64,

        #[arg(long)]
        avg_loss: f64,

        #[arg(long, default_value_t = 100.0)]
        confidence: f64,

        #[arg(long)]
        balance: Option<f64>,
    },
    /// Exposure, drawdown and daily report from a JSON portfolio snapshot.
    Portfolio { snapshot: PathBuf },
    /// Generate signals for many symbols in parallel.
    All {
        /// Symbols to scan. Defaults to the configured universe.
        symbols: Vec<String>,

        #[arg(long, default_value = "1h")]
        interval: Interval,
    },
    /// Broadcast batches periodically as JSON lines.
    Watch {
        #[arg(long, default_value = "1h")]
        interval: Interval,

        /// Stop after this many batches. Runs until killed when omitted.
        #[arg(long)]
        ticks: Option<usize>,
    },
    /// Print the effective configuration as TOML.
    Config,
}

/// Portfolio snapshot read by the `portfolio` command.
#[derive(Debug, Deserialize)]
struct Snapshot {
    balance: Option<f64>,
    #[serde(default)]
    open_positions: Vec<OpenPosition>,
    #[serde(default)]
    closed_today: Vec<ClosedTrade>,
    #[serde(default)]
    equity_curve: Vec<f64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => RunnerConfig::from_file(path).with_context(|| format!("loading {}", path.display()))?,
        None => RunnerConfig::default(),
    };

    match cli.command {
        Commands::Signal { ref symbol, interval } => {
            let orch = orchestrator(&cli, config)?;
            let signal = orch.generate_signal(symbol, interval);
            if signal.is_none() {
                info!(symbol = %symbol, %interval, "no signal");
            }
            print_json(&signal, cli.compact)
        }
        Commands::Analyze { ref symbol } => {
            let orch = orchestrator(&cli, config)?;
            print_json(&orch.analyze_multi_timeframe(symbol), cli.compact)
        }
        Commands::Scan { ref symbol, interval } => {
            let orch = orchestrator(&cli, config)?;
            let reports = orch.scan_symbol(symbol, interval)?;
            print_json(&reports, cli.compact)
        }
        Commands::Risk {
            entry,
            stop,
            direction,
            balance,
            risk_pct,
            confidence,
            reduced_risk,
        } => {
            let request = RiskRequest {
                entry,
                stop,
                direction: direction.into(),
                balance: balance.unwrap_or(config.account.balance),
                risk_pct: risk_pct.unwrap_or(config.account.risk_pct),
                reduced_risk,
                confidence,
            };
            let assessment = fxsignal_core::risk::compute_risk(&request, Utc::now(), &config.engine.risk)?;
            print_json(&assessment, cli.compact)
        }
        Commands::Kelly {
            win_rate,
            avg_win,
            avg_loss,
            confidence,
            balance,
        } => {
            let balance = balance.unwrap_or(config.account.balance);
            let sizing = kelly_sizing(balance, win_rate, avg_win, avg_loss, confidence, &config.engine.risk)?;
            print_json(&sizing, cli.compact)
        }
        Commands::Portfolio { ref snapshot } => run_portfolio(snapshot, &config, cli.compact),
        Commands::All { ref symbols, interval } => {
            let symbols = if symbols.is_empty() {
                config.symbols.clone()
            } else {
                symbols.clone()
            };
            let orch = orchestrator(&cli, config)?;
            print_json(&orch.generate_all(&symbols, interval), cli.compact)
        }
        Commands::Watch { interval, ticks } => run_watch(&cli, config, interval, ticks),
        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

fn provider(cli: &Cli) -> Result<Arc<dyn DataProvider>> {
    Ok(match cli.source {
        Source::Yahoo => Arc::new(YahooProvider::new(Arc::new(CircuitBreaker::default_provider()))?),
        Source::Csv => {
            if !cli.data_dir.is_dir() {
                bail!("data directory {} does not exist", cli.data_dir.display());
            }
            Arc::new(CsvProvider::new(&cli.data_dir))
        }
        Source::Synthetic => Arc::new(SyntheticProvider::new(cli.seed, Utc::now())),
    })
}

fn orchestrator(cli: &Cli, config: RunnerConfig) -> Result<Orchestrator> {
    let provider = provider(cli)?;
    info!(provider = provider.name(), "data provider ready");
    Ok(Orchestrator::new(provider, config)?)
}

fn run_portfolio(path: &Path, config: &RunnerConfig, compact: bool) -> Result<()> {
    #[derive(Serialize)]
    struct Output {
        portfolio: fxsignal_core::risk::PortfolioRisk,
        drawdown: fxsignal_core::risk::DrawdownMetrics,
        report: fxsignal_core::risk::RiskReport,
    }

    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let snapshot: Snapshot = serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    let balance = snapshot.balance.unwrap_or(config.account.balance);
    let risk = &config.engine.risk;

    let output = Output {
        portfolio: portfolio_risk(&snapshot.open_positions, risk),
        drawdown: drawdown_metrics(&snapshot.equity_curve),
        report: risk_report(balance, &snapshot.open_positions, &snapshot.closed_today, Utc::now(), risk),
    };
    print_json(&output, compact)
}

fn run_watch(cli: &Cli, config: RunnerConfig, interval: Interval, ticks: Option<usize>) -> Result<()> {
    let orch = Arc::new(orchestrator(cli, config)?);
    let (tx, rx) = mpsc::channel();
    let broadcaster = Broadcaster::spawn(Arc::clone(&orch), interval, tx)?;

    let mut received = 0usize;
    for batch in rx.iter() {
        println!("{}", serde_json::to_string(&batch)?);
        received += 1;
        if ticks.is_some_and(|n| received >= n) {
            break;
        }
    }
    broadcaster.stop();
    Ok(())
}

fn print_json<T: Serialize>(value: &T, compact: bool) -> Result<()> {
    let text = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{text}");
    Ok(())
}
