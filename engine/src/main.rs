// crypto-signal command line entry point
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shared::utils::{format_percent, format_usd};
use signal_engine::config::settings::LoggingConfig;
use signal_engine::config::ConfigLoader;
use signal_engine::data::ApiStatus;
use signal_engine::logging;
use signal_engine::services::AnalysisService;
use signal_engine::EngineError;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "crypto-signal",
    version,
    about = "Technical-indicator analysis and alerts for crypto assets"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse a single currency (e.g. BTC, ETH).
    Analyze {
        symbol: String,

        /// Print the full analysis as JSON instead of the console report.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Send the report to the configured notification channels.
        #[arg(long, default_value_t = false)]
        notify: bool,
    },
    /// Analyse every enabled currency.
    AnalyzeAll {
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Watch prices and send alerts until interrupted with Ctrl-C.
    Monitor,
    /// Check the market data provider and every notification channel.
    Test,
    /// Show descriptive information about a currency.
    Info { symbol: String },
    /// Show current prices for every enabled currency.
    Prices,
    /// List the coins the market data provider supports.
    Coins,
    /// Write a configuration template with the default values.
    Template { path: PathBuf },
}

/// Console output always; the log file is added when it can be opened.
/// A file problem is returned so it can be logged once tracing is up.
fn init_tracing(config: &LoggingConfig) -> Option<String> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let (appender, problem) = match &config.file {
        Some(path) => match logging::file_appender(config, path) {
            Ok(appender) => (Some(appender), None),
            Err(e) => (
                None,
                Some(format!("cannot log to {} ({}), using the console only", path.display(), e)),
            ),
        },
        None => (None, None),
    };
    let file_layer = appender.map(|appender| {
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(appender))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();
    problem
}

/// Exit status for a failed analysis: 2 when the input was at fault.
fn report_analysis_error(symbol: &str, e: &EngineError) -> ExitCode {
    eprintln!("❌ {}: {}", symbol, e);
    if e.is_input_error() {
        eprintln!("   hint: raise analysis.lookback_days or check the indicator periods");
        ExitCode::from(2)
    } else {
        ExitCode::FAILURE
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    if let Commands::Template { path } = &cli.command {
        ConfigLoader::create_template(path)
            .with_context(|| format!("writing template to {}", path.display()))?;
        println!("Configuration template written to {}", path.display());
        return Ok(ExitCode::SUCCESS);
    }

    let mut loader = ConfigLoader::new(cli.config.clone());
    let config_path = loader.path().to_path_buf();
    let config = loader
        .load()
        .with_context(|| format!("loading configuration from {}", config_path.display()))?
        .clone();
    let log_problem = init_tracing(&config.logging);
    info!(version = env!("CARGO_PKG_VERSION"), config = %config_path.display(), "Starting crypto-signal");
    if let Some(problem) = log_problem {
        warn!("{}", problem);
    }
    for warning in loader.warnings() {
        warn!("Configuration check: {}", warning);
    }

    let service = AnalysisService::from_config(config).context("initialising analysis service")?;

    match cli.command {
        Commands::Analyze { symbol, json, notify } => {
            let analysis = match service.analyze_currency(&symbol).await {
                Ok(analysis) => analysis,
                Err(e) => return Ok(report_analysis_error(&symbol.to_uppercase(), &e)),
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&analysis)?);
            } else {
                println!("{}", AnalysisService::render_analysis(&analysis));
            }
            if notify {
                service.send_analysis_report(&analysis).await;
            }
        }
        Commands::AnalyzeAll { json } => {
            for (symbol, outcome) in service.analyze_all().await {
                match outcome {
                    Ok(analysis) if json => println!("{}", serde_json::to_string_pretty(&analysis)?),
                    Ok(analysis) => println!("{}", AnalysisService::render_analysis(&analysis)),
                    Err(e) => {
                        report_analysis_error(&symbol, &e);
                    }
                }
            }
        }
        Commands::Monitor => {
            if !service.config().monitoring.enabled {
                warn!("Monitoring is disabled in the configuration");
                return Ok(ExitCode::SUCCESS);
            }
            let tests = service.test_notifications().await;
            if !tests.iter().any(|(_, ok)| *ok) {
                warn!("No notification channel is reachable; continuing without notifications");
            }

            let (tx, rx) = watch::channel(false);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Ctrl-C received, stopping monitor");
                    let _ = tx.send(true);
                }
            });
            println!("Monitoring started, press Ctrl-C to stop");
            service.monitor(rx).await;
            println!("Monitoring stopped");
        }
        Commands::Test => {
            let (provider, status) = service.provider_status().await;
            let icon = if status == ApiStatus::Online { "✅" } else { "❌" };
            println!("{} {} API: {}", icon, provider, status);
            for (channel, ok) in service.test_notifications().await {
                println!("{} {} notification", if ok { "✅" } else { "❌" }, channel);
            }
            if !loader.telegram_enabled() {
                println!("ℹ️  Telegram is disabled or missing credentials");
            }
        }
        Commands::Info { symbol } => {
            let info = service
                .coin_info(&symbol)
                .await
                .with_context(|| format!("looking up {}", symbol.to_uppercase()))?;
            println!("{} ({})", info.name, info.symbol);
            if let Some(rank) = info.market_cap_rank {
                println!("Market cap rank: #{}", rank);
            }
            if let Some(homepage) = &info.homepage {
                println!("Homepage: {}", homepage);
            }
            if let Some(genesis) = &info.genesis_date {
                println!("Genesis: {}", genesis);
            }
            if !info.description.is_empty() {
                println!("{}", info.description);
            }
        }
        Commands::Prices => {
            for (symbol, quote) in service.prices().await.context("fetching prices")? {
                println!(
                    "{:<6} {:>16} {:>9}",
                    symbol,
                    format_usd(quote.price),
                    format_percent(quote.change_24h)
                );
            }
        }
        Commands::Coins => {
            for coin in service.supported_coins().await.context("listing coins")? {
                println!("{:<16} {:<8} {}", coin.id, coin.symbol, coin.name);
            }
        }
        Commands::Template { .. } => {}
    }
    Ok(ExitCode::SUCCESS)
}
