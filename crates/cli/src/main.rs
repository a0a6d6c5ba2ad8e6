use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use feeguard_core::{
    config::AppConfig, metrics::install_prometheus_exporter, runtime::FeeguardRuntime,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
use commands::{
    handle_config_command, show_endpoints, show_fees, show_prices, ConfigCommands, OutputFormat,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Parser)]
#[command(name = "feeguard")]
#[command(about = "feeguard - unclaimed fee quotes and USD prices over unreliable RPC providers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the configuration file
    #[arg(long, global = true, env = "FEEGUARD_CONFIG", default_value = "config/config.toml")]
    config: String,

    /// Log output format (overrides the configuration)
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    /// Expose Prometheus metrics on this port while the command runs
    #[arg(long, global = true)]
    metrics_port: Option<u16>,
}

#[derive(Subcommand)]
enum Commands {
    /// Quote unclaimed fees of one or more positions
    Fees {
        /// Position ids (decimal)
        #[arg(required = true)]
        position_ids: Vec<String>,

        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Look up USD prices
    Price {
        /// Token symbols, e.g. WETH USDC
        #[arg(required = true)]
        symbols: Vec<String>,
    },

    /// Show endpoint health
    Endpoints {
        /// Call eth_blockNumber on every endpoint first
        #[arg(long)]
        probe: bool,
    },

    /// Configuration Management
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Initializes the logging system.
///
/// `RUST_LOG` wins when set; otherwise the configured level applies to feeguard crates and
/// everything else logs warnings only.
fn init_logging(config: &AppConfig, format_override: Option<LogFormat>) {
    let filter = EnvFilter::try_from_env("RUST_LOG").unwrap_or_else(|_| {
        let level = &config.logging.level;
        EnvFilter::new(format!("warn,feeguard_core={level},feeguard={level}"))
    });

    let json = match format_override {
        Some(format) => format == LogFormat::Json,
        None => config.logging.format == "json",
    };

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)).init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .pretty()
            .with_file(true)
            .with_line_number(true)
            .with_target(false)
            .with_writer(std::io::stderr);
        registry.with(fmt_layer).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::from_file(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config))?;
    init_logging(&config, cli.log_format);

    if let Some(port) = cli.metrics_port {
        install_prometheus_exporter(port).context("failed to start prometheus exporter")?;
        info!(port = port, "prometheus exporter listening");
    }

    if let Commands::Config(command) = cli.command {
        handle_config_command(command, &config)?;
        return Ok(());
    }

    let runtime =
        FeeguardRuntime::builder().with_config(config).enable_rate_limit_scheduler().build()?;

    let result = match &cli.command {
        Commands::Fees { position_ids, format } => show_fees(&runtime, position_ids, *format).await,
        Commands::Price { symbols } => show_prices(&runtime, symbols).await,
        Commands::Endpoints { probe } => show_endpoints(&runtime, *probe).await,
        Commands::Config(_) => Ok(()),
    };

    runtime.shutdown().await;
    result?;

    Ok(())
}
