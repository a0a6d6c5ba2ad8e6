use clap::Subcommand;
use feeguard_core::config::AppConfig;
use std::path::Path;

use super::utils::{print_info, print_success, redact_url, CliError, CliResult};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Validate the configuration
    Validate,

    /// Show the effective configuration (file plus environment overrides)
    Show {
        /// Print provider URLs unredacted
        #[arg(long)]
        show_sensitive: bool,

        /// Print as TOML instead of a summary
        #[arg(long)]
        toml: bool,
    },

    /// Generate a sample configuration file
    Generate {
        /// Output path for the config file
        #[arg(short, long, default_value = "config/config.toml")]
        output: String,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn handle_config_command(command: ConfigCommands, config: &AppConfig) -> CliResult<()> {
    match command {
        ConfigCommands::Validate => validate_config(config),
        ConfigCommands::Show { show_sensitive, toml } => show_config(config, show_sensitive, toml),
        ConfigCommands::Generate { output, force } => generate_config(&output, force),
    }
}

fn validate_config(config: &AppConfig) -> CliResult<()> {
    print_info("Validating configuration...");
    config.validate()?;

    print_success("Configuration is valid!");

    println!("Configuration Summary:");
    println!("  Upstreams: {} providers", config.upstreams.providers.len());
    println!(
        "  Retry: {} attempts, {}ms base delay",
        config.retry.max_attempts, config.retry.base_delay_ms
    );
    println!("  Rate limit cooldown: {}s", config.rate_limit.cooldown_seconds);
    println!("  Tokens: {}", config.tokens.len());
    println!("  Price TTL: {}s", config.pricing.ttl_seconds);

    Ok(())
}

fn show_config(config: &AppConfig, show_sensitive: bool, as_toml: bool) -> CliResult<()> {
    let mut config = config.clone();
    if !show_sensitive {
        for provider in &mut config.upstreams.providers {
            provider.url = redact_url(&provider.url);
        }
    }

    if as_toml {
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    let mut providers = config.upstreams.providers.clone();
    providers.sort_by_key(|p| p.priority);
    println!("[Upstreams] ({} providers)", providers.len());
    for provider in &providers {
        println!(
            "  {} (priority {}): {} timeout {}s",
            provider.name, provider.priority, provider.url, provider.timeout_seconds
        );
    }

    println!("\n[Retry]");
    println!("  Max Attempts: {}", config.retry.max_attempts);
    println!("  Base Delay: {}ms", config.retry.base_delay_ms);
    match config.retry.total_timeout_ms {
        Some(ms) => println!("  Total Timeout: {ms}ms"),
        None => println!("  Total Timeout: none"),
    }

    println!("\n[Rate Limit]");
    println!("  Cooldown: {}s", config.rate_limit.cooldown_seconds);
    println!("  Reset Interval: {}s", config.rate_limit.reset_interval_seconds);
    println!("  Max Error Count: {}", config.rate_limit.max_error_count);

    println!("\n[Contracts]");
    println!("  Chain ID: {}", config.contracts.chain_id);
    println!("  Position Manager: {}", config.contracts.position_manager);

    println!("\n[Tokens]");
    for token in &config.tokens {
        println!("  {}: {} ({} decimals)", token.symbol, token.address, token.decimals);
    }

    println!("\n[Pricing]");
    println!("  Base URL: {}", config.pricing.base_url);
    println!("  TTL: {}s", config.pricing.ttl_seconds);
    let mut fallbacks: Vec<_> = config.pricing.fallback_prices.iter().collect();
    fallbacks.sort_by(|a, b| a.0.cmp(b.0));
    for (symbol, price) in fallbacks {
        println!("  Fallback {symbol}: ${price}");
    }

    println!("\n[Logging]");
    println!("  Level: {}", config.logging.level);
    println!("  Format: {}", config.logging.format);

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# feeguard configuration

# Lower priority is preferred. Keep 4-6 providers so a rate-limited one can be skipped.
[[upstreams.providers]]
name = "llama"
url = "https://eth.llamarpc.com"
priority = 1
timeout_seconds = 10

[[upstreams.providers]]
name = "publicnode"
url = "https://ethereum-rpc.publicnode.com"
priority = 2
timeout_seconds = 10

[[upstreams.providers]]
name = "infura"
url = "https://mainnet.infura.io/v3/YOUR_API_KEY"
priority = 3
timeout_seconds = 10

[[upstreams.providers]]
name = "alchemy"
url = "https://eth-mainnet.g.alchemy.com/v2/YOUR_API_KEY"
priority = 4
timeout_seconds = 10

[retry]
max_attempts = 3
base_delay_ms = 1000
# total_timeout_ms = 20000

[rate_limit]
cooldown_seconds = 60
reset_interval_seconds = 60
max_error_count = 5

[contracts]
chain_id = 1
position_manager = "0xC36442b4a4522E871399CD717aBDD847Ab11FE88"

[[tokens]]
symbol = "WETH"
address = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"
decimals = 18

[[tokens]]
symbol = "USDC"
address = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"
decimals = 6

[pricing]
base_url = "https://api.coingecko.com/api/v3"
ttl_seconds = 30
request_timeout_seconds = 10

[pricing.feed_ids]
WETH = "weth"
USDC = "usd-coin"

[pricing.fallback_prices]
WETH = 3000.0
USDC = 1.0

[http]
concurrent_limit = 64
permit_timeout_ms = 2000

[logging]
level = "info"
format = "pretty"
"#;

fn generate_config(output: &str, force: bool) -> CliResult<()> {
    if Path::new(output).exists() && !force {
        return Err(CliError::Config(format!(
            "File {output} already exists. Use --force to overwrite."
        )));
    }

    if let Some(parent) = Path::new(output).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output, SAMPLE_CONFIG)?;

    print_success(&format!("Sample configuration generated: {output}"));
    print_info("Remember to:");
    print_info("  1. Replace YOUR_API_KEY placeholders with real API keys");
    print_info("  2. Add the tokens you need priced");

    Ok(())
}
