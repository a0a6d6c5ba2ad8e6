use feeguard_core::runtime::FeeguardRuntime;
use prettytable::{row, Table};

use super::utils::CliResult;

pub async fn show_prices(runtime: &FeeguardRuntime, symbols: &[String]) -> CliResult<()> {
    let cache = runtime.price_cache();
    let symbols: Vec<&str> = symbols.iter().map(String::as_str).collect();
    let prices = cache.get_prices(&symbols).await;

    let mut table = Table::new();
    table.add_row(row!["Symbol", "USD", "Source"]);

    for symbol in &symbols {
        let key = symbol.to_uppercase();
        let price = prices.get(&key).copied().unwrap_or_default();
        let source = match cache.cached_entry(&key) {
            Some(entry) => format!("feed @ {}", entry.fetched_at_utc.format("%H:%M:%S")),
            None if cache.fallback_price(&key).is_some() => "fallback constant".to_string(),
            None => "unknown".to_string(),
        };
        table.add_row(row![key, format!("{price:.4}"), source]);
    }

    table.printstd();
    Ok(())
}
