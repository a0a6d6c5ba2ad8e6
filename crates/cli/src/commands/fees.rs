use clap::ValueEnum;
use feeguard_core::{runtime::FeeguardRuntime, types::FeeQuote};

use super::utils::CliResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

pub async fn show_fees(
    runtime: &FeeguardRuntime,
    position_ids: &[String],
    format: OutputFormat,
) -> CliResult<()> {
    for position_id in position_ids {
        let quote = runtime.fee_resolver().get_unclaimed_fees(position_id).await?;
        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&quote)?),
            OutputFormat::Text => print!("{}", render_quote(&quote)),
        }
    }
    Ok(())
}

fn render_quote(quote: &FeeQuote) -> String {
    let usd = quote.usd_value.map_or_else(|| "unpriced".to_string(), |v| format!("${v:.2}"));
    let mut out = format!(
        "Position {} ({})\n  token0 {}: {}\n  token1 {}: {}\n  total: {usd}\n",
        quote.position_id,
        quote.source_method,
        quote.token0,
        quote.token0_raw,
        quote.token1,
        quote.token1_raw,
    );
    if let Some(breakdown) = &quote.usd_breakdown {
        out.push_str(&format!(
            "  breakdown: ${:.2} + ${:.2}\n",
            breakdown.token0_usd, breakdown.token1_usd
        ));
    }
    out
}
