use feeguard_core::{
    runtime::FeeguardRuntime,
    upstream::{EndpointSnapshot, HttpTransport, RpcClient, RpcTransport},
};
use prettytable::{row, Table};
use serde_json::json;
use std::sync::Arc;

use super::utils::{print_info, redact_url, CliResult};

/// Prints the registry state, optionally after probing every endpoint once with
/// `eth_blockNumber`. Probe outcomes feed the registry exactly like real calls do.
pub async fn show_endpoints(runtime: &FeeguardRuntime, probe: bool) -> CliResult<()> {
    let registry = runtime.registry();

    if probe {
        let transport: Arc<dyn RpcTransport> =
            Arc::new(HttpTransport::new(Arc::clone(runtime.components().http_client())));
        print_info(&format!("Probing {} endpoints...", registry.len()));

        for endpoint in registry.endpoints() {
            let client = RpcClient::new(Arc::clone(endpoint), Arc::clone(&transport));
            match client.request("eth_blockNumber", json!([])).await {
                Ok(block) => {
                    registry.mark_success(endpoint);
                    tracing::info!(endpoint = %endpoint.name(), block = %block, "probe succeeded");
                }
                Err(e) => {
                    registry.mark_error(endpoint, e.is_rate_limit());
                    tracing::warn!(endpoint = %endpoint.name(), error = %e, "probe failed");
                }
            }
        }
    }

    render_table(&registry.snapshots()).printstd();
    Ok(())
}

fn render_table(snapshots: &[EndpointSnapshot]) -> Table {
    let mut table = Table::new();
    table.add_row(row!["Name", "URL", "Priority", "State", "Errors", "Cooldown"]);

    for snapshot in snapshots {
        table.add_row(row![
            snapshot.name,
            redact_url(&snapshot.url),
            snapshot.priority,
            snapshot.state.as_str(),
            snapshot.error_count,
            snapshot
                .rate_limit_remaining_ms
                .map_or("-".to_string(), |ms| format!("{}s", ms.div_ceil(1000))),
        ]);
    }

    table
}
