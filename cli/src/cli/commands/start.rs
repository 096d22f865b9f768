use std::path::PathBuf;

use azure_gateway_core::config::load_config;
use azure_gateway_core::proxy::GatewayServer;

pub async fn run(
    config_path: Option<PathBuf>,
    host_override: Option<String>,
    port_override: Option<u16>,
) -> anyhow::Result<()> {
    // Load configuration
    let mut config = load_config(config_path)?;

    if let Some(host) = host_override {
        config.server.host = host;
    }
    if let Some(port) = port_override {
        config.server.port = port;
    }

    tracing::info!("Starting Azure Gateway...");
    tracing::info!("  Host: {}", config.server.host);
    tracing::info!("  Port: {}", config.server.port);
    tracing::info!("  Backend: {}", config.backend_base_url());
    tracing::info!("  API version: {}", config.azure.api_version);

    if config.azure.resource_name.is_empty() && config.azure.endpoint.is_none() {
        tracing::warn!("No Azure resource configured. Set RESOURCE_NAME or [azure] resource_name.");
    }

    let routes = config.route_table();
    let usable = routes.entries().filter(|(_, d)| !d.is_empty()).count();
    if usable == 0 {
        tracing::warn!("No model has a deployment configured; every completion request will be rejected.");
    } else {
        tracing::info!("Serving {} of {} configured model(s)", usable, routes.len());
    }

    let server = GatewayServer::new(&config)?;

    tracing::info!("Gateway starting on http://{}:{}", config.server.host, config.server.port);
    tracing::info!("Press Ctrl+C to stop");

    // Run server (blocks until shutdown)
    server.run().await?;

    Ok(())
}
