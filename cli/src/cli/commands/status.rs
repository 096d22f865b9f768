use std::path::PathBuf;

use azure_gateway_core::config::{load_config, Config};

pub async fn run(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    println!("Azure Gateway Status");
    println!("====================");
    println!();
    println!("Configuration:");
    println!("  Config file: {}", describe_source(&config));
    println!("  Backend: {}", config.backend_base_url());
    println!("  API version: {}", config.azure.api_version);
    println!("  Stream pacing: {}ms", config.streaming.pacing_ms);
    println!();
    println!("Server settings:");
    println!("  Host: {}", config.server.host);
    println!("  Port: {}", config.server.port);
    println!();

    let routes = config.route_table();
    let usable = routes.entries().filter(|(_, d)| !d.is_empty()).count();

    println!("Models:");
    println!("  Configured: {}", routes.len());
    println!("  With deployment: {}", usable);

    // Check if server is reachable
    println!();
    let url = format!("http://{}:{}/v1/models", config.server.host, config.server.port);
    match reqwest::get(&url).await {
        Ok(resp) if resp.status().is_success() => {
            let served = resp
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|v| v["data"].as_array().map(|d| d.len()))
                .unwrap_or(0);
            println!("Server: RUNNING ✓ ({} model(s) listed)", served);
        }
        _ => {
            println!("Server: NOT RUNNING");
        }
    }

    Ok(())
}

/// The file the loaded configuration came from
fn describe_source(config: &Config) -> String {
    match &config.source {
        Some(path) => path.display().to_string(),
        None => "none (built-in defaults)".to_string(),
    }
}
