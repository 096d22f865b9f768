use std::path::PathBuf;

use azure_gateway_core::config::load_config;

pub fn run(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let routes = config.route_table();

    if routes.is_empty() {
        println!("No models configured.");
        return Ok(());
    }

    let width = routes.models().map(str::len).max().unwrap_or(0);

    println!("{:<width$}  DEPLOYMENT", "MODEL", width = width);
    for (model, deployment) in routes.entries() {
        let shown = if deployment.is_empty() { "(not configured)" } else { deployment };
        println!("{:<width$}  {}", model, shown, width = width);
    }

    Ok(())
}
