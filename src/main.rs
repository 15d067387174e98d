use anyhow::Context;
use std::env;
use std::path::Path;
use std::process;
use studio_edge::{config::EdgeConfig, init_edge, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Get config file path from command line or use default
    let config_path = env::args()
        .nth(1)
        .unwrap_or_else(|| "config/edge.yaml".to_string());

    // Load configuration
    let config = match EdgeConfig::load(Some(Path::new(&config_path))) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration from {}: {}", config_path, e);
            eprintln!("Usage: studio-edge [config_file]");
            process::exit(1);
        }
    };

    init_tracing(&config.logging);

    init_edge(config).await.context("edge server failed")?;
    Ok(())
}
