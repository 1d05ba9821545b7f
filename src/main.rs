//! Rolegate - role-based authorization engine
//!
//! Boots the authorization service against the configured stores and keeps
//! it running until interrupted. Enforcement and administration happen
//! through the library API; this binary exists for operating the engine as
//! its own process.

#![allow(missing_docs)]

use std::process::ExitCode;

use rolegate::{AuthzService, Config};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging system
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Print error using Display (not Debug) to preserve newlines
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    // Config path: CLI argument, then environment, then the shipped default
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("ROLEGATE_CONFIG").ok())
        .unwrap_or_else(|| "config/rolegate.yaml".to_string());

    let config = match Config::from_file(&config_path).await {
        Ok(config) => config,
        Err(e) => {
            info!(
                "Configuration file '{}' not usable ({}), falling back to environment variables",
                config_path, e
            );
            Config::from_env()?
        }
    };

    let service = AuthzService::new(config).await?;
    service.start().await?;
    service.health_check().await?;
    info!("Authorization service ready, press Ctrl+C to stop");

    tokio::signal::ctrl_c().await?;
    service.shutdown().await;
    Ok(())
}
