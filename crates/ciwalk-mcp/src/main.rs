//! Ciwalk MCP server binary.
//!
//! This binary runs the MCP server using stdio transport.
//!
//! Configuration is read from `CIWALK_CONFIG`, falling back to
//! `.ciwalk/config.yaml` in the working directory. Setting `CIWALK_FIXTURE`
//! serves a JSON snapshot instead of a live instance.

use anyhow::Context;
use ciwalk::config::{CONFIG_ENV, CiwalkConfig, PASSWORD_ENV};
use ciwalk_mcp::CiwalkMcpServer;
use ciwalk_mcp::tools::Tools;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Environment variable naming a JSON fixture to serve
const FIXTURE_ENV: &str = "CIWALK_FIXTURE";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the protocol, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting ciwalk-mcp server");

    let config_path = match std::env::var_os(CONFIG_ENV) {
        Some(path) => PathBuf::from(path),
        None => CiwalkConfig::default_path(&std::env::current_dir()?),
    };
    let config = CiwalkConfig::load_or_default(&config_path)
        .await
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?
        .with_password_override(std::env::var(PASSWORD_ENV).ok());
    let fixture = std::env::var_os(FIXTURE_ENV).map(PathBuf::from);

    let tools = Tools::from_config(&config, fixture.as_deref()).await?;
    tracing::info!(source = %tools.connection_info().source, "Record source ready");

    let server = CiwalkMcpServer::new(tools);
    server.run().await?;

    Ok(())
}
