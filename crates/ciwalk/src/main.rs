//! Ciwalk CLI binary.

use anyhow::Result;
use ciwalk::cli::Cli;
use tracing_subscriber::EnvFilter;

/// Main entry point for the ciwalk CLI.
///
/// Traversals issue one remote call at a time, so the current-thread runtime
/// is enough.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Controlled via RUST_LOG, e.g. RUST_LOG=ciwalk=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ciwalk=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Starting ciwalk CLI");

    let cli = Cli::parse_args();
    cli.execute().await?;

    tracing::debug!("Ciwalk CLI completed successfully");
    Ok(())
}
