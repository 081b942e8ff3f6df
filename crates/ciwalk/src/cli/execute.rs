//! Command execution logic.

use anyhow::{Context, Result};
use std::path::Path;
use tokio_util::sync::CancellationToken;

use super::args::TraverseArgs;
use crate::config::{CiwalkConfig, PASSWORD_ENV};
use crate::output::{self, OutputConfig, OutputMode};
use crate::query::RecordQuery;
use crate::query::http::TableApiClient;
use crate::query::in_memory::InMemoryRecordStore;
use crate::traversal::Traversal;

/// Execute the traverse command
pub async fn execute_traverse(args: &TraverseArgs, output_mode: OutputMode) -> Result<()> {
    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => CiwalkConfig::default_path(&std::env::current_dir()?),
    };
    let config = load_config(&config_path).await?;
    let store = open_store(&config, args.fixture.as_deref()).await?;

    let cancel = CancellationToken::new();
    let interrupt = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, cancelling traversal");
                cancel.cancel();
            }
        }
    });

    let request = args.to_request();
    let result = Traversal::new(store.as_ref(), &config.tables)
        .with_cancellation(cancel)
        .run(&request)
        .await;
    interrupt.abort();
    let result = result?;

    match output_mode {
        OutputMode::Json => output::print_json(&result)?,
        OutputMode::Text => output::print_traversal(&result, &OutputConfig::from_env())?,
    }
    Ok(())
}

async fn load_config(path: &Path) -> Result<CiwalkConfig> {
    let config = CiwalkConfig::load_or_default(path)
        .await
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    Ok(config.with_password_override(std::env::var(PASSWORD_ENV).ok()))
}

async fn open_store(
    config: &CiwalkConfig,
    fixture: Option<&Path>,
) -> Result<Box<dyn RecordQuery>> {
    if let Some(path) = fixture {
        let store = InMemoryRecordStore::load_fixture(path)
            .await
            .with_context(|| format!("Failed to load fixture {}", path.display()))?
            .with_id_field(config.tables.id_field.as_str());
        return Ok(Box::new(store));
    }

    let instance = config
        .require_instance()
        .context("Pass --fixture or configure an instance")?;
    tracing::debug!(url = %instance.url, "Using remote instance");
    Ok(Box::new(TableApiClient::new(instance)?))
}
