//! MCP tool implementations.

use crate::error::Result;
use crate::models::{ConnectionInfoResponse, TraverseParams};
use ciwalk::config::{CiwalkConfig, TableConfig};
use ciwalk::domain::TraversalResult;
use ciwalk::query::RecordQuery;
use ciwalk::query::http::TableApiClient;
use ciwalk::query::in_memory::InMemoryRecordStore;
use ciwalk::traversal::Traversal;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Where the server reads records from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordSource {
    /// A live instance at the given base URL
    Instance(String),
    /// A JSON fixture at the given path
    Fixture(String),
}

/// Tool implementations for the ciwalk MCP server.
pub struct Tools {
    store: Arc<dyn RecordQuery>,
    tables: TableConfig,
    source: RecordSource,
}

impl Tools {
    /// Create tools over an existing store.
    pub fn new(store: Arc<dyn RecordQuery>, tables: TableConfig, source: RecordSource) -> Self {
        Self {
            store,
            tables,
            source,
        }
    }

    /// Create tools from configuration, reading `fixture` instead of the
    /// configured instance when given.
    ///
    /// # Errors
    ///
    /// Returns an error if the fixture cannot be loaded, or no instance is
    /// configured and no fixture is given.
    pub async fn from_config(config: &CiwalkConfig, fixture: Option<&Path>) -> Result<Self> {
        if let Some(path) = fixture {
            let store = InMemoryRecordStore::load_fixture(path)
                .await?
                .with_id_field(config.tables.id_field.as_str());
            return Ok(Self::new(
                Arc::new(store),
                config.tables.clone(),
                RecordSource::Fixture(path.display().to_string()),
            ));
        }

        let client = TableApiClient::new(config.require_instance()?)?;
        let url = client.base_url().to_string();
        Ok(Self::new(
            Arc::new(client),
            config.tables.clone(),
            RecordSource::Instance(url),
        ))
    }

    /// Walk the dependencies of a CI, stopping early when `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid arguments, an unresolvable root or a
    /// cancelled request.
    pub async fn traverse_dependencies(
        &self,
        params: TraverseParams,
        cancel: CancellationToken,
    ) -> Result<TraversalResult> {
        let request = params.into_request()?;
        let result = Traversal::new(self.store.as_ref(), &self.tables)
            .with_cancellation(cancel)
            .run(&request)
            .await?;
        info!(
            root = %result.root.id,
            total = result.meta.total,
            "Traversal completed"
        );
        Ok(result)
    }

    /// Describe the record source.
    #[must_use]
    pub fn connection_info(&self) -> ConnectionInfoResponse {
        let (source, location) = match &self.source {
            RecordSource::Instance(url) => ("instance", url.clone()),
            RecordSource::Fixture(path) => ("fixture", path.clone()),
        };
        ConnectionInfoResponse {
            source: source.to_string(),
            location,
            ci_table: self.tables.ci_table.clone(),
            relationship_table: self.tables.relationship_table.clone(),
        }
    }
}
