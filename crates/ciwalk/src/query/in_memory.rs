//! In-memory record store.
//!
//! This module provides an **ephemeral** [`RecordQuery`] implementation where
//! tables are held in RAM. It is suitable for:
//!
//! - Offline traversal of an exported snapshot (`--fixture`)
//! - Testing the traversal engine without a remote instance
//!
//! # Fixture format
//!
//! A fixture is a JSON object mapping table names to arrays of records:
//!
//! ```json
//! {
//!   "cmdb_ci": [{"sys_id": "a1", "name": "web01", "sys_class_name": "cmdb_ci_server"}],
//!   "cmdb_rel_ci": [{"parent": "a1", "child": "b2", "type": {"value": "t1", "display_value": "Depends on::Used by"}}]
//! }
//! ```
//!
//! # Behavior
//!
//! - Records keep insertion order, so `query` returns them in that order
//! - `query` evaluates the `^`/`^OR` equality subset of [`EncodedQuery`]
//! - `get` matches on the id field, `sys_id` unless set with
//!   [`InMemoryRecordStore::with_id_field`]
//! - Every call is recorded and can be inspected with [`InMemoryRecordStore::calls`]
//! - Failures can be injected per table and record with
//!   [`InMemoryRecordStore::fail_queries_for`] and [`InMemoryRecordStore::fail_gets_for`]

use crate::error::{Error, Result};
use crate::query::{EncodedQuery, Record, RecordQuery};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tokio::sync::Mutex;

/// Default field holding a record's identifier.
pub const ID_FIELD: &str = "sys_id";

/// A call made against the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    /// A `query` call
    Query {
        /// Target table
        table: String,
        /// Encoded filter expression
        filter: String,
        /// Requested row limit
        limit: usize,
    },

    /// A `get` call
    Get {
        /// Target table
        table: String,
        /// Requested record id
        id: String,
    },
}

#[derive(Debug, Default)]
struct InMemoryInner {
    tables: HashMap<String, Vec<Record>>,
    /// (table, id) pairs whose incident queries fail
    failing_queries: HashSet<(String, String)>,
    /// (table, id) pairs whose point lookups fail
    failing_gets: HashSet<(String, String)>,
    calls: Vec<RecordedCall>,
}

/// Tables of records held in memory.
#[derive(Debug)]
pub struct InMemoryRecordStore {
    inner: Mutex<InMemoryInner>,
    id_field: String,
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::from_tables(HashMap::new())
    }
}

impl InMemoryRecordStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store from table contents.
    #[must_use]
    pub fn from_tables(tables: HashMap<String, Vec<Record>>) -> Self {
        Self {
            inner: Mutex::new(InMemoryInner {
                tables,
                ..InMemoryInner::default()
            }),
            id_field: ID_FIELD.to_string(),
        }
    }

    /// Match `get` lookups on `field` instead of [`ID_FIELD`].
    #[must_use]
    pub fn with_id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = field.into();
        self
    }

    /// Load a store from a JSON fixture file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be read and `Error::Json` if it
    /// is not an object of record arrays.
    pub async fn load_fixture(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let tables: HashMap<String, Vec<Record>> = serde_json::from_str(&content)?;
        tracing::debug!(
            path = %path.display(),
            tables = tables.len(),
            "Loaded record fixture"
        );
        Ok(Self::from_tables(tables))
    }

    /// Append a record to a table.
    pub fn insert(&mut self, table: &str, record: Record) {
        self.inner
            .get_mut()
            .tables
            .entry(table.to_string())
            .or_default()
            .push(record);
    }

    /// Make every `query` on `table` whose filter mentions `id` fail.
    pub fn fail_queries_for(&mut self, table: &str, id: &str) {
        self.inner
            .get_mut()
            .failing_queries
            .insert((table.to_string(), id.to_string()));
    }

    /// Make every `get` of `id` on `table` fail.
    pub fn fail_gets_for(&mut self, table: &str, id: &str) {
        self.inner
            .get_mut()
            .failing_gets
            .insert((table.to_string(), id.to_string()));
    }

    /// All calls made so far, in order.
    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.inner.lock().await.calls.clone()
    }

    /// Number of `query` calls made against `table`.
    pub async fn query_count(&self, table: &str) -> usize {
        self.count_calls(|call| matches!(call, RecordedCall::Query { table: t, .. } if t == table))
            .await
    }

    /// Number of `get` calls made against `table`.
    pub async fn get_count(&self, table: &str) -> usize {
        self.count_calls(|call| matches!(call, RecordedCall::Get { table: t, .. } if t == table))
            .await
    }

    async fn count_calls(&self, predicate: impl Fn(&RecordedCall) -> bool) -> usize {
        self.inner
            .lock()
            .await
            .calls
            .iter()
            .filter(|call| predicate(call))
            .count()
    }
}

#[async_trait]
impl RecordQuery for InMemoryRecordStore {
    async fn query(
        &self,
        table: &str,
        filter: &str,
        fields: &[&str],
        limit: usize,
    ) -> Result<Vec<Record>> {
        let mut inner = self.inner.lock().await;
        inner.calls.push(RecordedCall::Query {
            table: table.to_string(),
            filter: filter.to_string(),
            limit,
        });

        let query = EncodedQuery::parse(filter)?;
        let failing = inner
            .failing_queries
            .iter()
            .any(|(t, id)| t == table && query.values().any(|value| value == id));
        if failing {
            return Err(Error::remote(table, format!("injected failure for '{filter}'")));
        }

        let rows = inner.tables.get(table).map_or_else(Vec::new, |records| {
            records
                .iter()
                .filter(|record| query.matches(record))
                .take(limit)
                .map(|record| record.project(fields))
                .collect()
        });
        Ok(rows)
    }

    async fn get(&self, table: &str, id: &str, fields: &[&str]) -> Result<Option<Record>> {
        let mut inner = self.inner.lock().await;
        inner.calls.push(RecordedCall::Get {
            table: table.to_string(),
            id: id.to_string(),
        });

        if inner
            .failing_gets
            .contains(&(table.to_string(), id.to_string()))
        {
            return Err(Error::remote(table, format!("injected failure for '{id}'")));
        }

        Ok(inner.tables.get(table).and_then(|records| {
            records
                .iter()
                .find(|record| record.reference_id(&self.id_field) == id)
                .map(|record| record.project(fields))
        }))
    }
}
