//! Per-traversal CI class cache.
//!
//! Maps CI id to class name. The cache is seeded with the root and filled on
//! demand with one point lookup per unseen id. A lookup that fails or comes
//! back empty is remembered as [`UNKNOWN_CLASS`], so a broken record costs at
//! most one remote call per traversal.

use crate::config::TableConfig;
use crate::domain::{Node, UNKNOWN_CLASS};
use crate::error::{Error, Result};
use crate::query::RecordQuery;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Memoized id → class lookups for one traversal.
#[derive(Debug, Default)]
pub struct ClassCache {
    classes: HashMap<String, String>,
}

impl ClassCache {
    /// Create a cache that already knows the root's class.
    #[must_use]
    pub fn seeded(root: &Node) -> Self {
        let mut cache = Self::default();
        cache.insert(&root.id, &root.class);
        cache
    }

    /// Record a class for `id`.
    pub fn insert(&mut self, id: &str, class: &str) {
        self.classes.insert(id.to_string(), class.to_string());
    }

    /// Cached class of `id`, if any.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&str> {
        self.classes.get(id).map(String::as_str)
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Class of `id`, looking it up remotely on a miss.
    ///
    /// Remote failures never surface; they resolve to [`UNKNOWN_CLASS`].
    ///
    /// # Errors
    ///
    /// Returns `Error::Cancelled` if `cancel` fires before the lookup.
    pub async fn resolve(
        &mut self,
        store: &dyn RecordQuery,
        tables: &TableConfig,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        if let Some(class) = self.get(id) {
            return Ok(class.to_string());
        }
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let fields = [tables.class_field.as_str()];
        let class = match store.get(&tables.ci_table, id, &fields).await {
            Ok(Some(record)) => record.text(&tables.class_field),
            Ok(None) => {
                debug!(ci = %id, "Class lookup found no record");
                String::new()
            }
            Err(e) => {
                warn!(ci = %id, error = %e, "Class lookup failed");
                String::new()
            }
        };

        let class = if class.is_empty() {
            UNKNOWN_CLASS.to_string()
        } else {
            class
        };
        self.insert(id, &class);
        Ok(class)
    }
}
