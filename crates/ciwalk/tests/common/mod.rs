//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use ciwalk::query::Record;
use ciwalk::query::in_memory::InMemoryRecordStore;
use serde_json::json;

/// CI table used by the default table layout
pub const CI_TABLE: &str = "cmdb_ci";

/// Relationship table used by the default table layout
pub const REL_TABLE: &str = "cmdb_rel_ci";

/// Builder for small relationship graphs held in an in-memory store.
#[derive(Default)]
pub struct GraphBuilder {
    store: InMemoryRecordStore,
    rows: usize,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a CI whose name is `<id>-name`.
    pub fn ci(self, id: &str, class: &str) -> Self {
        let name = format!("{id}-name");
        self.named_ci(id, &name, class)
    }

    /// Add a CI with an explicit name.
    pub fn named_ci(mut self, id: &str, name: &str, class: &str) -> Self {
        self.store.insert(
            CI_TABLE,
            Record::new()
                .with("sys_id", id)
                .with("name", name)
                .with("sys_class_name", class),
        );
        self
    }

    /// Add a relationship row `parent -> child` with display-encoded fields.
    pub fn rel(mut self, parent: &str, child: &str, kind: &str) -> Self {
        self.rows += 1;
        self.store.insert(
            REL_TABLE,
            Record::new()
                .with("sys_id", format!("rel{}", self.rows))
                .with(
                    "parent",
                    json!({"value": parent, "display_value": format!("{parent}-name")}),
                )
                .with(
                    "child",
                    json!({"value": child, "display_value": format!("{child}-name")}),
                )
                .with("type", json!({"value": "t", "display_value": kind})),
        );
        self
    }

    /// Make relationship queries for `id` fail.
    pub fn failing_rows_for(mut self, id: &str) -> Self {
        self.store.fail_queries_for(REL_TABLE, id);
        self
    }

    /// Make class lookups for `id` fail.
    pub fn failing_class_for(mut self, id: &str) -> Self {
        self.store.fail_gets_for(CI_TABLE, id);
        self
    }

    pub fn build(self) -> InMemoryRecordStore {
        self.store
    }
}

/// Relationship filter issued when expanding `id`.
pub fn expansion_filter(id: &str) -> String {
    format!("parent={id}^ORchild={id}")
}
