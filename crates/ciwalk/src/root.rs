//! Root resolution.
//!
//! Turns a [`RootSelector`] into a confirmed [`Node`]. Lookups by id are a
//! single point lookup. Lookups by name fetch at most
//! [`ROOT_NAME_CANDIDATES`] exact matches and take the first one in the
//! order the store returned them; no tie-break is applied.

use crate::config::TableConfig;
use crate::domain::{Node, RootSelector, UNKNOWN_CLASS};
use crate::error::{Error, Result};
use crate::query::{EncodedQuery, Record, RecordQuery};
use tracing::debug;

/// Maximum number of same-named candidates fetched for a name lookup.
pub const ROOT_NAME_CANDIDATES: usize = 5;

/// Resolve the root node of a traversal.
///
/// # Errors
///
/// - `Error::NotFound` if no CI matches, or the id lookup returns a record
///   without a name
/// - Any error raised by the store; root lookups are not retried or absorbed
pub async fn resolve_root(
    store: &dyn RecordQuery,
    tables: &TableConfig,
    selector: &RootSelector,
) -> Result<Node> {
    let fields = [
        tables.id_field.as_str(),
        tables.name_field.as_str(),
        tables.class_field.as_str(),
    ];

    match selector {
        RootSelector::Id(id) => {
            let record = store
                .get(&tables.ci_table, id, &fields)
                .await?
                .ok_or_else(|| Error::NotFound(format!("no CI with id '{id}'")))?;

            let node = to_node(&record, tables, id);
            if node.name.is_empty() {
                return Err(Error::NotFound(format!("CI '{id}' has no name")));
            }
            debug!(root = %node.id, name = %node.name, "Resolved root by id");
            Ok(node)
        }
        RootSelector::Name(name) => {
            let filter = EncodedQuery::new()
                .and(tables.name_field.as_str(), name.as_str())
                .to_string();
            let candidates = store
                .query(&tables.ci_table, &filter, &fields, ROOT_NAME_CANDIDATES)
                .await?;

            let first = candidates
                .first()
                .ok_or_else(|| Error::NotFound(format!("no CI named '{name}'")))?;
            if candidates.len() > 1 {
                debug!(
                    name = %name,
                    candidates = candidates.len(),
                    "Several CIs share this name, using the first"
                );
            }

            let mut node = to_node(first, tables, "");
            if node.name.is_empty() {
                node.name.clone_from(name);
            }
            debug!(root = %node.id, name = %node.name, "Resolved root by name");
            Ok(node)
        }
    }
}

fn to_node(record: &Record, tables: &TableConfig, fallback_id: &str) -> Node {
    let id = record.reference_id(&tables.id_field);
    let class = record.text(&tables.class_field);
    Node {
        id: if id.is_empty() {
            fallback_id.to_string()
        } else {
            id
        },
        name: record.text(&tables.name_field),
        class: if class.is_empty() {
            UNKNOWN_CLASS.to_string()
        } else {
            class
        },
    }
}
