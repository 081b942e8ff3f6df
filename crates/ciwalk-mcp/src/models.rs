//! MCP request and response models.
//!
//! Request parameter types derive `JsonSchema` so the tool router can
//! advertise their input schemas.

use crate::error::{Error, Result};
use ciwalk::domain::{DirectionFilter, TraversalRequest};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters of the `traverse_dependencies` tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct TraverseParams {
    /// Identifier (`sys_id`) of the root CI. Give this or `root_name`.
    #[serde(default)]
    pub root_id: Option<String>,

    /// Exact name of the root CI. Give this or `root_id`.
    #[serde(default)]
    pub root_name: Option<String>,

    /// Maximum depth, 1-5 (default 3). Out-of-range values are clamped.
    #[serde(default)]
    pub depth: Option<i64>,

    /// "upstream", "downstream" or "both" (default).
    #[serde(default)]
    pub direction: Option<String>,

    /// Only follow relationships whose type contains this text.
    #[serde(default)]
    pub relation_type: Option<String>,

    /// Only report CIs whose class contains this text.
    #[serde(default)]
    pub ci_class: Option<String>,
}

impl TraverseParams {
    /// Convert into a traversal request.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArgument` for an unknown direction.
    pub fn into_request(self) -> Result<TraversalRequest> {
        let direction = match self.direction.as_deref() {
            Some(value) => parse_direction(value)?,
            None => DirectionFilter::default(),
        };

        Ok(TraversalRequest {
            root_id: self.root_id,
            root_name: self.root_name,
            max_depth: self.depth,
            direction,
            type_filter: self.relation_type,
            class_filter: self.ci_class,
        })
    }
}

/// Parse a direction argument.
///
/// # Errors
///
/// Returns `Error::InvalidArgument` listing the valid values.
pub fn parse_direction(value: &str) -> Result<DirectionFilter> {
    value.parse().map_err(|_| Error::InvalidArgument {
        field: "direction",
        value: value.to_string(),
        valid_values: "upstream, downstream, both",
    })
}

/// Response from the `connection_info` tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ConnectionInfoResponse {
    /// Where records are read from: "instance" or "fixture".
    pub source: String,

    /// Instance base URL or fixture path.
    pub location: String,

    /// Table holding configuration items.
    pub ci_table: String,

    /// Table holding relationship rows.
    pub relationship_table: String,
}
