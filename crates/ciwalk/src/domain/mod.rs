//! Domain types for dependency traversal.
//!
//! This module contains the transient types built for one traversal call:
//! the request, the nodes and edges it discovers, and the serialized result.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Smallest effective traversal depth.
pub const MIN_DEPTH: u8 = 1;

/// Largest effective traversal depth.
pub const MAX_DEPTH: u8 = 5;

/// Depth used when a request does not specify one.
pub const DEFAULT_DEPTH: i64 = 3;

/// Class recorded for a CI whose class could not be looked up.
pub const UNKNOWN_CLASS: &str = "unknown";

/// Clamp a requested depth into `[MIN_DEPTH, MAX_DEPTH]`.
///
/// Out-of-range values are corrected rather than rejected.
#[must_use]
pub fn clamp_depth(requested: i64) -> u8 {
    let clamped = requested.clamp(i64::from(MIN_DEPTH), i64::from(MAX_DEPTH));
    u8::try_from(clamped).unwrap_or(MAX_DEPTH)
}

/// A configuration item in the relationship graph. Identity is `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier of the CI
    pub id: String,

    /// Human-readable name
    pub name: String,

    /// CI class name
    pub class: String,
}

/// Direction of a discovered edge, relative to the node that was being
/// expanded when the edge was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// The expanding node depends on the other node
    Upstream,

    /// The other node depends on the expanding node
    Downstream,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upstream => write!(f, "upstream"),
            Self::Downstream => write!(f, "downstream"),
        }
    }
}

/// Which edge directions a traversal follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectionFilter {
    /// Only upstream edges
    Upstream,

    /// Only downstream edges
    Downstream,

    /// Both directions
    #[default]
    Both,
}

impl DirectionFilter {
    /// Whether an edge in `direction` passes this filter.
    #[must_use]
    pub fn allows(self, direction: Direction) -> bool {
        match self {
            Self::Both => true,
            Self::Upstream => direction == Direction::Upstream,
            Self::Downstream => direction == Direction::Downstream,
        }
    }
}

impl fmt::Display for DirectionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upstream => write!(f, "upstream"),
            Self::Downstream => write!(f, "downstream"),
            Self::Both => write!(f, "both"),
        }
    }
}

impl FromStr for DirectionFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "upstream" | "up" => Ok(Self::Upstream),
            "downstream" | "down" => Ok(Self::Downstream),
            "both" => Ok(Self::Both),
            other => Err(Error::Validation(format!(
                "invalid direction '{other}'. Valid values: upstream, downstream, both"
            ))),
        }
    }
}

/// How the root CI is identified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootSelector {
    /// Point lookup by identifier
    Id(String),

    /// Lookup by exact name
    Name(String),
}

impl RootSelector {
    /// Build a selector from optional id and name inputs.
    ///
    /// Blank strings count as absent.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` unless exactly one of the two is present.
    pub fn from_parts(id: Option<&str>, name: Option<&str>) -> Result<Self> {
        let id = id.map(str::trim).filter(|s| !s.is_empty());
        let name = name.map(str::trim).filter(|s| !s.is_empty());

        match (id, name) {
            (Some(id), None) => Ok(Self::Id(id.to_string())),
            (None, Some(name)) => Ok(Self::Name(name.to_string())),
            (Some(_), Some(_)) => Err(Error::Validation(
                "provide either a root id or a root name, not both".to_string(),
            )),
            (None, None) => Err(Error::Validation(
                "a root id or a root name is required".to_string(),
            )),
        }
    }
}

/// A traversal request as received from a caller.
///
/// The root selectors are kept raw so that "both" and "neither" can be
/// reported as validation errors when the traversal starts.
#[derive(Debug, Clone, Default)]
pub struct TraversalRequest {
    /// Identifier of the root CI
    pub root_id: Option<String>,

    /// Exact name of the root CI
    pub root_name: Option<String>,

    /// Requested depth; clamped into `[MIN_DEPTH, MAX_DEPTH]`
    pub max_depth: Option<i64>,

    /// Edge directions to follow
    pub direction: DirectionFilter,

    /// Case-insensitive substring the relation type must contain
    pub type_filter: Option<String>,

    /// Case-insensitive substring the other CI's class must contain to be
    /// reported. Does not restrict exploration.
    pub class_filter: Option<String>,
}

impl TraversalRequest {
    /// Request rooted at the CI with the given id.
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            root_id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Request rooted at the CI with the given name.
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            root_name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Set the requested depth.
    #[must_use]
    pub fn with_depth(mut self, depth: i64) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set the direction filter.
    #[must_use]
    pub fn with_direction(mut self, direction: DirectionFilter) -> Self {
        self.direction = direction;
        self
    }

    /// Set the relation type filter.
    #[must_use]
    pub fn with_type_filter(mut self, filter: impl Into<String>) -> Self {
        self.type_filter = Some(filter.into());
        self
    }

    /// Set the class filter.
    #[must_use]
    pub fn with_class_filter(mut self, filter: impl Into<String>) -> Self {
        self.class_filter = Some(filter.into());
        self
    }

    /// The depth the traversal will actually use.
    #[must_use]
    pub fn effective_depth(&self) -> u8 {
        clamp_depth(self.max_depth.unwrap_or(DEFAULT_DEPTH))
    }
}

/// A relationship reported by a traversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Identifier of the CI at the far end
    #[serde(rename = "id")]
    pub other_id: String,

    /// Name of the CI at the far end
    #[serde(rename = "name")]
    pub other_name: String,

    /// Class of the CI at the far end
    #[serde(rename = "class")]
    pub other_class: String,

    /// Relation type display text (e.g. "Depends on::Used by")
    #[serde(rename = "type")]
    pub relation_type: String,

    /// Direction relative to the node being expanded
    pub direction: Direction,

    /// Depth at which the source node was being expanded (root = 1)
    pub depth: u8,
}

/// Summary block of a traversal result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalMeta {
    /// Effective (clamped) depth
    pub depth: u8,

    /// Direction filter that was applied
    pub direction: DirectionFilter,

    /// Number of reported edges
    pub total: usize,
}

/// Outcome of a traversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalResult {
    /// The resolved root CI
    pub root: Node,

    /// Reported edges, in discovery order
    pub relationships: Vec<Edge>,

    /// Summary of the traversal
    pub meta: TraversalMeta,
}
