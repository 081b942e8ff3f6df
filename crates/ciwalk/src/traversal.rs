//! Depth-bounded dependency traversal.
//!
//! The walk is a depth-first expansion from the root. Expanding a node means
//! fetching every relationship row where it is the parent or the child (one
//! query, at most [`RELATIONSHIP_ROW_LIMIT`] rows) and turning each row into
//! at most one reported [`Edge`]:
//!
//! - node is the parent: the other CI is downstream of it
//! - node is the child: the other CI is upstream of it
//!
//! Rows are then filtered by direction and relation type, deduplicated per
//! expanding node on `(other id, direction)`, and enriched with the other
//! CI's class. The class filter only decides whether an edge is reported; a
//! CI that is filtered out is still expanded.
//!
//! Each CI is expanded at most once per traversal. A failed row fetch makes
//! that node a leaf; only root resolution and cancellation abort the walk.
//!
//! # Ordering
//!
//! Results are in depth-first pre-order: after an edge is appended, its far
//! end is expanded completely before the next row of the current node. The
//! walk keeps an explicit stack of frames to get that order without async
//! recursion.

use crate::class_cache::ClassCache;
use crate::config::TableConfig;
use crate::domain::{
    Direction, DirectionFilter, Edge, Node, RootSelector, TraversalMeta, TraversalRequest,
    TraversalResult,
};
use crate::error::{Error, Result};
use crate::query::{EncodedQuery, Record, RecordQuery};
use crate::root::resolve_root;
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Maximum number of relationship rows considered per expanded node.
pub const RELATIONSHIP_ROW_LIMIT: usize = 100;

/// Traverse the relationship graph from the request's root.
///
/// Convenience wrapper around [`Traversal::run`] without cancellation.
///
/// # Errors
///
/// See [`Traversal::run`].
pub async fn traverse(
    store: &dyn RecordQuery,
    tables: &TableConfig,
    request: &TraversalRequest,
) -> Result<TraversalResult> {
    Traversal::new(store, tables).run(request).await
}

/// A traversal bound to a record store and table layout.
pub struct Traversal<'a> {
    store: &'a dyn RecordQuery,
    tables: &'a TableConfig,
    cancel: CancellationToken,
}

impl<'a> Traversal<'a> {
    /// Create a traversal over `store`.
    #[must_use]
    pub fn new(store: &'a dyn RecordQuery, tables: &'a TableConfig) -> Self {
        Self {
            store,
            tables,
            cancel: CancellationToken::new(),
        }
    }

    /// Stop the traversal when `token` is cancelled.
    ///
    /// The token is checked before every outbound call.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Run the traversal.
    ///
    /// # Errors
    ///
    /// - `Error::Validation` if the request names both or neither root
    ///   selectors
    /// - `Error::NotFound` if the root cannot be resolved
    /// - `Error::Cancelled` if the cancellation token fires
    /// - Store errors raised while resolving the root
    pub async fn run(&self, request: &TraversalRequest) -> Result<TraversalResult> {
        let selector =
            RootSelector::from_parts(request.root_id.as_deref(), request.root_name.as_deref())?;
        let max_depth = request.effective_depth();

        self.check_cancelled()?;
        let root = resolve_root(self.store, self.tables, &selector).await?;
        info!(
            root = %root.id,
            name = %root.name,
            depth = max_depth,
            direction = %request.direction,
            "Starting traversal"
        );

        let mut walk = Walk {
            filters: Filters::new(request),
            max_depth,
            visited: HashSet::from([root.id.clone()]),
            classes: ClassCache::seeded(&root),
            results: Vec::new(),
        };
        self.walk(&root, &mut walk).await?;

        let total = walk.results.len();
        debug!(
            expanded = walk.visited.len(),
            classes = walk.classes.len(),
            total,
            "Traversal finished"
        );

        Ok(TraversalResult {
            root,
            relationships: walk.results,
            meta: TraversalMeta {
                depth: max_depth,
                direction: request.direction,
                total,
            },
        })
    }

    async fn walk(&self, root: &Node, walk: &mut Walk) -> Result<()> {
        let mut stack = vec![self.open_frame(&root.id, 1).await?];

        while let Some(frame) = stack.last_mut() {
            let Some(row) = frame.rows.next() else {
                stack.pop();
                continue;
            };

            let depth = frame.depth;
            let Some(candidate) = Candidate::from_row(&row, &frame.node_id, self.tables) else {
                continue;
            };
            if !walk.filters.admits(&candidate) {
                continue;
            }
            if !frame
                .seen
                .insert((candidate.other_id.clone(), candidate.direction))
            {
                continue;
            }

            let class = walk
                .classes
                .resolve(self.store, self.tables, &candidate.other_id, &self.cancel)
                .await?;
            let expand = depth < walk.max_depth && walk.visited.insert(candidate.other_id.clone());
            let other_id = candidate.other_id.clone();

            if walk.filters.reports_class(&class) {
                walk.results.push(candidate.into_edge(class, depth));
            }
            if expand {
                stack.push(self.open_frame(&other_id, depth + 1).await?);
            }
        }
        Ok(())
    }

    /// Fetch the rows incident to `node_id` and open a frame over them.
    async fn open_frame(&self, node_id: &str, depth: u8) -> Result<Frame> {
        self.check_cancelled()?;

        let filter = EncodedQuery::new()
            .and(self.tables.parent_field.as_str(), node_id)
            .or(self.tables.child_field.as_str(), node_id)
            .to_string();
        let fields = [
            self.tables.id_field.as_str(),
            self.tables.parent_field.as_str(),
            self.tables.child_field.as_str(),
            self.tables.type_field.as_str(),
        ];

        let mut rows = match self
            .store
            .query(
                &self.tables.relationship_table,
                &filter,
                &fields,
                RELATIONSHIP_ROW_LIMIT,
            )
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                warn!(node = %node_id, depth, error = %e, "Relationship fetch failed, treating node as a leaf");
                Vec::new()
            }
        };
        rows.truncate(RELATIONSHIP_ROW_LIMIT);
        debug!(node = %node_id, depth, rows = rows.len(), "Expanding node");

        Ok(Frame {
            node_id: node_id.to_string(),
            depth,
            rows: rows.into_iter(),
            seen: HashSet::new(),
        })
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Mutable state of one traversal call.
struct Walk {
    filters: Filters,
    max_depth: u8,
    visited: HashSet<String>,
    classes: ClassCache,
    results: Vec<Edge>,
}

/// Rows still to be processed for one expanded node.
struct Frame {
    node_id: String,
    depth: u8,
    rows: std::vec::IntoIter<Record>,
    /// `(other id, direction)` pairs already handled for this node
    seen: HashSet<(String, Direction)>,
}

/// Request filters, normalized for matching.
#[derive(Debug)]
struct Filters {
    direction: DirectionFilter,
    relation_type: Option<String>,
    class: Option<String>,
}

impl Filters {
    fn new(request: &TraversalRequest) -> Self {
        Self {
            direction: request.direction,
            relation_type: normalize(request.type_filter.as_deref()),
            class: normalize(request.class_filter.as_deref()),
        }
    }

    /// Direction and relation type checks, applied before dedup.
    fn admits(&self, candidate: &Candidate) -> bool {
        self.direction.allows(candidate.direction)
            && self.relation_type.as_ref().is_none_or(|needle| {
                candidate.relation_type.to_lowercase().contains(needle.as_str())
            })
    }

    /// Whether an edge to a CI of `class` is reported.
    fn reports_class(&self, class: &str) -> bool {
        self.class
            .as_ref()
            .is_none_or(|needle| class.to_lowercase().contains(needle.as_str()))
    }
}

/// Blank filters count as unset.
fn normalize(filter: Option<&str>) -> Option<String> {
    filter
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_lowercase)
}

/// A relationship row seen from the node being expanded.
#[derive(Debug)]
struct Candidate {
    other_id: String,
    other_name: String,
    relation_type: String,
    direction: Direction,
}

impl Candidate {
    /// Decode a row. Returns `None` for self-loops, rows with an empty far
    /// end and rows that do not touch `node_id`.
    fn from_row(row: &Record, node_id: &str, tables: &TableConfig) -> Option<Self> {
        let parent = row.reference_id(&tables.parent_field);
        let child = row.reference_id(&tables.child_field);

        let (other_field, other_id, direction) = if parent == node_id {
            (&tables.child_field, child, Direction::Downstream)
        } else if child == node_id {
            (&tables.parent_field, parent, Direction::Upstream)
        } else {
            return None;
        };
        if other_id.is_empty() || other_id == node_id {
            return None;
        }

        Some(Self {
            other_name: row.display_name(other_field),
            relation_type: row.display_name(&tables.type_field),
            other_id,
            direction,
        })
    }

    fn into_edge(self, other_class: String, depth: u8) -> Edge {
        Edge {
            other_id: self.other_id,
            other_name: self.other_name,
            other_class,
            relation_type: self.relation_type,
            direction: self.direction,
            depth,
        }
    }
}
