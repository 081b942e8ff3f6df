//! Record-query collaborator.
//!
//! The configuration database exposes no graph API. Everything the traversal
//! needs is expressed as two calls against its record tables:
//!
//! - `query(table, filter, fields, limit)` returns records matching an
//!   encoded filter expression, in store order
//! - `get(table, id, fields)` is a point lookup
//!
//! Implementations:
//!
//! - [`in_memory::InMemoryRecordStore`]: tables held in memory, loadable from
//!   a JSON fixture; used offline and as the test double
//! - [`http::TableApiClient`]: the remote table API over HTTP
//!
//! # Filter expressions
//!
//! Filters are `field=value` clauses joined by `^` (AND) or `^OR` (OR).
//! An `^OR` clause joins the group of the clause before it, so
//! `a=1^ORb=2^c=3` means `(a=1 OR b=2) AND c=3`. A literal `^` inside a
//! value is written `^^`. [`EncodedQuery`] builds and evaluates this subset.

use crate::error::{Error, Result};
use crate::reference::{extract_display_name, extract_id, extract_text};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub mod http;
pub mod in_memory;

static NULL: Value = Value::Null;

/// A record returned by the store: field name to raw JSON value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(pub Map<String, Value>);

impl Record {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field setter.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Raw value of a field; `Null` when absent.
    #[must_use]
    pub fn field(&self, name: &str) -> &Value {
        self.0.get(name).unwrap_or(&NULL)
    }

    /// Identifier referenced by a field.
    #[must_use]
    pub fn reference_id(&self, name: &str) -> String {
        extract_id(self.field(name))
    }

    /// Display name carried by a field.
    #[must_use]
    pub fn display_name(&self, name: &str) -> String {
        extract_display_name(self.field(name))
    }

    /// Plain text of a non-reference field.
    #[must_use]
    pub fn text(&self, name: &str) -> String {
        extract_text(self.field(name))
    }

    /// Copy of this record restricted to `fields`. An empty list keeps all.
    #[must_use]
    pub fn project(&self, fields: &[&str]) -> Self {
        if fields.is_empty() {
            return self.clone();
        }
        Self(
            self.0
                .iter()
                .filter(|(name, _)| fields.contains(&name.as_str()))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
        )
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Access to the remote record tables.
///
/// Implementations own retry and backoff. Callers treat any error as a
/// failed call and never retry themselves.
#[async_trait]
pub trait RecordQuery: Send + Sync {
    /// Return up to `limit` records of `table` matching `filter`.
    ///
    /// An empty `fields` list requests every field.
    async fn query(
        &self,
        table: &str,
        filter: &str,
        fields: &[&str],
        limit: usize,
    ) -> Result<Vec<Record>>;

    /// Point lookup by record identifier. Returns `None` when absent.
    async fn get(&self, table: &str, id: &str, fields: &[&str]) -> Result<Option<Record>>;
}

/// How a clause attaches to the clauses before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Join {
    And,
    Or,
}

/// A single `field=value` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Clause {
    join: Join,
    field: String,
    value: String,
}

/// Builder and evaluator for encoded filter expressions.
///
/// # Example
///
/// ```
/// use ciwalk::query::EncodedQuery;
///
/// let filter = EncodedQuery::new().and("parent", "abc").or("child", "abc");
/// assert_eq!(filter.to_string(), "parent=abc^ORchild=abc");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodedQuery {
    clauses: Vec<Clause>,
}

impl EncodedQuery {
    /// Create an empty expression (matches everything).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// AND a `field=value` clause.
    #[must_use]
    pub fn and(self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(Join::And, field.into(), value.into())
    }

    /// OR a `field=value` clause onto the previous group.
    #[must_use]
    pub fn or(self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(Join::Or, field.into(), value.into())
    }

    fn push(mut self, join: Join, field: String, value: String) -> Self {
        self.clauses.push(Clause { join, field, value });
        self
    }

    /// Parse an encoded expression.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if a clause is not of the form
    /// `field=value`.
    pub fn parse(expression: &str) -> Result<Self> {
        let mut query = Self::new();
        let tokens = split_clauses(expression);
        for token in tokens.iter().map(String::as_str).filter(|t| !t.is_empty()) {
            let (join, clause) = match token.strip_prefix("OR") {
                Some(rest) if query.clauses.is_empty() => (Join::And, rest),
                Some(rest) => (Join::Or, rest),
                None => (Join::And, token),
            };
            let (field, value) = clause.split_once('=').ok_or_else(|| {
                Error::Validation(format!("unsupported filter clause '{token}'"))
            })?;
            query = query.push(join, field.to_string(), value.to_string());
        }
        Ok(query)
    }

    /// Clause values, unescaped.
    fn values(&self) -> impl Iterator<Item = &str> {
        self.clauses.iter().map(|clause| clause.value.as_str())
    }

    /// Whether `record` satisfies this expression.
    ///
    /// Reference fields compare on their raw identifier.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        let mut groups: Vec<Vec<&Clause>> = Vec::new();
        for clause in &self.clauses {
            if clause.join == Join::Or {
                if let Some(group) = groups.last_mut() {
                    group.push(clause);
                    continue;
                }
            }
            groups.push(vec![clause]);
        }

        groups.iter().all(|group| {
            group
                .iter()
                .any(|clause| record.reference_id(&clause.field) == clause.value)
        })
    }
}

impl fmt::Display for EncodedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, clause) in self.clauses.iter().enumerate() {
            match (i, clause.join) {
                (0, _) => {}
                (_, Join::And) => f.write_str("^")?,
                (_, Join::Or) => f.write_str("^OR")?,
            }
            write!(f, "{}={}", clause.field, clause.value.replace('^', "^^"))?;
        }
        Ok(())
    }
}

/// Split an expression on `^` separators, reading `^^` as a literal `^`.
fn split_clauses(expression: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = expression.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '^' {
            current.push(c);
        } else if chars.next_if_eq(&'^').is_some() {
            current.push('^');
        } else {
            tokens.push(std::mem::take(&mut current));
        }
    }
    tokens.push(current);
    tokens
}
