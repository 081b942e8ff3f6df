//! Reference field normalization.
//!
//! The record store encodes a relationship endpoint in one of three shapes
//! depending on how the field was requested:
//!
//! - a bare string (`"4f1c…"` or, when display values are inlined, `"web01"`)
//! - an object with the raw value and its display text
//!   (`{"value": "4f1c…", "display_value": "web01"}`)
//! - an object carrying only a resource link
//!   (`{"link": "https://instance/api/now/table/cmdb_ci/4f1c…"}`)
//!
//! [`ReferenceField`] models those shapes explicitly; [`extract_id`] and
//! [`extract_display_name`] work directly on JSON values.

use serde_json::Value;

/// Length of a record identifier in its hexadecimal form.
const SYS_ID_LEN: usize = 32;

/// A decoded reference field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceField {
    /// A bare string: usually an identifier, sometimes a display value.
    RawId(String),

    /// A raw value with an optional display string.
    ValueWithDisplay {
        /// The raw identifier
        value: String,
        /// The display text, if the store sent one
        display: Option<String>,
    },

    /// Only a resource link; the identifier is its last path segment.
    LinkOnly(String),
}

impl ReferenceField {
    /// Decode a JSON value into a reference field.
    ///
    /// Returns `None` for null, empty strings and unrecognized shapes.
    #[must_use]
    pub fn parse(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Some(Self::RawId(s.clone())),
            Value::Object(map) => {
                let text = |key: &str| {
                    map.get(key)
                        .and_then(Value::as_str)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                };

                if let Some(value) = text("value") {
                    Some(Self::ValueWithDisplay {
                        value,
                        display: text("display_value"),
                    })
                } else if let Some(link) = text("link") {
                    Some(Self::LinkOnly(link))
                } else {
                    text("display_value").map(|display| Self::ValueWithDisplay {
                        value: String::new(),
                        display: Some(display),
                    })
                }
            }
            _ => None,
        }
    }

    /// The identifier this field points at; empty when none can be derived.
    #[must_use]
    pub fn id(&self) -> String {
        match self {
            Self::RawId(id) => id.clone(),
            Self::ValueWithDisplay { value, .. } => value.clone(),
            Self::LinkOnly(link) => last_path_segment(link).to_string(),
        }
    }

    /// The human-readable name; empty when none is available.
    ///
    /// A bare string that looks like a record identifier is never returned
    /// as a name.
    #[must_use]
    pub fn display_name(&self) -> String {
        match self {
            Self::RawId(raw) if is_sys_id(raw) => String::new(),
            Self::RawId(raw) => raw.clone(),
            Self::ValueWithDisplay { display, .. } => display.clone().unwrap_or_default(),
            Self::LinkOnly(_) => String::new(),
        }
    }
}

/// Extract the identifier from a reference field value.
#[must_use]
pub fn extract_id(value: &Value) -> String {
    ReferenceField::parse(value)
        .map(|field| field.id())
        .unwrap_or_default()
}

/// Extract the display name from a reference field value.
#[must_use]
pub fn extract_display_name(value: &Value) -> String {
    ReferenceField::parse(value)
        .map(|field| field.display_name())
        .unwrap_or_default()
}

/// Extract plain text from a non-reference field (e.g. a class name).
///
/// Prefers the raw value over the display text.
#[must_use]
pub fn extract_text(value: &Value) -> String {
    match ReferenceField::parse(value) {
        Some(ReferenceField::ValueWithDisplay { value, display }) if value.is_empty() => {
            display.unwrap_or_default()
        }
        Some(field) => field.id(),
        None => String::new(),
    }
}

/// Whether `s` is a 32-character hexadecimal record identifier.
#[must_use]
pub fn is_sys_id(s: &str) -> bool {
    s.len() == SYS_ID_LEN && s.chars().all(|c| c.is_ascii_hexdigit())
}

fn last_path_segment(link: &str) -> &str {
    let path = link.split(['?', '#']).next().unwrap_or(link);
    path.trim_end_matches('/').rsplit('/').next().unwrap_or_default()
}
