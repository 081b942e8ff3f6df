//! Configuration management for ciwalk.
//!
//! Configuration lives in a YAML file, by default `.ciwalk/config.yaml`:
//!
//! ```yaml
//! instance:
//!   url: https://example.service-now.com
//!   username: svc_walk
//!   timeout_secs: 30
//!   max_retries: 3
//! tables:
//!   ci_table: cmdb_ci
//!   relationship_table: cmdb_rel_ci
//! ```
//!
//! Every `tables` entry is optional and defaults to the standard CMDB names.
//! The password can be left out of the file and supplied through
//! [`PASSWORD_ENV`] instead.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Name of the ciwalk directory
pub const CONFIG_DIR_NAME: &str = ".ciwalk";

/// Name of the configuration file
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV: &str = "CIWALK_CONFIG";

/// Environment variable overriding the instance password
pub const PASSWORD_ENV: &str = "CIWALK_PASSWORD";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default number of retries for transient remote failures
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Top-level configuration file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CiwalkConfig {
    /// Remote instance connection settings
    #[serde(default)]
    pub instance: Option<InstanceConfig>,

    /// Table and field names
    #[serde(default)]
    pub tables: TableConfig,
}

/// Remote instance connection settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstanceConfig {
    /// Base URL of the instance
    pub url: String,

    /// Basic-auth user name
    #[serde(default)]
    pub username: Option<String>,

    /// Basic-auth password
    #[serde(default, skip_serializing)]
    pub password: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries for transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

/// Names of the tables and fields the traversal reads
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TableConfig {
    /// Table holding configuration items
    pub ci_table: String,

    /// Table holding relationship rows
    pub relationship_table: String,

    /// Relationship field referencing the parent CI
    pub parent_field: String,

    /// Relationship field referencing the child CI
    pub child_field: String,

    /// Relationship field referencing the relation type
    pub type_field: String,

    /// Record identifier field
    pub id_field: String,

    /// CI name field
    pub name_field: String,

    /// CI class field
    pub class_field: String,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            ci_table: "cmdb_ci".to_string(),
            relationship_table: "cmdb_rel_ci".to_string(),
            parent_field: "parent".to_string(),
            child_field: "child".to_string(),
            type_field: "type".to_string(),
            id_field: "sys_id".to_string(),
            name_field: "name".to_string(),
            class_field: "sys_class_name".to_string(),
        }
    }
}

impl CiwalkConfig {
    /// Parse configuration from YAML text.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the YAML is malformed.
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load configuration from a file
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be read and `Error::Config` if
    /// it cannot be parsed.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        Self::from_yaml(&content)
    }

    /// Load configuration if the file exists, defaults otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load_or_default(path: &Path) -> Result<Self> {
        if fs::try_exists(path).await? {
            Self::load(path).await
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Default configuration path under `base_dir`.
    #[must_use]
    pub fn default_path(base_dir: &Path) -> PathBuf {
        base_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME)
    }

    /// Replace the instance password when `password` is set.
    #[must_use]
    pub fn with_password_override(mut self, password: Option<String>) -> Self {
        if let (Some(instance), Some(password)) = (self.instance.as_mut(), password) {
            instance.password = Some(password);
        }
        self
    }

    /// Instance settings, required for remote traversal.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` when no `instance` section is configured.
    pub fn require_instance(&self) -> Result<&InstanceConfig> {
        self.instance
            .as_ref()
            .ok_or_else(|| Error::Config("no instance configured".to_string()))
    }
}
