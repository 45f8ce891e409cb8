//! Configuration loading and database path resolution
//!
//! Bootstrap configuration comes from a TOML file. Resolution order for the
//! file itself and for the database path:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`UKBOL_CONFIG` / `UKBOL_DATABASE`)
//! 3. TOML config file (`~/.config/ukbol/config.toml`, then `/etc/ukbol/config.toml`)
//! 4. Compiled default (fallback)
//!
//! A missing default config file is not an error: defaults are used and a
//! warning is logged. A config file named explicitly (CLI or ENV) must exist.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the TOML config file
pub const CONFIG_ENV_VAR: &str = "UKBOL_CONFIG";

/// Environment variable naming the SQLite database file
pub const DATABASE_ENV_VAR: &str = "UKBOL_DATABASE";

/// Environment variable carrying the version label of a PANTHEON snapshot
pub const PANTHEON_VERSION_ENV_VAR: &str = "UKBOL_PANTHEON_DATA_VERSION";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Path to the SQLite database file
    pub database_path: Option<PathBuf>,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Taxonomy rebuild policy
    pub taxonomy: TaxonomyConfig,

    /// NBN species search feed
    pub nbn: NbnConfig,

    /// Cluster (BIN) matching and specimen import
    pub bins: BinsConfig,

    /// PANTHEON species traits import
    pub pantheon: PantheonConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// What to do with a parentless taxon whose name is not a configured root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtraRootPolicy {
    /// Drop the node and everything below it
    #[default]
    Drop,
    /// Keep the node as an additional root (logged as an anomaly)
    Retain,
}

/// Taxonomy rebuild policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxonomyConfig {
    /// Names pinned as the roots of the stored forest
    pub root_names: BTreeSet<String>,
    /// Ranks never stored; their subtrees are dropped with them
    pub excluded_ranks: BTreeSet<String>,
    /// Rows per insert transaction
    pub batch_size: usize,
    /// Policy for parentless taxa outside `root_names`
    pub extra_roots: ExtraRootPolicy,
    /// Only records from this info source are used (when the feed says)
    pub info_source: Option<String>,
}

impl Default for TaxonomyConfig {
    fn default() -> Self {
        Self {
            root_names: ["animalia", "chromista", "fungi", "plantae"]
                .into_iter()
                .map(String::from)
                .collect(),
            excluded_ranks: ["unranked", "unknown", "functional group"]
                .into_iter()
                .map(String::from)
                .collect(),
            batch_size: 1000,
            extra_roots: ExtraRootPolicy::Drop,
            info_source: Some("uksi".to_string()),
        }
    }
}

/// NBN species search feed settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NbnConfig {
    pub url: String,
    /// Rows requested per page
    pub page_size: usize,
    /// Retries per page before the rebuild is abandoned
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub timeout_secs: u64,
}

impl Default for NbnConfig {
    fn default() -> Self {
        Self {
            url: "https://species-ws.nbnatlas.org/search".to_string(),
            page_size: 200,
            max_retries: 5,
            initial_backoff_ms: 500,
            max_backoff_ms: 30_000,
            timeout_secs: 60,
        }
    }
}

/// Cluster matching and specimen import settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BinsConfig {
    /// Country code counted separately in cluster summaries
    pub geography: String,
    /// Specimens per chunk when streaming exports
    pub chunk_size: usize,
    /// Specimens per insert transaction during a snapshot import
    pub specimen_batch_size: usize,
}

impl Default for BinsConfig {
    fn default() -> Self {
        Self {
            geography: "gb".to_string(),
            chunk_size: 1000,
            specimen_batch_size: 10_000,
        }
    }
}

/// PANTHEON species traits import settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PantheonConfig {
    /// Rows per insert transaction
    pub batch_size: usize,
    /// Version label recorded in the data source status
    pub data_version: Option<String>,
}

impl Default for PantheonConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            data_version: None,
        }
    }
}

impl TomlConfig {
    /// Parse, normalize and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)?;
        config.normalized()
    }

    /// Lowercase the matching vocabularies and reject unusable sizes
    pub fn normalized(mut self) -> Result<Self> {
        let lower = |set: &BTreeSet<String>| -> BTreeSet<String> {
            set.iter()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect()
        };
        self.taxonomy.root_names = lower(&self.taxonomy.root_names);
        self.taxonomy.excluded_ranks = lower(&self.taxonomy.excluded_ranks);
        self.taxonomy.info_source = self
            .taxonomy
            .info_source
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        self.bins.geography = self.bins.geography.trim().to_lowercase();

        if self.taxonomy.root_names.is_empty() {
            return Err(Error::Config("taxonomy.root_names must not be empty".to_string()));
        }
        for (key, value) in [
            ("taxonomy.batch_size", self.taxonomy.batch_size),
            ("nbn.page_size", self.nbn.page_size),
            ("bins.chunk_size", self.bins.chunk_size),
            ("bins.specimen_batch_size", self.bins.specimen_batch_size),
            ("pantheon.batch_size", self.pantheon.batch_size),
        ] {
            if value == 0 {
                return Err(Error::Config(format!("{} must be greater than 0", key)));
            }
        }
        Ok(self)
    }
}

/// Load configuration following the documented priority order
pub fn load_config(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    // Priority 1 and 2: explicitly named files must exist
    let explicit = cli_arg
        .map(Path::to_path_buf)
        .or_else(|| std::env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from));

    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            path
        }
        // Priority 3: well-known locations
        None => match default_config_file() {
            Some(path) => path,
            None => {
                // Priority 4: compiled defaults
                warn!("No config file found, using built-in defaults");
                return TomlConfig::default().normalized();
            }
        },
    };

    info!("Loading configuration from {}", path.display());
    let content = std::fs::read_to_string(&path)?;
    TomlConfig::from_toml_str(&content)
}

/// Resolve the database file path
pub fn resolve_database_path(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var(DATABASE_ENV_VAR) {
        return PathBuf::from(path);
    }
    if let Some(path) = &config.database_path {
        return path.clone();
    }
    default_database_path()
}

/// First existing config file in the platform's well-known locations
fn default_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("ukbol").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }
    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/ukbol/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }
    None
}

/// OS-dependent default database location
fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("ukbol"))
        .unwrap_or_else(|| PathBuf::from("./ukbol_data"))
        .join("ukbol.db")
}
