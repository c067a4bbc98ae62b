//! Configuration loading and resolution
//!
//! Settings are resolved per key in priority order:
//! 1. Command-line argument / environment variable (handled by the binary)
//! 2. TOML config file
//! 3. Compiled default
//!
//! Both upper layers are expressed as a [`TomlConfig`] with every key
//! optional; [`AuditConfig::resolve`] overlays them onto the defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::mapping::FieldMapping;
use crate::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://islandora.dev/islandora/object";
pub const DEFAULT_FORMAT: &str = "mods";
pub const DEFAULT_REGISTRY_PATH: &str = "pids.csv";
pub const DEFAULT_REPORT_PATH: &str = "update.csv";
pub const DEFAULT_WORKERS: usize = 50;
pub const DEFAULT_PLACEHOLDER: &str = ".keep";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// One configuration layer (TOML file or command line)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// Directory holding one legacy MODS file per object
    pub root_dir: Option<PathBuf>,
    /// Base URL objects are fetched from on the live platform
    pub base_url: Option<String>,
    /// Value of the `_format` query parameter
    pub format: Option<String>,
    /// `nid,pid` registry file
    pub registry_path: Option<PathBuf>,
    /// Report CSV written by the audit
    pub report_path: Option<PathBuf>,
    /// Number of concurrent workers
    pub workers: Option<usize>,
    /// Bound on queued object files (defaults to `workers`)
    pub queue_capacity: Option<usize>,
    /// File name skipped during the directory walk
    pub placeholder: Option<String>,
    /// Resolve node ids missing from the registry against the live platform
    pub resolve_remote: Option<bool>,
    /// Per-request timeout for live fetches; unset means no timeout
    pub request_timeout_secs: Option<u64>,
    /// Report columns to audit (field names or column names)
    pub fields: Option<Vec<String>>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    pub level: Option<String>,
}

impl TomlConfig {
    /// Overlay `self` on top of `lower`: keys set here win
    pub fn or(self, lower: TomlConfig) -> TomlConfig {
        TomlConfig {
            root_dir: self.root_dir.or(lower.root_dir),
            base_url: self.base_url.or(lower.base_url),
            format: self.format.or(lower.format),
            registry_path: self.registry_path.or(lower.registry_path),
            report_path: self.report_path.or(lower.report_path),
            workers: self.workers.or(lower.workers),
            queue_capacity: self.queue_capacity.or(lower.queue_capacity),
            placeholder: self.placeholder.or(lower.placeholder),
            resolve_remote: self.resolve_remote.or(lower.resolve_remote),
            request_timeout_secs: self.request_timeout_secs.or(lower.request_timeout_secs),
            fields: self.fields.or(lower.fields),
            logging: LoggingConfig {
                level: self.logging.level.or(lower.logging.level),
            },
        }
    }
}

/// Fully resolved audit configuration
#[derive(Debug, Clone)]
pub struct AuditConfig {
    pub root_dir: PathBuf,
    pub base_url: String,
    pub format: String,
    pub registry_path: PathBuf,
    pub report_path: PathBuf,
    pub workers: usize,
    pub queue_capacity: usize,
    pub placeholder: String,
    pub resolve_remote: bool,
    pub request_timeout: Option<Duration>,
    pub mapping: FieldMapping,
    pub log_level: String,
}

impl AuditConfig {
    /// Defaults for a given root directory
    pub fn for_root(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            format: DEFAULT_FORMAT.to_string(),
            registry_path: PathBuf::from(DEFAULT_REGISTRY_PATH),
            report_path: PathBuf::from(DEFAULT_REPORT_PATH),
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_WORKERS,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            resolve_remote: false,
            request_timeout: None,
            mapping: FieldMapping::default(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }

    /// Resolve command-line and file layers onto compiled defaults
    pub fn resolve(cli: TomlConfig, file: TomlConfig) -> Result<Self> {
        let merged = cli.or(file);

        let root_dir = merged.root_dir.ok_or_else(|| {
            Error::Config("root directory not set (use --root-dir or DIR)".to_string())
        })?;
        let mut config = Self::for_root(root_dir);

        if let Some(base_url) = merged.base_url {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(format) = merged.format {
            config.format = format;
        }
        if let Some(path) = merged.registry_path {
            config.registry_path = path;
        }
        if let Some(path) = merged.report_path {
            config.report_path = path;
        }
        if let Some(workers) = merged.workers {
            if workers == 0 {
                return Err(Error::Config("workers must be at least 1".to_string()));
            }
            config.workers = workers;
        }
        config.queue_capacity = match merged.queue_capacity {
            Some(0) => return Err(Error::Config("queue_capacity must be at least 1".to_string())),
            Some(capacity) => capacity,
            None => config.workers,
        };
        if let Some(placeholder) = merged.placeholder {
            config.placeholder = placeholder;
        }
        if let Some(resolve_remote) = merged.resolve_remote {
            config.resolve_remote = resolve_remote;
        }
        config.request_timeout = merged.request_timeout_secs.map(Duration::from_secs);
        if let Some(fields) = merged.fields {
            config.mapping = FieldMapping::select(&fields)
                .map_err(|e| Error::Config(format!("invalid fields: {}", e)))?;
        }
        if let Some(level) = merged.logging.level {
            config.log_level = level;
        }

        Ok(config)
    }
}

/// Default config file location (`~/.config/modsrecon/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("modsrecon").join("config.toml"))
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Load the file layer
///
/// An explicitly named file must exist and parse. Without one, the default
/// location is tried and silently skipped when absent.
pub fn load_config_layer(explicit: Option<&Path>) -> Result<TomlConfig> {
    if let Some(path) = explicit {
        return load_toml_config(path);
    }

    match default_config_path() {
        Some(path) if path.exists() => {
            tracing::info!(path = %path.display(), "Using config file");
            load_toml_config(&path)
        }
        _ => Ok(TomlConfig::default()),
    }
}
