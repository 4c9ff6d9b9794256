//! Configuration module for docsync.
//!
//! Provides typed configuration structs that map to the YAML configuration
//! file, with loading, validation, and defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// File extensions eligible for synchronization, compared case-insensitively
/// against the file's extension (without the leading dot).
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "txt", "md", "pdf", "py", "js", "ts", "json", "yaml", "yml", "xml", "html", "css", "sh",
    "bash", "zsh", "swift", "go", "rs", "java", "c", "cpp", "h", "hpp", "sql", "env", "csv",
];

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for docsync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub sync: SyncConfig,
    pub remote: RemoteConfig,
    pub logging: LoggingConfig,
}

/// Synchronization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Root directory of the watched document tree.
    pub root: PathBuf,
    /// Milliseconds a path must stay quiet after its last filesystem event
    /// before it is evaluated (debounce settle interval).
    pub debounce_delay_ms: u64,
    /// Milliseconds between checks of the debounce queue for settled paths.
    pub settle_poll_ms: u64,
    /// File extensions (without the dot) eligible for sync.
    pub extensions: Vec<String>,
    /// Files larger than this (in KiB) are skipped.
    pub max_file_size_kib: u64,
}

/// Remote document store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the document store, e.g. `http://localhost:8080`.
    pub base_url: String,
    /// Per-request timeout for upload calls, in seconds.
    pub request_timeout_secs: u64,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/docsync/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("docsync")
            .join("config.yaml")
    }

    /// Maximum file size in bytes derived from `sync.max_file_size_kib`.
    pub fn max_file_size_bytes(&self) -> u64 {
        self.sync.max_file_size_kib * 1024
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

// Config derives Default because all its fields implement Default.

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            root: dirs::document_dir()
                .or_else(dirs::home_dir)
                .unwrap_or_else(|| PathBuf::from("~"))
                .join("docsync"),
            debounce_delay_ms: 500,
            settle_poll_ms: 100,
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            max_file_size_kib: 500,
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"sync.debounce_delay_ms"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- sync ---
        if self.sync.debounce_delay_ms == 0 {
            errors.push(ValidationError {
                field: "sync.debounce_delay_ms".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.sync.settle_poll_ms == 0 {
            errors.push(ValidationError {
                field: "sync.settle_poll_ms".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.sync.extensions.is_empty() {
            errors.push(ValidationError {
                field: "sync.extensions".into(),
                message: "must list at least one extension".into(),
            });
        }
        if self.sync.max_file_size_kib == 0 {
            errors.push(ValidationError {
                field: "sync.max_file_size_kib".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- remote ---
        if self.remote.base_url.is_empty() {
            errors.push(ValidationError {
                field: "remote.base_url".into(),
                message: "must not be empty".into(),
            });
        }
        if self.remote.request_timeout_secs == 0 {
            errors.push(ValidationError {
                field: "remote.request_timeout_secs".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "must be one of {} (got '{}')",
                    VALID_LOG_LEVELS.join(", "),
                    self.logging.level
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_default_debounce_is_half_second() {
        let config = Config::default();
        assert_eq!(config.sync.debounce_delay_ms, 500);
    }

    #[test]
    fn test_default_size_ceiling() {
        let config = Config::default();
        assert_eq!(config.sync.max_file_size_kib, 500);
        assert_eq!(config.max_file_size_bytes(), 500 * 1024);
    }

    #[test]
    fn test_default_extensions_include_common_formats() {
        let config = Config::default();
        for ext in ["md", "txt", "rs", "py", "csv"] {
            assert!(
                config.sync.extensions.iter().any(|e| e == ext),
                "missing extension {ext}"
            );
        }
    }

    #[test]
    fn test_zero_debounce_rejected() {
        let mut config = Config::default();
        config.sync.debounce_delay_ms = 0;
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.field == "sync.debounce_delay_ms"));
    }

    #[test]
    fn test_empty_base_url_rejected() {
        let mut config = Config::default();
        config.remote.base_url.clear();
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.field == "remote.base_url"));
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let mut config = Config::default();
        config.logging.level = "verbose".into();
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.field == "logging.level"));
    }

    #[test]
    fn test_load_roundtrip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");

        let mut config = Config::default();
        config.sync.root = PathBuf::from("/srv/docs");
        config.remote.base_url = "http://store.internal:9000".into();

        std::fs::write(&path, serde_yaml::to_string(&config).unwrap()).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.sync.root, PathBuf::from("/srv/docs"));
        assert_eq!(loaded.remote.base_url, "http://store.internal:9000");
    }

    #[test]
    fn test_load_or_default_on_missing_file() {
        let config = Config::load_or_default(Path::new("/nonexistent/config.yaml"));
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_default_path_is_not_empty() {
        let path = Config::default_path();
        assert!(!path.as_os_str().is_empty());
    }
}
