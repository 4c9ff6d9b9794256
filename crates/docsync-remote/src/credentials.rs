//! API token resolution
//!
//! The token is resolved exactly once at startup, from two sources in
//! order: an environment variable, then a per-user config file containing
//! the raw secret as trimmed text. The first non-empty value wins.
//!
//! Absence is not an error. The engine reports it and runs in watch-only
//! mode; rotating the token requires a restart.

use std::path::PathBuf;

use tracing::debug;

/// Environment variable checked first for the API token.
pub const TOKEN_ENV_VAR: &str = "DOCSYNC_API_TOKEN";

/// Where to look for the API token.
#[derive(Debug, Clone)]
pub struct CredentialSource {
    env_var: String,
    file_path: PathBuf,
}

impl CredentialSource {
    /// Creates a source with explicit locations (used by tests).
    pub fn new(env_var: impl Into<String>, file_path: impl Into<PathBuf>) -> Self {
        Self {
            env_var: env_var.into(),
            file_path: file_path.into(),
        }
    }

    /// The token file path reported to the operator in degraded mode.
    pub fn file_path(&self) -> &std::path::Path {
        &self.file_path
    }

    /// The environment variable name reported to the operator.
    pub fn env_var(&self) -> &str {
        &self.env_var
    }

    /// Resolves the token: environment variable first, then the token file.
    ///
    /// Values are trimmed; empty values are treated as absent. Returns
    /// `None` when neither source yields a token.
    pub fn resolve(&self) -> Option<String> {
        if let Ok(value) = std::env::var(&self.env_var) {
            let value = value.trim();
            if !value.is_empty() {
                debug!(source = %self.env_var, "API token resolved from environment");
                return Some(value.to_string());
            }
        }

        if let Ok(content) = std::fs::read_to_string(&self.file_path) {
            let content = content.trim();
            if !content.is_empty() {
                debug!(source = %self.file_path.display(), "API token resolved from file");
                return Some(content.to_string());
            }
        }

        None
    }
}

impl Default for CredentialSource {
    /// `DOCSYNC_API_TOKEN`, then `<config_dir>/docsync/api_token`.
    fn default() -> Self {
        let file_path = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("docsync")
            .join("api_token");
        Self::new(TOKEN_ENV_VAR, file_path)
    }
}
