//! Workspace files port (collaborator boundary)
//!
//! Components outside the sync engine (e.g. a chat-command router) read and
//! write files in the watched directory through this interface. Files
//! created via [`WorkspaceFiles::write_file`] are ordinary files: the
//! watcher picks them up exactly like externally created ones, with no
//! special-casing in the engine.

/// Port trait for collaborator access to the watched directory.
///
/// Names are relative to the watched root and must not escape it;
/// implementations reject traversal attempts.
#[async_trait::async_trait]
pub trait WorkspaceFiles: Send + Sync {
    /// Lists syncable files (non-hidden, supported extension) as paths
    /// relative to the watched root, sorted.
    async fn list_files(&self) -> anyhow::Result<Vec<String>>;

    /// Reads a file's content as UTF-8 text.
    ///
    /// Honors the engine's file-size ceiling: oversize files are an error,
    /// not a truncated read.
    async fn read_file(&self, name: &str) -> anyhow::Result<String>;

    /// Writes `content` to a file, atomically (temp file + rename),
    /// creating parent directories as needed.
    async fn write_file(&self, name: &str, content: &str) -> anyhow::Result<()>;
}
