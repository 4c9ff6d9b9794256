//! Workspace files adapter
//!
//! Implements the [`WorkspaceFiles`] port directly over the watched tree.
//! Writes are ordinary filesystem writes, so the watcher observes them and
//! the engine syncs them like any external edit; nothing here talks to the
//! ledger or the remote.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use walkdir::WalkDir;

use docsync_core::ports::WorkspaceFiles;

use crate::detector::SyncPolicy;
use crate::watcher::is_hidden;

/// Workspace access rooted at the watched directory.
pub struct WorkspaceFilesAdapter {
    root: PathBuf,
    policy: Arc<SyncPolicy>,
}

impl WorkspaceFilesAdapter {
    pub fn new(root: PathBuf, policy: SyncPolicy) -> Self {
        Self {
            root,
            policy: Arc::new(policy),
        }
    }

    /// Resolves a relative name to an absolute path inside the root.
    ///
    /// Rejects absolute names and any `..` component, so a name can never
    /// address a file outside the watched tree.
    fn resolve(&self, name: &str) -> Result<PathBuf> {
        let relative = Path::new(name);
        if relative.is_absolute() {
            bail!("file name must be relative: {name}");
        }
        for component in relative.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                _ => bail!("file name escapes the workspace: {name}"),
            }
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait::async_trait]
impl WorkspaceFiles for WorkspaceFilesAdapter {
    async fn list_files(&self) -> Result<Vec<String>> {
        let root = self.root.clone();
        let policy = self.policy.clone();

        let mut names = tokio::task::spawn_blocking(move || {
            WalkDir::new(&root)
                .follow_links(false)
                .into_iter()
                .filter_entry(|entry| !is_hidden(&root, entry.path()))
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file())
                .filter(|entry| policy.extension_allowed(entry.path()))
                .filter_map(|entry| {
                    entry
                        .path()
                        .strip_prefix(&root)
                        .ok()
                        .map(|rel| rel.to_string_lossy().into_owned())
                })
                .collect::<Vec<_>>()
        })
        .await
        .context("workspace listing task failed")?;

        names.sort();
        Ok(names)
    }

    async fn read_file(&self, name: &str) -> Result<String> {
        let path = self.resolve(name)?;

        let metadata = tokio::fs::metadata(&path)
            .await
            .with_context(|| format!("cannot stat {name}"))?;
        if metadata.len() > self.policy.max_file_size() {
            bail!(
                "{name} is {} bytes, over the {}-byte limit",
                metadata.len(),
                self.policy.max_file_size()
            );
        }

        tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("cannot read {name}"))
    }

    async fn write_file(&self, name: &str, content: &str) -> Result<()> {
        let path = self.resolve(name)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("cannot create parent directories for {name}"))?;
        }

        // Write-then-rename so the watcher never observes a half-written
        // file under the final name.
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp = path.with_file_name(format!(".{file_name}.tmp"));

        tokio::fs::write(&tmp, content)
            .await
            .with_context(|| format!("cannot write temp file for {name}"))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("cannot move {name} into place"))?;

        Ok(())
    }
}

// ============================================================================
// Unit tests
// ============================================================================
