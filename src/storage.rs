//! Local storage layout for one run.
//!
//! Everything a run writes before archiving lives under a single root:
//! artifacts named `{id}{ext}`, the tag journal, and the progress journal.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

/// File name of the tag journal inside the storage root.
pub const TAGS_FILE_NAME: &str = "tags.csv";

/// File name of the progress journal inside the storage root.
pub const PROGRESS_FILE_NAME: &str = "status.dat";

/// Paths of everything a run keeps in local storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    root: PathBuf,
}

impl StorageLayout {
    /// Creates a layout rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the storage root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the tag journal path.
    #[must_use]
    pub fn tags_path(&self) -> PathBuf {
        self.root.join(TAGS_FILE_NAME)
    }

    /// Returns the progress journal path.
    #[must_use]
    pub fn progress_path(&self) -> PathBuf {
        self.root.join(PROGRESS_FILE_NAME)
    }

    /// Returns the artifact path for a record id and resolved extension.
    #[must_use]
    pub fn artifact_path(&self, id: i64, extension: &str) -> PathBuf {
        self.root.join(format!("{id}{extension}"))
    }

    /// Returns the directory prefix artifacts carry inside the archive.
    ///
    /// This is the last component of the storage root, e.g. `images`.
    #[must_use]
    pub fn archive_prefix(&self) -> Option<String> {
        self.root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
    }

    /// Creates the storage root if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns the underlying IO error if the directory cannot be created.
    pub async fn prepare(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        debug!(root = %self.root.display(), "storage ready");
        Ok(())
    }

    /// Removes the storage root and everything in it.
    ///
    /// A root that is already gone is not an error.
    ///
    /// # Errors
    ///
    /// Returns the underlying IO error if removal fails.
    pub async fn cleanup(&self) -> std::io::Result<()> {
        match tokio::fs::remove_dir_all(&self.root).await {
            Ok(()) => {
                info!(root = %self.root.display(), "local storage removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}
