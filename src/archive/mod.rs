//! Final archive creation.
//!
//! The archiver packages local storage into one zip file once every worker
//! has finished:
//!
//! ```text
//! result.zip
//! ├── images/100003.jpg
//! ├── images/100006.jpg
//! └── tags.csv            <- bare name, not under the storage prefix
//! ```
//!
//! The progress journal never enters the archive. An existing archive at the
//! target path is renamed with a unix timestamp suffix instead of being
//! overwritten.

mod error;

pub use error::ArchiveError;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info, instrument, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::storage::{PROGRESS_FILE_NAME, StorageLayout, TAGS_FILE_NAME};

/// One file that will be written into the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Path of the file in local storage.
    pub source: PathBuf,
    /// Name of the entry inside the archive.
    pub name: String,
}

/// Outcome of a successful archive run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveReport {
    /// The archive that was written.
    pub path: PathBuf,
    /// Where a previous archive was moved, if there was one.
    pub rotated: Option<PathBuf>,
    /// Entry names, in write order.
    pub entries: Vec<String>,
}

/// Packages local storage into a single archive.
#[derive(Debug, Clone)]
pub struct Archiver {
    layout: StorageLayout,
    archive_path: PathBuf,
}

impl Archiver {
    /// Creates an archiver for `layout` writing to `archive_path`.
    #[must_use]
    pub fn new(layout: StorageLayout, archive_path: impl Into<PathBuf>) -> Self {
        Self {
            layout,
            archive_path: archive_path.into(),
        }
    }

    /// Lists what [`archive`](Self::archive) would write, sorted by entry name.
    ///
    /// A missing storage directory lists nothing.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Io`] if the storage directory cannot be read.
    pub async fn entries(&self) -> Result<Vec<ArchiveEntry>, ArchiveError> {
        let layout = self.layout.clone();
        tokio::task::spawn_blocking(move || collect_entries(&layout))
            .await
            .map_err(|e| ArchiveError::Task(e.to_string()))?
    }

    /// Rotates any existing archive, then writes a new one.
    ///
    /// The work runs on the blocking pool. If any entry fails, the partial
    /// archive is removed; a rotated predecessor stays where it was moved.
    ///
    /// # Errors
    ///
    /// - [`ArchiveError::Rotate`] if the existing archive cannot be renamed
    /// - [`ArchiveError::Io`] if storage or the archive file fails
    /// - [`ArchiveError::Zip`] if the archive writer fails
    #[instrument(skip(self), fields(archive = %self.archive_path.display()))]
    pub async fn archive(&self) -> Result<ArchiveReport, ArchiveError> {
        let layout = self.layout.clone();
        let archive_path = self.archive_path.clone();
        tokio::task::spawn_blocking(move || write_archive(&layout, &archive_path))
            .await
            .map_err(|e| ArchiveError::Task(e.to_string()))?
    }
}

fn write_archive(
    layout: &StorageLayout,
    archive_path: &Path,
) -> Result<ArchiveReport, ArchiveError> {
    let rotated = rotate_existing(archive_path)?;
    let entries = collect_entries(layout)?;

    match write_entries(archive_path, &entries) {
        Ok(()) => {
            info!(
                archive = %archive_path.display(),
                entries = entries.len(),
                "archive written"
            );
            Ok(ArchiveReport {
                path: archive_path.to_path_buf(),
                rotated,
                entries: entries.into_iter().map(|entry| entry.name).collect(),
            })
        }
        Err(e) => {
            warn!(archive = %archive_path.display(), error = %e, "removing partial archive");
            let _ = std::fs::remove_file(archive_path);
            Err(e)
        }
    }
}

fn write_entries(archive_path: &Path, entries: &[ArchiveEntry]) -> Result<(), ArchiveError> {
    let file = File::create(archive_path).map_err(|e| ArchiveError::io(archive_path, e))?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    // Fixed timestamps keep the archive byte-identical for identical inputs.
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());

    for entry in entries {
        debug!(entry = %entry.name, "adding archive entry");
        let mut source =
            File::open(&entry.source).map_err(|e| ArchiveError::io(&entry.source, e))?;
        zip.start_file(entry.name.as_str(), options)
            .map_err(|e| ArchiveError::zip(archive_path, e))?;
        std::io::copy(&mut source, &mut zip).map_err(|e| ArchiveError::io(&entry.source, e))?;
    }

    let mut writer = zip.finish().map_err(|e| ArchiveError::zip(archive_path, e))?;
    writer.flush().map_err(|e| ArchiveError::io(archive_path, e))?;
    let file = writer
        .into_inner()
        .map_err(|e| ArchiveError::io(archive_path, e.into_error()))?;
    file.sync_all().map_err(|e| ArchiveError::io(archive_path, e))?;
    Ok(())
}

fn collect_entries(layout: &StorageLayout) -> Result<Vec<ArchiveEntry>, ArchiveError> {
    let root = layout.root();
    let read_dir = match std::fs::read_dir(root) {
        Ok(read_dir) => read_dir,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(ArchiveError::io(root, e)),
    };
    let prefix = layout.archive_prefix();

    let mut entries = Vec::new();
    for dir_entry in read_dir {
        let dir_entry = dir_entry.map_err(|e| ArchiveError::io(root, e))?;
        let file_type = dir_entry
            .file_type()
            .map_err(|e| ArchiveError::io(dir_entry.path(), e))?;
        if !file_type.is_file() {
            debug!(path = %dir_entry.path().display(), "skipping non-file storage entry");
            continue;
        }

        let file_name = dir_entry.file_name().to_string_lossy().into_owned();
        if file_name == PROGRESS_FILE_NAME {
            continue;
        }
        let name = if file_name == TAGS_FILE_NAME {
            file_name
        } else {
            match &prefix {
                Some(prefix) => format!("{prefix}/{file_name}"),
                None => file_name,
            }
        };
        entries.push(ArchiveEntry {
            source: dir_entry.path(),
            name,
        });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Moves an existing archive aside, returning its new path.
fn rotate_existing(archive_path: &Path) -> Result<Option<PathBuf>, ArchiveError> {
    if std::fs::symlink_metadata(archive_path).is_err() {
        return Ok(None);
    }

    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let mut target = suffixed(archive_path, &stamp.to_string());
    let mut attempt = 1u32;
    while std::fs::symlink_metadata(&target).is_ok() {
        target = suffixed(archive_path, &format!("{stamp}.{attempt}"));
        attempt += 1;
    }

    std::fs::rename(archive_path, &target).map_err(|source| ArchiveError::Rotate {
        from: archive_path.to_path_buf(),
        to: target.clone(),
        source,
    })?;
    info!(from = %archive_path.display(), to = %target.display(), "rotated previous archive");
    Ok(Some(target))
}

fn suffixed(path: &Path, suffix: &str) -> PathBuf {
    let mut raw = path.as_os_str().to_os_string();
    raw.push(".");
    raw.push(suffix);
    PathBuf::from(raw)
}
