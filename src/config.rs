//! Run configuration.
//!
//! [`RunConfig`] gathers every tunable of a run. The binary layers command
//! line flags over an optional TOML file over [`RunConfig::default`].

use std::path::{Component, Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::batch::FailurePolicy;
use crate::fetch::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use crate::storage::StorageLayout;

/// Default local storage directory.
pub const DEFAULT_STORAGE_DIR: &str = "images";

/// Default archive path.
pub const DEFAULT_ARCHIVE_PATH: &str = "result.zip";

/// Default number of records requested per page.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Default ceiling on records accepted in one run.
pub const DEFAULT_MAX_RESULTS: usize = 20;

/// Default number of concurrently active workers.
pub const DEFAULT_CONCURRENCY: usize = 2;

/// Minimum allowed concurrency value.
pub const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
pub const MAX_CONCURRENCY: usize = 100;

/// Maximum allowed page size.
pub const MAX_PAGE_SIZE: usize = 1000;

/// Invalid configuration values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Concurrency outside the supported range.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },

    /// Page size outside the supported range.
    #[error("invalid page size {value}: must be between 1 and {MAX_PAGE_SIZE}")]
    InvalidPageSize {
        /// The invalid value that was provided.
        value: usize,
    },

    /// A run must accept at least one record.
    #[error("invalid max results {value}: must be at least 1")]
    InvalidMaxResults {
        /// The invalid value that was provided.
        value: usize,
    },

    /// A timeout of zero seconds would fail every request.
    #[error("invalid {name}: must be at least 1 second")]
    InvalidTimeout {
        /// Name of the timeout setting.
        name: &'static str,
    },

    /// The storage root is the working directory or one of its ancestors,
    /// which cleanup would remove.
    #[error(
        "invalid storage directory {path:?}: must not be the working directory or one of its ancestors"
    )]
    InvalidStorageDir {
        /// Storage directory as given.
        path: PathBuf,
    },

    /// The archive would be written inside the storage it packages.
    #[error("archive path {archive} must not be inside storage directory {storage}")]
    ArchiveInsideStorage {
        /// Archive path.
        archive: PathBuf,
        /// Storage directory.
        storage: PathBuf,
    },
}

/// Every tunable of one run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Local storage root for artifacts and journals.
    pub storage_dir: PathBuf,
    /// Where the final archive is written.
    pub archive_path: PathBuf,
    /// Records requested per page.
    pub page_size: usize,
    /// Ceiling on records accepted for fetching in one run.
    pub max_results: usize,
    /// Ceiling on concurrently active workers.
    pub concurrency: usize,
    /// What a transport failure does to the run.
    pub failure_policy: FailurePolicy,
    /// Keep local storage after archiving instead of removing it.
    pub keep_storage: bool,
    /// HTTP connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// HTTP total request timeout in seconds.
    pub read_timeout_secs: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            archive_path: PathBuf::from(DEFAULT_ARCHIVE_PATH),
            page_size: DEFAULT_PAGE_SIZE,
            max_results: DEFAULT_MAX_RESULTS,
            concurrency: DEFAULT_CONCURRENCY,
            failure_policy: FailurePolicy::default(),
            keep_storage: false,
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            read_timeout_secs: READ_TIMEOUT_SECS,
        }
    }
}

impl RunConfig {
    /// Checks every value against its supported range.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&self.concurrency) {
            return Err(ConfigError::InvalidConcurrency {
                value: self.concurrency,
            });
        }
        if !(1..=MAX_PAGE_SIZE).contains(&self.page_size) {
            return Err(ConfigError::InvalidPageSize {
                value: self.page_size,
            });
        }
        if self.max_results == 0 {
            return Err(ConfigError::InvalidMaxResults {
                value: self.max_results,
            });
        }
        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout {
                name: "connect_timeout_secs",
            });
        }
        if self.read_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout {
                name: "read_timeout_secs",
            });
        }
        let storage = lexical_absolute(&self.storage_dir);
        let cwd = lexical_absolute(Path::new("."));
        if self.storage_dir.as_os_str().is_empty() || cwd.starts_with(&storage) {
            return Err(ConfigError::InvalidStorageDir {
                path: self.storage_dir.clone(),
            });
        }
        if lexical_absolute(&self.archive_path).starts_with(&storage) {
            return Err(ConfigError::ArchiveInsideStorage {
                archive: self.archive_path.clone(),
                storage: self.storage_dir.clone(),
            });
        }
        Ok(())
    }

    /// Returns the storage layout for this configuration.
    #[must_use]
    pub fn layout(&self) -> StorageLayout {
        StorageLayout::new(&self.storage_dir)
    }
}

/// Makes `path` absolute against the working directory and folds `.` and
/// `..` without touching the file system, so different spellings of the same
/// location compare equal.
fn lexical_absolute(path: &Path) -> PathBuf {
    let base = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut normalized = PathBuf::new();
    for component in base.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = RunConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.page_size, 10);
        assert_eq!(config.max_results, 20);
        assert_eq!(config.concurrency, 2);
        assert_eq!(config.failure_policy, FailurePolicy::Skip);
        assert!(!config.keep_storage);
    }

    #[test]
    fn test_validate_concurrency_bounds() {
        let mut config = RunConfig {
            concurrency: 0,
            ..RunConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidConcurrency { value: 0 })
        );
        config.concurrency = 101;
        assert!(config.validate().is_err());
        config.concurrency = 100;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_page_size_and_max_results() {
        let config = RunConfig {
            page_size: 0,
            ..RunConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidPageSize { value: 0 }));

        let config = RunConfig {
            max_results: 0,
            ..RunConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidMaxResults { value: 0 })
        );
    }

    #[test]
    fn test_validate_zero_timeout() {
        let config = RunConfig {
            read_timeout_secs: 0,
            ..RunConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidTimeout {
                name: "read_timeout_secs"
            })
        );
    }

    #[test]
    fn test_validate_archive_inside_storage() {
        let config = RunConfig {
            archive_path: PathBuf::from("images/result.zip"),
            ..RunConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ArchiveInsideStorage { .. })
        ));
    }

    #[test]
    fn test_validate_archive_inside_storage_other_spellings() {
        let config = RunConfig {
            storage_dir: PathBuf::from("./images"),
            archive_path: PathBuf::from("images/result.zip"),
            ..RunConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ArchiveInsideStorage { .. })
        ));

        let config = RunConfig {
            storage_dir: PathBuf::from("work/../images"),
            archive_path: PathBuf::from("./images/./result.zip"),
            ..RunConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ArchiveInsideStorage { .. })
        ));

        let config = RunConfig {
            storage_dir: std::env::current_dir().unwrap().join("images"),
            archive_path: PathBuf::from("images/result.zip"),
            ..RunConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ArchiveInsideStorage { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_working_directory_as_storage() {
        for dir in [".", "./", "", "..", "images/.."] {
            let config = RunConfig {
                storage_dir: PathBuf::from(dir),
                ..RunConfig::default()
            };
            assert_eq!(
                config.validate(),
                Err(ConfigError::InvalidStorageDir {
                    path: PathBuf::from(dir)
                }),
                "storage_dir {dir:?}"
            );
        }
    }

    #[test]
    fn test_validate_archive_beside_storage_is_fine() {
        let config = RunConfig {
            storage_dir: PathBuf::from("./images"),
            archive_path: PathBuf::from("images.zip"),
            ..RunConfig::default()
        };
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_lexical_absolute_folds_dots() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(lexical_absolute(Path::new("./a/../b")), cwd.join("b"));
        assert_eq!(lexical_absolute(Path::new("/x/./y/../z")), PathBuf::from("/x/z"));
    }

    #[test]
    fn test_error_display_mentions_range() {
        let msg = ConfigError::InvalidConcurrency { value: 0 }.to_string();
        assert!(msg.contains("invalid concurrency"));
        assert!(msg.contains("100"));
    }

    #[test]
    fn test_deserialize_partial_toml_keeps_defaults() {
        let config: RunConfig = toml::from_str(
            r#"
concurrency = 4
failure_policy = "abort"
storage_dir = "work"
"#,
        )
        .unwrap();
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.failure_policy, FailurePolicy::Abort);
        assert_eq!(config.storage_dir, PathBuf::from("work"));
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_deserialize_rejects_unknown_key() {
        let result: Result<RunConfig, _> = toml::from_str("concurency = 4\n");
        assert!(result.is_err());
    }
}
