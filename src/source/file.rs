//! Line-oriented file record source.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, instrument};

use super::{Record, RecordSource, SourceError, page_of};

/// Record source backed by a text file.
///
/// Each non-blank line that does not start with `#` holds one record:
///
/// ```text
/// # id     url                                   tags (optional)
/// 100003   https://example.com/a/38485185.jpg    portrait,eva
/// 100006   https://example.com/b/big_347354.jpg
/// ```
///
/// Fields are separated by whitespace. The file is read once when opened and
/// served in file order, which keeps paging stable for the whole run.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    records: Vec<Record>,
}

impl FileSource {
    /// Reads and parses the source file.
    ///
    /// # Errors
    ///
    /// - [`SourceError::Io`] if the file cannot be read
    /// - [`SourceError::Parse`] for a line without a URL or with a non-integer id
    /// - [`SourceError::DuplicateId`] if an id is listed twice
    #[instrument(fields(path = %path.display()))]
    pub async fn open(path: &Path) -> Result<Self, SourceError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| SourceError::io(path, e))?;
        let records = parse_records(path, &contents)?;
        debug!(records = records.len(), "record source loaded");
        Ok(Self {
            path: path.to_path_buf(),
            records,
        })
    }

    /// Returns the source file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the number of records in the file.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the file holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl RecordSource for FileSource {
    async fn fetch_page(
        &self,
        page_size: usize,
        offset: usize,
    ) -> Result<Vec<Record>, SourceError> {
        Ok(page_of(&self.records, page_size, offset))
    }
}

fn parse_records(path: &Path, contents: &str) -> Result<Vec<Record>, SourceError> {
    let mut records = Vec::new();
    let mut seen = HashSet::new();

    for (index, raw) in contents.lines().enumerate() {
        let line_number = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = line.split_whitespace();
        let id_field = fields.next().unwrap_or_default();
        let id = id_field.parse::<i64>().map_err(|_| {
            SourceError::parse(path, line_number, format!("{id_field:?} is not an integer id"))
        })?;
        let Some(locator) = fields.next() else {
            return Err(SourceError::parse(path, line_number, "missing URL"));
        };
        let tags = fields
            .next()
            .map(|raw_tags| {
                raw_tags
                    .split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default();
        if fields.next().is_some() {
            return Err(SourceError::parse(
                path,
                line_number,
                "unexpected trailing field (tags must be comma-separated without spaces)",
            ));
        }

        if !seen.insert(id) {
            return Err(SourceError::DuplicateId {
                path: path.to_path_buf(),
                line: line_number,
                id,
            });
        }
        records.push(Record::with_tags(id, locator, tags));
    }

    Ok(records)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_parse_records_with_comments_blank_lines_and_tags() {
        let contents = "\
# sample
100003 https://h/a.jpg portrait,eva

100006\thttps://h/b.jpg?V
";
        let records = parse_records(Path::new("records.txt"), contents).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, 100_003);
        assert_eq!(records[0].tags, vec!["portrait".to_string(), "eva".to_string()]);
        assert_eq!(records[1].locator, "https://h/b.jpg?V");
        assert!(records[1].tags.is_empty());
    }

    #[test]
    fn test_parse_records_rejects_bad_id() {
        let err = parse_records(Path::new("r.txt"), "abc https://h/a.jpg\n").unwrap_err();
        assert!(matches!(err, SourceError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_parse_records_rejects_missing_url() {
        let err = parse_records(Path::new("r.txt"), "1 https://h/a\n2\n").unwrap_err();
        match err {
            SourceError::Parse { line, reason, .. } => {
                assert_eq!(line, 2);
                assert!(reason.contains("missing URL"));
            }
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_records_rejects_duplicate_id() {
        let err = parse_records(Path::new("r.txt"), "1 https://h/a\n1 https://h/b\n").unwrap_err();
        assert!(matches!(err, SourceError::DuplicateId { id: 1, line: 2, .. }));
    }

    #[test]
    fn test_parse_records_rejects_trailing_field() {
        let err = parse_records(Path::new("r.txt"), "1 https://h/a x y\n").unwrap_err();
        assert!(matches!(err, SourceError::Parse { line: 1, .. }));
    }

    #[tokio::test]
    async fn test_open_and_page() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.txt");
        std::fs::write(&path, "1 https://h/1.jpg\n2 https://h/2.jpg\n3 https://h/3.jpg\n").unwrap();

        let source = FileSource::open(&path).await.unwrap();
        assert_eq!(source.len(), 3);
        let page = source.fetch_page(2, 2).await.unwrap();
        assert_eq!(page, vec![Record::new(3, "https://h/3.jpg")]);
    }

    #[tokio::test]
    async fn test_open_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = FileSource::open(&dir.path().join("absent.txt")).await.unwrap_err();
        assert!(matches!(err, SourceError::Io { .. }));
    }
}
