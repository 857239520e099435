#![allow(dead_code)]

pub mod socket_guard;

/// Evaluates to a running mock server, or returns from the calling test when
/// localhost sockets are unavailable.
macro_rules! require_mock_server {
    () => {{
        let caller = concat!(file!(), ":", line!());
        let Some(mock_server) = $crate::support::socket_guard::mock_server_for(caller).await else {
            return;
        };
        mock_server
    }};
}

use std::path::Path;

/// Reads a journal file into its lines, or an empty list if it is absent.
pub fn journal_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .map(|text| text.lines().map(str::to_owned).collect())
        .unwrap_or_default()
}

/// Returns the sorted entry names of a zip archive.
pub fn archive_names(path: &Path) -> Vec<String> {
    let file = std::fs::File::open(path).unwrap();
    let archive = zip::ZipArchive::new(file).unwrap();
    let mut names: Vec<String> = archive.file_names().map(str::to_owned).collect();
    names.sort();
    names
}
