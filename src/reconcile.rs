//! Comparison of local candidates against the remote filename set, and the
//! plain-text report of what is missing.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::enumerator::RemoteFilenameSet;
use crate::error::{AuditError, Result};
use crate::scanner::LocalFileEntry;

/// Local paths with no same-named remote item, in scan order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissingList {
    paths: Vec<PathBuf>,
}

impl MissingList {
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn into_paths(self) -> Vec<PathBuf> {
        self.paths
    }
}

/// Keep the entries whose base file name is not in `remote`.
///
/// Matching uses the file name only, compared exactly; the directory a file
/// lives in plays no part.
pub fn find_missing<'a, I>(entries: I, remote: &RemoteFilenameSet) -> MissingList
where
    I: IntoIterator<Item = &'a LocalFileEntry>,
{
    let paths = entries
        .into_iter()
        .filter(|entry| !remote.contains(&entry.file_name))
        .map(|entry| entry.path.clone())
        .collect();
    MissingList { paths }
}

/// Write one path per line, replacing any existing report.
///
/// The file is flushed and closed before this returns.
pub fn write_report<P: AsRef<Path>>(path: P, missing: &MissingList) -> Result<()> {
    let path = path.as_ref();
    let report_err = |source| AuditError::ReportWriteError {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(report_err)?;
    let mut writer = BufWriter::new(file);
    for missing_path in missing.paths() {
        writeln!(writer, "{}", missing_path.display()).map_err(report_err)?;
    }
    writer.flush().map_err(report_err)?;

    info!(path = %path.display(), entries = missing.len(), "report written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str) -> LocalFileEntry {
        let path = PathBuf::from(path);
        LocalFileEntry {
            file_name: path.file_name().unwrap().to_string_lossy().into_owned(),
            extension: path.extension().unwrap().to_string_lossy().into_owned(),
            path,
        }
    }

    #[test]
    fn test_filename_only_match() {
        let remote: RemoteFilenameSet = ["a.jpg", "b.png"].into_iter().collect();
        let entries = vec![entry("/x/a.jpg"), entry("/x/c.gif"), entry("/y/b.png")];

        let missing = find_missing(&entries, &remote);
        assert_eq!(missing.paths(), &[PathBuf::from("/x/c.gif")]);
    }

    #[test]
    fn test_same_name_in_different_folders_matches_both() {
        let remote: RemoteFilenameSet = ["IMG_1.jpg"].into_iter().collect();
        let entries = vec![entry("/2020/IMG_1.jpg"), entry("/2021/IMG_1.jpg")];
        assert!(find_missing(&entries, &remote).is_empty());
    }

    #[test]
    fn test_filename_comparison_is_case_sensitive() {
        let remote: RemoteFilenameSet = ["img_1.jpg"].into_iter().collect();
        let entries = vec![entry("/a/IMG_1.JPG")];
        assert_eq!(find_missing(&entries, &remote).len(), 1);
    }

    #[test]
    fn test_keeps_scan_order() {
        let remote = RemoteFilenameSet::new();
        let entries = vec![entry("/b/2.jpg"), entry("/a/1.jpg"), entry("/c/3.jpg")];
        let missing = find_missing(&entries, &remote);
        assert_eq!(
            missing.into_paths(),
            vec![
                PathBuf::from("/b/2.jpg"),
                PathBuf::from("/a/1.jpg"),
                PathBuf::from("/c/3.jpg"),
            ]
        );
    }
}
