//! Audit driver: validates the local root, scans it, reconciles against the
//! remote filename set and writes the report.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::{AuditConfig, MediaKinds};
use crate::enumerator::Enumeration;
use crate::error::{AuditError, Result};
use crate::reconcile::{find_missing, write_report, MissingList};
use crate::scanner::{scan_directory, SupportedExtensions};

/// What one audit run found.
#[derive(Debug, Clone)]
pub struct AuditSummary {
    /// Distinct remote filenames the comparison ran against.
    pub remote_count: usize,
    /// Set when remote enumeration stopped early.
    pub truncated: Option<String>,
    /// Local files with a supported extension.
    pub scanned: usize,
    pub missing: MissingList,
    pub report_path: PathBuf,
}

impl AuditSummary {
    pub fn all_found(&self) -> bool {
        self.missing.is_empty()
    }

    /// Closing lines shown to the user once the report is written.
    pub fn summary_lines(&self, kinds: MediaKinds) -> Vec<String> {
        if self.all_found() {
            return vec!["All local media files were found in your Google Photos library.".to_string()];
        }
        vec![
            format!(
                "{} {} were not found in Google Photos.",
                self.missing.len(),
                kinds.noun()
            ),
            format!(
                "A list of these files has been saved to: {}",
                self.report_path.display()
            ),
        ]
    }
}

/// Ensure `path` names an existing directory.
pub fn validate_directory<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let path = path.as_ref();
    if path.is_dir() {
        Ok(path.to_path_buf())
    } else {
        Err(AuditError::InvalidDirectory(path.to_path_buf()))
    }
}

/// Scan `root` and write the report of files absent from the remote library.
///
/// Nothing is written if `root` is not a directory.
pub fn run_audit<P: AsRef<Path>>(
    config: &AuditConfig,
    remote: &Enumeration,
    root: P,
) -> Result<AuditSummary> {
    let root = validate_directory(root)?;
    let extensions = SupportedExtensions::for_kinds(config.media_kinds);

    let entries = scan_directory(&root, &extensions);
    let missing = find_missing(&entries, remote.filenames());
    info!(
        root = %root.display(),
        scanned = entries.len(),
        missing = missing.len(),
        "local scan reconciled"
    );

    write_report(&config.report_path, &missing)?;

    let truncated = match remote {
        Enumeration::Truncated { error, .. } => Some(error.clone()),
        Enumeration::Complete { .. } => None,
    };

    Ok(AuditSummary {
        remote_count: remote.filenames().len(),
        truncated,
        scanned: entries.len(),
        missing,
        report_path: config.report_path.clone(),
    })
}
