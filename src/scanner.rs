//! Recursive scan of a local folder for files with media extensions.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::config::MediaKinds;

const PHOTO_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "tiff", "webp", "heic", "raw",
];

const VIDEO_EXTENSIONS: &[&str] = &[
    "mpg", "mpeg", "mp4", "mkv", "mov", "avi", "wmv", "flv", "3gp", "m4v", "mts", "m2ts",
];

/// Allow-list of file extensions, stored lowercase without the leading dot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedExtensions {
    extensions: HashSet<String>,
}

impl SupportedExtensions {
    pub fn photos() -> Self {
        Self::from_list(PHOTO_EXTENSIONS)
    }

    /// Photos plus videos.
    pub fn media() -> Self {
        Self::from_list(PHOTO_EXTENSIONS.iter().chain(VIDEO_EXTENSIONS))
    }

    pub fn for_kinds(kinds: MediaKinds) -> Self {
        match kinds {
            MediaKinds::PhotosOnly => Self::photos(),
            MediaKinds::PhotosAndVideos => Self::media(),
        }
    }

    fn from_list<'a>(list: impl IntoIterator<Item = &'a &'a str>) -> Self {
        Self {
            extensions: list.into_iter().map(|e| e.to_string()).collect(),
        }
    }

    /// Case-insensitive check of an extension given without the dot.
    pub fn matches(&self, extension: &str) -> bool {
        self.extensions.contains(&extension.to_ascii_lowercase())
    }
}

/// A candidate local file found during the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFileEntry {
    pub path: PathBuf,
    /// Base name used for matching. Lossy if the name is not valid UTF-8.
    pub file_name: String,
    /// Extension as found on disk, without the dot.
    pub extension: String,
}

impl LocalFileEntry {
    fn from_path(path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_string_lossy().into_owned();
        let extension = path.extension()?.to_string_lossy().into_owned();
        Some(Self {
            path: path.to_path_buf(),
            file_name,
            extension,
        })
    }
}

/// Walk `root` recursively and return every file whose extension is supported,
/// in traversal order.
///
/// Entries that cannot be read and files with other extensions are skipped
/// silently. Symbolic links to files are reported like regular files;
/// symbolic links to directories are not followed.
pub fn scan_directory<P: AsRef<Path>>(root: P, extensions: &SupportedExtensions) -> Vec<LocalFileEntry> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| !is_directory(entry))
        .filter_map(|entry| LocalFileEntry::from_path(entry.path()))
        .filter(|candidate| extensions.matches(&candidate.extension))
        .collect()
}

/// Directories, including symlinks that resolve to one. Links are listed but
/// never descended into; a dangling link counts as a file.
fn is_directory(entry: &DirEntry) -> bool {
    entry.file_type().is_dir() || (entry.path_is_symlink() && entry.path().is_dir())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_extension_match_is_case_insensitive() {
        let photos = SupportedExtensions::photos();
        assert!(photos.matches("jpg"));
        assert!(photos.matches("JPG"));
        assert!(photos.matches("HeIc"));
        assert!(!photos.matches("mp4"));
        assert!(!photos.matches("txt"));
    }

    #[test]
    fn test_media_includes_videos() {
        let media = SupportedExtensions::media();
        for ext in ["mp4", "MOV", "m2ts", "3gp", "png"] {
            assert!(media.matches(ext), "{} should be supported", ext);
        }
    }

    #[test]
    fn test_scan_filters_and_recurses() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("2021").join("summer");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("top.JPG"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();
        fs::write(dir.path().join("README"), b"").unwrap();
        fs::write(nested.join("beach.heic"), b"").unwrap();
        fs::write(nested.join("clip.mp4"), b"").unwrap();

        let mut found: Vec<String> = scan_directory(dir.path(), &SupportedExtensions::photos())
            .into_iter()
            .map(|e| e.file_name)
            .collect();
        found.sort();
        assert_eq!(found, vec!["beach.heic", "top.JPG"]);

        let media = scan_directory(dir.path(), &SupportedExtensions::media());
        assert_eq!(media.len(), 3);
    }

    #[test]
    fn test_directory_named_like_media_is_not_a_file() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("album.jpg")).unwrap();
        assert!(scan_directory(dir.path(), &SupportedExtensions::photos()).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_to_files_are_listed() {
        use std::os::unix::fs::symlink;

        let dir = tempdir().unwrap();
        let elsewhere = tempdir().unwrap();
        let real = elsewhere.path().join("real.jpg");
        fs::write(&real, b"").unwrap();
        fs::create_dir(elsewhere.path().join("album")).unwrap();
        fs::write(elsewhere.path().join("album").join("inner.jpg"), b"").unwrap();

        fs::write(dir.path().join("plain.jpg"), b"").unwrap();
        symlink(&real, dir.path().join("link.jpg")).unwrap();
        symlink(elsewhere.path().join("gone.png"), dir.path().join("dangling.png")).unwrap();
        symlink(elsewhere.path().join("album"), dir.path().join("linked.jpg")).unwrap();

        let mut found: Vec<String> = scan_directory(dir.path(), &SupportedExtensions::media())
            .into_iter()
            .map(|e| e.file_name)
            .collect();
        found.sort();
        assert_eq!(found, vec!["dangling.png", "link.jpg", "plain.jpg"]);
    }

    #[test]
    fn test_entry_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("IMG_01.Png");
        fs::write(&path, b"").unwrap();

        let entries = scan_directory(dir.path(), &SupportedExtensions::photos());
        assert_eq!(
            entries,
            vec![LocalFileEntry {
                path,
                file_name: "IMG_01.Png".to_string(),
                extension: "Png".to_string(),
            }]
        );
    }
}
