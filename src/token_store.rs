//! JSON token cache kept next to the program between runs.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;
use crate::models::StoredToken;

/// File-backed store for a single [`StoredToken`].
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the cached token. A missing file is not an error.
    pub fn load(&self) -> Result<Option<StoredToken>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no token cache");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let token = serde_json::from_str(&content)?;
        Ok(Some(token))
    }

    /// Persist the token, replacing any previous cache.
    pub fn save(&self, token: &StoredToken) -> Result<()> {
        let content = serde_json::to_string_pretty(token)?;
        fs::write(&self.path, content)?;
        restrict_permissions(&self.path)?;
        debug!(path = %self.path.display(), "token cache written");
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_token() -> StoredToken {
        StoredToken {
            access_token: "access".to_string(),
            refresh_token: Some("refresh".to_string()),
            expires_at: 1_700_000_000,
            scopes: vec!["scope".to_string()],
        }
    }

    #[test]
    fn test_load_missing_is_none() {
        let dir = tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        store.save(&sample_token()).unwrap();
        assert_eq!(store.load().unwrap(), Some(sample_token()));
    }

    #[test]
    fn test_load_corrupt_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("token.json");
        fs::write(&path, "not json").unwrap();
        assert!(TokenStore::new(&path).load().is_err());
    }
}
