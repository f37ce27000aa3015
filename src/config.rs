//! Run configuration shared by the credential provider, the Photos client and
//! the audit driver.

use std::path::PathBuf;

use crate::error::{AuditError, Result};

/// Read-only access to the Google Photos library.
pub const PHOTOS_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/photoslibrary.readonly";

/// Base URL for the Google Photos Library API v1.
pub const PHOTOS_API_BASE: &str = "https://photoslibrary.googleapis.com/v1";

/// Largest page size accepted by `mediaItems.list`.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Page size used unless overridden.
pub const DEFAULT_PAGE_SIZE: u32 = MAX_PAGE_SIZE;

pub const DEFAULT_CLIENT_SECRETS_FILE: &str = "client_secret.json";
pub const DEFAULT_TOKEN_CACHE_FILE: &str = "token.json";

const MEDIA_REPORT_FILE: &str = "media_not_in_google_photos.txt";
const PHOTOS_REPORT_FILE: &str = "photos_not_in_google_photos.txt";

/// Which kinds of local files take part in the audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaKinds {
    PhotosOnly,
    #[default]
    PhotosAndVideos,
}

impl MediaKinds {
    /// Report file name used when no explicit output path is given.
    pub fn default_report_file(self) -> &'static str {
        match self {
            MediaKinds::PhotosOnly => PHOTOS_REPORT_FILE,
            MediaKinds::PhotosAndVideos => MEDIA_REPORT_FILE,
        }
    }

    /// Noun used in user-facing messages.
    pub fn noun(self) -> &'static str {
        match self {
            MediaKinds::PhotosOnly => "photos",
            MediaKinds::PhotosAndVideos => "photos or videos",
        }
    }
}

/// Immutable configuration for one audit run.
#[derive(Debug, Clone)]
pub struct AuditConfig {
    /// OAuth client JSON downloaded from the Google Cloud console.
    pub client_secrets_path: PathBuf,
    /// Where the access and refresh tokens are cached between runs.
    pub token_cache_path: PathBuf,
    pub scopes: Vec<String>,
    pub api_base: String,
    pub page_size: u32,
    pub media_kinds: MediaKinds,
    pub report_path: PathBuf,
    /// Launch a browser for the interactive authorization flow.
    pub open_browser: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self::for_media_kinds(MediaKinds::default())
    }
}

impl AuditConfig {
    /// Default configuration with the report name matching `media_kinds`.
    pub fn for_media_kinds(media_kinds: MediaKinds) -> Self {
        Self {
            client_secrets_path: PathBuf::from(DEFAULT_CLIENT_SECRETS_FILE),
            token_cache_path: PathBuf::from(DEFAULT_TOKEN_CACHE_FILE),
            scopes: vec![PHOTOS_READONLY_SCOPE.to_string()],
            api_base: PHOTOS_API_BASE.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            media_kinds,
            report_path: PathBuf::from(media_kinds.default_report_file()),
            open_browser: true,
        }
    }

    /// Check the values the remote API would otherwise reject.
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(AuditError::ConfigError(format!(
                "page size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, self.page_size
            )));
        }
        if self.scopes.is_empty() {
            return Err(AuditError::ConfigError("at least one OAuth scope is required".to_string()));
        }
        Ok(())
    }
}
