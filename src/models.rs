//! Data models for Google Photos API responses and OAuth credentials.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Google OAuth2 authorization endpoint.
pub const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";

/// Google OAuth2 token endpoint.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Tokens expiring within this many seconds are treated as expired.
pub const EXPIRY_BUFFER_SECS: u64 = 60;

/// A photo or video stored in the remote library.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    #[serde(default)]
    pub id: String,
    pub filename: String,
    #[serde(default)]
    pub mime_type: Option<String>,
}

/// Response from the mediaItems.list API endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItemsPage {
    #[serde(default)]
    pub media_items: Vec<MediaItem>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

impl MediaItemsPage {
    /// Cursor for the following page, if the service supplied a non-empty one.
    pub fn next_token(&self) -> Option<&str> {
        self.next_page_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Google API error response.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    pub code: u16,
    pub message: String,
}

/// OAuth client file as downloaded from the Google Cloud console.
///
/// Desktop clients put their settings under `installed`, web clients under `web`.
#[derive(Debug, Deserialize)]
pub struct ClientSecretsFile {
    pub installed: Option<ClientSecrets>,
    pub web: Option<ClientSecrets>,
}

impl ClientSecretsFile {
    pub fn into_secrets(self) -> Option<ClientSecrets> {
        self.installed.or(self.web)
    }
}

/// OAuth client identity used for the authorization and token endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// OAuth2 token response.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_in: u64,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Credential persisted in the token cache between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Expiry as seconds since the Unix epoch.
    pub expires_at: u64,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl StoredToken {
    /// Build a token from an endpoint response received now.
    ///
    /// `previous_refresh` is kept when the response does not rotate the refresh token.
    pub fn from_response(
        response: TokenResponse,
        previous_refresh: Option<String>,
        requested_scopes: &[String],
    ) -> Self {
        let scopes = match response.scope {
            Some(scope) => scope.split_whitespace().map(str::to_string).collect(),
            None => requested_scopes.to_vec(),
        };
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token.or(previous_refresh),
            expires_at: unix_now() + response.expires_in,
            scopes,
        }
    }

    pub fn is_valid_at(&self, now: u64) -> bool {
        self.expires_at > now + EXPIRY_BUFFER_SECS
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(unix_now())
    }

    /// An empty scope list means the cache predates scope tracking and is accepted.
    pub fn covers_scopes(&self, required: &[String]) -> bool {
        self.scopes.is_empty() || required.iter().all(|s| self.scopes.contains(s))
    }
}

/// Seconds since the Unix epoch, or 0 if the clock is before it.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
