//! Google Photos Library API client.

use async_trait::async_trait;
use reqwest::{Client, Response};

use crate::auth::Authenticator;
use crate::config::AuditConfig;
use crate::error::{AuditError, Result};
use crate::models::{ApiErrorResponse, MediaItemsPage};

/// One page of the remote `list items` operation.
#[async_trait]
pub trait MediaItemSource: Send + Sync {
    async fn list_page(&self, page_size: u32, page_token: Option<&str>) -> Result<MediaItemsPage>;
}

/// Client for reading the media items of a Google Photos library.
pub struct PhotosClient {
    api_base: String,
    auth: Authenticator,
    http: Client,
}

impl PhotosClient {
    /// Create a new PhotosClient.
    ///
    /// # Arguments
    /// * `auth` - Authenticator for obtaining access tokens
    /// * `api_base` - Base URL of the Library API, without trailing slash
    pub fn new(auth: Authenticator, api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            auth,
            http: Client::new(),
        }
    }

    pub fn from_config(auth: Authenticator, config: &AuditConfig) -> Self {
        Self::new(auth, config.api_base.clone())
    }

    /// Fetch a single page of `mediaItems.list`.
    pub async fn list_media_items(
        &self,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<MediaItemsPage> {
        let token = self.auth.get_access_token().await?;

        let mut request = self
            .http
            .get(format!("{}/mediaItems", self.api_base))
            .bearer_auth(&token)
            .query(&[("pageSize", page_size.to_string())]);

        if let Some(page_token) = page_token {
            request = request.query(&[("pageToken", page_token)]);
        }

        let response = check_status(request.send().await?).await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl MediaItemSource for PhotosClient {
    async fn list_page(&self, page_size: u32, page_token: Option<&str>) -> Result<MediaItemsPage> {
        self.list_media_items(page_size, page_token).await
    }
}

/// Turn a non-success response into `AuditError::ApiError`, preferring Google's error body.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_body = response.text().await.unwrap_or_default();
    if let Ok(api_error) = serde_json::from_str::<ApiErrorResponse>(&error_body) {
        return Err(AuditError::ApiError {
            status: api_error.error.code,
            message: api_error.error.message,
        });
    }
    Err(AuditError::ApiError {
        status: status.as_u16(),
        message: error_body,
    })
}
