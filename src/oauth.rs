//! OAuth 2.0 installed-application flow for Google APIs.
//!
//! Covers the three token operations the audit needs:
//! - building a PKCE (S256) authorization URL pointing back at a loopback listener
//! - exchanging the authorization code for tokens
//! - refreshing an expired access token
//!
//! Tokens, codes and verifiers are never logged.

use std::fs;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;
use reqwest::Client;
use sha2::{Digest, Sha256};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::error::{AuditError, Result};
use crate::models::{ApiErrorResponse, ClientSecrets, ClientSecretsFile, StoredToken, TokenResponse};

/// Upper bound on the callback request head we are willing to buffer.
const MAX_CALLBACK_REQUEST: usize = 16 * 1024;

const CALLBACK_SUCCESS_PAGE: &str = "<html><body>The authentication flow has completed. \
You may close this window.</body></html>";

/// PKCE code verifier plus the CSRF state sent with the authorization request.
#[derive(Debug, Clone)]
pub struct PkceVerifier {
    verifier: String,
    state: String,
}

impl PkceVerifier {
    /// Generate a 32-byte verifier and 16-byte state, both base64url without padding.
    pub fn new() -> Self {
        let mut rng = rand::thread_rng();

        let mut verifier_bytes = [0u8; 32];
        rng.fill(&mut verifier_bytes);

        let mut state_bytes = [0u8; 16];
        rng.fill(&mut state_bytes);

        Self {
            verifier: URL_SAFE_NO_PAD.encode(verifier_bytes),
            state: URL_SAFE_NO_PAD.encode(state_bytes),
        }
    }

    pub fn verifier(&self) -> &str {
        &self.verifier
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    /// BASE64URL(SHA256(verifier))
    pub fn challenge(&self) -> String {
        let hash = Sha256::digest(self.verifier.as_bytes());
        URL_SAFE_NO_PAD.encode(hash)
    }
}

impl Default for PkceVerifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Query parameters delivered to the redirect URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackParams {
    pub code: String,
    pub state: String,
}

/// Parse the request target of a redirect, e.g. `/?code=...&state=...`.
///
/// Returns `Ok(None)` for requests that carry neither a code nor an error,
/// such as a browser asking for `/favicon.ico`.
pub fn parse_callback(target: &str) -> Result<Option<CallbackParams>> {
    let url = Url::parse(&format!("http://localhost{}", target))
        .map_err(|e| AuditError::AuthenticationError(format!("Malformed callback URL: {}", e)))?;

    let mut code = None;
    let mut state = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "error" => {
                return Err(AuditError::AuthenticationError(format!(
                    "Authorization was not granted: {}",
                    value
                )))
            }
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            _ => {}
        }
    }

    match (code, state) {
        (Some(code), Some(state)) => Ok(Some(CallbackParams { code, state })),
        (Some(_), None) => Err(AuditError::AuthenticationError(
            "Callback is missing the state parameter".to_string(),
        )),
        _ => Ok(None),
    }
}

/// One-shot HTTP listener on an ephemeral loopback port receiving the redirect.
pub struct LoopbackReceiver {
    listener: TcpListener,
    addr: SocketAddr,
}

impl LoopbackReceiver {
    pub async fn bind() -> Result<Self> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await?;
        let addr = listener.local_addr()?;
        debug!(%addr, "loopback listener bound");
        Ok(Self { listener, addr })
    }

    pub fn redirect_uri(&self) -> String {
        format!("http://{}:{}/", self.addr.ip(), self.addr.port())
    }

    /// Serve connections until one carries the authorization response.
    pub async fn wait_for_callback(self) -> Result<CallbackParams> {
        loop {
            let (mut stream, peer) = self.listener.accept().await?;
            debug!(%peer, "callback connection");

            let target = match read_request_target(&mut stream).await {
                Ok(Some(target)) => target,
                Ok(None) => continue,
                Err(e) => {
                    warn!("ignoring unreadable callback request: {}", e);
                    continue;
                }
            };

            match parse_callback(&target) {
                Ok(Some(params)) => {
                    respond(&mut stream, "200 OK", CALLBACK_SUCCESS_PAGE).await;
                    return Ok(params);
                }
                Ok(None) => respond(&mut stream, "404 Not Found", "").await,
                Err(e) => {
                    respond(&mut stream, "400 Bad Request", &e.to_string()).await;
                    return Err(e);
                }
            }
        }
    }
}

async fn read_request_target(stream: &mut TcpStream) -> Result<Option<String>> {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];

    while !buf.windows(4).any(|w| w == b"\r\n\r\n") && buf.len() < MAX_CALLBACK_REQUEST {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let head = String::from_utf8_lossy(&buf);
    let target = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .map(str::to_string);
    Ok(target)
}

async fn respond(stream: &mut TcpStream, status: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    if let Err(e) = stream.write_all(response.as_bytes()).await {
        debug!("failed to answer callback request: {}", e);
    }
    let _ = stream.shutdown().await;
}

/// Client for Google's OAuth endpoints, bound to one client identity and scope set.
#[derive(Clone)]
pub struct OAuthClient {
    secrets: ClientSecrets,
    scopes: Vec<String>,
    http: Client,
}

impl OAuthClient {
    pub fn new(secrets: ClientSecrets, scopes: Vec<String>) -> Self {
        Self {
            secrets,
            scopes,
            http: Client::new(),
        }
    }

    /// Load the client identity from a Google Cloud console JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P, scopes: Vec<String>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| AuditError::CredentialsFileError {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ClientSecretsFile = serde_json::from_str(&content)?;
        let secrets = file.into_secrets().ok_or_else(|| {
            AuditError::AuthenticationError(format!(
                "{} has neither an \"installed\" nor a \"web\" client section",
                path.display()
            ))
        })?;
        Ok(Self::new(secrets, scopes))
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// Build the URL the user must visit, plus the verifier to keep for the exchange.
    pub fn build_auth_url(&self, redirect_uri: &str) -> Result<(String, PkceVerifier)> {
        let verifier = PkceVerifier::new();

        let mut url = Url::parse(&self.secrets.auth_uri)
            .map_err(|e| AuditError::AuthenticationError(format!("Invalid auth URL: {}", e)))?;

        url.query_pairs_mut()
            .append_pair("client_id", &self.secrets.client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.scopes.join(" "))
            .append_pair("state", verifier.state())
            .append_pair("code_challenge", &verifier.challenge())
            .append_pair("code_challenge_method", "S256")
            .append_pair("access_type", "offline")
            .append_pair("prompt", "consent");

        Ok((url.to_string(), verifier))
    }

    /// Exchange an authorization code for tokens after checking the CSRF state.
    #[instrument(skip_all)]
    pub async fn exchange_code(
        &self,
        callback: &CallbackParams,
        verifier: &PkceVerifier,
        redirect_uri: &str,
    ) -> Result<StoredToken> {
        if callback.state != verifier.state() {
            return Err(AuditError::StateMismatch {
                expected: verifier.state().to_string(),
                actual: callback.state.clone(),
            });
        }

        let mut params = vec![
            ("grant_type", "authorization_code"),
            ("code", callback.code.as_str()),
            ("redirect_uri", redirect_uri),
            ("client_id", self.secrets.client_id.as_str()),
            ("code_verifier", verifier.verifier()),
        ];
        if let Some(ref secret) = self.secrets.client_secret {
            params.push(("client_secret", secret.as_str()));
        }

        let response = self.request_token(&params).await.map_err(|e| match e {
            AuditError::TokenRefreshError(msg) => AuditError::AuthenticationError(msg),
            other => other,
        })?;

        info!(expires_in = response.expires_in, "authorization code exchanged");
        Ok(StoredToken::from_response(response, None, &self.scopes))
    }

    /// Obtain a fresh access token using the refresh token in `token`.
    #[instrument(skip_all)]
    pub async fn refresh(&self, token: &StoredToken) -> Result<StoredToken> {
        let refresh_token = token.refresh_token.as_deref().ok_or_else(|| {
            AuditError::TokenRefreshError("cached credential has no refresh token".to_string())
        })?;

        let mut params = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.secrets.client_id.as_str()),
        ];
        if let Some(ref secret) = self.secrets.client_secret {
            params.push(("client_secret", secret.as_str()));
        }

        let response = self.request_token(&params).await?;
        info!(expires_in = response.expires_in, "access token refreshed");
        Ok(StoredToken::from_response(
            response,
            token.refresh_token.clone(),
            &self.scopes,
        ))
    }

    async fn request_token(&self, params: &[(&str, &str)]) -> Result<TokenResponse> {
        let response = self
            .http
            .post(&self.secrets.token_uri)
            .form(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_error) => api_error.error.message,
                Err(_) => body,
            };
            return Err(AuditError::TokenRefreshError(format!(
                "Status {}: {}",
                status, message
            )));
        }

        Ok(response.json().await?)
    }
}
