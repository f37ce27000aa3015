//! Credential resolution for the Google Photos Library API.
//!
//! Credentials come from an ordered chain of [`CredentialSource`]s: the
//! cached token file first, then the interactive browser flow. The
//! [`Authenticator`] keeps the resolved token in memory and walks the chain
//! again only once it is about to expire.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::AuditConfig;
use crate::error::{AuditError, Result};
use crate::models::StoredToken;
use crate::oauth::{LoopbackReceiver, OAuthClient};
use crate::token_store::TokenStore;

/// Something that may be able to produce a usable access token.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &'static str;

    /// `Ok(None)` passes to the next source in the chain; errors are fatal.
    async fn fetch(&self) -> Result<Option<StoredToken>>;
}

/// Reads the token cache, refreshing and re-persisting an expired token.
pub struct CachedFileSource {
    store: TokenStore,
    oauth: OAuthClient,
}

impl CachedFileSource {
    pub fn new(store: TokenStore, oauth: OAuthClient) -> Self {
        Self { store, oauth }
    }
}

#[async_trait]
impl CredentialSource for CachedFileSource {
    fn name(&self) -> &'static str {
        "token cache"
    }

    async fn fetch(&self) -> Result<Option<StoredToken>> {
        let token = match self.store.load() {
            Ok(Some(token)) => token,
            Ok(None) => return Ok(None),
            Err(e) => {
                warn!(path = %self.store.path().display(), "ignoring unreadable token cache: {}", e);
                return Ok(None);
            }
        };

        if !token.covers_scopes(self.oauth.scopes()) {
            info!("cached token was granted different scopes, re-authorizing");
            return Ok(None);
        }

        if token.is_valid() {
            debug!("using cached access token");
            return Ok(Some(token));
        }

        if token.refresh_token.is_none() {
            info!("cached token expired and cannot be refreshed");
            return Ok(None);
        }

        let refreshed = self.oauth.refresh(&token).await?;
        self.store.save(&refreshed)?;
        Ok(Some(refreshed))
    }
}

/// Runs the browser-based authorization flow against a loopback redirect.
pub struct InteractiveFlowSource {
    store: TokenStore,
    oauth: OAuthClient,
    open_browser: bool,
}

impl InteractiveFlowSource {
    pub fn new(store: TokenStore, oauth: OAuthClient) -> Self {
        Self {
            store,
            oauth,
            open_browser: true,
        }
    }

    /// Only print the authorization URL instead of also launching a browser.
    pub fn without_browser(mut self) -> Self {
        self.open_browser = false;
        self
    }
}

#[async_trait]
impl CredentialSource for InteractiveFlowSource {
    fn name(&self) -> &'static str {
        "interactive authorization"
    }

    async fn fetch(&self) -> Result<Option<StoredToken>> {
        let receiver = LoopbackReceiver::bind().await?;
        let redirect_uri = receiver.redirect_uri();
        let (auth_url, verifier) = self.oauth.build_auth_url(&redirect_uri)?;

        println!("Please visit this URL to authorize this application:");
        println!("{}", auth_url);
        if self.open_browser {
            if let Err(e) = open::that(&auth_url) {
                debug!("could not launch a browser: {}", e);
            }
        }

        let callback = receiver.wait_for_callback().await?;
        let token = self
            .oauth
            .exchange_code(&callback, &verifier, &redirect_uri)
            .await?;
        self.store.save(&token)?;
        Ok(Some(token))
    }
}

/// Resolves and caches the bearer token used by the Photos client.
#[derive(Clone)]
pub struct Authenticator {
    sources: Arc<Vec<Box<dyn CredentialSource>>>,
    cached_token: Arc<RwLock<Option<StoredToken>>>,
}

impl Authenticator {
    /// Chain of sources tried in order until one yields a token.
    pub fn new(sources: Vec<Box<dyn CredentialSource>>) -> Self {
        Self {
            sources: Arc::new(sources),
            cached_token: Arc::new(RwLock::new(None)),
        }
    }

    /// Standard chain: token cache, then interactive flow.
    pub fn from_config(config: &AuditConfig) -> Result<Self> {
        let oauth = OAuthClient::from_file(&config.client_secrets_path, config.scopes.clone())?;
        let store = TokenStore::new(&config.token_cache_path);

        let mut interactive = InteractiveFlowSource::new(store.clone(), oauth.clone());
        if !config.open_browser {
            interactive = interactive.without_browser();
        }

        Ok(Self::new(vec![
            Box::new(CachedFileSource::new(store, oauth)),
            Box::new(interactive),
        ]))
    }

    /// Get a valid access token, resolving the chain again if necessary.
    pub async fn get_access_token(&self) -> Result<String> {
        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                if token.is_valid() {
                    return Ok(token.access_token.clone());
                }
            }
        }

        let token = self.resolve().await?;
        let access_token = token.access_token.clone();
        *self.cached_token.write().await = Some(token);
        Ok(access_token)
    }

    async fn resolve(&self) -> Result<StoredToken> {
        for source in self.sources.iter() {
            debug!(source = source.name(), "trying credential source");
            if let Some(token) = source.fetch().await? {
                info!(source = source.name(), "credentials obtained");
                return Ok(token);
            }
        }
        Err(AuditError::NoCredentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::unix_now;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedSource {
        token: Option<StoredToken>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl CredentialSource for FixedSource {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn fetch(&self) -> Result<Option<StoredToken>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.token.clone())
        }
    }

    fn token(access: &str, expires_at: u64) -> StoredToken {
        StoredToken {
            access_token: access.to_string(),
            refresh_token: None,
            expires_at,
            scopes: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_first_source_with_token_wins() {
        let first_calls = Arc::new(AtomicUsize::new(0));
        let second_calls = Arc::new(AtomicUsize::new(0));
        let auth = Authenticator::new(vec![
            Box::new(FixedSource {
                token: None,
                calls: first_calls.clone(),
            }),
            Box::new(FixedSource {
                token: Some(token("second", unix_now() + 3600)),
                calls: second_calls.clone(),
            }),
        ]);

        assert_eq!(auth.get_access_token().await.unwrap(), "second");
        assert_eq!(auth.get_access_token().await.unwrap(), "second");
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_chain_is_no_credentials() {
        let auth = Authenticator::new(vec![Box::new(FixedSource {
            token: None,
            calls: Arc::new(AtomicUsize::new(0)),
        })]);
        let err = auth.get_access_token().await.unwrap_err();
        assert!(matches!(err, AuditError::NoCredentials));
    }

    #[tokio::test]
    async fn test_expired_cached_token_resolves_again() {
        let calls = Arc::new(AtomicUsize::new(0));
        let auth = Authenticator::new(vec![Box::new(FixedSource {
            token: Some(token("stale", 10)),
            calls: calls.clone(),
        })]);

        auth.get_access_token().await.unwrap();
        auth.get_access_token().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
