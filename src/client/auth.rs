//! OAuth authentication
//!
//! Implements the client-credentials token flow against the configured
//! OAuth host, with in-memory token caching.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::RwLock;

use crate::error::{Error, Result};

/// Token expiry buffer - refresh tokens this much before they actually expire
/// This prevents using tokens that are about to expire during a request
const TOKEN_EXPIRY_BUFFER: Duration = Duration::from_secs(60);

/// Default token TTL if the token endpoint omits `expires_in`
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

/// Client-credentials token provider with token caching
#[derive(Clone)]
pub struct TokenProvider {
    http: reqwest::Client,
    oauth_host: String,
    client_id: String,
    client_secret: String,
    token_cache: Arc<RwLock<Option<CachedToken>>>,
}

#[derive(Clone)]
struct CachedToken {
    token: String,
    /// When this token expires (with buffer applied)
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

impl TokenProvider {
    pub fn new(
        http: reqwest::Client,
        oauth_host: String,
        client_id: String,
        client_secret: String,
    ) -> Self {
        Self {
            http,
            oauth_host,
            client_id,
            client_secret,
            token_cache: Arc::new(RwLock::new(None)),
        }
    }

    /// Get an access token for API calls, serving from cache while the
    /// cached token is still valid.
    pub async fn token(&self) -> Result<String> {
        {
            let cache = self.token_cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid() {
                    return Ok(cached.token.clone());
                }
                tracing::debug!("cached token expired, fetching new token");
            }
        }

        let token = self.fetch_token().await?;

        {
            let mut cache = self.token_cache.write().await;
            *cache = Some(token.clone());
        }

        Ok(token.token)
    }

    async fn fetch_token(&self) -> Result<CachedToken> {
        let url = format!("{}/oauth/token", self.oauth_host);
        tracing::debug!("POST {}", url);

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        let body: serde_json::Value = response.json().await?;

        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = serde_json::from_value(body)?;
        let ttl = token
            .expires_in
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TOKEN_TTL);
        let expires_at = Instant::now() + ttl.saturating_sub(TOKEN_EXPIRY_BUFFER);

        Ok(CachedToken {
            token: token.access_token,
            expires_at,
        })
    }
}
