use crate::error::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration as StdDuration;
use url::Url;

/// Margin applied before the recorded expiry so a token is never presented
/// right at its expiry instant.
const EXPIRY_MARGIN_SECONDS: i64 = 30;

/// Fallback lifetime when the token endpoint omits `expires_in`.
const DEFAULT_EXPIRES_IN: i64 = 3600;

/// Token-endpoint response, passed through to callers as received.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

/// HTTP client for the authorization server's token endpoint.
///
/// Issues the three grants this system needs: authorization-code, refresh,
/// and client-credentials. The client authenticates with HTTP Basic.
#[derive(Debug, Clone)]
pub struct TokenClient {
    http: reqwest::Client,
    token_url: Url,
    client_id: String,
    client_secret: String,
}

impl TokenClient {
    pub fn new(
        token_url: Url,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        timeout: StdDuration,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("http client");
        Self {
            http,
            token_url,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Exchange an authorization code for tokens.
    pub async fn authorization_code(&self, code: &str, redirect_uri: &str) -> Result<TokenSet> {
        self.grant(
            &[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", redirect_uri),
            ],
            Error::TokenExchange,
        )
        .await
    }

    /// Obtain a new token set from a refresh token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenSet> {
        self.grant(
            &[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ],
            Error::TokenRefresh,
        )
        .await
    }

    /// Obtain a service-level token via the client-credentials grant.
    pub async fn client_credentials(&self, scope: &str) -> Result<TokenSet> {
        self.grant(
            &[("grant_type", "client_credentials"), ("scope", scope)],
            Error::TokenAcquisition,
        )
        .await
    }

    async fn grant(&self, form: &[(&str, &str)], err: fn(String) -> Error) -> Result<TokenSet> {
        let response = self
            .http
            .post(self.token_url.clone())
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(form)
            .send()
            .await
            .map_err(|e| classify(e, err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(err(format!("token endpoint returned {}: {}", status, body)));
        }

        response
            .json::<TokenSet>()
            .await
            .map_err(|e| err(format!("invalid token response: {}", e)))
    }
}

fn classify(e: reqwest::Error, err: fn(String) -> Error) -> Error {
    if e.is_timeout() {
        Error::UpstreamTimeout(e.to_string())
    } else {
        err(e.to_string())
    }
}

/// A cached service-level access token with its recorded expiry.
#[derive(Debug, Clone)]
pub struct ServiceToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl ServiceToken {
    fn from_token_set(set: &TokenSet) -> Self {
        Self {
            access_token: set.access_token.clone(),
            expires_at: Utc::now() + Duration::seconds(set.expires_in.unwrap_or(DEFAULT_EXPIRES_IN)),
        }
    }

    /// True while the token is safely inside its lifetime.
    pub fn is_fresh(&self) -> bool {
        self.expires_at > Utc::now() + Duration::seconds(EXPIRY_MARGIN_SECONDS)
    }
}

/// Holds the process-wide service token used for privileged consent-API calls
/// and refreshes it under the client-credentials grant when stale.
///
/// The cache lock is held across the refresh call, so concurrent callers wait
/// on one in-flight grant instead of issuing duplicates. A failed grant leaves
/// the previous cache entry untouched.
pub struct ClientTokenCache {
    client: TokenClient,
    scope: String,
    cached: tokio::sync::Mutex<Option<ServiceToken>>,
}

impl ClientTokenCache {
    pub fn new(client: TokenClient, scope: impl Into<String>) -> Self {
        Self {
            client,
            scope: scope.into(),
            cached: tokio::sync::Mutex::new(None),
        }
    }

    /// Return a bearer token known to be unexpired, refreshing if needed.
    ///
    /// Cheap when the cached token is still fresh; must be called before
    /// every privileged API call.
    pub async fn ensure_fresh(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if token.is_fresh() {
                return Ok(token.access_token.clone());
            }
        }

        let set = self.client.client_credentials(&self.scope).await?;
        let token = ServiceToken::from_token_set(&set);
        tracing::info!(expires_at = %token.expires_at, "acquired service token");

        let bearer = token.access_token.clone();
        *cached = Some(token);
        Ok(bearer)
    }
}
