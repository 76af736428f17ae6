use crate::error::{Error, Result};
use std::time::Duration;
use url::Url;

const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the relying-party client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the authorization server
    pub issuer: Url,

    /// Path of the authorization endpoint on the issuer
    pub authorize_path: String,

    /// Path of the token endpoint on the issuer
    pub token_path: String,

    /// OAuth client id
    pub client_id: String,

    /// OAuth client secret
    pub client_secret: String,

    /// Redirect URI registered for this client
    pub redirect_uri: Url,

    /// Timeout applied to every upstream call
    pub upstream_timeout: Duration,
}

impl ClientConfig {
    /// Create a configuration with the demo defaults.
    pub fn new(
        issuer: Url,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            issuer,
            authorize_path: "/oauth2/auth".to_string(),
            token_path: "/oauth2/token".to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: Url::parse("http://localhost:4000/callback").expect("valid url"),
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
        }
    }

    /// Read issuer and client credentials from `AUTH_SERVER_URL`,
    /// `AUTH_CLIENT_ID` and `AUTH_CLIENT_SECRET`.
    pub fn from_env() -> Result<Self> {
        let issuer = parse_url("AUTH_SERVER_URL", &env_var("AUTH_SERVER_URL")?)?;
        Ok(Self::new(
            issuer,
            env_var("AUTH_CLIENT_ID")?,
            env_var("AUTH_CLIENT_SECRET")?,
        ))
    }

    /// Set the redirect URI
    pub fn with_redirect_uri(mut self, uri: Url) -> Self {
        self.redirect_uri = uri;
        self
    }

    /// Set the authorization-endpoint path
    pub fn with_authorize_path(mut self, path: impl Into<String>) -> Self {
        self.authorize_path = path.into();
        self
    }

    /// Set the token-endpoint path
    pub fn with_token_path(mut self, path: impl Into<String>) -> Self {
        self.token_path = path.into();
        self
    }

    /// Set the upstream-call timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout = timeout;
        self
    }

    pub fn authorize_url(&self) -> Url {
        self.issuer.join(&self.authorize_path).expect("valid url")
    }

    pub fn token_url(&self) -> Url {
        self.issuer.join(&self.token_path).expect("valid url")
    }
}

/// Configuration for the consent front end.
#[derive(Debug, Clone)]
pub struct ConsentConfig {
    /// Base URL of the authorization server (also the consent-API base)
    pub issuer: Url,

    /// Path of the token endpoint on the issuer
    pub token_path: String,

    /// OAuth client id used for the client-credentials grant
    pub client_id: String,

    /// OAuth client secret
    pub client_secret: String,

    /// Administrative scope requested for consent-API access
    pub consent_scope: String,

    /// Timeout applied to every upstream call
    pub upstream_timeout: Duration,
}

impl ConsentConfig {
    /// Create a configuration with the demo defaults.
    pub fn new(
        issuer: Url,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            issuer,
            token_path: "/oauth2/token".to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            consent_scope: "consent.admin".to_string(),
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
        }
    }

    /// Read issuer and client credentials from `AUTH_SERVER_URL`,
    /// `AUTH_CLIENT_ID` and `AUTH_CLIENT_SECRET`.
    pub fn from_env() -> Result<Self> {
        let issuer = parse_url("AUTH_SERVER_URL", &env_var("AUTH_SERVER_URL")?)?;
        Ok(Self::new(
            issuer,
            env_var("AUTH_CLIENT_ID")?,
            env_var("AUTH_CLIENT_SECRET")?,
        ))
    }

    /// Set the administrative scope
    pub fn with_consent_scope(mut self, scope: impl Into<String>) -> Self {
        self.consent_scope = scope.into();
        self
    }

    /// Set the token-endpoint path
    pub fn with_token_path(mut self, path: impl Into<String>) -> Self {
        self.token_path = path.into();
        self
    }

    /// Set the upstream-call timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout = timeout;
        self
    }

    pub fn token_url(&self) -> Url {
        self.issuer.join(&self.token_path).expect("valid url")
    }
}

fn env_var(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| Error::Validation(format!("{} is not set", name)))
}

fn parse_url(name: &str, value: &str) -> Result<Url> {
    Url::parse(value).map_err(|e| Error::Validation(format!("{}: {}", name, e)))
}
