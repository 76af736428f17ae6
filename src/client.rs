use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::state::{FlowVariant, StateTokenManager};
use crate::token::{TokenClient, TokenSet};
use axum::{
    Json, Router,
    extract::{Query, State},
    response::Response,
    response::IntoResponse,
    routing::get,
};
use serde::{Deserialize, Serialize};
use url::Url;

/// Relying-party side of the authorization flow.
///
/// Builds authorization-request URIs per flow variant, exchanges callback
/// codes for tokens and refreshes tokens on demand. The state check always
/// runs before any network call.
#[derive(Debug, Clone)]
pub struct AuthorizationFlow {
    config: ClientConfig,
    states: StateTokenManager,
    tokens: TokenClient,
}

impl AuthorizationFlow {
    pub fn new(config: ClientConfig) -> Self {
        let tokens = TokenClient::new(
            config.token_url(),
            config.client_id.clone(),
            config.client_secret.clone(),
            config.upstream_timeout,
        );
        Self {
            config,
            states: StateTokenManager::new(),
            tokens,
        }
    }

    /// The state-token manager bound to this flow.
    pub fn states(&self) -> &StateTokenManager {
        &self.states
    }

    /// Compose the authorization-endpoint URI for a flow variant.
    pub fn authorization_uri(&self, variant: FlowVariant) -> Url {
        let mut url = self.config.authorize_url();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", self.config.redirect_uri.as_str())
            .append_pair("scope", &variant.scope_param())
            .append_pair("state", &self.states.generate(variant));
        url
    }

    /// Exchange an authorization code received on the callback.
    ///
    /// The state candidate is checked first; no token exchange is attempted
    /// on an invalid state.
    pub async fn handle_callback(&self, code: &str, state: &str) -> Result<TokenView> {
        let variant = self.check_state(state)?;
        let token = self
            .tokens
            .authorization_code(code, self.config.redirect_uri.as_str())
            .await?;
        tracing::info!(?variant, "exchanged authorization code");
        Ok(TokenView::new(token, variant))
    }

    /// Run a refresh grant for a previously issued refresh token.
    pub async fn refresh(&self, refresh_token: &str, state: &str) -> Result<TokenView> {
        let variant = self.check_state(state)?;
        let token = self.tokens.refresh(refresh_token).await?;
        tracing::info!(?variant, "refreshed token");
        Ok(TokenView::new(token, variant))
    }

    fn check_state(&self, candidate: &str) -> Result<Option<FlowVariant>> {
        match self.states.validate(candidate) {
            Some(validation) if validation.valid => Ok(validation.variant),
            _ => Err(Error::InvalidState),
        }
    }

    /// The axum router exposing the relying-party endpoints.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(handle_index))
            .route("/profile", get(handle_profile))
            .route("/refresh", get(handle_refresh_page))
            .route("/callback", get(handle_callback).post(handle_refresh))
            .with_state(self.clone())
    }
}

/// Render model for a returned token set.
#[derive(Debug, Clone, Serialize)]
pub struct TokenView {
    pub token: TokenSet,
    /// Unverified ID-token payload, when one was supplied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_claims: Option<serde_json::Value>,
    /// Flow variant recovered from the state value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<FlowVariant>,
}

impl TokenView {
    fn new(token: TokenSet, variant: Option<FlowVariant>) -> Self {
        let id_claims = token.id_token.as_deref().and_then(decode_id_token_payload);
        Self {
            token,
            id_claims,
            variant,
        }
    }
}

/// Decode a JWT payload without signature verification, for display only.
pub fn decode_id_token_payload(jwt: &str) -> Option<serde_json::Value> {
    use base64::prelude::*;

    let parts: Vec<&str> = jwt.split('.').collect();
    if parts.len() != 3 {
        return None;
    }
    let payload = BASE64_URL_SAFE_NO_PAD.decode(parts[1]).ok()?;
    serde_json::from_slice(&payload).ok()
}

// Handler functions

/// Render model for an authorization link page.
#[derive(Debug, Serialize)]
struct AuthPage {
    title: &'static str,
    what: &'static str,
    uri: String,
}

fn auth_page(flow: &AuthorizationFlow, what: &'static str, variant: FlowVariant) -> Json<AuthPage> {
    Json(AuthPage {
        title: "OAuth 2 / OpenID Connect Demo",
        what,
        uri: flow.authorization_uri(variant).to_string(),
    })
}

async fn handle_index(State(flow): State<AuthorizationFlow>) -> Json<AuthPage> {
    auth_page(&flow, "Sign in", FlowVariant::Default)
}

async fn handle_profile(State(flow): State<AuthorizationFlow>) -> Json<AuthPage> {
    auth_page(&flow, "Authorize profile access", FlowVariant::Profile)
}

async fn handle_refresh_page(State(flow): State<AuthorizationFlow>) -> Json<AuthPage> {
    auth_page(&flow, "Sign in with refresh token", FlowVariant::Refresh)
}

#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
}

/// Handle the authorization callback and exchange the code.
async fn handle_callback(
    State(flow): State<AuthorizationFlow>,
    Query(params): Query<CallbackParams>,
) -> Result<Response> {
    let state = params.state.as_deref().ok_or(Error::InvalidState)?;
    let code = params
        .code
        .as_deref()
        .ok_or_else(|| Error::Validation("missing code".to_string()))?;

    let view = flow.handle_callback(code, state).await?;
    Ok(Json(view).into_response())
}

/// Handle a refresh form post; the state rides on the query string.
async fn handle_refresh(
    State(flow): State<AuthorizationFlow>,
    Query(params): Query<CallbackParams>,
    body: String,
) -> Result<Response> {
    let state = params.state.as_deref().ok_or(Error::InvalidState)?;
    let refresh_token = form_value(&body, "refresh_token")
        .ok_or_else(|| Error::Validation("missing refresh_token".to_string()))?;

    let view = flow.refresh(&refresh_token, state).await?;
    Ok(Json(view).into_response())
}

fn form_value(body: &str, key: &str) -> Option<String> {
    url::form_urlencoded::parse(body.as_bytes())
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}
