use crate::api::ConsentApi;
use crate::config::ConsentConfig;
use crate::consent::{ConsentDecisionEngine, ScopeInput, Subject};
use crate::error::{Error, Result};
use crate::identity::IdentityStore;
use crate::token::{ClientTokenCache, TokenClient};
use axum::{
    Json, Router,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Per-browser session state. Owned by the HTTP layer; the flow only reads
/// and writes the flag.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub is_authenticated: bool,
}

/// Query parameters of the consent endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ConsentQuery {
    pub consent: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Submitted login credentials with the consent id they belong to.
#[derive(Debug, Clone)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub consent: String,
}

/// Render model for the interactive consent prompt.
#[derive(Debug, Clone, Serialize)]
pub struct ConsentPrompt {
    pub consent_id: String,
    pub client_id: String,
    pub scopes: Vec<String>,
}

/// Resolution of a consent-endpoint request.
#[derive(Debug)]
pub enum ConsentOutcome {
    /// Send the browser to this target
    Redirect(String),
    /// Render the interactive consent prompt
    Prompt(ConsentPrompt),
}

/// Server-side consent flow: authenticates the resource owner, proxies
/// consent decisions to the authorization server and keeps the privileged
/// service token fresh along the way.
pub struct ConsentFlow<I: IdentityStore> {
    api: ConsentApi,
    tokens: ClientTokenCache,
    identity: I,
}

impl<I: IdentityStore> ConsentFlow<I> {
    pub fn new(config: ConsentConfig, identity: I) -> Self {
        let tokens = ClientTokenCache::new(
            TokenClient::new(
                config.token_url(),
                config.client_id.clone(),
                config.client_secret.clone(),
                config.upstream_timeout,
            ),
            config.consent_scope.clone(),
        );
        let api = ConsentApi::new(config.issuer.clone(), config.upstream_timeout);
        Self {
            api,
            tokens,
            identity,
        }
    }

    /// The subject record consents are resolved for.
    pub fn subject(&self) -> Subject {
        self.identity.subject()
    }

    /// Resolve a GET to the consent endpoint.
    ///
    /// Unauthenticated sessions are sent to the login page with the consent
    /// id preserved. An upstream error relayed in the query terminates the
    /// flow. Otherwise the pending request is fetched and either auto-granted
    /// or handed to the interactive prompt.
    pub async fn begin(&self, session: &Session, query: &ConsentQuery) -> Result<ConsentOutcome> {
        if !session.is_authenticated {
            let id = query.consent.as_deref().unwrap_or_default();
            return Ok(ConsentOutcome::Redirect(login_redirect(id, None)));
        }

        if let Some(name) = query.error.as_deref() {
            let message = match query.error_description.as_deref() {
                Some(description) => format!("{}: {}", name, description),
                None => name.to_string(),
            };
            return Err(Error::Upstream(message));
        }

        let id = query
            .consent
            .as_deref()
            .ok_or_else(|| Error::Validation("missing consent parameter".to_string()))?;

        let bearer = self.tokens.ensure_fresh().await?;
        let request = self.api.fetch(id, &bearer).await?;

        let subject = self.identity.subject();
        let decision = ConsentDecisionEngine::decide(&request, &subject);
        if let Some(grant) = decision.grant {
            tracing::info!(consent = id, "auto-granting consent request");
            let accepted = self.api.accept(id, &bearer, &grant).await?;
            return Ok(ConsentOutcome::Redirect(accepted.redirect_url));
        }

        tracing::info!(consent = id, "prompting for consent");
        Ok(ConsentOutcome::Prompt(ConsentPrompt {
            consent_id: request.id,
            client_id: request.client_id,
            scopes: request.requested_scopes,
        }))
    }

    /// Resolve a POST to the consent endpoint with user-approved scopes.
    pub async fn submit(
        &self,
        session: &Session,
        consent_id: &str,
        scopes: ScopeInput,
    ) -> Result<ConsentOutcome> {
        if !session.is_authenticated {
            return Ok(ConsentOutcome::Redirect(login_redirect(consent_id, None)));
        }

        let bearer = self.tokens.ensure_fresh().await?;
        let grant = ConsentDecisionEngine::build_grant(&self.identity.subject(), scopes);

        tracing::info!(consent = consent_id, scopes = ?grant.grant_scopes, "accepting consent request");
        let accepted = self.api.accept(consent_id, &bearer, &grant).await?;
        Ok(ConsentOutcome::Redirect(accepted.redirect_url))
    }

    /// Handle a login submission.
    ///
    /// A credential mismatch is terminal for the request: the session flag is
    /// left untouched and the browser returns to the login page with the
    /// consent id preserved for a retry.
    pub async fn login(&self, session: &mut Session, form: &LoginForm) -> String {
        match self
            .identity
            .verify_credentials(&form.email, &form.password)
            .await
        {
            Some(subject) => {
                tracing::info!(subject = %subject.subject, "login succeeded");
                session.is_authenticated = true;
                format!(
                    "/consent?consent={}",
                    urlencoding::encode(&form.consent)
                )
            }
            None => {
                tracing::info!("login failed");
                login_redirect(&form.consent, Some("invalid credentials"))
            }
        }
    }

    /// Clear the authenticated flag; idempotent.
    pub fn logout(&self, session: &mut Session) {
        session.is_authenticated = false;
    }
}

fn login_redirect(consent_id: &str, error: Option<&str>) -> String {
    match error {
        Some(error) => format!(
            "/login?error={}&consent={}",
            urlencoding::encode(error),
            urlencoding::encode(consent_id)
        ),
        None => format!("/login?consent={}", urlencoding::encode(consent_id)),
    }
}

/// Axum front end over [`ConsentFlow`]. Owns the session state the flow
/// reads and writes.
pub struct ConsentServer<I: IdentityStore> {
    flow: Arc<ConsentFlow<I>>,
    session: Arc<RwLock<Session>>,
}

impl<I: IdentityStore> Clone for ConsentServer<I> {
    fn clone(&self) -> Self {
        Self {
            flow: self.flow.clone(),
            session: self.session.clone(),
        }
    }
}

impl<I: IdentityStore + 'static> ConsentServer<I> {
    pub fn new(flow: ConsentFlow<I>) -> Self {
        Self {
            flow: Arc::new(flow),
            session: Arc::new(RwLock::new(Session::default())),
        }
    }

    /// Handle to the session state, for embedding layers that manage it.
    pub fn session(&self) -> Arc<RwLock<Session>> {
        self.session.clone()
    }

    /// The axum router exposing the consent endpoints.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(handle_index))
            .route("/consent", get(handle_consent).post(handle_consent_submit))
            .route("/login", get(handle_login_page).post(handle_login))
            .route("/logout", get(handle_logout_page).post(handle_logout))
            .with_state(self.clone())
    }
}

// Handler functions

#[derive(Debug, Serialize)]
struct SessionView {
    is_authenticated: bool,
}

async fn handle_index<I>(State(server): State<ConsentServer<I>>) -> Json<SessionView>
where
    I: IdentityStore + 'static,
{
    let session = server.session.read().await;
    Json(SessionView {
        is_authenticated: session.is_authenticated,
    })
}

async fn handle_consent<I>(
    State(server): State<ConsentServer<I>>,
    Query(query): Query<ConsentQuery>,
) -> Result<Response>
where
    I: IdentityStore + 'static,
{
    let session = server.session.read().await.clone();
    match server.flow.begin(&session, &query).await? {
        ConsentOutcome::Redirect(target) => Ok(Redirect::to(&target).into_response()),
        ConsentOutcome::Prompt(prompt) => Ok(Json(prompt).into_response()),
    }
}

async fn handle_consent_submit<I>(
    State(server): State<ConsentServer<I>>,
    Query(query): Query<ConsentQuery>,
    body: String,
) -> Result<Response>
where
    I: IdentityStore + 'static,
{
    let consent_id = query
        .consent
        .or_else(|| form_value(&body, "consent"))
        .ok_or_else(|| Error::Validation("missing consent parameter".to_string()))?;
    let scopes = ScopeInput::Many(form_values(&body, "allowed_scopes"));

    let session = server.session.read().await.clone();
    match server.flow.submit(&session, &consent_id, scopes).await? {
        ConsentOutcome::Redirect(target) => Ok(Redirect::to(&target).into_response()),
        ConsentOutcome::Prompt(prompt) => Ok(Json(prompt).into_response()),
    }
}

#[derive(Debug, Deserialize)]
struct LoginQuery {
    error: Option<String>,
    consent: Option<String>,
}

/// Render model for the login page.
#[derive(Debug, Serialize)]
struct LoginPage {
    title: &'static str,
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    consent: Option<String>,
}

async fn handle_login_page<I>(
    State(server): State<ConsentServer<I>>,
    Query(query): Query<LoginQuery>,
) -> Json<LoginPage>
where
    I: IdentityStore + 'static,
{
    Json(LoginPage {
        title: "Sign in required",
        email: server.flow.subject().email,
        error: query.error,
        consent: query.consent,
    })
}

async fn handle_login<I>(State(server): State<ConsentServer<I>>, body: String) -> Response
where
    I: IdentityStore + 'static,
{
    let form = LoginForm {
        email: form_value(&body, "email").unwrap_or_default(),
        password: form_value(&body, "password").unwrap_or_default(),
        consent: form_value(&body, "consent").unwrap_or_default(),
    };

    let mut session = server.session.write().await;
    let target = server.flow.login(&mut session, &form).await;
    Redirect::to(&target).into_response()
}

async fn handle_logout_page<I>(State(server): State<ConsentServer<I>>) -> Json<SessionView>
where
    I: IdentityStore + 'static,
{
    let session = server.session.read().await;
    Json(SessionView {
        is_authenticated: session.is_authenticated,
    })
}

async fn handle_logout<I>(State(server): State<ConsentServer<I>>) -> Response
where
    I: IdentityStore + 'static,
{
    let mut session = server.session.write().await;
    server.flow.logout(&mut session);
    Redirect::to("/").into_response()
}

// Form-body helpers

fn form_value(body: &str, key: &str) -> Option<String> {
    url::form_urlencoded::parse(body.as_bytes())
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

fn form_values(body: &str, key: &str) -> Vec<String> {
    url::form_urlencoded::parse(body.as_bytes())
        .filter(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
        .collect()
}
