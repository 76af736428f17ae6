use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The resource-owner identity record.
///
/// Sourced from an [`IdentityStore`](crate::identity::IdentityStore) so a
/// real identity provider can replace the fixed demo record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub subject: String,
    pub email: String,
    pub email_verified: bool,
    pub name: String,
    pub nickname: String,
}

/// A pending consent request as returned by the authorization server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentRequest {
    pub id: String,
    pub requested_scopes: Vec<String>,
    pub client_id: String,
    pub redirect_url: String,
}

/// Grant payload for the accept-consent call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentGrant {
    pub subject: String,
    pub grant_scopes: Vec<String>,
    pub id_token_extra: Map<String, Value>,
    pub access_token_extra: Map<String, Value>,
}

/// Scope input normalized at the boundary.
///
/// HTML form parsers hand over a single string when one checkbox is ticked
/// and a list otherwise; both deserialize here. Non-string elements are
/// rejected by deserialization rather than silently included.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ScopeInput {
    One(String),
    Many(Vec<String>),
}

impl ScopeInput {
    /// Normalize to a scope list; a scalar becomes a one-element list.
    pub fn into_scopes(self) -> Vec<String> {
        match self {
            ScopeInput::One(scope) => vec![scope],
            ScopeInput::Many(scopes) => scopes,
        }
    }
}

impl From<Vec<String>> for ScopeInput {
    fn from(scopes: Vec<String>) -> Self {
        ScopeInput::Many(scopes)
    }
}

/// Outcome of the consent-resolution decision procedure.
#[derive(Debug, Clone)]
pub struct Decision {
    pub auto_grant: bool,
    pub grant: Option<ConsentGrant>,
}

/// Decides whether a consent request is auto-granted or needs an interactive
/// prompt, and builds the grant payload.
pub struct ConsentDecisionEngine;

impl ConsentDecisionEngine {
    /// Decide how to resolve a pending consent request.
    ///
    /// An `offline` scope in the request marks a previously-trusted client in
    /// this design, so the request is granted with all requested scopes and
    /// no prompt. Everything else goes to the interactive prompt.
    pub fn decide(request: &ConsentRequest, subject: &Subject) -> Decision {
        if request.requested_scopes.iter().any(|s| s == "offline") {
            let grant =
                Self::build_grant(subject, ScopeInput::Many(request.requested_scopes.clone()));
            return Decision {
                auto_grant: true,
                grant: Some(grant),
            };
        }

        Decision {
            auto_grant: false,
            grant: None,
        }
    }

    /// Build the grant payload for a set of approved scopes.
    ///
    /// ID-token claims follow the granted scopes: `profile` contributes
    /// `name` and `nickname`, `email` contributes `email` and
    /// `email_verified`. Access-token claims stay empty; the field exists as
    /// an extension point.
    pub fn build_grant(subject: &Subject, scopes: ScopeInput) -> ConsentGrant {
        let grant_scopes = scopes.into_scopes();
        let mut id_token_extra = Map::new();

        if grant_scopes.iter().any(|s| s == "profile") {
            id_token_extra.insert("name".into(), Value::String(subject.name.clone()));
            id_token_extra.insert("nickname".into(), Value::String(subject.nickname.clone()));
        }
        if grant_scopes.iter().any(|s| s == "email") {
            id_token_extra.insert("email".into(), Value::String(subject.email.clone()));
            id_token_extra.insert("email_verified".into(), Value::Bool(subject.email_verified));
        }

        ConsentGrant {
            subject: subject.subject.clone(),
            grant_scopes,
            id_token_extra,
            access_token_extra: Map::new(),
        }
    }
}
