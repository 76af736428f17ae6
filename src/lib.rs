//! # oidc-flows
//!
//! The two cooperating halves of an OAuth 2 / OpenID Connect authorization
//! flow: a relying-party client that initiates authorization requests and
//! exchanges codes or refresh tokens, and an authorization-server-side
//! consent front end that authenticates the resource owner and resolves
//! requested scopes on their behalf.
//!
//! ## Features
//!
//! - **Flow-bound state tokens**: anti-forgery state values carrying the
//!   originating flow variant, validated before any token exchange
//! - **Service-token cache**: a client-credentials token for privileged
//!   consent-API calls, refreshed transparently and single-flight
//! - **Consent resolution**: auto-grant for offline-access requests,
//!   interactive prompt otherwise, with scope-driven ID-token claims
//! - **Pluggable identity**: a capability trait in front of the resource
//!   owner record
//!
//! ## Example
//!
//! ```rust,no_run
//! use oidc_flows::prelude::*;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let issuer = url::Url::parse("http://localhost:4444")?;
//!
//! let client = AuthorizationFlow::new(ClientConfig::new(issuer.clone(), "demo", "hunter2"));
//! let consent = ConsentServer::new(ConsentFlow::new(
//!     ConsentConfig::new(issuer, "demo-consent", "hunter2"),
//!     FixedIdentity::default(),
//! ));
//!
//! let client_app = client.router();
//! let consent_app = consent.router();
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod consent;
pub mod error;
pub mod identity;
pub mod server;
pub mod state;
pub mod token;

pub mod prelude {
    pub use crate::api::{AcceptResponse, ConsentApi};
    pub use crate::client::{AuthorizationFlow, TokenView};
    pub use crate::config::{ClientConfig, ConsentConfig};
    pub use crate::consent::{
        ConsentDecisionEngine, ConsentGrant, ConsentRequest, Decision, ScopeInput, Subject,
    };
    pub use crate::error::{Error, Result};
    pub use crate::identity::{FixedIdentity, IdentityStore};
    pub use crate::server::{
        ConsentFlow, ConsentOutcome, ConsentPrompt, ConsentServer, Session,
    };
    pub use crate::state::{FlowVariant, StateTokenManager, StateValidation};
    pub use crate::token::{ClientTokenCache, ServiceToken, TokenClient, TokenSet};
}
