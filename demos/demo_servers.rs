//! Runnable relying-party + consent pair against a local authorization server.
//!
//! Reads `AUTH_SERVER_URL`, `AUTH_CLIENT_ID` and `AUTH_CLIENT_SECRET`, falling
//! back to a localhost issuer and demo credentials.
//!
//! Run with:
//! ```
//! cargo run --example demo_servers
//! ```

use miette::{Context, IntoDiagnostic};
use oidc_flows::prelude::*;
use std::net::SocketAddr;
use url::Url;

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "demo_servers=debug,oidc_flows=debug,info".parse().unwrap()),
        )
        .init();

    let issuer = Url::parse(
        &std::env::var("AUTH_SERVER_URL").unwrap_or_else(|_| "http://localhost:4444".to_string()),
    )
    .into_diagnostic()
    .wrap_err("invalid AUTH_SERVER_URL")?;
    let client_id = std::env::var("AUTH_CLIENT_ID").unwrap_or_else(|_| "demo".to_string());
    let client_secret = std::env::var("AUTH_CLIENT_SECRET").unwrap_or_else(|_| "demo".to_string());

    // Relying-party client on :4000
    let client = AuthorizationFlow::new(ClientConfig::new(
        issuer.clone(),
        client_id.clone(),
        client_secret.clone(),
    ));
    let client_app = client.router();

    // Consent front end on :3000
    let consent = ConsentServer::new(ConsentFlow::new(
        ConsentConfig::new(issuer, client_id, client_secret),
        FixedIdentity::default(),
    ));
    let consent_app = consent.router();

    let client_addr = SocketAddr::from(([127, 0, 0, 1], 4000));
    let consent_addr = SocketAddr::from(([127, 0, 0, 1], 3000));

    let client_listener = tokio::net::TcpListener::bind(client_addr)
        .await
        .into_diagnostic()
        .wrap_err("failed to bind client address")?;
    let consent_listener = tokio::net::TcpListener::bind(consent_addr)
        .await
        .into_diagnostic()
        .wrap_err("failed to bind consent address")?;

    tracing::info!("relying-party client listening on {}", client_addr);
    tracing::info!("consent front end listening on {}", consent_addr);

    let client_server = tokio::spawn(async move { axum::serve(client_listener, client_app).await });
    let consent_server =
        tokio::spawn(async move { axum::serve(consent_listener, consent_app).await });

    let (client_result, consent_result) = tokio::try_join!(client_server, consent_server)
        .into_diagnostic()
        .wrap_err("server task failed")?;
    client_result.into_diagnostic().wrap_err("client server error")?;
    consent_result
        .into_diagnostic()
        .wrap_err("consent server error")?;

    Ok(())
}
