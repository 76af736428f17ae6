//! Service-token cache tests against a mocked token endpoint.

use oidc_flows::error::Error;
use oidc_flows::token::{ClientTokenCache, TokenClient};
use serde_json::json;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn token_client(server: &MockServer) -> TokenClient {
    let token_url = Url::parse(&format!("{}/oauth2/token", server.uri())).expect("valid url");
    TokenClient::new(token_url, "consent-app", "hunter2", Duration::from_secs(2))
}

#[tokio::test]
async fn ensure_fresh_performs_one_grant_while_the_token_is_valid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("scope=consent.admin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "svc-token",
            "expires_in": 3600,
            "token_type": "bearer",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let cache = ClientTokenCache::new(token_client(&server), "consent.admin");

    assert_eq!(cache.ensure_fresh().await.unwrap(), "svc-token");
    assert_eq!(cache.ensure_fresh().await.unwrap(), "svc-token");
}

#[tokio::test]
async fn a_stale_token_is_replaced_on_the_next_call() {
    let server = MockServer::start().await;
    // expires_in of 1 second falls inside the freshness margin, so every call
    // sees a stale cache entry.
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "svc-token",
            "expires_in": 1,
        })))
        .expect(2)
        .mount(&server)
        .await;

    let cache = ClientTokenCache::new(token_client(&server), "consent.admin");

    cache.ensure_fresh().await.unwrap();
    cache.ensure_fresh().await.unwrap();
}

#[tokio::test]
async fn a_rejected_grant_surfaces_as_token_acquisition_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let cache = ClientTokenCache::new(token_client(&server), "consent.admin");

    match cache.ensure_fresh().await {
        Err(Error::TokenAcquisition(_)) => {}
        other => panic!("expected TokenAcquisition error, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn a_missing_expires_in_still_caches_the_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "svc-token",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let cache = ClientTokenCache::new(token_client(&server), "consent.admin");

    assert_eq!(cache.ensure_fresh().await.unwrap(), "svc-token");
    assert_eq!(cache.ensure_fresh().await.unwrap(), "svc-token");
}
