//! Consent-resolution decision and grant-building tests.

use oidc_flows::consent::{ConsentDecisionEngine, ConsentRequest, ScopeInput, Subject};
use serde_json::json;

fn subject() -> Subject {
    Subject {
        subject: "user:12345:dandean".into(),
        email: "dan@acme.com".into(),
        email_verified: true,
        name: "Dan Dean".into(),
        nickname: "Danny".into(),
    }
}

fn request(scopes: &[&str]) -> ConsentRequest {
    ConsentRequest {
        id: "abc123".into(),
        requested_scopes: scopes.iter().map(|s| s.to_string()).collect(),
        client_id: "demo".into(),
        redirect_url: "http://localhost:4444/oauth2/auth?consent=abc123".into(),
    }
}

#[test]
fn offline_scope_auto_grants_all_requested_scopes() {
    let request = request(&["openid", "offline", "email"]);
    let decision = ConsentDecisionEngine::decide(&request, &subject());

    assert!(decision.auto_grant);
    let grant = decision.grant.expect("grant built on auto-grant");
    assert_eq!(grant.grant_scopes, vec!["openid", "offline", "email"]);
    assert_eq!(grant.subject, "user:12345:dandean");
}

#[test]
fn without_offline_the_prompt_is_required() {
    let request = request(&["openid", "email", "profile"]);
    let decision = ConsentDecisionEngine::decide(&request, &subject());

    assert!(!decision.auto_grant);
    assert!(decision.grant.is_none());
}

#[test]
fn profile_scope_yields_exactly_name_and_nickname() {
    let grant = ConsentDecisionEngine::build_grant(
        &subject(),
        ScopeInput::Many(vec!["profile".to_string()]),
    );

    assert_eq!(grant.id_token_extra.len(), 2);
    assert_eq!(grant.id_token_extra["name"], json!("Dan Dean"));
    assert_eq!(grant.id_token_extra["nickname"], json!("Danny"));
}

#[test]
fn email_scope_yields_exactly_email_claims() {
    let grant =
        ConsentDecisionEngine::build_grant(&subject(), ScopeInput::Many(vec!["email".to_string()]));

    assert_eq!(grant.id_token_extra.len(), 2);
    assert_eq!(grant.id_token_extra["email"], json!("dan@acme.com"));
    assert_eq!(grant.id_token_extra["email_verified"], json!(true));
}

#[test]
fn empty_scopes_yield_no_claims() {
    let grant = ConsentDecisionEngine::build_grant(&subject(), ScopeInput::Many(vec![]));

    assert!(grant.id_token_extra.is_empty());
    assert!(grant.access_token_extra.is_empty());
    assert!(grant.grant_scopes.is_empty());
}

#[test]
fn both_claim_scopes_combine() {
    let grant = ConsentDecisionEngine::build_grant(
        &subject(),
        ScopeInput::Many(vec!["profile".to_string(), "email".to_string()]),
    );

    assert_eq!(grant.id_token_extra.len(), 4);
    assert!(grant.id_token_extra.contains_key("name"));
    assert!(grant.id_token_extra.contains_key("nickname"));
    assert!(grant.id_token_extra.contains_key("email"));
    assert!(grant.id_token_extra.contains_key("email_verified"));
}

#[test]
fn scalar_scope_behaves_like_a_one_element_list() {
    let from_scalar =
        ConsentDecisionEngine::build_grant(&subject(), ScopeInput::One("profile".to_string()));
    let from_list = ConsentDecisionEngine::build_grant(
        &subject(),
        ScopeInput::Many(vec!["profile".to_string()]),
    );

    assert_eq!(from_scalar, from_list);
}

#[test]
fn scope_input_deserializes_scalar_and_list() {
    let scalar: ScopeInput = serde_json::from_value(json!("openid")).unwrap();
    assert_eq!(scalar.into_scopes(), vec!["openid"]);

    let list: ScopeInput = serde_json::from_value(json!(["openid", "email"])).unwrap();
    assert_eq!(list.into_scopes(), vec!["openid", "email"]);
}

#[test]
fn non_string_scope_elements_are_rejected() {
    assert!(serde_json::from_value::<ScopeInput>(json!(["openid", 42])).is_err());
    assert!(serde_json::from_value::<ScopeInput>(json!(42)).is_err());
    assert!(serde_json::from_value::<ScopeInput>(json!({"scope": "openid"})).is_err());
}
