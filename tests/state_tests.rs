//! State-token generation and validation tests.

use oidc_flows::state::{FlowVariant, StateTokenManager};

#[test]
fn round_trip_resolves_each_variant() {
    let manager = StateTokenManager::new();

    for variant in [
        FlowVariant::Default,
        FlowVariant::Profile,
        FlowVariant::Refresh,
    ] {
        let state = manager.generate(variant);
        let validation = manager.validate(&state).expect("state matches pattern");
        assert!(validation.valid, "{:?}", variant);
        assert_eq!(validation.variant, Some(variant));
    }
}

#[test]
fn variant_prefixes() {
    let manager = StateTokenManager::with_secret("s3cr3t");

    assert_eq!(manager.generate(FlowVariant::Default), "s3cr3t");
    assert_eq!(manager.generate(FlowVariant::Profile), "p-s3cr3t");
    assert_eq!(manager.generate(FlowVariant::Refresh), "r-s3cr3t");
}

#[test]
fn non_matching_candidates_return_none() {
    let manager = StateTokenManager::with_secret("s3cr3t");

    for candidate in [
        "",
        "p-",
        "a-",
        "-abc",
        "has space",
        "two-dashes-x",
        "p-sec!ret",
        "p-s3cr3t-",
    ] {
        assert!(
            manager.validate(candidate).is_none(),
            "expected no match for {:?}",
            candidate
        );
    }
}

#[test]
fn wrong_secret_still_resolves_the_variant() {
    let manager = StateTokenManager::with_secret("rightsecret");

    let validation = manager.validate("p-wrongsecret").expect("pattern matches");
    assert!(!validation.valid);
    assert_eq!(validation.variant, Some(FlowVariant::Profile));

    let validation = manager.validate("r-wrongsecret").expect("pattern matches");
    assert!(!validation.valid);
    assert_eq!(validation.variant, Some(FlowVariant::Refresh));
}

#[test]
fn unknown_prefix_does_not_mask_the_secret_check() {
    let manager = StateTokenManager::with_secret("s3cr3t");

    // Right secret, unrecognized variant
    let validation = manager.validate("x-s3cr3t").expect("pattern matches");
    assert!(validation.valid);
    assert_eq!(validation.variant, None);

    // Wrong secret, unrecognized variant
    let validation = manager.validate("x-nope").expect("pattern matches");
    assert!(!validation.valid);
    assert_eq!(validation.variant, None);
}

#[test]
fn bare_secret_resolves_the_default_variant() {
    let manager = StateTokenManager::with_secret("s3cr3t");

    let validation = manager.validate("s3cr3t").expect("pattern matches");
    assert!(validation.valid);
    assert_eq!(validation.variant, Some(FlowVariant::Default));
}

#[test]
fn managers_draw_distinct_secrets() {
    let a = StateTokenManager::new();
    let b = StateTokenManager::new();

    assert_ne!(
        a.generate(FlowVariant::Default),
        b.generate(FlowVariant::Default)
    );
}
