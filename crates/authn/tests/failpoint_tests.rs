#![allow(clippy::expect_used, clippy::panic)]
//! Integration tests for fail-point injection in the authn crate.
//!
//! These tests require both `failpoints` and `testutil` features:
//! ```bash
//! cargo test -p vey-authn --features failpoints,testutil --test failpoint_tests
//! ```

#![cfg(feature = "failpoints")]

use vey_authn::{AuthError, generate_token};

#[test]
fn random_source_failpoint_fails_token_generation() {
    let scenario = fail::FailScenario::setup();

    fail::cfg("token-random-source", "return").expect("failed to configure fail point");

    let result = generate_token();
    assert!(
        matches!(result, Err(AuthError::RandomSource(_))),
        "token generation must fail when the random source fails, got {result:?}"
    );

    scenario.teardown();
}

#[test]
fn random_source_failpoint_off_generates_token() {
    let scenario = fail::FailScenario::setup();

    fail::cfg("token-random-source", "off").expect("failed to configure fail point");
    generate_token().expect("token generation should succeed without the fail point");

    scenario.teardown();
}
