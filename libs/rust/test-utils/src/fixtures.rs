//! Test fixtures with sample data.
//!
//! RSA key generation is slow, so keys are generated once per test binary
//! and shared.

use auth_caep::{
    CaepEvent, EventReason, EventSubject, FixedClock, InitiatingEntity, KeyGenParams, KeySet,
    SecurityEvents, SetClaims, SigningKey, SubjectIdentifier, build_claims,
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use once_cell::sync::Lazy;
use serde_json::{Value, json};

/// Issuer used across tests.
pub const ISSUER: &str = "https://issuer.example";

/// Audience used across tests.
pub const AUDIENCE: &str = "https://receiver.example";

/// Private event type used across tests.
pub const RISK_CHANGE_URI: &str = "urn:example:risk-change";

/// Fixed issue time used across tests.
pub const IAT: i64 = 1_700_000_000;

/// Key set with one RS256 signing key.
pub static KEY_SET: Lazy<KeySet> = Lazy::new(generate_set);

/// Unrelated key set, for negative verification.
pub static OTHER_KEY_SET: Lazy<KeySet> = Lazy::new(generate_set);

fn generate_set() -> KeySet {
    match KeySet::generate(&KeyGenParams::default()) {
        Ok(set) => set,
        Err(e) => panic!("fixture key generation failed: {e}"),
    }
}

/// The signing key of [`KEY_SET`].
#[must_use]
pub fn signing_key() -> &'static SigningKey {
    &KEY_SET.keys()[0]
}

/// The signing key of [`OTHER_KEY_SET`].
#[must_use]
pub fn other_signing_key() -> &'static SigningKey {
    &OTHER_KEY_SET.keys()[0]
}

/// Clock frozen at [`IAT`].
#[must_use]
pub fn fixed_clock() -> FixedClock {
    FixedClock::at_epoch_seconds(IAT)
}

/// One event under [`RISK_CHANGE_URI`].
#[must_use]
pub fn risk_change_events() -> SecurityEvents {
    SecurityEvents::from([(
        RISK_CHANGE_URI.to_string(),
        json!({
            "subject": {"user": {"format": "email", "email": "jane@example.com"}},
            "current_level": "high",
            "previous_level": "low",
            "event_timestamp": IAT,
        }),
    )])
}

/// Claims for [`risk_change_events`] at [`IAT`].
#[must_use]
pub fn sample_claims() -> SetClaims {
    match build_claims(ISSUER, AUDIENCE, risk_change_events(), &fixed_clock()) {
        Ok(claims) => claims,
        Err(e) => panic!("fixture claims failed: {e}"),
    }
}

/// Session-revoked event for an email subject.
#[must_use]
pub fn session_revoked(email: &str) -> CaepEvent {
    CaepEvent::session_revoked(
        EventSubject::user(SubjectIdentifier::email(email)),
        Some("Large file transfer to unapproved storage".to_string()),
    )
    .with_initiating_entity(InitiatingEntity::Admin)
}

/// User-risk-change event for an email subject.
#[must_use]
pub fn user_risk_elevated(email: &str) -> CaepEvent {
    CaepEvent::user_risk_change(EventSubject::user(SubjectIdentifier::email(email)), "low", "high")
        .with_initiating_entity(InitiatingEntity::Policy)
        .with_reason_admin(EventReason::en("Unusual volume of sensitive API calls"))
}

/// Verify `token` against `key`'s public members and the expected audience.
///
/// Checks the signature the way a receiver would.
///
/// # Errors
///
/// Returns the `jsonwebtoken` error when the signature or claims do not verify.
pub fn verify(
    token: &str,
    key: &SigningKey,
    audience: &str,
) -> Result<SetClaims, jsonwebtoken::errors::Error> {
    let decoding_key = DecodingKey::from_rsa_components(key.modulus(), key.exponent())?;
    let algorithm = key
        .alg()
        .and_then(|alg| alg.parse::<Algorithm>().ok())
        .unwrap_or(Algorithm::RS256);

    let mut validation = Validation::new(algorithm);
    validation.required_spec_claims.clear();
    validation.validate_exp = false;
    validation.set_audience(&[audience]);

    Ok(decode::<SetClaims>(token, &decoding_key, &validation)?.claims)
}

/// Decode a base64url JSON segment without verifying anything.
#[must_use]
pub fn decode_segment(segment: &str) -> Value {
    URL_SAFE_NO_PAD
        .decode(segment)
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .unwrap_or(Value::Null)
}
