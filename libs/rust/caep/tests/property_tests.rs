//! Property-based tests for SET issuing.
//!
//! Signing properties run fewer cases; each one performs RSA operations.

use auth_caep::*;
use proptest::prelude::*;
use serde_json::{Value, json};
use test_utils::fixtures::{
    AUDIENCE, IAT, ISSUER, KEY_SET, decode_segment, fixed_clock, other_signing_key,
    risk_change_events, signing_key, verify,
};
use test_utils::{
    caep_event_strategy, epoch_seconds_strategy, http_status_code_strategy, https_uri_strategy,
    security_events_strategy,
};

const BASE64URL: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Issuer, audience and events are copied verbatim; `iat` comes from the clock.
    #[test]
    fn prop_claims_carry_inputs(
        issuer in https_uri_strategy(),
        audience in https_uri_strategy(),
        events in security_events_strategy(),
        now in epoch_seconds_strategy(),
    ) {
        let claims = build_claims(&issuer, &audience, events.clone(), &FixedClock::at_epoch_seconds(now)).unwrap();

        prop_assert_eq!(&claims.iss, &issuer);
        prop_assert_eq!(&claims.aud, &audience);
        prop_assert_eq!(claims.iat, now);
        prop_assert_eq!(&claims.events, &events);
        prop_assert!(uuid::Uuid::parse_str(&claims.jti).is_ok());
    }

    /// Two builds from identical inputs never share a `jti`.
    #[test]
    fn prop_jti_is_unique(events in security_events_strategy()) {
        let clock = fixed_clock();
        let first = build_claims(ISSUER, AUDIENCE, events.clone(), &clock).unwrap();
        let second = build_claims(ISSUER, AUDIENCE, events, &clock).unwrap();

        prop_assert_ne!(first.jti, second.jti);
        prop_assert_eq!(first.iat, second.iat);
    }

    /// Typed events land under their own URI with subject and timestamp intact.
    #[test]
    fn prop_typed_event_body(event in caep_event_strategy()) {
        let claims = SetBuilder::new(ISSUER, AUDIENCE).add_event(&event).build(&fixed_clock()).unwrap();

        prop_assert_eq!(claims.event_count(), 1);
        let body = &claims.events[event.event_type.uri()];
        prop_assert_eq!(&body["subject"], &serde_json::to_value(&event.subject).unwrap());
        prop_assert_eq!(body["event_timestamp"].as_i64(), Some(event.event_timestamp.timestamp()));
    }

    /// Only 2xx answers count as accepted; 204 carries no body.
    #[test]
    fn prop_delivery_classification(status in http_status_code_strategy()) {
        let result = DeliveryResult::classify(status, br#"{"error":"x"}"#);

        prop_assert_eq!(result.is_accepted(), (200..300).contains(&status));
        prop_assert_eq!(result.status(), status);
        if status == 204 {
            prop_assert_eq!(result, DeliveryResult::Accepted);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// A signed token verifies with the signing key's public half and yields the same claims.
    #[test]
    fn prop_signed_token_round_trips(events in security_events_strategy()) {
        let claims = build_claims(ISSUER, AUDIENCE, events, &fixed_clock()).unwrap();
        let token = sign(&claims, signing_key()).unwrap();

        let public = signing_key().to_public();
        prop_assert_eq!(verify(token.as_str(), &public, AUDIENCE).unwrap(), claims);
    }

    /// Verification against any other key fails.
    #[test]
    fn prop_other_key_does_not_verify(events in security_events_strategy()) {
        let claims = build_claims(ISSUER, AUDIENCE, events, &fixed_clock()).unwrap();
        let token = sign(&claims, signing_key()).unwrap();

        prop_assert!(verify(token.as_str(), other_signing_key(), AUDIENCE).is_err());
    }

    /// Changing any payload character invalidates the signature.
    #[test]
    fn prop_tampered_payload_fails(index in any::<prop::sample::Index>(), replacement in 0usize..64) {
        let claims = build_claims(ISSUER, AUDIENCE, risk_change_events(), &fixed_clock()).unwrap();
        let token = sign(&claims, signing_key()).unwrap();
        let segments = token.segments();

        let mut payload = segments[1].as_bytes().to_vec();
        let at = index.index(payload.len());
        let mut new_char = BASE64URL[replacement];
        if new_char == payload[at] {
            new_char = BASE64URL[(replacement + 1) % BASE64URL.len()];
        }
        payload[at] = new_char;
        let tampered = format!("{}.{}.{}", segments[0], String::from_utf8(payload).unwrap(), segments[2]);

        prop_assert!(verify(&tampered, signing_key(), AUDIENCE).is_err());
    }
}

#[test]
fn test_public_export_has_no_private_members() {
    let exported: Value = serde_json::from_str(&KEY_SET.export_public().unwrap()).unwrap();

    for key in exported["keys"].as_array().unwrap() {
        for member in ["d", "p", "q", "dp", "dq", "qi"] {
            assert!(key.get(member).is_none(), "public export leaked {member}");
        }
        assert_eq!(key["kty"], "RSA");
        assert_eq!(key["use"], "sig");
    }
}

#[test]
fn test_generated_kids_are_unique() {
    let other = KeySet::generate(&KeyGenParams::default()).unwrap();
    assert_ne!(other.keys()[0].kid(), KEY_SET.keys()[0].kid());

    let mut merged = KEY_SET.clone();
    merged.insert(other.keys()[0].clone()).unwrap();
    assert_eq!(merged.len(), 2);
    assert!(KeySet::load(&merged.export_full().unwrap()).is_ok());
}

#[test]
fn test_empty_events_rejected() {
    let err = build_claims(ISSUER, AUDIENCE, SecurityEvents::new(), &fixed_clock()).unwrap_err();
    assert!(matches!(err, CaepError::EmptyEvents));
}

#[test]
fn test_single_event_token_shape() {
    let claims = build_claims(ISSUER, AUDIENCE, risk_change_events(), &fixed_clock()).unwrap();
    let token = sign(&claims, signing_key()).unwrap();
    let segments = token.segments();

    let header = decode_segment(segments[0]);
    assert_eq!(header["typ"], SET_TOKEN_TYPE);
    assert_eq!(header["alg"], "RS256");
    assert_eq!(header["kid"], signing_key().kid());

    let payload = decode_segment(segments[1]);
    assert_eq!(payload["iat"], IAT);
    assert_eq!(payload["iss"], ISSUER);
    assert_eq!(payload["aud"], AUDIENCE);
    assert_eq!(payload["events"]["urn:example:risk-change"]["current_level"], json!("high"));
}

#[test]
fn test_key_set_without_signing_key() {
    let mut key = serde_json::to_value(signing_key()).unwrap();
    key["use"] = json!("enc");
    let set = KeySet::load(&json!({ "keys": [key] }).to_string()).unwrap();

    let err = set.select_signing_key(&KeySelection::FirstSigning).unwrap_err();
    assert!(matches!(err, CaepError::NoSigningKey(_)));
}

#[test]
fn test_loaded_full_export_signs() {
    let loaded = KeySet::load(&KEY_SET.export_full().unwrap()).unwrap();
    let key = loaded.select_signing_key(&KeySelection::FirstSigning).unwrap();

    let claims = build_claims(ISSUER, AUDIENCE, risk_change_events(), &fixed_clock()).unwrap();
    let token = sign(&claims, key).unwrap();

    let public = KeySet::load(&KEY_SET.export_public().unwrap()).unwrap();
    let verified = verify(token.as_str(), public.get(key.kid()).unwrap(), AUDIENCE).unwrap();
    assert_eq!(verified.jti, claims.jti);
}
