//! Shared proptest generators.

use auth_caep::{CaepEvent, CaepEventType, EventSubject, SecurityEvents, SubjectIdentifier};
use proptest::prelude::*;
use serde_json::{Value, json};

/// Any known event type.
pub fn caep_event_type_strategy() -> impl Strategy<Value = CaepEventType> {
    proptest::sample::select(CaepEventType::ALL.to_vec())
}

/// Simple subject identifiers of every format.
pub fn subject_identifier_strategy() -> impl Strategy<Value = SubjectIdentifier> {
    prop_oneof![
        ("[a-z]{5,20}", "[a-z0-9]{10,30}").prop_map(|(iss, sub)| {
            SubjectIdentifier::iss_sub(format!("https://{iss}.example.com"), sub)
        }),
        "[a-z0-9._%+-]{1,20}@[a-z0-9-]{1,20}\\.[a-z]{2,4}".prop_map(SubjectIdentifier::email),
        "[a-z0-9]{32}".prop_map(SubjectIdentifier::opaque),
        "[a-z0-9-]{36}".prop_map(|session_id| SubjectIdentifier::SessionId { session_id }),
    ]
}

/// Simple or user-complex subjects.
pub fn event_subject_strategy() -> impl Strategy<Value = EventSubject> {
    prop_oneof![
        subject_identifier_strategy().prop_map(EventSubject::from),
        subject_identifier_strategy().prop_map(EventSubject::user),
    ]
}

/// A typed event with an optional admin reason.
pub fn caep_event_strategy() -> impl Strategy<Value = CaepEvent> {
    (
        caep_event_type_strategy(),
        event_subject_strategy(),
        proptest::option::of("[A-Za-z ]{1,60}"),
        1_500_000_000i64..2_000_000_000,
    )
        .prop_map(|(event_type, subject, reason, ts)| {
            let mut event = CaepEvent::new(event_type, subject)
                .with_timestamp(chrono::DateTime::from_timestamp(ts, 0).unwrap_or_default());
            event.reason_admin = reason.map(auth_caep::EventReason::en);
            event
        })
}

/// `https://<name>.example` style URIs.
pub fn https_uri_strategy() -> impl Strategy<Value = String> {
    "[a-z]{3,20}".prop_map(|host| format!("https://{host}.example"))
}

/// Event-type URIs, known or private (`urn:`).
pub fn event_uri_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        caep_event_type_strategy().prop_map(|t| t.uri().to_string()),
        "[a-z]{3,12}".prop_map(|name| format!("urn:example:{name}")),
    ]
}

/// Object-shaped event bodies.
pub fn event_body_strategy() -> impl Strategy<Value = Value> {
    ("[a-z]{1,10}", "[A-Za-z0-9 ]{0,40}", any::<i32>())
        .prop_map(|(key, text, n)| json!({ key: text, "n": n }))
}

/// Non-empty event maps with one to four entries.
pub fn security_events_strategy() -> impl Strategy<Value = SecurityEvents> {
    proptest::collection::btree_map(event_uri_strategy(), event_body_strategy(), 1..5)
}

/// Epoch seconds within a plausible range.
pub fn epoch_seconds_strategy() -> impl Strategy<Value = i64> {
    1_500_000_000i64..2_000_000_000
}

/// Any HTTP status a receiver might answer with.
pub fn http_status_code_strategy() -> impl Strategy<Value = u16> {
    prop_oneof![
        Just(200u16),
        Just(201u16),
        Just(202u16),
        Just(204u16),
        Just(400u16),
        Just(401u16),
        Just(403u16),
        Just(404u16),
        Just(429u16),
        Just(500u16),
        Just(502u16),
        Just(503u16),
    ]
}
