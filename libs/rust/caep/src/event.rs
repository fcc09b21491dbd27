//! CAEP event types and structures.
//!
//! A [`CaepEvent`] renders to the JSON object carried under its event-type
//! URI in the `events` claim. Event-type schemas are followed by convention
//! only; nothing here validates a body against its schema.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Event types this crate knows how to build.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum CaepEventType {
    /// Session has been revoked
    SessionRevoked,
    /// Credential has changed (added, removed, or modified)
    CredentialChange,
    /// User's assurance level has changed
    AssuranceLevelChange,
    /// Token claims have been updated
    TokenClaimsChange,
    /// Device compliance status has changed
    DeviceComplianceChange,
    /// Okta user risk level has changed
    UserRiskChange,
}

impl CaepEventType {
    /// Every known event type.
    pub const ALL: [Self; 6] = [
        Self::SessionRevoked,
        Self::CredentialChange,
        Self::AssuranceLevelChange,
        Self::TokenClaimsChange,
        Self::DeviceComplianceChange,
        Self::UserRiskChange,
    ];

    /// Get the full URI for this event type
    #[must_use]
    pub const fn uri(&self) -> &'static str {
        match self {
            Self::SessionRevoked => {
                "https://schemas.openid.net/secevent/caep/event-type/session-revoked"
            }
            Self::CredentialChange => {
                "https://schemas.openid.net/secevent/caep/event-type/credential-change"
            }
            Self::AssuranceLevelChange => {
                "https://schemas.openid.net/secevent/caep/event-type/assurance-level-change"
            }
            Self::TokenClaimsChange => {
                "https://schemas.openid.net/secevent/caep/event-type/token-claims-change"
            }
            Self::DeviceComplianceChange => {
                "https://schemas.openid.net/secevent/caep/event-type/device-compliance-change"
            }
            Self::UserRiskChange => {
                "https://schemas.okta.com/secevent/okta/event-type/user-risk-change"
            }
        }
    }

    /// Look up an event type by its URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.uri() == uri)
    }
}

/// Subject identifier formats per OpenID SSF
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum SubjectIdentifier {
    /// Issuer and subject combination
    IssSub {
        /// Issuer of the subject identifier
        iss: String,
        /// Subject within that issuer
        sub: String,
    },
    /// Email address
    Email {
        /// Address
        email: String,
    },
    /// Opaque identifier
    Opaque {
        /// Identifier value
        id: String,
    },
    /// Session identifier
    SessionId {
        /// Session id value
        session_id: String,
    },
}

impl SubjectIdentifier {
    /// Email subject.
    #[must_use]
    pub fn email(email: impl Into<String>) -> Self {
        Self::Email { email: email.into() }
    }

    /// Issuer/subject pair.
    #[must_use]
    pub fn iss_sub(iss: impl Into<String>, sub: impl Into<String>) -> Self {
        Self::IssSub { iss: iss.into(), sub: sub.into() }
    }

    /// Opaque identifier.
    #[must_use]
    pub fn opaque(id: impl Into<String>) -> Self {
        Self::Opaque { id: id.into() }
    }
}

/// Complex subject: one identifier per facet of the principal.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComplexSubject {
    /// The user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<SubjectIdentifier>,
    /// The session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<SubjectIdentifier>,
    /// The device
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<SubjectIdentifier>,
    /// The tenant or organisation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<SubjectIdentifier>,
}

/// Subject of an event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum EventSubject {
    /// A bare identifier (`{"format": ..., ...}`)
    Simple(SubjectIdentifier),
    /// A complex subject (`{"user": {...}, ...}`)
    Complex(ComplexSubject),
}

impl EventSubject {
    /// Complex subject naming only the user.
    #[must_use]
    pub fn user(id: SubjectIdentifier) -> Self {
        Self::Complex(ComplexSubject { user: Some(id), ..ComplexSubject::default() })
    }
}

impl From<SubjectIdentifier> for EventSubject {
    fn from(id: SubjectIdentifier) -> Self {
        Self::Simple(id)
    }
}

impl From<ComplexSubject> for EventSubject {
    fn from(subject: ComplexSubject) -> Self {
        Self::Complex(subject)
    }
}

/// Who initiated the event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InitiatingEntity {
    /// An administrator
    Admin,
    /// The subject user
    User,
    /// A policy evaluation
    Policy,
    /// Any other system process
    System,
}

/// Localised reason text, keyed by language tag.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct EventReason(pub BTreeMap<String, String>);

impl EventReason {
    /// English reason.
    #[must_use]
    pub fn en(text: impl Into<String>) -> Self {
        Self::default().with("en", text)
    }

    /// Add a translation.
    #[must_use]
    pub fn with(mut self, language: impl Into<String>, text: impl Into<String>) -> Self {
        self.0.insert(language.into(), text.into());
        self
    }
}

/// CAEP Event structure
#[derive(Debug, Clone, PartialEq)]
pub struct CaepEvent {
    /// Event type
    pub event_type: CaepEventType,
    /// Subject of the event
    pub subject: EventSubject,
    /// Timestamp when the event occurred
    pub event_timestamp: DateTime<Utc>,
    /// Who initiated the change
    pub initiating_entity: Option<InitiatingEntity>,
    /// Reason for the event (admin-facing)
    pub reason_admin: Option<EventReason>,
    /// Reason for the event (user-facing)
    pub reason_user: Option<EventReason>,
    /// Additional event-specific members
    pub extra: Map<String, Value>,
}

impl CaepEvent {
    /// Create an event of the given type with no event-specific members.
    pub fn new(event_type: CaepEventType, subject: impl Into<EventSubject>) -> Self {
        Self {
            event_type,
            subject: subject.into(),
            event_timestamp: Utc::now(),
            initiating_entity: None,
            reason_admin: None,
            reason_user: None,
            extra: Map::new(),
        }
    }

    /// Create a new session-revoked event
    pub fn session_revoked(subject: impl Into<EventSubject>, reason: Option<String>) -> Self {
        let mut event = Self::new(CaepEventType::SessionRevoked, subject);
        event.reason_admin = reason.map(EventReason::en);
        event
    }

    /// Create a new credential-change event
    pub fn credential_change(
        subject: impl Into<EventSubject>,
        change_type: &str,
        credential_type: &str,
    ) -> Self {
        Self::new(CaepEventType::CredentialChange, subject)
            .with_extra("change_type", change_type)
            .with_extra("credential_type", credential_type)
    }

    /// Create a new assurance-level-change event
    pub fn assurance_level_change(
        subject: impl Into<EventSubject>,
        previous_level: &str,
        current_level: &str,
    ) -> Self {
        Self::new(CaepEventType::AssuranceLevelChange, subject)
            .with_extra("previous_level", previous_level)
            .with_extra("current_level", current_level)
    }

    /// Create a new token-claims-change event carrying the changed claims
    pub fn token_claims_change(subject: impl Into<EventSubject>, claims: Map<String, Value>) -> Self {
        Self::new(CaepEventType::TokenClaimsChange, subject).with_extra("claims", Value::Object(claims))
    }

    /// Create a new device-compliance-change event
    pub fn device_compliance_change(
        subject: impl Into<EventSubject>,
        previous_status: &str,
        current_status: &str,
    ) -> Self {
        Self::new(CaepEventType::DeviceComplianceChange, subject)
            .with_extra("previous_status", previous_status)
            .with_extra("current_status", current_status)
    }

    /// Create a new Okta user-risk-change event
    pub fn user_risk_change(
        subject: impl Into<EventSubject>,
        previous_level: &str,
        current_level: &str,
    ) -> Self {
        Self::new(CaepEventType::UserRiskChange, subject)
            .with_extra("previous_level", previous_level)
            .with_extra("current_level", current_level)
    }

    /// Set the event timestamp.
    #[must_use]
    pub const fn with_timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.event_timestamp = at;
        self
    }

    /// Set the initiating entity.
    #[must_use]
    pub const fn with_initiating_entity(mut self, entity: InitiatingEntity) -> Self {
        self.initiating_entity = Some(entity);
        self
    }

    /// Set the admin-facing reason.
    #[must_use]
    pub fn with_reason_admin(mut self, reason: EventReason) -> Self {
        self.reason_admin = Some(reason);
        self
    }

    /// Set the user-facing reason.
    #[must_use]
    pub fn with_reason_user(mut self, reason: EventReason) -> Self {
        self.reason_user = Some(reason);
        self
    }

    /// Add an event-specific member.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Render the event body placed under [`CaepEventType::uri`].
    ///
    /// Standard members win over `extra` members with the same name.
    ///
    /// # Errors
    ///
    /// Returns an error if the subject cannot be serialized.
    pub fn body(&self) -> serde_json::Result<Value> {
        let mut body = self.extra.clone();

        body.insert("subject".to_string(), serde_json::to_value(&self.subject)?);
        body.insert("event_timestamp".to_string(), self.event_timestamp.timestamp().into());
        if let Some(entity) = self.initiating_entity {
            body.insert("initiating_entity".to_string(), serde_json::to_value(entity)?);
        }
        if let Some(reason) = &self.reason_admin {
            body.insert("reason_admin".to_string(), serde_json::to_value(reason)?);
        }
        if let Some(reason) = &self.reason_user {
            body.insert("reason_user".to_string(), serde_json::to_value(reason)?);
        }

        Ok(Value::Object(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_type_uri() {
        assert_eq!(
            CaepEventType::SessionRevoked.uri(),
            "https://schemas.openid.net/secevent/caep/event-type/session-revoked"
        );
        assert_eq!(
            CaepEventType::UserRiskChange.uri(),
            "https://schemas.okta.com/secevent/okta/event-type/user-risk-change"
        );
    }

    #[test]
    fn test_event_type_from_uri() {
        for event_type in CaepEventType::ALL {
            assert_eq!(CaepEventType::from_uri(event_type.uri()), Some(event_type));
        }
        assert_eq!(CaepEventType::from_uri("urn:example:risk-change"), None);
    }

    #[test]
    fn test_session_revoked_event() {
        let subject = SubjectIdentifier::iss_sub("https://auth.example.com", "user-123");
        let event = CaepEvent::session_revoked(subject, Some("Admin action".to_string()));

        assert_eq!(event.event_type, CaepEventType::SessionRevoked);
        assert_eq!(event.reason_admin, Some(EventReason::en("Admin action")));
    }

    #[test]
    fn test_user_risk_change_body() {
        let at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let event = CaepEvent::user_risk_change(
            EventSubject::user(SubjectIdentifier::email("jane@example.com")),
            "low",
            "high",
        )
        .with_timestamp(at)
        .with_initiating_entity(InitiatingEntity::Policy)
        .with_reason_admin(EventReason::en("Unusual API volume"));

        assert_eq!(
            event.body().unwrap(),
            json!({
                "subject": {"user": {"format": "email", "email": "jane@example.com"}},
                "current_level": "high",
                "previous_level": "low",
                "event_timestamp": 1_700_000_000,
                "initiating_entity": "policy",
                "reason_admin": {"en": "Unusual API volume"}
            })
        );
    }

    fn at_epoch() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_assurance_level_change_body() {
        let event = CaepEvent::assurance_level_change(SubjectIdentifier::opaque("u-1"), "nist-aal1", "nist-aal2")
            .with_timestamp(at_epoch());

        assert_eq!(event.event_type, CaepEventType::AssuranceLevelChange);
        assert_eq!(
            event.body().unwrap(),
            json!({
                "subject": {"format": "opaque", "id": "u-1"},
                "previous_level": "nist-aal1",
                "current_level": "nist-aal2",
                "event_timestamp": 1_700_000_000
            })
        );
    }

    #[test]
    fn test_token_claims_change_body() {
        let mut claims = Map::new();
        claims.insert("role".to_string(), json!("ro-admin"));
        claims.insert("groups".to_string(), json!(["ops"]));

        let event = CaepEvent::token_claims_change(SubjectIdentifier::opaque("u-1"), claims)
            .with_timestamp(at_epoch())
            .with_initiating_entity(InitiatingEntity::System);

        assert_eq!(event.event_type, CaepEventType::TokenClaimsChange);
        assert_eq!(
            event.body().unwrap(),
            json!({
                "subject": {"format": "opaque", "id": "u-1"},
                "claims": {"role": "ro-admin", "groups": ["ops"]},
                "event_timestamp": 1_700_000_000,
                "initiating_entity": "system"
            })
        );
    }

    #[test]
    fn test_device_compliance_change_body() {
        let subject = ComplexSubject {
            device: Some(SubjectIdentifier::opaque("laptop-7")),
            user: Some(SubjectIdentifier::email("jane@example.com")),
            ..ComplexSubject::default()
        };
        let event = CaepEvent::device_compliance_change(subject, "compliant", "not-compliant")
            .with_timestamp(at_epoch());

        assert_eq!(event.event_type, CaepEventType::DeviceComplianceChange);
        assert_eq!(
            event.body().unwrap(),
            json!({
                "subject": {
                    "device": {"format": "opaque", "id": "laptop-7"},
                    "user": {"format": "email", "email": "jane@example.com"}
                },
                "previous_status": "compliant",
                "current_status": "not-compliant",
                "event_timestamp": 1_700_000_000
            })
        );
    }

    #[test]
    fn test_reason_user_body() {
        let event = CaepEvent::session_revoked(SubjectIdentifier::opaque("u-1"), Some("Policy violation".to_string()))
            .with_timestamp(at_epoch())
            .with_reason_user(EventReason::en("You were signed out").with("es", "Se cerró tu sesión"));

        let body = event.body().unwrap();
        assert_eq!(body["reason_admin"], json!({"en": "Policy violation"}));
        assert_eq!(body["reason_user"], json!({"en": "You were signed out", "es": "Se cerró tu sesión"}));
    }

    #[test]
    fn test_standard_members_override_extra() {
        let event = CaepEvent::new(CaepEventType::SessionRevoked, SubjectIdentifier::opaque("abc"))
            .with_extra("subject", "spoofed");
        let body = event.body().unwrap();
        assert_eq!(body["subject"], json!({"format": "opaque", "id": "abc"}));
    }

    #[test]
    fn test_subject_deserializes_both_shapes() {
        let simple: EventSubject =
            serde_json::from_value(json!({"format": "email", "email": "a@b.c"})).unwrap();
        assert_eq!(simple, EventSubject::Simple(SubjectIdentifier::email("a@b.c")));

        let complex: EventSubject = serde_json::from_value(json!({
            "user": {"format": "email", "email": "a@b.c"},
            "session": {"format": "session_id", "session_id": "s-1"}
        }))
        .unwrap();
        match complex {
            EventSubject::Complex(c) => {
                assert_eq!(c.user, Some(SubjectIdentifier::email("a@b.c")));
                assert!(c.device.is_none());
            }
            EventSubject::Simple(_) => panic!("expected complex subject"),
        }
    }

    #[test]
    fn test_reason_translations() {
        let reason = EventReason::en("Revoked").with("de", "Widerrufen");
        assert_eq!(
            serde_json::to_value(&reason).unwrap(),
            json!({"de": "Widerrufen", "en": "Revoked"})
        );
    }
}
