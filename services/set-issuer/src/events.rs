//! Event selection: the default risk/session pair or a JSON events file.

use crate::error::{IssuerError, IssuerResult};
use auth_caep::{
    CaepEvent, Clock, EventReason, EventSubject, InitiatingEntity, SecurityEvents, SetBuilder,
    SubjectIdentifier,
};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Events carried by one token.
#[derive(Debug, Clone, PartialEq)]
pub enum EventBatch {
    /// Typed CAEP events
    Typed(Vec<CaepEvent>),
    /// Bodies keyed by event-type URI, used as given
    Raw(SecurityEvents),
}

impl EventBatch {
    /// Add every event to `builder`.
    #[must_use]
    pub fn apply(self, builder: SetBuilder) -> SetBuilder {
        match self {
            Self::Typed(events) => events.iter().fold(builder, SetBuilder::add_event),
            Self::Raw(events) => events
                .into_iter()
                .fold(builder, |builder, (uri, body)| builder.add_raw_event(uri, body)),
        }
    }
}

/// Where the events come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventSource {
    /// Default events about this subject
    Defaults {
        /// Subject email
        subject_email: String,
        /// Admin-facing reason, if any
        reason_admin: Option<String>,
    },
    /// JSON file of event-type URI to body
    File(PathBuf),
}

impl EventSource {
    /// An events file wins over the default events.
    ///
    /// # Errors
    ///
    /// Returns [`IssuerError::NoEventSource`] when neither is configured.
    pub fn resolve(
        events_file: Option<PathBuf>,
        subject_email: Option<String>,
        reason_admin: Option<String>,
    ) -> IssuerResult<Self> {
        match (events_file, subject_email) {
            (Some(path), _) => Ok(Self::File(path)),
            (None, Some(subject_email)) => Ok(Self::Defaults { subject_email, reason_admin }),
            (None, None) => Err(IssuerError::NoEventSource),
        }
    }

    /// Produce the batch, stamping default events with `clock`.
    ///
    /// # Errors
    ///
    /// Returns file read or format errors for [`EventSource::File`].
    pub async fn load(&self, clock: &dyn Clock) -> IssuerResult<EventBatch> {
        match self {
            Self::Defaults { subject_email, reason_admin } => Ok(EventBatch::Typed(default_events(
                subject_email,
                reason_admin.as_deref(),
                clock,
            ))),
            Self::File(path) => load_events_file(path).await.map(EventBatch::Raw),
        }
    }
}

/// User risk raised from low to high by policy, and the user's sessions
/// revoked by an admin.
#[must_use]
pub fn default_events(subject_email: &str, reason_admin: Option<&str>, clock: &dyn Clock) -> Vec<CaepEvent> {
    let now = clock.now();
    let subject = EventSubject::user(SubjectIdentifier::email(subject_email));

    let risk = CaepEvent::user_risk_change(subject.clone(), "low", "high")
        .with_timestamp(now)
        .with_initiating_entity(InitiatingEntity::Policy);
    let revoked = CaepEvent::session_revoked(subject, None)
        .with_timestamp(now)
        .with_initiating_entity(InitiatingEntity::Admin);

    match reason_admin {
        Some(reason) => vec![
            risk.with_reason_admin(EventReason::en(reason)),
            revoked.with_reason_admin(EventReason::en(reason)),
        ],
        None => vec![risk, revoked],
    }
}

/// Read an events file: a JSON object mapping event-type URI to body.
///
/// Body shapes are checked when claims are built.
///
/// # Errors
///
/// Returns the I/O error, or [`IssuerError::EventsFile`] if the document is
/// not a JSON object.
pub async fn load_events_file(path: &Path) -> IssuerResult<SecurityEvents> {
    let text = tokio::fs::read_to_string(path).await.map_err(|e| IssuerError::io(path, e))?;
    parse_events(&text).map_err(|reason| IssuerError::EventsFile { path: path.to_path_buf(), reason })
}

fn parse_events(text: &str) -> Result<SecurityEvents, String> {
    match serde_json::from_str::<Value>(text).map_err(|e| e.to_string())? {
        Value::Object(map) => Ok(map.into_iter().collect()),
        other => Err(format!("expected a JSON object, found {}", json_kind(&other))),
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
