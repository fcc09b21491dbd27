//! Security Event Token (SET) claims per RFC 8417.
//!
//! [`build_claims`] is the single place claims are minted: it assigns a fresh
//! `jti`, stamps `iat` from the supplied [`Clock`], and attaches the events
//! as given.

use crate::{CaepError, CaepEvent, CaepResult, Clock};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;
use uuid::Uuid;

/// Event-type URI to event body.
pub type SecurityEvents = BTreeMap<String, Value>;

/// Claim set of a Security Event Token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SetClaims {
    /// Issuer
    pub iss: String,
    /// JWT ID, unique per token
    pub jti: String,
    /// Issued at, epoch seconds
    pub iat: i64,
    /// Audience
    pub aud: String,
    /// Events map (event URI -> event data)
    pub events: SecurityEvents,
}

impl SetClaims {
    /// Check if this SET contains a specific event type.
    #[must_use]
    pub fn contains_event_type(&self, uri: &str) -> bool {
        self.events.contains_key(uri)
    }

    /// Get the number of events in this SET.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events.len()
    }
}

/// Build the claim set for one emission.
///
/// `issuer` and `audience` are copied verbatim. Each call mints a new `jti`
/// from a v4 UUID, so concurrent callers never collide.
///
/// # Errors
///
/// Returns [`CaepError::EmptyEvents`] if `events` is empty and
/// [`CaepError::InvalidEvent`] if any body is not a JSON object.
pub fn build_claims(
    issuer: &str,
    audience: &str,
    events: SecurityEvents,
    clock: &dyn Clock,
) -> CaepResult<SetClaims> {
    if events.is_empty() {
        return Err(CaepError::EmptyEvents);
    }
    if let Some((uri, _)) = events.iter().find(|(_, body)| !body.is_object()) {
        return Err(CaepError::invalid_event(format!("body of {uri} is not a JSON object")));
    }

    let claims = SetClaims {
        iss: issuer.to_string(),
        jti: Uuid::new_v4().to_string(),
        iat: clock.epoch_seconds(),
        aud: audience.to_string(),
        events,
    };
    debug!(jti = %claims.jti, iat = claims.iat, events = claims.event_count(), "SET claims built");
    Ok(claims)
}

/// SET Builder for fluent construction.
#[derive(Debug, Clone)]
pub struct SetBuilder {
    issuer: String,
    audience: String,
    events: SecurityEvents,
    error: Option<String>,
}

impl SetBuilder {
    /// Create a new SET builder.
    #[must_use]
    pub fn new(issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            audience: audience.into(),
            events: SecurityEvents::new(),
            error: None,
        }
    }

    /// Add a typed event.
    #[must_use]
    pub fn add_event(self, event: &CaepEvent) -> Self {
        match event.body() {
            Ok(body) => self.add_raw_event(event.event_type.uri(), body),
            Err(e) => self.fail(format!("{}: {e}", event.event_type.uri())),
        }
    }

    /// Add an event body under an arbitrary event-type URI.
    #[must_use]
    pub fn add_raw_event(mut self, uri: impl Into<String>, body: Value) -> Self {
        let uri = uri.into();
        if self.events.contains_key(&uri) {
            return self.fail(format!("event type {uri} added twice"));
        }
        self.events.insert(uri, body);
        self
    }

    fn fail(mut self, msg: String) -> Self {
        self.error.get_or_insert(msg);
        self
    }

    /// Build a single SET containing all events.
    ///
    /// # Errors
    ///
    /// Returns the first error recorded while adding events, or any error
    /// from [`build_claims`].
    pub fn build(self, clock: &dyn Clock) -> CaepResult<SetClaims> {
        if let Some(msg) = self.error {
            return Err(CaepError::InvalidEvent(msg));
        }
        build_claims(&self.issuer, &self.audience, self.events, clock)
    }
}
