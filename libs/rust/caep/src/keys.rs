//! Key Material Provider: key sets, their file formats, and signing key selection.
//!
//! Persisting key sets is the caller's business. This module only turns a
//! [`KeySet`] into the two file formats (public and full) and back.

use crate::jwk::{KeyGenParams, SigningKey};
use crate::{CaepError, CaepResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, instrument};

/// Ordered collection of keys with unique `kid`s.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeySet {
    keys: Vec<SigningKey>,
}

/// How the signing key is picked from a [`KeySet`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum KeySelection {
    /// First key in file order declaring `use: sig`.
    #[default]
    FirstSigning,
    /// The signing key with exactly this `kid`.
    Kid(String),
}

impl KeySelection {
    /// Pin a `kid` when one is given, otherwise take the first signing key.
    #[must_use]
    pub fn from_pinned(kid: Option<String>) -> Self {
        kid.map_or(Self::FirstSigning, Self::Kid)
    }
}

impl KeySet {
    /// Empty key set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Key set holding one freshly generated key.
    ///
    /// # Errors
    ///
    /// Propagates [`CaepError::KeyGeneration`].
    pub fn generate(params: &KeyGenParams) -> CaepResult<Self> {
        let mut set = Self::new();
        set.insert(SigningKey::generate(params)?)?;
        Ok(set)
    }

    /// Append a key.
    ///
    /// # Errors
    ///
    /// Returns [`CaepError::DuplicateKid`] if the `kid` is already present.
    pub fn insert(&mut self, key: SigningKey) -> CaepResult<()> {
        if self.get(key.kid()).is_some() {
            return Err(CaepError::DuplicateKid(key.kid().to_string()));
        }
        self.keys.push(key);
        Ok(())
    }

    /// Keys in file order.
    #[must_use]
    pub fn keys(&self) -> &[SigningKey] {
        &self.keys
    }

    /// Key with the given `kid`.
    #[must_use]
    pub fn get(&self, kid: &str) -> Option<&SigningKey> {
        self.keys.iter().find(|k| k.kid() == kid)
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// The same keys without private members.
    #[must_use]
    pub fn public_view(&self) -> Self {
        Self { keys: self.keys.iter().map(SigningKey::to_public).collect() }
    }

    /// Serialize the public view. Safe to publish.
    ///
    /// # Errors
    ///
    /// Returns [`CaepError::Serialization`] if JSON encoding fails.
    pub fn export_public(&self) -> CaepResult<String> {
        to_pretty_json(&self.public_view())
    }

    /// Serialize every key including private members. Store confidentially.
    ///
    /// # Errors
    ///
    /// Returns [`CaepError::Serialization`] if JSON encoding fails.
    pub fn export_full(&self) -> CaepResult<String> {
        to_pretty_json(self)
    }

    /// Parse a persisted key set.
    ///
    /// # Errors
    ///
    /// Returns [`CaepError::KeyLoad`] if the document is malformed, holds no
    /// keys, holds a non-RSA or structurally broken key, or repeats a `kid`.
    #[instrument(skip(serialized), fields(bytes = serialized.len()))]
    pub fn load(serialized: &str) -> CaepResult<Self> {
        let set: Self = serde_json::from_str(serialized)
            .map_err(|e| CaepError::key_load(format!("malformed key set: {e}")))?;

        if set.is_empty() {
            return Err(CaepError::key_load("key set contains no keys"));
        }

        let mut seen = HashSet::new();
        for key in &set.keys {
            key.validate()?;
            if !seen.insert(key.kid()) {
                return Err(CaepError::key_load(format!("duplicate kid {}", key.kid())));
            }
        }

        debug!(keys = set.len(), "key set loaded");
        Ok(set)
    }

    /// Pick the signing key.
    ///
    /// With [`KeySelection::FirstSigning`] the result depends on file order;
    /// pin a `kid` when the set holds more than one signing key.
    ///
    /// # Errors
    ///
    /// Returns [`CaepError::NoSigningKey`] if no key matches.
    pub fn select_signing_key(&self, selection: &KeySelection) -> CaepResult<&SigningKey> {
        match selection {
            KeySelection::FirstSigning => self
                .keys
                .iter()
                .find(|k| k.is_signing_key())
                .ok_or_else(|| CaepError::no_signing_key("no key with use \"sig\" in key set")),
            KeySelection::Kid(kid) => match self.get(kid) {
                Some(key) if key.is_signing_key() => Ok(key),
                Some(_) => Err(CaepError::no_signing_key(format!("key {kid} is not a signing key"))),
                None => Err(CaepError::no_signing_key(format!("key {kid} not in key set"))),
            },
        }
    }
}

fn to_pretty_json<T: Serialize>(value: &T) -> CaepResult<String> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;
    String::from_utf8(out).map_err(|e| CaepError::Platform(rust_common::PlatformError::internal(e.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwk::SigningAlgorithm;
    use once_cell::sync::Lazy;
    use serde_json::Value;

    static SET: Lazy<KeySet> = Lazy::new(|| KeySet::generate(&KeyGenParams::default()).unwrap());

    fn with_use(key: &SigningKey, key_use: &str) -> Value {
        let mut json = serde_json::to_value(key).unwrap();
        json["use"] = Value::from(key_use);
        json
    }

    #[test]
    fn test_export_public_has_no_private_members() {
        let public: Value = serde_json::from_str(&SET.export_public().unwrap()).unwrap();
        let keys = public["keys"].as_array().unwrap();
        assert_eq!(keys.len(), 1);
        assert!(keys[0].get("d").is_none());
        assert_eq!(keys[0]["kid"], SET.keys()[0].kid());
    }

    #[test]
    fn test_export_uses_four_space_indent() {
        let text = SET.export_public().unwrap();
        assert!(text.starts_with("{\n    \"keys\": ["));
    }

    #[test]
    fn test_full_export_loads_back() {
        let loaded = KeySet::load(&SET.export_full().unwrap()).unwrap();
        assert_eq!(loaded, *SET);
        assert!(loaded.keys()[0].has_private());
    }

    #[test]
    fn test_load_rejects_malformed_and_empty() {
        assert!(matches!(KeySet::load("not json"), Err(CaepError::KeyLoad(_))));
        assert!(matches!(KeySet::load(r#"{"keys": []}"#), Err(CaepError::KeyLoad(_))));
        assert!(matches!(KeySet::load(r#"{"keys": [{"kty": "RSA"}]}"#), Err(CaepError::KeyLoad(_))));
    }

    #[test]
    fn test_load_rejects_duplicate_kid() {
        let key = serde_json::to_value(&SET.keys()[0]).unwrap();
        let doc = serde_json::json!({ "keys": [key.clone(), key] }).to_string();
        assert!(matches!(KeySet::load(&doc), Err(CaepError::KeyLoad(msg)) if msg.contains("duplicate")));
    }

    #[test]
    fn test_load_rejects_non_rsa() {
        let mut key = serde_json::to_value(&SET.keys()[0]).unwrap();
        key["kty"] = Value::from("EC");
        let doc = serde_json::json!({ "keys": [key] }).to_string();
        assert!(matches!(KeySet::load(&doc), Err(CaepError::KeyLoad(_))));
    }

    #[test]
    fn test_insert_rejects_duplicate_kid() {
        let mut set = SET.clone();
        let err = set.insert(SET.keys()[0].clone()).unwrap_err();
        assert!(matches!(err, CaepError::DuplicateKid(_)));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_select_first_signing() {
        let key = SET.select_signing_key(&KeySelection::FirstSigning).unwrap();
        assert_eq!(key.kid(), SET.keys()[0].kid());
    }

    #[test]
    fn test_select_without_signing_key() {
        let doc = serde_json::json!({ "keys": [with_use(&SET.keys()[0], "enc")] }).to_string();
        let set = KeySet::load(&doc).unwrap();
        let err = set.select_signing_key(&KeySelection::FirstSigning).unwrap_err();
        assert!(matches!(err, CaepError::NoSigningKey(_)));
    }

    #[test]
    fn test_select_pinned_kid() {
        let kid = SET.keys()[0].kid().to_string();
        let key = SET.select_signing_key(&KeySelection::Kid(kid.clone())).unwrap();
        assert_eq!(key.kid(), kid);

        let err = SET.select_signing_key(&KeySelection::Kid("missing".into())).unwrap_err();
        assert!(matches!(err, CaepError::NoSigningKey(msg) if msg.contains("missing")));
    }

    #[test]
    fn test_selection_from_pinned() {
        assert_eq!(KeySelection::from_pinned(None), KeySelection::FirstSigning);
        assert_eq!(KeySelection::from_pinned(Some("k".into())), KeySelection::Kid("k".into()));
    }

    #[test]
    fn test_generate_records_algorithm() {
        let set = KeySet::generate(&KeyGenParams::default().with_algorithm(SigningAlgorithm::PS256)).unwrap();
        assert_eq!(set.keys()[0].alg(), Some("PS256"));
    }
}
