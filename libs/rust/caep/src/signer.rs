//! Token Signer: compact JWS serialization of SET claims.
//!
//! The protected header always carries `typ: secevent+jwt`, the signing
//! key's `kid`, and its `alg`.

use crate::jwk::SigningKey;
use crate::{CaepError, CaepResult, SetClaims};
use jsonwebtoken::{Header, encode};
use std::fmt;
use tracing::{info, instrument};

/// `typ` header value identifying a Security Event Token.
pub const SET_TOKEN_TYPE: &str = "secevent+jwt";

/// Media type used when a SET is transmitted.
pub const SET_MEDIA_TYPE: &str = "application/secevent+jwt";

/// Compact serialization of a signed SET (`header.payload.signature`).
#[derive(Clone, PartialEq, Eq)]
pub struct SignedToken(String);

impl SignedToken {
    /// The compact string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the compact string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }

    /// The three base64url segments.
    #[must_use]
    pub fn segments(&self) -> Vec<&str> {
        self.0.split('.').collect()
    }

    /// Decoded protected header.
    ///
    /// # Errors
    ///
    /// Returns [`CaepError::Signing`] if the header segment does not decode.
    pub fn header(&self) -> CaepResult<Header> {
        jsonwebtoken::decode_header(&self.0).map_err(|e| CaepError::signing(format!("undecodable header: {e}")))
    }
}

impl fmt::Display for SignedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for SignedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SignedToken").field(&format_args!("{} bytes", self.0.len())).finish()
    }
}

impl AsRef<str> for SignedToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Sign `claims` with `key`.
///
/// # Errors
///
/// Returns [`CaepError::Signing`] if the key lacks private material,
/// declares an unsupported algorithm, or the signature operation fails.
#[instrument(skip_all, fields(kid = %key.kid(), jti = %claims.jti))]
pub fn sign(claims: &SetClaims, key: &SigningKey) -> CaepResult<SignedToken> {
    if !key.has_private() {
        return Err(CaepError::signing(format!("key {} has no private material", key.kid())));
    }
    let algorithm = key.algorithm()?;
    let encoding_key = key.encoding_key()?;

    let mut header = Header::new(algorithm.jwt_algorithm());
    header.typ = Some(SET_TOKEN_TYPE.to_string());
    header.kid = Some(key.kid().to_string());

    let token = encode(&header, claims, &encoding_key).map_err(|e| CaepError::signing(e.to_string()))?;
    info!(alg = %algorithm, "SET signed");
    Ok(SignedToken(token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwk::{KeyGenParams, SigningAlgorithm};
    use crate::{FixedClock, SecurityEvents, build_claims};
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use jsonwebtoken::Algorithm;
    use once_cell::sync::Lazy;
    use serde_json::json;

    static KEY: Lazy<SigningKey> =
        Lazy::new(|| SigningKey::generate(&KeyGenParams::default()).unwrap());

    fn claims() -> SetClaims {
        let events = SecurityEvents::from([(
            "urn:example:risk-change".to_string(),
            json!({"current_level": "high"}),
        )]);
        build_claims(
            "https://issuer.example",
            "https://receiver.example",
            events,
            &FixedClock::at_epoch_seconds(1_700_000_000),
        )
        .unwrap()
    }

    #[test]
    fn test_token_has_three_segments() {
        let token = sign(&claims(), &KEY).unwrap();
        let segments = token.segments();
        assert_eq!(segments.len(), 3);
        assert!(segments.iter().all(|s| !s.is_empty()));
    }

    #[test]
    fn test_header_fields() {
        let token = sign(&claims(), &KEY).unwrap();
        let header = token.header().unwrap();
        assert_eq!(header.alg, Algorithm::RS256);
        assert_eq!(header.typ.as_deref(), Some(SET_TOKEN_TYPE));
        assert_eq!(header.kid.as_deref(), Some(KEY.kid()));
    }

    #[test]
    fn test_payload_is_claims() {
        let claims = claims();
        let token = sign(&claims, &KEY).unwrap();
        let payload = URL_SAFE_NO_PAD.decode(token.segments()[1]).unwrap();
        let decoded: SetClaims = serde_json::from_slice(&payload).unwrap();
        assert_eq!(decoded, claims);
    }

    #[test]
    fn test_public_key_cannot_sign() {
        let err = sign(&claims(), &KEY.to_public()).unwrap_err();
        assert!(matches!(err, CaepError::Signing(msg) if msg.contains("no private material")));
    }

    #[test]
    fn test_unsupported_algorithm() {
        let mut json = serde_json::to_value(&*KEY).unwrap();
        json["alg"] = json!("ES256");
        let key: SigningKey = serde_json::from_value(json).unwrap();
        assert!(matches!(sign(&claims(), &key), Err(CaepError::Signing(_))));
    }

    #[test]
    fn test_declared_algorithm_is_used() {
        let mut json = serde_json::to_value(&*KEY).unwrap();
        json["alg"] = json!(SigningAlgorithm::PS256.as_str());
        let key: SigningKey = serde_json::from_value(json).unwrap();
        let token = sign(&claims(), &key).unwrap();
        assert_eq!(token.header().unwrap().alg, Algorithm::PS256);
    }

    #[test]
    fn test_debug_hides_token() {
        let token = sign(&claims(), &KEY).unwrap();
        assert!(!format!("{token:?}").contains(token.segments()[2]));
    }
}
