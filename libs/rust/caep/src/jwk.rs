//! RSA signing keys in JWK form (RFC 7517).
//!
//! A [`SigningKey`] is stored exactly as it appears in a key set file. The
//! private members are optional: a public view simply drops them. Private
//! members are redacted from `Debug` output and zeroized on drop.

use crate::{CaepError, CaepResult};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{Algorithm, EncodingKey};
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{BigUint, RsaPrivateKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use zeroize::Zeroize;

/// Declared use of a signing key.
pub const KEY_USE_SIGNATURE: &str = "sig";

/// Key type of every key this crate handles.
pub const KEY_TYPE_RSA: &str = "RSA";

/// Smallest accepted modulus.
pub const MIN_RSA_BITS: usize = 2048;

/// Largest accepted modulus.
pub const MAX_RSA_BITS: usize = 8192;

/// RSA signature algorithms accepted for SETs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SigningAlgorithm {
    /// RSASSA-PKCS1-v1_5 with SHA-256
    #[default]
    RS256,
    /// RSASSA-PKCS1-v1_5 with SHA-384
    RS384,
    /// RSASSA-PKCS1-v1_5 with SHA-512
    RS512,
    /// RSASSA-PSS with SHA-256
    PS256,
}

impl SigningAlgorithm {
    /// Parse an `alg` value.
    ///
    /// # Errors
    ///
    /// Returns [`CaepError::Signing`] for anything outside the supported set.
    pub fn parse(alg: &str) -> CaepResult<Self> {
        match alg {
            "RS256" => Ok(Self::RS256),
            "RS384" => Ok(Self::RS384),
            "RS512" => Ok(Self::RS512),
            "PS256" => Ok(Self::PS256),
            other => Err(CaepError::signing(format!("unsupported algorithm {other:?}"))),
        }
    }

    /// Name used in the `alg` header and JWK member.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RS256 => "RS256",
            Self::RS384 => "RS384",
            Self::RS512 => "RS512",
            Self::PS256 => "PS256",
        }
    }

    /// The matching `jsonwebtoken` algorithm.
    #[must_use]
    pub const fn jwt_algorithm(&self) -> Algorithm {
        match self {
            Self::RS256 => Algorithm::RS256,
            Self::RS384 => Algorithm::RS384,
            Self::RS512 => Algorithm::RS512,
            Self::PS256 => Algorithm::PS256,
        }
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters for [`SigningKey::generate`].
#[derive(Debug, Clone)]
pub struct KeyGenParams {
    /// Modulus size in bits
    pub bits: usize,
    /// Algorithm recorded on the key
    pub algorithm: SigningAlgorithm,
    /// Declared use
    pub key_use: String,
}

impl Default for KeyGenParams {
    fn default() -> Self {
        Self {
            bits: MIN_RSA_BITS,
            algorithm: SigningAlgorithm::RS256,
            key_use: KEY_USE_SIGNATURE.to_string(),
        }
    }
}

impl KeyGenParams {
    /// Set the modulus size.
    #[must_use]
    pub const fn with_bits(mut self, bits: usize) -> Self {
        self.bits = bits;
        self
    }

    /// Set the algorithm.
    #[must_use]
    pub const fn with_algorithm(mut self, algorithm: SigningAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }
}

/// One RSA key as a JWK record.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SigningKey {
    kty: String,
    kid: String,
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    key_use: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    alg: Option<String>,
    n: String,
    e: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    d: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    p: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    q: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dq: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    qi: Option<String>,
}

impl SigningKey {
    /// Generate a fresh RSA key pair.
    ///
    /// The `kid` is the RFC 7638 thumbprint of the public key.
    ///
    /// # Errors
    ///
    /// Returns [`CaepError::KeyGeneration`] for an out-of-range modulus size
    /// or if the RNG or prime search fails.
    pub fn generate(params: &KeyGenParams) -> CaepResult<Self> {
        if !(MIN_RSA_BITS..=MAX_RSA_BITS).contains(&params.bits) {
            return Err(CaepError::key_generation(format!(
                "modulus size {} outside {MIN_RSA_BITS}..={MAX_RSA_BITS}",
                params.bits
            )));
        }
        if params.key_use.is_empty() {
            return Err(CaepError::key_generation("key use must not be empty"));
        }

        let mut rng = rand::rngs::OsRng;
        let private = RsaPrivateKey::new(&mut rng, params.bits)
            .map_err(|e| CaepError::key_generation(e.to_string()))?;

        let key = Self::from_rsa(&private, params.algorithm, &params.key_use)?;
        tracing::info!(kid = %key.kid, bits = params.bits, alg = %params.algorithm, "RSA key generated");
        Ok(key)
    }

    fn from_rsa(private: &RsaPrivateKey, algorithm: SigningAlgorithm, key_use: &str) -> CaepResult<Self> {
        let [p, q] = private.primes() else {
            return Err(CaepError::key_generation("expected exactly two primes"));
        };
        let one = BigUint::from(1u32);
        let two = BigUint::from(2u32);
        let d = private.d();
        let dp = d % &(p - &one);
        let dq = d % &(q - &one);
        // p is prime, so q^(p-2) mod p is the inverse of q.
        let qi = q.modpow(&(p - &two), p);

        let mut key = Self {
            kty: KEY_TYPE_RSA.to_string(),
            kid: String::new(),
            key_use: Some(key_use.to_string()),
            alg: Some(algorithm.as_str().to_string()),
            n: encode_uint(private.n()),
            e: encode_uint(private.e()),
            d: Some(encode_uint(d)),
            p: Some(encode_uint(p)),
            q: Some(encode_uint(q)),
            dp: Some(encode_uint(&dp)),
            dq: Some(encode_uint(&dq)),
            qi: Some(encode_uint(&qi)),
        };
        key.kid = key.thumbprint();
        Ok(key)
    }

    /// Key identifier.
    #[must_use]
    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// Key type (`RSA`).
    #[must_use]
    pub fn kty(&self) -> &str {
        &self.kty
    }

    /// Declared use, if any.
    #[must_use]
    pub fn key_use(&self) -> Option<&str> {
        self.key_use.as_deref()
    }

    /// Declared algorithm, if any.
    #[must_use]
    pub fn alg(&self) -> Option<&str> {
        self.alg.as_deref()
    }

    /// Base64url modulus.
    #[must_use]
    pub fn modulus(&self) -> &str {
        &self.n
    }

    /// Base64url public exponent.
    #[must_use]
    pub fn exponent(&self) -> &str {
        &self.e
    }

    /// Whether the key declares `use: sig`.
    #[must_use]
    pub fn is_signing_key(&self) -> bool {
        self.key_use.as_deref() == Some(KEY_USE_SIGNATURE)
    }

    /// Whether the private exponent is present.
    #[must_use]
    pub const fn has_private(&self) -> bool {
        self.d.is_some()
    }

    /// The declared algorithm, defaulting to RS256 when the member is absent.
    ///
    /// # Errors
    ///
    /// Returns [`CaepError::Signing`] when the declared algorithm is not supported.
    pub fn algorithm(&self) -> CaepResult<SigningAlgorithm> {
        self.alg.as_deref().map_or(Ok(SigningAlgorithm::RS256), SigningAlgorithm::parse)
    }

    /// Copy of this key without any private member.
    #[must_use]
    pub fn to_public(&self) -> Self {
        Self {
            kty: self.kty.clone(),
            kid: self.kid.clone(),
            key_use: self.key_use.clone(),
            alg: self.alg.clone(),
            n: self.n.clone(),
            e: self.e.clone(),
            d: None,
            p: None,
            q: None,
            dp: None,
            dq: None,
            qi: None,
        }
    }

    /// RFC 7638 SHA-256 thumbprint of the public members.
    #[must_use]
    pub fn thumbprint(&self) -> String {
        // Required members in lexicographic order, no whitespace.
        let canonical = format!(r#"{{"e":"{}","kty":"RSA","n":"{}"}}"#, self.e, self.n);
        URL_SAFE_NO_PAD.encode(Sha256::digest(canonical.as_bytes()))
    }

    /// Structural checks applied when a key is loaded from storage.
    pub(crate) fn validate(&self) -> CaepResult<()> {
        if self.kty != KEY_TYPE_RSA {
            return Err(CaepError::key_load(format!(
                "key {} has unsupported kty {:?}",
                self.kid, self.kty
            )));
        }
        if self.kid.is_empty() {
            return Err(CaepError::key_load("key without kid"));
        }
        decode_uint("n", &self.n).map_err(|e| CaepError::key_load(format!("key {}: {e}", self.kid)))?;
        decode_uint("e", &self.e).map_err(|e| CaepError::key_load(format!("key {}: {e}", self.kid)))?;
        Ok(())
    }

    /// `jsonwebtoken` encoding key built from the private members.
    ///
    /// # Errors
    ///
    /// Returns [`CaepError::Signing`] if private members are missing or do
    /// not form a consistent RSA key.
    pub fn encoding_key(&self) -> CaepResult<EncodingKey> {
        let private = self.rsa_private_key()?;
        let der = private
            .to_pkcs1_der()
            .map_err(|e| CaepError::signing(format!("key {}: {e}", self.kid)))?;
        Ok(EncodingKey::from_rsa_der(der.as_bytes()))
    }

    fn rsa_private_key(&self) -> CaepResult<RsaPrivateKey> {
        let missing = |member: &str| CaepError::signing(format!("key {} has no private member {member}", self.kid));
        let d = self.d.as_deref().ok_or_else(|| missing("d"))?;
        let p = self.p.as_deref().ok_or_else(|| missing("p"))?;
        let q = self.q.as_deref().ok_or_else(|| missing("q"))?;

        let component = |name: &str, value: &str| {
            decode_uint(name, value).map_err(|e| CaepError::signing(format!("key {}: {e}", self.kid)))
        };
        let key = RsaPrivateKey::from_components(
            component("n", &self.n)?,
            component("e", &self.e)?,
            component("d", d)?,
            vec![component("p", p)?, component("q", q)?],
        )
        .map_err(|e| CaepError::signing(format!("key {}: {e}", self.kid)))?;
        key.validate()
            .map_err(|e| CaepError::signing(format!("key {}: {e}", self.kid)))?;
        Ok(key)
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("kty", &self.kty)
            .field("kid", &self.kid)
            .field("use", &self.key_use)
            .field("alg", &self.alg)
            .field("private", &if self.has_private() { "[REDACTED]" } else { "none" })
            .finish_non_exhaustive()
    }
}

impl Drop for SigningKey {
    fn drop(&mut self) {
        self.d.zeroize();
        self.p.zeroize();
        self.q.zeroize();
        self.dp.zeroize();
        self.dq.zeroize();
        self.qi.zeroize();
    }
}

fn encode_uint(value: &BigUint) -> String {
    URL_SAFE_NO_PAD.encode(value.to_bytes_be())
}

fn decode_uint(name: &str, value: &str) -> Result<BigUint, String> {
    let bytes = URL_SAFE_NO_PAD
        .decode(value)
        .map_err(|e| format!("member {name} is not base64url: {e}"))?;
    if bytes.is_empty() {
        return Err(format!("member {name} is empty"));
    }
    Ok(BigUint::from_bytes_be(&bytes))
}
