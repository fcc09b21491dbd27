//! Security Event Token (SET) issuing for CAEP receivers.
//!
//! Implements the transmitter half of RFC 8417 / OpenID CAEP 1.0 push
//! delivery.
//!
//! # Features
//! - RSA key generation and JWK key set files (public and full views)
//! - CAEP event bodies and SET claim construction
//! - Compact JWS signing with `typ: secevent+jwt`
//! - Push delivery with response classification
//!
//! # Example
//!
//! ```no_run
//! use auth_caep::{
//!     CaepEvent, HttpTransmitter, KeySelection, KeySet, SetBuilder, SetTransmitter,
//!     SubjectIdentifier, SystemClock, sign,
//! };
//! use rust_common::HttpConfig;
//!
//! # async fn run(private_jwks: &str) -> auth_caep::CaepResult<()> {
//! let keys = KeySet::load(private_jwks)?;
//! let key = keys.select_signing_key(&KeySelection::FirstSigning)?;
//!
//! let event = CaepEvent::session_revoked(SubjectIdentifier::email("jane@example.com"), None);
//! let claims = SetBuilder::new("https://issuer.example", "https://receiver.example")
//!     .add_event(&event)
//!     .build(&SystemClock)?;
//!
//! let token = sign(&claims, key)?;
//! let endpoint = "https://receiver.example/security/api/v1/security-events".parse().unwrap();
//! let outcome = HttpTransmitter::from_config(&HttpConfig::default())?
//!     .deliver(&token, &endpoint)
//!     .await?;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod error;
pub mod event;
pub mod jwk;
pub mod keys;
pub mod set;
pub mod signer;
pub mod transmitter;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{CaepError, CaepResult};
pub use event::{
    CaepEvent, CaepEventType, ComplexSubject, EventReason, EventSubject, InitiatingEntity,
    SubjectIdentifier,
};
pub use jwk::{KeyGenParams, SigningAlgorithm, SigningKey};
pub use keys::{KeySelection, KeySet};
pub use set::{SecurityEvents, SetBuilder, SetClaims, build_claims};
pub use signer::{SET_MEDIA_TYPE, SET_TOKEN_TYPE, SignedToken, sign};
pub use transmitter::{DeliveryResult, HttpTransmitter, SetTransmitter};
