//! One emission: select key, build claims, sign, deliver.

use crate::config::DeliveryTarget;
use crate::error::IssuerResult;
use crate::events::EventBatch;
use auth_caep::{
    Clock, DeliveryResult, KeySelection, KeySet, SetBuilder, SetClaims, SetTransmitter,
    SignedToken, sign,
};
use tracing::{info, instrument};

/// Everything one emission produced, for presentation.
#[derive(Debug, Clone)]
pub struct EmissionReport {
    /// Key that signed the token
    pub kid: String,
    /// Signed claims
    pub claims: SetClaims,
    /// Compact token
    pub token: SignedToken,
    /// Receiver answer; `None` for a dry run
    pub delivery: Option<DeliveryResult>,
}

/// Issues tokens for one configured receiver.
#[derive(Debug)]
pub struct Emitter<T, C> {
    keys: KeySet,
    selection: KeySelection,
    target: DeliveryTarget,
    transmitter: T,
    clock: C,
}

impl<T: SetTransmitter, C: Clock> Emitter<T, C> {
    /// Create an emitter.
    pub fn new(
        keys: KeySet,
        selection: KeySelection,
        target: DeliveryTarget,
        transmitter: T,
        clock: C,
    ) -> Self {
        Self { keys, selection, target, transmitter, clock }
    }

    /// Build and sign a token without sending it.
    ///
    /// # Errors
    ///
    /// Returns key selection, claim building, or signing failures.
    pub fn prepare(&self, events: EventBatch) -> IssuerResult<(SetClaims, SignedToken, String)> {
        let key = self.keys.select_signing_key(&self.selection)?;
        let claims = events
            .apply(SetBuilder::new(&self.target.issuer, &self.target.audience))
            .build(&self.clock)?;
        let token = sign(&claims, key)?;
        Ok((claims, token, key.kid().to_string()))
    }

    /// Build, sign and (unless `dry_run`) deliver one token.
    ///
    /// A rejection is a successful emission with a
    /// [`DeliveryResult::Rejected`] outcome; only a missing response is an error.
    ///
    /// # Errors
    ///
    /// Returns any failure before delivery, or [`auth_caep::CaepError::Transport`].
    #[instrument(skip(self, events), fields(endpoint = %self.target.endpoint))]
    pub async fn emit(&self, events: EventBatch, dry_run: bool) -> IssuerResult<EmissionReport> {
        let (claims, token, kid) = self.prepare(events)?;

        let delivery = if dry_run {
            info!(jti = %claims.jti, "dry run, token not delivered");
            None
        } else {
            Some(self.transmitter.deliver(&token, &self.target.endpoint).await?)
        };

        Ok(EmissionReport { kid, claims, token, delivery })
    }
}
