//! Mock implementations for testing.

use auth_caep::{CaepError, CaepResult, DeliveryResult, SetTransmitter, SignedToken};
use std::sync::Arc;
use tokio::sync::RwLock;
use url::Url;

/// A delivery recorded by [`RecordingTransmitter`].
#[derive(Debug, Clone)]
pub struct RecordedDelivery {
    /// Compact token that was handed over
    pub token: String,
    /// Endpoint it was addressed to
    pub endpoint: Url,
}

#[derive(Debug, Clone)]
enum Reply {
    Result(DeliveryResult),
    TransportFailure(String),
}

/// Transmitter that records deliveries and answers with a canned reply.
#[derive(Debug, Clone)]
pub struct RecordingTransmitter {
    reply: Reply,
    deliveries: Arc<RwLock<Vec<RecordedDelivery>>>,
}

impl Default for RecordingTransmitter {
    fn default() -> Self {
        Self::replying(DeliveryResult::Accepted)
    }
}

impl RecordingTransmitter {
    /// Accept every token with 204.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every delivery with `result`.
    #[must_use]
    pub fn replying(result: DeliveryResult) -> Self {
        Self { reply: Reply::Result(result), deliveries: Arc::default() }
    }

    /// Fail every delivery as if the receiver were unreachable.
    #[must_use]
    pub fn unreachable(reason: impl Into<String>) -> Self {
        Self { reply: Reply::TransportFailure(reason.into()), deliveries: Arc::default() }
    }

    /// Deliveries seen so far.
    pub async fn deliveries(&self) -> Vec<RecordedDelivery> {
        self.deliveries.read().await.clone()
    }

    /// Number of deliveries seen so far.
    pub async fn delivery_count(&self) -> usize {
        self.deliveries.read().await.len()
    }

    /// Forget recorded deliveries.
    pub async fn clear(&self) {
        self.deliveries.write().await.clear();
    }
}

impl SetTransmitter for RecordingTransmitter {
    async fn deliver(&self, token: &SignedToken, endpoint: &Url) -> CaepResult<DeliveryResult> {
        self.deliveries.write().await.push(RecordedDelivery {
            token: token.as_str().to_string(),
            endpoint: endpoint.clone(),
        });
        match &self.reply {
            Reply::Result(result) => Ok(result.clone()),
            Reply::TransportFailure(reason) => Err(CaepError::transport(reason.clone())),
        }
    }
}
