//! Item executors - one action per normalized address
//!
//! The orchestrator drives a single `ItemExecutor` over the batch; the
//! send and probe flows differ only in which executor they supply. Every
//! executor converts its own failures into a failed DispatchResult so a
//! bad item can never abort the batch.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use wr_common::{DispatchResult, MessagePayload};
use wr_transport::{MessageTransport, NumberDirectory};

use crate::normalizer::NormalizedAddress;

/// Failure reason recorded for numbers the directory does not know.
pub const NOT_REGISTERED_REASON: &str = "number not registered on WhatsApp";

/// One action against one normalized address.
///
/// `raw` is the recipient exactly as the caller supplied it; results are
/// tagged with it so callers can correlate failures back to their input.
#[async_trait]
pub trait ItemExecutor: Send + Sync {
    async fn execute(&self, raw: &str, address: &NormalizedAddress) -> DispatchResult;
}

/// Delivers one message payload per address via the injected transport.
pub struct SendExecutor {
    transport: Arc<dyn MessageTransport>,
    payload: MessagePayload,
}

impl SendExecutor {
    pub fn new(transport: Arc<dyn MessageTransport>, payload: MessagePayload) -> Self {
        Self { transport, payload }
    }
}

#[async_trait]
impl ItemExecutor for SendExecutor {
    async fn execute(&self, raw: &str, address: &NormalizedAddress) -> DispatchResult {
        match self.transport.send(address.as_str(), &self.payload).await {
            Ok(()) => {
                debug!(address = %address, "Send succeeded");
                DispatchResult::succeeded(raw)
            }
            Err(e) => {
                debug!(address = %address, error = %e, "Send failed");
                DispatchResult::failed(raw, e.to_string())
            }
        }
    }
}

/// Checks whether each address is registered on the network.
///
/// An unregistered number is a failed item with [`NOT_REGISTERED_REASON`];
/// a directory error keeps the transport's own message.
pub struct ProbeExecutor {
    directory: Arc<dyn NumberDirectory>,
}

impl ProbeExecutor {
    pub fn new(directory: Arc<dyn NumberDirectory>) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl ItemExecutor for ProbeExecutor {
    async fn execute(&self, raw: &str, address: &NormalizedAddress) -> DispatchResult {
        match self.directory.lookup(address.as_str()).await {
            Ok(true) => DispatchResult::succeeded(raw),
            Ok(false) => DispatchResult::failed(raw, NOT_REGISTERED_REASON),
            Err(e) => DispatchResult::failed(raw, e.to_string()),
        }
    }
}
