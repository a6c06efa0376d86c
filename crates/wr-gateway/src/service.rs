//! DispatchService - batch execution against the shared session
//!
//! The messaging backend supports a single authenticated session, so the
//! service serializes batch invocations with a mutex: one active batch at
//! a time, whatever flow it belongs to. Completed batches are folded into
//! the contact store here, keeping the dispatch core persistence-free.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use wr_common::{BatchSummary, MessagePayload};
use wr_dispatch::{BatchOrchestrator, DispatchError, OrchestratorConfig, ProbeExecutor};
use wr_transport::{MessageTransport, NumberDirectory};

use crate::contacts::ContactStore;

/// Service construction parameters, mapped from the dispatch section of
/// the application config.
#[derive(Debug, Clone)]
pub struct DispatchServiceConfig {
    pub country_prefix: String,
    pub local_number_length: usize,
    /// Delay between consecutive sends when the request does not override it
    pub default_interval: Duration,
    /// Delay between consecutive directory probes
    pub probe_interval: Duration,
    /// Optional absolute cap on sends per minute
    pub rate_limit_per_minute: Option<u32>,
}

impl Default for DispatchServiceConfig {
    fn default() -> Self {
        Self {
            country_prefix: "94".to_string(),
            local_number_length: 9,
            default_interval: Duration::from_millis(2000),
            probe_interval: Duration::from_millis(1000),
            rate_limit_per_minute: None,
        }
    }
}

/// Owns batch execution for the gateway.
pub struct DispatchService {
    transport: Arc<dyn MessageTransport>,
    directory: Arc<dyn NumberDirectory>,
    contacts: Arc<ContactStore>,
    config: DispatchServiceConfig,
    /// One batch at a time on the shared session
    batch_lock: tokio::sync::Mutex<()>,
    /// Cancellation token of the batch currently running, if any
    active_batch: Mutex<Option<CancellationToken>>,
}

impl DispatchService {
    pub fn new(
        transport: Arc<dyn MessageTransport>,
        directory: Arc<dyn NumberDirectory>,
        contacts: Arc<ContactStore>,
        config: DispatchServiceConfig,
    ) -> Self {
        Self {
            transport,
            directory,
            contacts,
            config,
            batch_lock: tokio::sync::Mutex::new(()),
            active_batch: Mutex::new(None),
        }
    }

    /// Fresh orchestrator per batch; each carries its own cancellation token.
    fn orchestrator(&self) -> BatchOrchestrator {
        BatchOrchestrator::new(OrchestratorConfig {
            country_prefix: self.config.country_prefix.clone(),
            local_number_length: self.config.local_number_length,
            rate_limit_per_minute: self.config.rate_limit_per_minute,
        })
    }

    /// Send one payload to every recipient with inter-send pacing.
    pub async fn send_bulk(
        &self,
        recipients: Vec<String>,
        payload: MessagePayload,
        interval: Option<Duration>,
    ) -> wr_dispatch::Result<BatchSummary> {
        let interval = interval.unwrap_or(self.config.default_interval);
        let batch_id = Uuid::new_v4();

        let _guard = self.batch_lock.lock().await;

        let orchestrator = self.orchestrator();
        *self.active_batch.lock() = Some(orchestrator.cancellation_token());

        info!(batch_id = %batch_id, recipients = recipients.len(), "Bulk dispatch accepted");
        let result = orchestrator
            .run_batch(&recipients, payload, interval, self.transport.clone())
            .await;
        *self.active_batch.lock() = None;

        let summary = result?;
        self.contacts.record_batch(&summary);
        Ok(summary)
    }

    /// Single send expressed as a batch of one (no pacing involved).
    pub async fn send_single(
        &self,
        number: String,
        payload: MessagePayload,
    ) -> wr_dispatch::Result<BatchSummary> {
        self.send_bulk(vec![number], payload, Some(Duration::ZERO))
            .await
    }

    /// Probe every number against the directory with inter-probe pacing.
    pub async fn detect_active(
        &self,
        numbers: Vec<String>,
        interval: Option<Duration>,
    ) -> wr_dispatch::Result<BatchSummary> {
        let interval = interval.unwrap_or(self.config.probe_interval);

        let _guard = self.batch_lock.lock().await;

        // Probes ride the same session as sends; the same readiness guard
        // applies even though no payload is involved.
        if !self.transport.is_ready() {
            return Err(DispatchError::TransportNotReady);
        }

        let orchestrator = self.orchestrator();
        *self.active_batch.lock() = Some(orchestrator.cancellation_token());

        let executor = ProbeExecutor::new(self.directory.clone());
        let result = orchestrator
            .run_with_executor(&numbers, interval, &executor)
            .await;
        *self.active_batch.lock() = None;

        let summary = result?;
        self.contacts.record_probes(&summary);
        Ok(summary)
    }

    /// Cancel the batch currently in flight, if any.
    ///
    /// Already-issued sends are not rolled back; the batch returns partial
    /// results to its caller.
    pub fn cancel_active(&self) -> bool {
        match self.active_batch.lock().as_ref() {
            Some(token) => {
                warn!("Cancelling active batch");
                token.cancel();
                true
            }
            None => false,
        }
    }
}
