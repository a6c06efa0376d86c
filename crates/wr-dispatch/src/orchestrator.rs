//! Batch Orchestrator - sequential dispatch with per-item accounting
//!
//! One logical worker per batch: items are processed strictly in input
//! order, one in flight at a time. Individual failures are recorded and
//! the loop proceeds; only the fail-fast preconditions (empty input, empty
//! payload, transport not ready) abort a batch, and both fire before any
//! send is attempted.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use wr_common::{BatchSummary, DispatchResult, MessagePayload};
use wr_transport::MessageTransport;

use crate::aggregator::summarize;
use crate::error::DispatchError;
use crate::executor::{ItemExecutor, SendExecutor};
use crate::normalizer::RecipientNormalizer;
use crate::pacer::Pacer;
use crate::Result;

/// Orchestrator construction parameters.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Country prefix applied by the recipient normalizer
    pub country_prefix: String,
    /// Digit count of a local number without the prefix
    pub local_number_length: usize,
    /// Optional absolute cap on sends per minute
    pub rate_limit_per_minute: Option<u32>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            country_prefix: "94".to_string(),
            local_number_length: 9,
            rate_limit_per_minute: None,
        }
    }
}

/// Drives the normalizer, pacer, and executor over one recipient list.
///
/// An orchestrator carries the cancellation token for exactly one batch;
/// construct a fresh one per `run_batch` call.
pub struct BatchOrchestrator {
    normalizer: RecipientNormalizer,
    pacer: Pacer,
    cancel: CancellationToken,
}

impl BatchOrchestrator {
    pub fn new(config: OrchestratorConfig) -> Self {
        Self {
            normalizer: RecipientNormalizer::new(
                config.country_prefix,
                config.local_number_length,
            ),
            pacer: Pacer::new(config.rate_limit_per_minute),
            cancel: CancellationToken::new(),
        }
    }

    /// Token callers may use to cancel this batch cooperatively.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Send `payload` to every recipient with `interval` between sends.
    pub async fn run_batch(
        &self,
        recipients: &[String],
        payload: MessagePayload,
        interval: Duration,
        transport: Arc<dyn MessageTransport>,
    ) -> Result<BatchSummary> {
        if payload.is_empty() {
            return Err(DispatchError::Validation("message payload is required"));
        }
        if !transport.is_ready() {
            return Err(DispatchError::TransportNotReady);
        }

        let executor = SendExecutor::new(transport, payload);
        self.run_with_executor(recipients, interval, &executor).await
    }

    /// Drive any per-item action over the recipient list.
    ///
    /// This is the loop every bulk flow shares; `run_batch` is the
    /// payload-send specialization and the number-activity probe supplies
    /// its own executor. The caller is responsible for any readiness
    /// check its executor requires.
    pub async fn run_with_executor(
        &self,
        recipients: &[String],
        interval: Duration,
        executor: &dyn ItemExecutor,
    ) -> Result<BatchSummary> {
        if recipients.is_empty() {
            return Err(DispatchError::Validation("recipients list is required"));
        }

        info!(
            total = recipients.len(),
            interval_ms = interval.as_millis() as u64,
            "Starting batch"
        );

        let mut details: Vec<DispatchResult> = Vec::with_capacity(recipients.len());

        for (position, raw) in recipients.iter().enumerate() {
            // Pace between consecutive items, never before the first or
            // after the last. The wait runs regardless of the previous
            // item's outcome so the batch always holds the configured rate.
            if position > 0 {
                self.pacer.wait_between(interval, &self.cancel).await;
            }
            self.pacer.acquire_send_slot(&self.cancel).await;

            if self.cancel.is_cancelled() {
                warn!(
                    processed = details.len(),
                    total = recipients.len(),
                    "Batch cancelled, returning partial results"
                );
                break;
            }

            let result = match self.normalizer.normalize(raw) {
                Ok(address) => executor.execute(raw, &address).await,
                Err(e) => {
                    debug!(recipient = %raw, error = %e, "Recipient rejected by normalizer");
                    DispatchResult::failed(raw.as_str(), e.to_string())
                }
            };

            details.push(result);
        }

        let summary = summarize(details);
        info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Batch finished"
        );

        Ok(summary)
    }
}
