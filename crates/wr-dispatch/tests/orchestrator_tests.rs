//! BatchOrchestrator Integration Tests
//!
//! Tests for:
//! - Fail-fast preconditions (empty input, empty payload, not ready)
//! - Per-item failure isolation
//! - Result ordering and raw-recipient tagging
//! - Pacing between items
//! - Cooperative cancellation

use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use wr_common::{DispatchStatus, MessagePayload};
use wr_dispatch::{
    BatchOrchestrator, DispatchError, OrchestratorConfig, ProbeExecutor, NOT_REGISTERED_REASON,
};
use wr_transport::{MessageTransport, NumberDirectory, TransportError};

/// Mock transport that records sends and can fail selected addresses
struct MockTransport {
    ready: bool,
    fail_addresses: HashSet<String>,
    call_count: AtomicU32,
    sent_to: parking_lot::Mutex<Vec<String>>,
    /// Cancelled after the first successful send, when set
    cancel_after_first: parking_lot::Mutex<Option<CancellationToken>>,
}

impl MockTransport {
    fn ready() -> Self {
        Self {
            ready: true,
            fail_addresses: HashSet::new(),
            call_count: AtomicU32::new(0),
            sent_to: parking_lot::Mutex::new(Vec::new()),
            cancel_after_first: parking_lot::Mutex::new(None),
        }
    }

    fn disconnected() -> Self {
        Self {
            ready: false,
            ..Self::ready()
        }
    }

    fn failing_on(addresses: &[&str]) -> Self {
        Self {
            fail_addresses: addresses.iter().map(|s| s.to_string()).collect(),
            ..Self::ready()
        }
    }

    fn cancelling(token: CancellationToken) -> Self {
        Self {
            cancel_after_first: parking_lot::Mutex::new(Some(token)),
            ..Self::ready()
        }
    }

    fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    fn sent_to(&self) -> Vec<String> {
        self.sent_to.lock().clone()
    }
}

#[async_trait]
impl MessageTransport for MockTransport {
    fn is_ready(&self) -> bool {
        self.ready
    }

    async fn send(&self, address: &str, _payload: &MessagePayload) -> wr_transport::Result<()> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.sent_to.lock().push(address.to_string());

        if let Some(token) = self.cancel_after_first.lock().take() {
            token.cancel();
        }

        if self.fail_addresses.contains(address) {
            return Err(TransportError::Rejected {
                status: 500,
                message: "simulated send failure".to_string(),
            });
        }
        Ok(())
    }
}

fn orchestrator() -> BatchOrchestrator {
    BatchOrchestrator::new(OrchestratorConfig::default())
}

fn recipients(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn batch_counts_sum_to_total() {
    let transport = Arc::new(MockTransport::ready());
    let summary = orchestrator()
        .run_batch(
            &recipients(&["0771234567", "0712345678", "94765554443"]),
            MessagePayload::text("hello"),
            Duration::ZERO,
            transport.clone(),
        )
        .await
        .unwrap();

    assert_eq!(summary.total, 3);
    assert_eq!(summary.succeeded, 3);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.succeeded + summary.failed, summary.total);
    assert_eq!(summary.success_rate_percent, 100.0);
    assert_eq!(transport.call_count(), 3);
}

#[tokio::test]
async fn transport_sees_normalized_addresses_but_details_keep_raw_input() {
    let transport = Arc::new(MockTransport::ready());
    let summary = orchestrator()
        .run_batch(
            &recipients(&["0771234567"]),
            MessagePayload::text("hello"),
            Duration::ZERO,
            transport.clone(),
        )
        .await
        .unwrap();

    assert_eq!(transport.sent_to(), vec!["94771234567".to_string()]);
    assert_eq!(summary.details[0].recipient, "0771234567");
}

#[tokio::test]
async fn one_failing_item_does_not_abort_the_batch() {
    let transport = Arc::new(MockTransport::failing_on(&["94712345678"]));
    let summary = orchestrator()
        .run_batch(
            &recipients(&["0771234567", "0712345678", "0765554443"]),
            MessagePayload::text("msg"),
            Duration::ZERO,
            transport.clone(),
        )
        .await
        .unwrap();

    assert_eq!(summary.total, 3);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.details[0].status, DispatchStatus::Succeeded);
    assert_eq!(summary.details[1].status, DispatchStatus::Failed);
    assert_eq!(summary.details[2].status, DispatchStatus::Succeeded);
    assert!(summary.details[1]
        .reason
        .as_ref()
        .unwrap()
        .contains("simulated send failure"));
    // All three were attempted
    assert_eq!(transport.call_count(), 3);
}

#[tokio::test]
async fn empty_recipient_list_fails_before_any_send() {
    let transport = Arc::new(MockTransport::ready());
    let result = orchestrator()
        .run_batch(
            &[],
            MessagePayload::text("hello"),
            Duration::ZERO,
            transport.clone(),
        )
        .await;

    assert!(matches!(result, Err(DispatchError::Validation(_))));
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn empty_payload_fails_before_any_send() {
    let transport = Arc::new(MockTransport::ready());
    let result = orchestrator()
        .run_batch(
            &recipients(&["0771234567"]),
            MessagePayload::text("   "),
            Duration::ZERO,
            transport.clone(),
        )
        .await;

    assert!(matches!(result, Err(DispatchError::Validation(_))));
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn disconnected_transport_fails_the_whole_batch() {
    let transport = Arc::new(MockTransport::disconnected());
    let result = orchestrator()
        .run_batch(
            &recipients(&["0771234567", "0712345678"]),
            MessagePayload::text("hello"),
            Duration::ZERO,
            transport.clone(),
        )
        .await;

    assert!(matches!(result, Err(DispatchError::TransportNotReady)));
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn malformed_recipient_is_recorded_and_batch_continues() {
    let transport = Arc::new(MockTransport::ready());
    let summary = orchestrator()
        .run_batch(
            &recipients(&["0771234567", "no digits here", "0712345678"]),
            MessagePayload::text("hello"),
            Duration::ZERO,
            transport.clone(),
        )
        .await
        .unwrap();

    assert_eq!(summary.total, 3);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.details[1].recipient, "no digits here");
    assert_eq!(summary.details[1].status, DispatchStatus::Failed);
    // The bad item never reached the transport
    assert_eq!(transport.call_count(), 2);
}

#[tokio::test]
async fn details_preserve_input_order() {
    let input = recipients(&["0771111111", "0772222222", "0773333333", "0774444444"]);
    let transport = Arc::new(MockTransport::ready());
    let summary = orchestrator()
        .run_batch(
            &input,
            MessagePayload::text("hello"),
            Duration::ZERO,
            transport,
        )
        .await
        .unwrap();

    let detail_order: Vec<&str> = summary.details.iter().map(|d| d.recipient.as_str()).collect();
    assert_eq!(detail_order, vec!["0771111111", "0772222222", "0773333333", "0774444444"]);
}

#[tokio::test(start_paused = true)]
async fn pacer_runs_exactly_len_minus_one_times() {
    let transport = Arc::new(MockTransport::ready());
    let interval = Duration::from_millis(2000);

    let start = tokio::time::Instant::now();
    let summary = orchestrator()
        .run_batch(
            &recipients(&["0771111111", "0772222222", "0773333333"]),
            MessagePayload::text("hello"),
            interval,
            transport,
        )
        .await
        .unwrap();

    assert_eq!(summary.total, 3);
    // Two waits for three items: paced virtual time is exactly 2 * interval
    assert_eq!(start.elapsed(), interval * 2);
}

#[tokio::test(start_paused = true)]
async fn single_item_batch_never_waits() {
    let transport = Arc::new(MockTransport::ready());

    let start = tokio::time::Instant::now();
    orchestrator()
        .run_batch(
            &recipients(&["0771111111"]),
            MessagePayload::text("hello"),
            Duration::from_millis(2000),
            transport,
        )
        .await
        .unwrap();

    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test]
async fn cancellation_returns_partial_results() {
    let orchestrator = orchestrator();
    let transport = Arc::new(MockTransport::cancelling(orchestrator.cancellation_token()));

    let summary = orchestrator
        .run_batch(
            &recipients(&["0771111111", "0772222222", "0773333333"]),
            MessagePayload::text("hello"),
            Duration::from_millis(2000),
            transport.clone(),
        )
        .await
        .unwrap();

    // Cancelled during the first send: the in-progress wait is abandoned
    // and no further sends are issued.
    assert_eq!(transport.call_count(), 1);
    assert_eq!(summary.total, 1);
    assert_eq!(summary.succeeded + summary.failed, summary.total);
}

#[tokio::test]
async fn probe_executor_maps_directory_answers() {
    struct StubDirectory;

    #[async_trait]
    impl NumberDirectory for StubDirectory {
        async fn lookup(&self, address: &str) -> wr_transport::Result<bool> {
            match address {
                "94771111111" => Ok(true),
                "94772222222" => Ok(false),
                _ => Err(TransportError::Request("directory offline".to_string())),
            }
        }
    }

    let executor = ProbeExecutor::new(Arc::new(StubDirectory));
    let summary = orchestrator()
        .run_with_executor(
            &recipients(&["0771111111", "0772222222", "0773333333"]),
            Duration::ZERO,
            &executor,
        )
        .await
        .unwrap();

    assert_eq!(summary.details[0].status, DispatchStatus::Succeeded);
    assert_eq!(summary.details[1].status, DispatchStatus::Failed);
    assert_eq!(
        summary.details[1].reason.as_deref(),
        Some(NOT_REGISTERED_REASON)
    );
    assert_eq!(summary.details[2].status, DispatchStatus::Failed);
    assert!(summary.details[2]
        .reason
        .as_ref()
        .unwrap()
        .contains("directory offline"));
}
