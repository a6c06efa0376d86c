//! Gateway API Contract Tests
//!
//! Business endpoints must answer HTTP 200 with a `success` flag in every
//! outcome; these tests pin that envelope, the dispatch wiring, and the
//! contact bookkeeping behind it.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use wr_common::MessagePayload;
use wr_gateway::{create_router, AppState, ContactStore, DispatchService, DispatchServiceConfig};
use wr_transport::{
    BridgeStatus, ConnectionManager, ConnectionManagerConfig, MessageTransport, NumberDirectory,
    SessionControl, TransportError,
};

/// Scripted bridge double implementing every transport capability
struct StubBridge {
    ready: AtomicBool,
    fail_sends: bool,
    active_numbers: HashSet<String>,
}

impl StubBridge {
    fn connected() -> Arc<Self> {
        Arc::new(Self {
            ready: AtomicBool::new(true),
            fail_sends: false,
            active_numbers: HashSet::new(),
        })
    }

    fn disconnected() -> Arc<Self> {
        Arc::new(Self {
            ready: AtomicBool::new(false),
            fail_sends: false,
            active_numbers: HashSet::new(),
        })
    }

    fn failing_sends() -> Arc<Self> {
        Arc::new(Self {
            ready: AtomicBool::new(true),
            fail_sends: true,
            active_numbers: HashSet::new(),
        })
    }

    fn with_active_numbers(numbers: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            ready: AtomicBool::new(true),
            fail_sends: false,
            active_numbers: numbers.iter().map(|s| s.to_string()).collect(),
        })
    }
}

#[async_trait]
impl MessageTransport for StubBridge {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn send(&self, _address: &str, _payload: &MessagePayload) -> wr_transport::Result<()> {
        if self.fail_sends {
            return Err(TransportError::Rejected {
                status: 500,
                message: "bridge unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl NumberDirectory for StubBridge {
    async fn lookup(&self, address: &str) -> wr_transport::Result<bool> {
        Ok(self.active_numbers.contains(address))
    }
}

#[async_trait]
impl SessionControl for StubBridge {
    async fn fetch_status(&self) -> wr_transport::Result<BridgeStatus> {
        Ok(BridgeStatus {
            connected: self.ready.load(Ordering::SeqCst),
            ..Default::default()
        })
    }

    async fn request_pairing(&self, _phone_number: &str) -> wr_transport::Result<String> {
        Ok("TESTCODE".to_string())
    }

    async fn reset_session(&self) -> wr_transport::Result<()> {
        Ok(())
    }

    fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }
}

fn test_config() -> DispatchServiceConfig {
    DispatchServiceConfig {
        default_interval: Duration::ZERO,
        probe_interval: Duration::ZERO,
        ..Default::default()
    }
}

fn build_app(stub: Arc<StubBridge>) -> (Router, Arc<ConnectionManager>, Arc<ContactStore>) {
    let contacts = Arc::new(ContactStore::new());
    let dispatch = Arc::new(DispatchService::new(
        stub.clone(),
        stub.clone(),
        contacts.clone(),
        test_config(),
    ));
    let connection = Arc::new(ConnectionManager::new(
        stub,
        ConnectionManagerConfig::default(),
    ));

    let router = create_router(AppState {
        dispatch,
        connection: connection.clone(),
        contacts: contacts.clone(),
    });

    (router, connection, contacts)
}

async fn post_json(router: Router, path: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(path)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

async fn get_json(router: Router, path: &str) -> (StatusCode, serde_json::Value) {
    let response = router
        .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn bulk_dispatch_returns_flattened_summary() {
    let (router, _, _) = build_app(StubBridge::connected());

    let (status, json) = post_json(
        router,
        "/api/dispatch/bulk",
        serde_json::json!({
            "recipients": ["0771111111", "0772222222"],
            "message": "hello",
            "intervalMillis": 0
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["total"], 2);
    assert_eq!(json["succeeded"], 2);
    assert_eq!(json["failed"], 0);
    assert_eq!(json["successRatePercent"], 100.0);
    assert_eq!(json["details"][0]["recipient"], "0771111111");
    assert_eq!(json["details"][1]["recipient"], "0772222222");
}

#[tokio::test]
async fn disconnected_transport_yields_error_envelope_with_http_200() {
    let (router, _, _) = build_app(StubBridge::disconnected());

    let (status, json) = post_json(
        router,
        "/api/dispatch/bulk",
        serde_json::json!({
            "recipients": ["0771111111"],
            "message": "hello"
        }),
    )
    .await;

    // Legacy contract: failures are still HTTP 200 with success=false
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().contains("not connected"));
    assert!(json.get("total").is_none());
}

#[tokio::test]
async fn empty_recipients_yield_validation_envelope() {
    let (router, _, _) = build_app(StubBridge::connected());

    let (status, json) = post_json(
        router,
        "/api/dispatch/bulk",
        serde_json::json!({
            "recipients": [],
            "message": "hello"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().contains("recipients"));
}

#[tokio::test]
async fn failed_sends_are_reported_per_item() {
    let (router, _, _) = build_app(StubBridge::failing_sends());

    let (_, json) = post_json(
        router,
        "/api/dispatch/bulk",
        serde_json::json!({
            "recipients": ["0771111111", "0772222222"],
            "message": "hello",
            "intervalMillis": 0
        }),
    )
    .await;

    // The batch itself succeeds; every item inside it failed
    assert_eq!(json["success"], true);
    assert_eq!(json["total"], 2);
    assert_eq!(json["succeeded"], 0);
    assert_eq!(json["failed"], 2);
    assert_eq!(json["details"][0]["status"], "failed");
    assert!(json["details"][0]["reason"]
        .as_str()
        .unwrap()
        .contains("bridge unavailable"));
}

#[tokio::test]
async fn single_send_maps_item_outcome_to_envelope() {
    let (router, _, _) = build_app(StubBridge::connected());
    let (_, json) = post_json(
        router,
        "/api/messages/send",
        serde_json::json!({"number": "0771111111", "message": "hi"}),
    )
    .await;
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "Message sent successfully");

    let (router, _, _) = build_app(StubBridge::failing_sends());
    let (_, json) = post_json(
        router,
        "/api/messages/send",
        serde_json::json!({"number": "0771111111", "message": "hi"}),
    )
    .await;
    assert_eq!(json["success"], false);
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("Failed to send message"));
}

#[tokio::test]
async fn detect_active_maps_summary_to_active_counts() {
    let stub = StubBridge::with_active_numbers(&["94771111111"]);
    let (router, _, _) = build_app(stub);

    let (_, json) = post_json(
        router,
        "/api/numbers/detect-active",
        serde_json::json!({
            "numbers": ["0771111111", "0772222222"],
            "intervalMillis": 0
        }),
    )
    .await;

    assert_eq!(json["success"], true);
    assert_eq!(json["total"], 2);
    assert_eq!(json["active"], 1);
    assert_eq!(json["inactive"], 1);
    assert_eq!(json["activePercentage"], 50.0);
}

#[tokio::test]
async fn status_reflects_connection_state_machine() {
    let (router, connection, _) = build_app(StubBridge::connected());

    connection.apply_status(BridgeStatus {
        connected: false,
        qr: Some("qr-data".to_string()),
        ..Default::default()
    });

    let (status, json) = get_json(router, "/api/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["connected"], false);
    assert_eq!(json["state"], "QR_PENDING");
    assert_eq!(json["qrAvailable"], true);
}

#[tokio::test]
async fn contacts_are_tracked_after_dispatch() {
    let (router, _, contacts) = build_app(StubBridge::connected());

    post_json(
        router.clone(),
        "/api/dispatch/bulk",
        serde_json::json!({
            "recipients": ["0771111111", "0771111111", "0772222222"],
            "message": "hello",
            "intervalMillis": 0
        }),
    )
    .await;

    assert_eq!(contacts.get("0771111111").unwrap().message_count, 2);

    let (_, json) = get_json(router, "/api/stats").await;
    assert_eq!(json["success"], true);
    assert_eq!(json["stats"]["totalBatches"], 1);
    assert_eq!(json["stats"]["totalMessages"], 3);
    assert_eq!(json["stats"]["contactsTracked"], 2);
}

#[tokio::test]
async fn readiness_probe_uses_real_status_codes() {
    let (router, connection, _) = build_app(StubBridge::connected());

    let (status, json) = get_json(router.clone(), "/health/ready").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["status"], "NOT_READY");

    connection.apply_status(BridgeStatus {
        connected: true,
        ..Default::default()
    });

    let (status, json) = get_json(router, "/health/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "READY");
}

#[tokio::test]
async fn cancel_without_active_batch_reports_nothing_to_cancel() {
    let (router, _, _) = build_app(StubBridge::connected());

    let (status, json) = post_json(router, "/api/dispatch/cancel", serde_json::json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["cancelled"], false);
}

#[tokio::test]
async fn pairing_endpoint_returns_issued_code() {
    let (router, _, _) = build_app(StubBridge::connected());

    let (_, json) = post_json(
        router,
        "/api/session/pairing",
        serde_json::json!({"phoneNumber": "0771111111"}),
    )
    .await;

    assert_eq!(json["success"], true);
    assert_eq!(json["pairingCode"], "TESTCODE");
}
