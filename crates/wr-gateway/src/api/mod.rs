//! WaRelay Gateway HTTP API
//!
//! Endpoints for:
//! - Bulk dispatch, single sends, and batch cancellation
//! - Number-activity detection
//! - Session lifecycle (status, QR, pairing, reset)
//! - Contact activity and gateway statistics
//! - Kubernetes probes and Swagger UI
//!
//! Business endpoints answer HTTP 200 with a `success` flag (the contract
//! legacy callers rely on); probes and health use real status codes.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use wr_common::{ConnectionState, MessagePayload};
use wr_transport::ConnectionManager;

use crate::contacts::ContactStore;
use crate::service::DispatchService;

pub mod model;

use model::{
    BulkDispatchRequest, BulkDispatchResponse, CancelResponse, ContactsResponse,
    DetectActiveRequest, DetectActiveResponse, NewSessionResponse, PairingRequest,
    PairingResponse, ProbeResponse, QrCodeResponse, SendMessageRequest, SendMessageResponse,
    SimpleHealthResponse, StatsResponse, StatusResponse,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub dispatch: Arc<DispatchService>,
    pub connection: Arc<ConnectionManager>,
    pub contacts: Arc<ContactStore>,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "WaRelay Gateway API",
        version = "0.1.0",
        description = "HTTP API for bulk message dispatch, number detection, and session management"
    ),
    paths(
        health_handler,
        liveness_probe,
        readiness_probe,
        status_handler,
        qr_handler,
        pairing_handler,
        new_session_handler,
        bulk_dispatch_handler,
        cancel_handler,
        send_message_handler,
        detect_active_handler,
        contacts_handler,
        stats_handler,
    ),
    components(schemas(
        BulkDispatchRequest,
        BulkDispatchResponse,
        SendMessageRequest,
        SendMessageResponse,
        DetectActiveRequest,
        DetectActiveResponse,
        StatusResponse,
        QrCodeResponse,
        PairingRequest,
        PairingResponse,
        NewSessionResponse,
        CancelResponse,
        ContactsResponse,
        StatsResponse,
        SimpleHealthResponse,
        ProbeResponse,
    )),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "session", description = "Backend session lifecycle"),
        (name = "dispatch", description = "Message dispatch endpoints"),
        (name = "contacts", description = "Contact activity endpoints"),
    )
)]
pub struct ApiDoc;

/// Create the full router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        // Health and probes
        .route("/health", get(health_handler))
        .route("/health/live", get(liveness_probe))
        .route("/health/ready", get(readiness_probe))
        // Session lifecycle
        .route("/api/status", get(status_handler))
        .route("/api/session/qr", get(qr_handler))
        .route("/api/session/pairing", post(pairing_handler))
        .route("/api/session/new", post(new_session_handler))
        // Dispatch
        .route("/api/dispatch/bulk", post(bulk_dispatch_handler))
        .route("/api/dispatch/cancel", post(cancel_handler))
        .route("/api/messages/send", post(send_message_handler))
        .route("/api/numbers/detect-active", post(detect_active_handler))
        // Contact activity
        .route("/api/contacts", get(contacts_handler))
        .route("/api/stats", get(stats_handler))
        .with_state(state)
}

fn payload_from(text: String, media_url: Option<String>, caption: Option<String>) -> MessagePayload {
    let payload = MessagePayload::text(text);
    match media_url {
        Some(url) => payload.with_attachment(url, caption),
        None => payload,
    }
}

// ============================================================================
// Health Endpoints
// ============================================================================

/// Basic health check
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is running", body = SimpleHealthResponse)
    )
)]
async fn health_handler() -> Json<SimpleHealthResponse> {
    Json(SimpleHealthResponse {
        status: "UP".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Kubernetes liveness probe
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "health",
    responses(
        (status = 200, description = "Application is live", body = ProbeResponse)
    )
)]
async fn liveness_probe() -> Json<ProbeResponse> {
    Json(ProbeResponse {
        status: "LIVE".to_string(),
    })
}

/// Kubernetes readiness probe - ready once the backend session can send
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "health",
    responses(
        (status = 200, description = "Ready to dispatch", body = ProbeResponse),
        (status = 503, description = "Backend session not connected", body = ProbeResponse)
    )
)]
async fn readiness_probe(State(state): State<AppState>) -> Response {
    if state.connection.is_connected() {
        (
            StatusCode::OK,
            Json(ProbeResponse {
                status: "READY".to_string(),
            }),
        )
            .into_response()
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ProbeResponse {
                status: "NOT_READY".to_string(),
            }),
        )
            .into_response()
    }
}

// ============================================================================
// Session Endpoints
// ============================================================================

/// Connection status snapshot
#[utoipa::path(
    get,
    path = "/api/status",
    tag = "session",
    responses(
        (status = 200, description = "Current session status", body = StatusResponse)
    )
)]
async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    let session = state.connection.session();

    Json(StatusResponse {
        success: true,
        connected: session.state == ConnectionState::Connected,
        state: session.state,
        phone_number: session.phone_number.clone(),
        qr_available: session.qr_code.is_some(),
        pairing_code_available: session.pairing_code.is_some(),
        message: session.status_message().to_string(),
    })
}

/// Current QR code for linking, when one is pending
#[utoipa::path(
    get,
    path = "/api/session/qr",
    tag = "session",
    responses(
        (status = 200, description = "QR code or a wait message", body = QrCodeResponse)
    )
)]
async fn qr_handler(State(state): State<AppState>) -> Json<QrCodeResponse> {
    let session = state.connection.session();

    match session.qr_code {
        Some(qr) => Json(QrCodeResponse {
            success: true,
            qr: Some(qr),
            message: "Scan with WhatsApp within 2 minutes".to_string(),
        }),
        None => Json(QrCodeResponse {
            success: false,
            qr: None,
            message: "QR code not available yet".to_string(),
        }),
    }
}

/// Request a pairing code for a phone number
#[utoipa::path(
    post,
    path = "/api/session/pairing",
    tag = "session",
    request_body = PairingRequest,
    responses(
        (status = 200, description = "Pairing code issued or an error envelope", body = PairingResponse)
    )
)]
async fn pairing_handler(
    State(state): State<AppState>,
    Json(request): Json<PairingRequest>,
) -> Json<PairingResponse> {
    if request.phone_number.trim().is_empty() {
        return Json(PairingResponse {
            success: false,
            pairing_code: None,
            error: Some("Phone number is required".to_string()),
        });
    }

    match state.connection.request_pairing(&request.phone_number).await {
        Ok(code) => Json(PairingResponse {
            success: true,
            pairing_code: Some(code),
            error: None,
        }),
        Err(e) => {
            warn!(error = %e, "Pairing request failed");
            Json(PairingResponse {
                success: false,
                pairing_code: None,
                error: Some(format!("Failed to request pairing code: {}", e)),
            })
        }
    }
}

/// Drop the current session and start a fresh login
#[utoipa::path(
    post,
    path = "/api/session/new",
    tag = "session",
    responses(
        (status = 200, description = "Session reset outcome", body = NewSessionResponse)
    )
)]
async fn new_session_handler(State(state): State<AppState>) -> Json<NewSessionResponse> {
    match state.connection.reset().await {
        Ok(()) => Json(NewSessionResponse {
            success: true,
            message: Some("New session creation started".to_string()),
            error: None,
        }),
        Err(e) => Json(NewSessionResponse {
            success: false,
            message: None,
            error: Some(e.to_string()),
        }),
    }
}

// ============================================================================
// Dispatch Endpoints
// ============================================================================

/// Dispatch one message to many recipients with inter-send pacing
#[utoipa::path(
    post,
    path = "/api/dispatch/bulk",
    tag = "dispatch",
    request_body = BulkDispatchRequest,
    responses(
        (status = 200, description = "Batch summary or an error envelope", body = BulkDispatchResponse)
    )
)]
async fn bulk_dispatch_handler(
    State(state): State<AppState>,
    Json(request): Json<BulkDispatchRequest>,
) -> Json<BulkDispatchResponse> {
    let payload = payload_from(request.message, request.media_url, request.caption);
    let interval = request.interval_millis.map(Duration::from_millis);

    match state
        .dispatch
        .send_bulk(request.recipients, payload, interval)
        .await
    {
        Ok(summary) => Json(BulkDispatchResponse::ok(summary)),
        Err(e) => Json(BulkDispatchResponse::failure(e.to_string())),
    }
}

/// Cancel the batch currently in flight
#[utoipa::path(
    post,
    path = "/api/dispatch/cancel",
    tag = "dispatch",
    responses(
        (status = 200, description = "Whether a running batch was cancelled", body = CancelResponse)
    )
)]
async fn cancel_handler(State(state): State<AppState>) -> Json<CancelResponse> {
    let cancelled = state.dispatch.cancel_active();
    Json(CancelResponse {
        success: true,
        cancelled,
    })
}

/// Send a single message
#[utoipa::path(
    post,
    path = "/api/messages/send",
    tag = "dispatch",
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "Send outcome envelope", body = SendMessageResponse)
    )
)]
async fn send_message_handler(
    State(state): State<AppState>,
    Json(request): Json<SendMessageRequest>,
) -> Json<SendMessageResponse> {
    let payload = payload_from(request.message, request.media_url, request.caption);

    match state.dispatch.send_single(request.number, payload).await {
        Ok(summary) => match summary.details.first() {
            Some(detail) if detail.is_success() => Json(SendMessageResponse::ok()),
            Some(detail) => Json(SendMessageResponse::failure(format!(
                "Failed to send message: {}",
                detail.reason.as_deref().unwrap_or("unknown error")
            ))),
            None => Json(SendMessageResponse::failure("Failed to send message")),
        },
        Err(e) => Json(SendMessageResponse::failure(e.to_string())),
    }
}

/// Detect which numbers are registered on the network
#[utoipa::path(
    post,
    path = "/api/numbers/detect-active",
    tag = "dispatch",
    request_body = DetectActiveRequest,
    responses(
        (status = 200, description = "Detection summary or an error envelope", body = DetectActiveResponse)
    )
)]
async fn detect_active_handler(
    State(state): State<AppState>,
    Json(request): Json<DetectActiveRequest>,
) -> Json<DetectActiveResponse> {
    let interval = request.interval_millis.map(Duration::from_millis);

    match state.dispatch.detect_active(request.numbers, interval).await {
        Ok(summary) => Json(DetectActiveResponse::from_summary(summary)),
        Err(e) => Json(DetectActiveResponse::failure(e.to_string())),
    }
}

// ============================================================================
// Contact Activity Endpoints
// ============================================================================

/// Tracked contacts, most recently contacted first
#[utoipa::path(
    get,
    path = "/api/contacts",
    tag = "contacts",
    responses(
        (status = 200, description = "Contact activity list", body = ContactsResponse)
    )
)]
async fn contacts_handler(State(state): State<AppState>) -> Json<ContactsResponse> {
    let contacts = state.contacts.snapshot();
    Json(ContactsResponse {
        success: true,
        total: contacts.len(),
        contacts,
    })
}

/// Aggregate dispatch counters since startup
#[utoipa::path(
    get,
    path = "/api/stats",
    tag = "contacts",
    responses(
        (status = 200, description = "Gateway statistics", body = StatsResponse)
    )
)]
async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let session = state.connection.session();
    Json(StatsResponse {
        success: true,
        connected: session.state == ConnectionState::Connected,
        phone_number: session.phone_number,
        stats: state.contacts.stats(),
    })
}
