//! API request/response models
//!
//! Business endpoints keep the legacy contract: HTTP 200 with a `success`
//! flag, and an `error` string when the flag is false. Callers built
//! against the legacy gateway depend on that envelope.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use wr_common::{BatchSummary, ConnectionState, ContactActivity, DispatchResult, GatewayStats};

/// Request to dispatch one message to many recipients
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkDispatchRequest {
    /// Recipients in raw form, one per entry
    pub recipients: Vec<String>,
    /// Message text forwarded to every recipient
    pub message: String,
    /// Optional attachment URL
    pub media_url: Option<String>,
    /// Optional attachment caption
    pub caption: Option<String>,
    /// Delay between consecutive sends (default from config)
    pub interval_millis: Option<u64>,
}

/// Bulk dispatch outcome, flattening the batch summary into the envelope
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkDispatchResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub summary: Option<BatchSummary>,
}

impl BulkDispatchResponse {
    pub fn ok(summary: BatchSummary) -> Self {
        Self {
            success: true,
            error: None,
            summary: Some(summary),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            summary: None,
        }
    }
}

/// Request to send a single message
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub number: String,
    pub message: String,
    pub media_url: Option<String>,
    pub caption: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SendMessageResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: Some("Message sent successfully".to_string()),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
        }
    }
}

/// Request to detect which numbers are registered on the network
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DetectActiveRequest {
    pub numbers: Vec<String>,
    /// Delay between consecutive probes (default from config)
    pub interval_millis: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DetectActiveResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    pub active_percentage: f64,
    pub details: Vec<DispatchResult>,
}

impl DetectActiveResponse {
    /// Active numbers are the batch's succeeded items; everything else
    /// (unregistered or errored) counts as inactive, matching what legacy
    /// callers expect.
    pub fn from_summary(summary: BatchSummary) -> Self {
        Self {
            success: true,
            error: None,
            total: summary.total,
            active: summary.succeeded,
            inactive: summary.failed,
            active_percentage: summary.success_rate_percent,
            details: summary.details,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            total: 0,
            active: 0,
            inactive: 0,
            active_percentage: 0.0,
            details: Vec::new(),
        }
    }
}

/// Connection status snapshot
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub success: bool,
    pub connected: bool,
    pub state: ConnectionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub qr_available: bool,
    pub pairing_code_available: bool,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QrCodeResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr: Option<String>,
    pub message: String,
}

/// Request to start pairing for a phone number
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PairingRequest {
    pub phone_number: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PairingResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pairing_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewSessionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CancelResponse {
    pub success: bool,
    /// Whether a running batch was actually cancelled
    pub cancelled: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactsResponse {
    pub success: bool,
    pub total: usize,
    pub contacts: Vec<ContactActivity>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub success: bool,
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub stats: GatewayStats,
}

/// Simple health response
#[derive(Debug, Serialize, ToSchema)]
pub struct SimpleHealthResponse {
    /// Health status: UP
    pub status: String,
    /// Application version
    pub version: String,
}

/// Kubernetes probe response
#[derive(Debug, Serialize, ToSchema)]
pub struct ProbeResponse {
    /// Probe status: LIVE, READY, NOT_READY
    pub status: String,
}
