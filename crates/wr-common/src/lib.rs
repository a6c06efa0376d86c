use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod logging;

// ============================================================================
// Message Payload
// ============================================================================

/// Reference to an attachment delivered alongside a text message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentRef {
    pub media_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

/// The message content forwarded to the transport.
///
/// The dispatch core never inspects the contents beyond non-emptiness;
/// interpretation is entirely the transport's concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<AttachmentRef>,
}

impl MessagePayload {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attachment: None,
        }
    }

    pub fn with_attachment(mut self, media_url: impl Into<String>, caption: Option<String>) -> Self {
        self.attachment = Some(AttachmentRef {
            media_url: media_url.into(),
            caption,
        });
        self
    }

    /// A payload is empty when it carries neither text nor an attachment.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.attachment.is_none()
    }
}

// ============================================================================
// Dispatch Results
// ============================================================================

/// Terminal status of one dispatch item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DispatchStatus {
    Succeeded,
    Failed,
}

/// Outcome of one dispatch item, tagged with the recipient exactly as the
/// caller supplied it so results can be zipped back to the input list.
/// Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DispatchResult {
    pub recipient: String,
    pub status: DispatchStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl DispatchResult {
    pub fn succeeded(recipient: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            status: DispatchStatus::Succeeded,
            reason: None,
            timestamp: Utc::now(),
        }
    }

    pub fn failed(recipient: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            status: DispatchStatus::Failed,
            reason: Some(reason.into()),
            timestamp: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == DispatchStatus::Succeeded
    }
}

/// Aggregate view of one batch, immutable once returned.
///
/// `details` preserves the exact order of the input recipient list, and
/// `succeeded + failed == total` always holds.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub success_rate_percent: f64,
    pub details: Vec<DispatchResult>,
}

// ============================================================================
// Session & Connection Types
// ============================================================================

/// State of the backend messaging session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionState {
    Disconnected,
    QrPending,
    PairingPending,
    Connected,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConnectionState::Disconnected => "DISCONNECTED",
            ConnectionState::QrPending => "QR_PENDING",
            ConnectionState::PairingPending => "PAIRING_PENDING",
            ConnectionState::Connected => "CONNECTED",
        };
        write!(f, "{}", s)
    }
}

/// Snapshot of the backend session as last reported by the bridge.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub state: ConnectionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pairing_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<DateTime<Utc>>,
}

impl SessionInfo {
    /// Human-readable status line shown by the status endpoint.
    pub fn status_message(&self) -> &'static str {
        match self.state {
            ConnectionState::Connected => "WhatsApp connected",
            ConnectionState::QrPending => "QR available - please scan",
            ConnectionState::PairingPending => "Pairing code pending",
            ConnectionState::Disconnected => "Initializing...",
        }
    }
}

impl Default for SessionInfo {
    fn default() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            phone_number: None,
            qr_code: None,
            pairing_code: None,
            last_activity: None,
        }
    }
}

// ============================================================================
// Contact Activity & Gateway Stats
// ============================================================================

/// Per-recipient activity counters recorded by the gateway after batches.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactActivity {
    pub phone_number: String,
    pub message_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_contacted: Option<DateTime<Utc>>,
    /// Result of the most recent directory probe, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<DateTime<Utc>>,
}

impl ContactActivity {
    pub fn new(phone_number: impl Into<String>) -> Self {
        Self {
            phone_number: phone_number.into(),
            message_count: 0,
            last_contacted: None,
            active: None,
            last_checked: None,
        }
    }
}

/// Aggregate counters across all batches since startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GatewayStats {
    pub total_batches: u64,
    pub total_messages: u64,
    pub total_failed: u64,
    pub contacts_tracked: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_dispatch_at: Option<DateTime<Utc>>,
}
