//! WaRelay Transport Layer
//!
//! This crate provides the capability seam between the dispatch engine and
//! the actual messaging backend:
//! - MessageTransport / NumberDirectory / SessionControl: the traits the
//!   rest of the system programs against
//! - BridgeTransport: production implementation talking to the bridge
//!   sidecar that hosts the WhatsApp client
//! - ConnectionManager: explicit session state machine replacing ambient
//!   global connection state

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use wr_common::MessagePayload;

pub mod bridge;
pub mod connection;

pub use bridge::{BridgeClientConfig, BridgeTransport};
pub use connection::{ConnectionManager, ConnectionManagerConfig};

pub type Result<T> = std::result::Result<T, TransportError>;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("bridge rejected request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("bridge request failed: {0}")]
    Request(String),

    #[error("bridge request timed out")]
    Timeout,

    #[error("unexpected bridge response: {0}")]
    Malformed(String),
}

/// Status document returned by the bridge sidecar.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BridgeStatus {
    pub connected: bool,
    pub qr: Option<String>,
    pub pairing_code: Option<String>,
    pub phone_number: Option<String>,
}

/// Capability to deliver messages to the backend.
///
/// The dispatch core consumes this trait and never constructs or manages
/// the implementation's lifecycle.
#[async_trait]
pub trait MessageTransport: Send + Sync {
    /// True only when the backend session is authenticated and able to send.
    fn is_ready(&self) -> bool;

    /// Deliver one message. A failure applies to this recipient only.
    async fn send(&self, address: &str, payload: &MessagePayload) -> Result<()>;
}

/// Capability to check whether an address is registered on the network.
#[async_trait]
pub trait NumberDirectory: Send + Sync {
    async fn lookup(&self, address: &str) -> Result<bool>;
}

/// Session lifecycle operations against the backend client.
#[async_trait]
pub trait SessionControl: Send + Sync {
    /// Fetch the current session status from the backend.
    async fn fetch_status(&self) -> Result<BridgeStatus>;

    /// Ask the backend for a pairing code for the given phone number.
    async fn request_pairing(&self, phone_number: &str) -> Result<String>;

    /// Drop the current session and start a fresh login.
    async fn reset_session(&self) -> Result<()>;

    /// Readiness feedback from the connection manager after a status poll.
    fn set_ready(&self, ready: bool);
}
