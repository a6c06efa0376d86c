//! BridgeTransport - HTTP client for the WhatsApp bridge sidecar
//!
//! The bridge process owns the actual WhatsApp session (protocol,
//! encryption, QR/pairing generation). This client exposes it behind the
//! transport traits with:
//! - Request/connect timeouts
//! - Optional HMAC-SHA256 request signing (X-WARELAY-SIGNATURE,
//!   X-WARELAY-TIMESTAMP)
//! - Response code classification

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::{debug, info, warn};

use wr_common::MessagePayload;

use crate::{BridgeStatus, MessageTransport, NumberDirectory, Result, SessionControl, TransportError};

/// Signature header attached to signed bridge requests
pub const SIGNATURE_HEADER: &str = "X-WARELAY-SIGNATURE";
/// Timestamp header attached to signed bridge requests
pub const TIMESTAMP_HEADER: &str = "X-WARELAY-TIMESTAMP";

type HmacSha256 = Hmac<Sha256>;

/// Generate the HMAC-SHA256 signature for a request body.
///
/// Signature payload = timestamp + body, hex-encoded.
fn sign_request(body: &str, api_secret: &str) -> (String, String) {
    let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string();
    let signature_payload = format!("{}{}", timestamp, body);

    let mut mac = HmacSha256::new_from_slice(api_secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(signature_payload.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    (signature, timestamp)
}

/// Configuration for the bridge HTTP client
#[derive(Debug, Clone)]
pub struct BridgeClientConfig {
    /// Base URL of the bridge API
    pub base_url: String,
    /// Shared secret for request signing (None disables signing)
    pub api_secret: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
    /// Connection timeout
    pub connect_timeout: Duration,
}

impl Default for BridgeClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3001".to_string(),
            api_secret: None,
            timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendRequest<'a> {
    number: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    media_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    caption: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupRequest<'a> {
    number: &'a str,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    exists: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PairingRequest<'a> {
    phone_number: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PairingResponse {
    pairing_code: String,
}

/// HTTP transport backed by the bridge sidecar.
///
/// Readiness is pushed in by the ConnectionManager after each status poll;
/// `is_ready()` never performs I/O.
pub struct BridgeTransport {
    client: Client,
    config: BridgeClientConfig,
    ready: AtomicBool,
}

impl BridgeTransport {
    pub fn new(config: BridgeClientConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(10)
            .build()
            .expect("Failed to build HTTP client");

        info!(
            base_url = %config.base_url,
            timeout_secs = config.timeout.as_secs(),
            signing = config.api_secret.is_some(),
            "BridgeTransport initialized"
        );

        Self {
            client,
            config,
            ready: AtomicBool::new(false),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// POST a JSON body, attaching signature headers when a secret is set.
    async fn post_json<T: Serialize>(&self, path: &str, body: &T) -> Result<reqwest::Response> {
        let body_json = serde_json::to_string(body)
            .map_err(|e| TransportError::Malformed(e.to_string()))?;

        let mut request = self
            .client
            .post(self.endpoint(path))
            .header("Content-Type", "application/json")
            .header("Accept", "application/json");

        if let Some(ref secret) = self.config.api_secret {
            let (signature, timestamp) = sign_request(&body_json, secret);
            request = request
                .header(SIGNATURE_HEADER, signature)
                .header(TIMESTAMP_HEADER, timestamp);
        }

        request.body(body_json).send().await.map_err(map_request_error)
    }

    async fn check_status_code(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .text()
            .await
            .ok()
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());

        Err(TransportError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

fn map_request_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_connect() {
        TransportError::Request(format!("connection error: {}", e))
    } else {
        TransportError::Request(e.to_string())
    }
}

#[async_trait]
impl MessageTransport for BridgeTransport {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn send(&self, address: &str, payload: &MessagePayload) -> Result<()> {
        let request = SendRequest {
            number: address,
            text: &payload.text,
            media_url: payload.attachment.as_ref().map(|a| a.media_url.as_str()),
            caption: payload
                .attachment
                .as_ref()
                .and_then(|a| a.caption.as_deref()),
        };

        debug!(address = %address, has_attachment = payload.attachment.is_some(), "Sending message via bridge");

        let response = self.post_json("/send", &request).await?;
        Self::check_status_code(response).await?;

        debug!(address = %address, "Message delivered");
        Ok(())
    }
}

#[async_trait]
impl NumberDirectory for BridgeTransport {
    async fn lookup(&self, address: &str) -> Result<bool> {
        let response = self.post_json("/exists", &LookupRequest { number: address }).await?;
        let response = Self::check_status_code(response).await?;

        let body: LookupResponse = response
            .json()
            .await
            .map_err(|e| TransportError::Malformed(e.to_string()))?;

        Ok(body.exists)
    }
}

#[async_trait]
impl SessionControl for BridgeTransport {
    async fn fetch_status(&self) -> Result<BridgeStatus> {
        let response = self
            .client
            .get(self.endpoint("/status"))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(map_request_error)?;
        let response = Self::check_status_code(response).await?;

        response
            .json()
            .await
            .map_err(|e| TransportError::Malformed(e.to_string()))
    }

    async fn request_pairing(&self, phone_number: &str) -> Result<String> {
        let response = self
            .post_json("/pair", &PairingRequest { phone_number })
            .await?;
        let response = Self::check_status_code(response).await?;

        let body: PairingResponse = response
            .json()
            .await
            .map_err(|e| TransportError::Malformed(e.to_string()))?;

        info!(phone_number = %phone_number, "Pairing code issued by bridge");
        Ok(body.pairing_code)
    }

    async fn reset_session(&self) -> Result<()> {
        let response = self
            .client
            .post(self.endpoint("/reset"))
            .send()
            .await
            .map_err(map_request_error)?;
        Self::check_status_code(response).await?;

        warn!("Bridge session reset requested");
        Ok(())
    }

    fn set_ready(&self, ready: bool) {
        let was_ready = self.ready.swap(ready, Ordering::SeqCst);
        if was_ready != ready {
            info!(ready = ready, "Transport readiness changed");
        }
    }
}
