//! ConnectionManager - explicit session state machine
//!
//! Replaces the ambient global-socket pattern: the manager owns the session
//! snapshot, polls the bridge for status, and pushes readiness into the
//! transport. States: Disconnected -> QrPending | PairingPending ->
//! Connected, driven entirely by bridge status documents.
//!
//! When the bridge is unreachable the poll delay doubles up to a cap and
//! resets on the next successful poll.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use wr_common::{ConnectionState, SessionInfo};

use crate::{BridgeStatus, SessionControl};

/// Configuration for the connection manager poll loop
#[derive(Debug, Clone)]
pub struct ConnectionManagerConfig {
    /// Interval between status polls while the bridge is healthy
    pub poll_interval: Duration,
    /// Upper bound for the backoff delay while the bridge is unreachable
    pub max_backoff: Duration,
}

impl Default for ConnectionManagerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(3),
            max_backoff: Duration::from_secs(60),
        }
    }
}

/// Double the poll delay after a failed poll, bounded by `max`.
fn grow_backoff(current: Duration, max: Duration) -> Duration {
    (current * 2).min(max)
}

/// Owns the backend session snapshot and keeps it in sync with the bridge.
pub struct ConnectionManager {
    control: Arc<dyn SessionControl>,
    config: ConnectionManagerConfig,
    session: RwLock<SessionInfo>,
    shutdown: CancellationToken,
}

impl ConnectionManager {
    pub fn new(control: Arc<dyn SessionControl>, config: ConnectionManagerConfig) -> Self {
        Self {
            control,
            config,
            session: RwLock::new(SessionInfo::default()),
            shutdown: CancellationToken::new(),
        }
    }

    /// Current session snapshot.
    pub fn session(&self) -> SessionInfo {
        self.session.read().clone()
    }

    pub fn state(&self) -> ConnectionState {
        self.session.read().state
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Record a locally initiated pairing attempt.
    pub fn begin_pairing(&self, pairing_code: String, phone_number: String) {
        let mut session = self.session.write();
        session.state = ConnectionState::PairingPending;
        session.pairing_code = Some(pairing_code);
        session.phone_number = Some(phone_number);
        session.qr_code = None;
        info!("Session entering pairing mode");
    }

    /// Ask the backend for a pairing code and enter pairing mode.
    pub async fn request_pairing(&self, phone_number: &str) -> crate::Result<String> {
        let code = self.control.request_pairing(phone_number).await?;
        self.begin_pairing(code.clone(), phone_number.to_string());
        Ok(code)
    }

    /// Drop the backend session and wipe the local snapshot.
    pub async fn reset(&self) -> crate::Result<()> {
        self.control.reset_session().await?;
        self.clear_session();
        Ok(())
    }

    /// Wipe the session snapshot after a reset.
    pub fn clear_session(&self) {
        *self.session.write() = SessionInfo::default();
        self.control.set_ready(false);
        info!("Session cleared");
    }

    /// Fold one bridge status document into the state machine.
    pub fn apply_status(&self, status: BridgeStatus) {
        let mut session = self.session.write();
        let previous = session.state;

        let next = if status.connected {
            ConnectionState::Connected
        } else if status.qr.is_some() {
            ConnectionState::QrPending
        } else if status.pairing_code.is_some() {
            ConnectionState::PairingPending
        } else if previous == ConnectionState::PairingPending && session.pairing_code.is_some() {
            // The bridge drops the code from status once consumed; stay
            // pending until it connects or the session resets.
            ConnectionState::PairingPending
        } else {
            ConnectionState::Disconnected
        };

        session.qr_code = status.qr;
        session.pairing_code = match next {
            ConnectionState::Connected => None,
            _ => status.pairing_code.or_else(|| session.pairing_code.take()),
        };
        session.phone_number = status.phone_number.or_else(|| session.phone_number.take());
        if next == ConnectionState::Connected {
            session.last_activity = Some(Utc::now());
        }
        session.state = next;
        drop(session);

        if previous != next {
            info!(from = %previous, to = %next, "Connection state changed");
        }

        self.control.set_ready(next == ConnectionState::Connected);
    }

    /// Mark the bridge as unreachable (failed poll).
    fn mark_unreachable(&self) {
        let mut session = self.session.write();
        let previous = session.state;
        session.state = ConnectionState::Disconnected;
        // Stale codes are useless once the bridge is gone
        session.qr_code = None;
        session.pairing_code = None;
        drop(session);

        if previous != ConnectionState::Disconnected {
            warn!(from = %previous, "Bridge unreachable, session marked disconnected");
        }

        self.control.set_ready(false);
    }

    /// Spawn the poll loop on the runtime.
    pub fn spawn(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move { manager.run().await })
    }

    /// Poll loop: fetch status, fold it in, back off while unreachable.
    pub async fn run(&self) {
        info!(
            poll_interval_secs = self.config.poll_interval.as_secs(),
            "Connection manager started"
        );

        let mut delay = self.config.poll_interval;

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }

            match self.control.fetch_status().await {
                Ok(status) => {
                    debug!(connected = status.connected, "Bridge status poll");
                    self.apply_status(status);
                    delay = self.config.poll_interval;
                }
                Err(e) => {
                    delay = grow_backoff(delay, self.config.max_backoff);
                    warn!(
                        error = %e,
                        retry_in_secs = delay.as_secs(),
                        "Bridge status poll failed"
                    );
                    self.mark_unreachable();
                }
            }
        }

        info!("Connection manager stopped");
    }

    /// Stop the poll loop.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}
