//! Pacer - inter-send delay and the optional per-minute send cap
//!
//! The delay between consecutive items is the primary throttle; the
//! governor-based cap is a second guard for callers that configure an
//! absolute sends-per-minute budget. Both waits abandon promptly when the
//! batch's cancellation token fires; already-issued sends are not rolled
//! back.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use tokio_util::sync::CancellationToken;
use tracing::debug;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Enforces inter-item delay and the optional send-rate cap.
pub struct Pacer {
    rate_limiter: Option<Arc<DirectRateLimiter>>,
}

impl Pacer {
    /// `rate_limit_per_minute = None` (or zero) disables the cap.
    pub fn new(rate_limit_per_minute: Option<u32>) -> Self {
        let rate_limiter = rate_limit_per_minute
            .and_then(NonZeroU32::new)
            .map(|rpm| Arc::new(RateLimiter::direct(Quota::per_minute(rpm))));

        Self { rate_limiter }
    }

    /// Suspend for approximately `interval` between two consecutive items.
    ///
    /// Returns early (without error) when the token is cancelled; the
    /// caller re-checks cancellation at the top of its loop.
    pub async fn wait_between(&self, interval: Duration, cancel: &CancellationToken) {
        if interval.is_zero() {
            return;
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = cancel.cancelled() => {
                debug!("Inter-send wait abandoned by cancellation");
            }
        }
    }

    /// Block until the per-minute cap admits another send.
    ///
    /// Polls rather than sleeping for the full refill window so that
    /// cancellation is observed promptly.
    pub async fn acquire_send_slot(&self, cancel: &CancellationToken) {
        let Some(ref limiter) = self.rate_limiter else {
            return;
        };

        let mut logged = false;
        loop {
            if cancel.is_cancelled() {
                return;
            }
            if limiter.check().is_ok() {
                return;
            }

            if !logged {
                debug!("Send rate cap reached, waiting for a slot");
                logged = true;
            }

            tokio::select! {
                _ = tokio::time::sleep(Duration::from_millis(100)) => {}
                _ = cancel.cancelled() => return,
            }
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        self.rate_limiter
            .as_ref()
            .map(|rl| rl.check().is_err())
            .unwrap_or(false)
    }
}
