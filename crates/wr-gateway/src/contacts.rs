//! ContactStore - in-memory per-recipient activity tracking
//!
//! The gateway records aggregate counters after each batch: message counts
//! and last-contacted timestamps per recipient, probe outcomes from number
//! detection, and totals across all batches. Persistence beyond process
//! lifetime is deliberately out of scope for the dispatch core.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;

use wr_common::{BatchSummary, ContactActivity, GatewayStats};
use wr_dispatch::NOT_REGISTERED_REASON;

/// In-memory contact activity store.
pub struct ContactStore {
    contacts: DashMap<String, ContactActivity>,
    total_batches: AtomicU64,
    total_messages: AtomicU64,
    total_failed: AtomicU64,
    last_dispatch_at: RwLock<Option<DateTime<Utc>>>,
}

impl ContactStore {
    pub fn new() -> Self {
        Self {
            contacts: DashMap::new(),
            total_batches: AtomicU64::new(0),
            total_messages: AtomicU64::new(0),
            total_failed: AtomicU64::new(0),
            last_dispatch_at: RwLock::new(None),
        }
    }

    /// Fold a completed send batch into the counters.
    pub fn record_batch(&self, summary: &BatchSummary) {
        self.total_batches.fetch_add(1, Ordering::SeqCst);
        self.total_messages
            .fetch_add(summary.succeeded as u64, Ordering::SeqCst);
        self.total_failed
            .fetch_add(summary.failed as u64, Ordering::SeqCst);
        *self.last_dispatch_at.write() = Some(Utc::now());

        for detail in summary.details.iter().filter(|d| d.is_success()) {
            let mut entry = self
                .contacts
                .entry(detail.recipient.clone())
                .or_insert_with(|| ContactActivity::new(detail.recipient.clone()));
            entry.message_count += 1;
            entry.last_contacted = Some(detail.timestamp);
        }
    }

    /// Fold a detection batch into the per-contact probe fields.
    ///
    /// Directory errors leave the contact's probe status untouched; only a
    /// definite yes/no answer is recorded.
    pub fn record_probes(&self, summary: &BatchSummary) {
        for detail in &summary.details {
            let active = if detail.is_success() {
                Some(true)
            } else if detail.reason.as_deref() == Some(NOT_REGISTERED_REASON) {
                Some(false)
            } else {
                None
            };

            let Some(active) = active else { continue };

            let mut entry = self
                .contacts
                .entry(detail.recipient.clone())
                .or_insert_with(|| ContactActivity::new(detail.recipient.clone()));
            entry.active = Some(active);
            entry.last_checked = Some(detail.timestamp);
        }
    }

    pub fn get(&self, phone_number: &str) -> Option<ContactActivity> {
        self.contacts.get(phone_number).map(|e| e.clone())
    }

    /// All tracked contacts, most recently contacted first.
    pub fn snapshot(&self) -> Vec<ContactActivity> {
        let mut contacts: Vec<ContactActivity> =
            self.contacts.iter().map(|e| e.value().clone()).collect();
        contacts.sort_by(|a, b| b.last_contacted.cmp(&a.last_contacted));
        contacts
    }

    pub fn stats(&self) -> GatewayStats {
        GatewayStats {
            total_batches: self.total_batches.load(Ordering::SeqCst),
            total_messages: self.total_messages.load(Ordering::SeqCst),
            total_failed: self.total_failed.load(Ordering::SeqCst),
            contacts_tracked: self.contacts.len() as u64,
            last_dispatch_at: *self.last_dispatch_at.read(),
        }
    }
}

impl Default for ContactStore {
    fn default() -> Self {
        Self::new()
    }
}
