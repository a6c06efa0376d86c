//! WaRelay Gateway
//!
//! The HTTP-facing layer of the relay:
//! - DispatchService: serializes batches onto the single shared session
//!   and records activity after each one
//! - ContactStore: in-memory per-recipient activity counters
//! - api: axum router, request/response models, OpenAPI documentation

pub mod api;
pub mod contacts;
pub mod service;

pub use api::{create_router, AppState};
pub use contacts::ContactStore;
pub use service::{DispatchService, DispatchServiceConfig};
