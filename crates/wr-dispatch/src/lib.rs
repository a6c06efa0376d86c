//! WaRelay Bulk Dispatch Engine
//!
//! The consolidated batch sender behind every bulk flow in the gateway:
//! - RecipientNormalizer: canonicalizes raw phone input
//! - Pacer: inter-send delay plus an optional per-minute send cap
//! - SendExecutor / ProbeExecutor: one item action against the transport
//! - BatchOrchestrator: drives the loop, accumulates per-item results
//! - summarize: folds per-item outcomes into a BatchSummary
//!
//! Items run strictly sequentially, one in flight at a time; the pacing
//! between sends exists to stay under the messaging backend's abuse
//! detection, so no parallelism is ever introduced here.

pub mod aggregator;
pub mod error;
pub mod executor;
pub mod normalizer;
pub mod orchestrator;
pub mod pacer;

pub use aggregator::summarize;
pub use error::DispatchError;
pub use executor::{ItemExecutor, ProbeExecutor, SendExecutor, NOT_REGISTERED_REASON};
pub use normalizer::{NormalizationError, NormalizedAddress, RecipientNormalizer};
pub use orchestrator::{BatchOrchestrator, OrchestratorConfig};
pub use pacer::Pacer;

pub type Result<T> = std::result::Result<T, DispatchError>;
