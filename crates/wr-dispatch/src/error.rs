use thiserror::Error;

/// Batch-fatal errors.
///
/// Only these two abort a batch, and both fire before any send is
/// attempted. Per-item failures (transport errors, malformed recipients)
/// are recorded in the item's DispatchResult and never escalate.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("validation error: {0}")]
    Validation(&'static str),

    #[error("transport not connected")]
    TransportNotReady,
}
