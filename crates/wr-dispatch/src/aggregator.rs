//! Result aggregation - per-item outcomes into a BatchSummary

use wr_common::{BatchSummary, DispatchResult};

/// Fold per-item outcomes into the summary consumed by callers.
///
/// Counts are derived by scanning the detail list, so
/// `succeeded + failed == total` holds by construction. The success rate
/// is defined as 0 for an empty detail list.
pub fn summarize(details: Vec<DispatchResult>) -> BatchSummary {
    let total = details.len();
    let succeeded = details.iter().filter(|d| d.is_success()).count();
    let failed = total - succeeded;

    let success_rate_percent = if total == 0 {
        0.0
    } else {
        round_two_places(succeeded as f64 / total as f64 * 100.0)
    };

    BatchSummary {
        total,
        succeeded,
        failed,
        success_rate_percent,
        details,
    }
}

fn round_two_places(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
