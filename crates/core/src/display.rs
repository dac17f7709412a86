//! Short human-readable labels for job status, progress, and timestamps.

use chrono::Local;

use crate::types::{timestamp_from_unix, UnixSeconds};

/// Progress at or above this percentage is shown as finalizing.
pub const FINALIZING_THRESHOLD: u8 = 99;

/// Badge text for a raw status string, as reported by the service.
pub fn status_badge(status: Option<&str>) -> String {
    let Some(raw) = status.filter(|s| !s.is_empty()) else {
        return "Unknown".to_string();
    };
    let label = match raw.to_lowercase().as_str() {
        "queued" => "Queued",
        "in_progress" => "In progress",
        "processing" => "Processing",
        "pending" => "Pending",
        "succeeded" => "Succeeded",
        "completed" | "complete" => "Completed",
        "failed" => "Failed",
        "canceled" | "cancelled" => "Canceled",
        _ => return raw.to_string(),
    };
    label.to_string()
}

/// Progress bar caption for a percentage in `[0, 100]`.
pub fn progress_label(percent: u8) -> String {
    if percent >= FINALIZING_THRESHOLD {
        "Finalizing".to_string()
    } else {
        format!("Rendering {percent}%")
    }
}

/// Format Unix seconds as local `%Y-%m-%d %H:%M:%S`, or `-` when absent.
pub fn format_ts(ts: Option<UnixSeconds>) -> String {
    ts.and_then(timestamp_from_unix)
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}
