//! Canonical job status, status aliases, and list status filters.
//!
//! The video service is not consistent about the status strings it
//! reports, so every status is lower-cased and folded into [`JobStatus`]
//! before the rest of the crate looks at it.

use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Status string constants
// ---------------------------------------------------------------------------

/// Job is waiting for a render slot.
pub const STATUS_QUEUED: &str = "queued";
/// Job is rendering.
pub const STATUS_IN_PROGRESS: &str = "in_progress";
/// Job finished and media is available.
pub const STATUS_SUCCEEDED: &str = "succeeded";
/// Job finished with an error.
pub const STATUS_FAILED: &str = "failed";
/// Job was cancelled before it finished.
pub const STATUS_CANCELED: &str = "canceled";

/// Status strings that mean the job finished successfully.
pub const SUCCESS_ALIASES: &[&str] = &["succeeded", "completed", "complete"];

/// Status strings that mean the job finished without usable media.
pub const FAILURE_ALIASES: &[&str] = &["failed", "error", "canceled", "cancelled"];

// ---------------------------------------------------------------------------
// JobStatus
// ---------------------------------------------------------------------------

/// Lifecycle state of a remote video job.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Queued,
    InProgress,
    Succeeded,
    Failed,
    Canceled,
    /// Any status string the client does not recognise, lower-cased.
    Unknown(String),
}

impl JobStatus {
    /// Parse a raw status string. Never fails: unrecognised values are
    /// kept as [`JobStatus::Unknown`].
    pub fn parse(raw: &str) -> Self {
        let lowered = raw.trim().to_lowercase();
        match lowered.as_str() {
            STATUS_QUEUED => Self::Queued,
            STATUS_IN_PROGRESS => Self::InProgress,
            "succeeded" | "completed" | "complete" => Self::Succeeded,
            "failed" | "error" => Self::Failed,
            "canceled" | "cancelled" => Self::Canceled,
            _ => Self::Unknown(lowered),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Queued => STATUS_QUEUED,
            Self::InProgress => STATUS_IN_PROGRESS,
            Self::Succeeded => STATUS_SUCCEEDED,
            Self::Failed => STATUS_FAILED,
            Self::Canceled => STATUS_CANCELED,
            Self::Unknown(raw) => raw,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    /// Failed and cancelled jobs both end without media.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::Canceled)
    }

    pub fn is_terminal(&self) -> bool {
        self.is_success() || self.is_failure()
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Queued | Self::InProgress)
    }
}

impl Default for JobStatus {
    fn default() -> Self {
        Self::Unknown(String::new())
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Status filter
// ---------------------------------------------------------------------------

/// Server-side status filter for job listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    InProgress,
    Completed,
    Failed,
}

/// Display labels for every filter option, in menu order.
pub const STATUS_FILTER_LABELS: &[&str] = &["All", "In-progress", "Completed", "Failed"];

impl StatusFilter {
    /// Value sent as the `status` query parameter. `None` means the
    /// parameter is omitted.
    pub fn api_value(&self) -> Option<&'static str> {
        match self {
            Self::All => None,
            Self::InProgress => Some("in_progress"),
            Self::Completed => Some("completed"),
            Self::Failed => Some("failed"),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::All => "All",
            Self::InProgress => "In-progress",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
        }
    }
}

impl FromStr for StatusFilter {
    type Err = CoreError;

    /// Accepts either the display label or the API value, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" | "" => Ok(Self::All),
            "in-progress" | "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(CoreError::Validation(format!(
                "Unknown status filter: '{other}'. Valid filters: {}",
                STATUS_FILTER_LABELS.join(", ")
            ))),
        }
    }
}
