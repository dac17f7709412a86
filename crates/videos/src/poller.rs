//! Fixed-interval status polling for a single video job.
//!
//! [`poll_until_complete`] keeps fetching a job until it reaches a
//! terminal status or the [`CancellationToken`] is triggered. There is
//! no cap on attempts or elapsed time; callers that need one cancel the
//! token themselves.

use std::time::Duration;

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use vidgen_core::job_status::JobStatus;
use vidgen_core::types::JobId;

use crate::api::{VideoApiError, VideoJobs};
use crate::normalize::JobRecord;

/// Errors that end a polling loop early.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    /// The service reported a terminal failure (failed, error, canceled).
    /// Carries the full last payload for diagnostics.
    #[error("Video job {status}. Details:\n{payload:#}")]
    JobFailed { status: JobStatus, payload: Value },

    /// A status request failed. Not retried.
    #[error(transparent)]
    Api(#[from] VideoApiError),

    /// The cancellation token fired before the job finished.
    #[error("Polling cancelled for job {job_id}")]
    Cancelled { job_id: JobId },
}

/// Poll `GET /videos/{job_id}` until the job succeeds or fails.
///
/// Each fetched state is normalized and handed to `on_tick` before the
/// status is inspected, so the callback also sees the final state. On
/// success the final record is returned; a failure status becomes
/// [`PollError::JobFailed`].
///
/// The token is checked before every fetch and raced against both the
/// in-flight request and the wait between ticks.
pub async fn poll_until_complete<F>(
    api: &dyn VideoJobs,
    job_id: &str,
    interval: Duration,
    cancel: &CancellationToken,
    mut on_tick: F,
) -> Result<JobRecord, PollError>
where
    F: FnMut(&JobRecord),
{
    let cancelled = || {
        tracing::info!(job_id = %job_id, "Polling cancelled");
        Err(PollError::Cancelled {
            job_id: job_id.to_string(),
        })
    };

    let mut tick = 0u32;

    loop {
        if cancel.is_cancelled() {
            return cancelled();
        }
        tick += 1;

        let record = tokio::select! {
            _ = cancel.cancelled() => return cancelled(),
            result = api.retrieve(job_id) => result?,
        };

        tracing::debug!(
            job_id = %job_id,
            tick,
            status = %record.status,
            progress = record.progress,
            "Polled video job",
        );

        on_tick(&record);

        if record.status.is_success() {
            tracing::info!(job_id = %job_id, ticks = tick, "Video job completed");
            return Ok(record);
        }
        if record.status.is_failure() {
            tracing::warn!(job_id = %job_id, status = %record.status, "Video job failed");
            return Err(PollError::JobFailed {
                payload: record.raw_json(),
                status: record.status,
            });
        }

        // Wait before the next attempt, respecting cancellation.
        tokio::select! {
            _ = cancel.cancelled() => return cancelled(),
            _ = tokio::time::sleep(interval) => {}
        }
    }
}
