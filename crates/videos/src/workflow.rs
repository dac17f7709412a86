//! User-facing job operations that tie the client, poller, and session
//! together.
//!
//! Each operation holds the session's busy guard for its whole run, so
//! a session never has two requests in flight. Local validation happens
//! before the guard is taken and before any network call. Remote errors
//! propagate as-is; state cached before the error is left in place.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use vidgen_core::error::CoreError;
use vidgen_core::video_request::CreateVideoRequest;

use crate::api::{DeleteAck, VideoApiError, VideoJobs};
use crate::history::HistorySource;
use crate::normalize::JobRecord;
use crate::poller::{poll_until_complete, PollError};
use crate::session::Session;

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// Local validation failed, or the session is busy.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Api(#[from] VideoApiError),

    #[error(transparent)]
    Poll(#[from] PollError),
}

/// Where the rendered media for a finished job can be found.
#[derive(Debug, Clone, PartialEq)]
pub enum Media {
    /// The job payload carried a direct asset URL.
    Url(String),
    /// No URL was offered, so the default MP4 was downloaded.
    Bytes(Vec<u8>),
    /// Neither a URL nor a download was available.
    Unavailable,
}

/// Result of a completed [`generate`] run.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub record: JobRecord,
    pub media: Media,
}

/// Submit a render job and poll it to completion.
///
/// Every state along the way is cached and written to history
/// (`generate`, then `poll` per tick, then `complete`) and handed to
/// `on_progress`. A failed fallback download does not fail the run; the
/// media is reported as [`Media::Unavailable`].
pub async fn generate<P>(
    api: &dyn VideoJobs,
    session: &mut Session,
    request: &CreateVideoRequest,
    interval: Duration,
    cancel: &CancellationToken,
    mut on_progress: P,
) -> Result<GenerationOutcome, WorkflowError>
where
    P: FnMut(&JobRecord),
{
    request.validate()?;
    let mut session = session.begin()?;
    let prompt = request.prompt.trim().to_string();

    let created = api.create(request).await?;
    let job_id = created.id.clone().ok_or_else(|| VideoApiError::MissingId {
        payload: created.raw_json(),
    })?;
    session.record(&created, Some(&prompt), HistorySource::Generate);
    on_progress(&created);

    let record = poll_until_complete(api, &job_id, interval, cancel, |tick| {
        session.record(tick, Some(&prompt), HistorySource::Poll);
        on_progress(tick);
    })
    .await?;
    session.record(&record, Some(&prompt), HistorySource::Complete);

    let media = resolve_media(api, &record, &job_id).await;
    Ok(GenerationOutcome { record, media })
}

/// Resume polling a job that was submitted earlier.
///
/// The finished record replaces the job's listing row, or is inserted
/// at the top when the job is not listed yet.
pub async fn resume_polling<P>(
    api: &dyn VideoJobs,
    session: &mut Session,
    job_id: &str,
    interval: Duration,
    cancel: &CancellationToken,
    mut on_progress: P,
) -> Result<JobRecord, WorkflowError>
where
    P: FnMut(&JobRecord),
{
    validate_job_id(job_id)?;
    let mut session = session.begin()?;

    let record = poll_until_complete(api, job_id, interval, cancel, |tick| {
        session.record(tick, None, HistorySource::Poll);
        on_progress(tick);
    })
    .await?;

    session.record(&record, None, HistorySource::Complete);
    session.listing_mut().upsert_row(record.clone());
    Ok(record)
}

/// Fetch the latest state of one job.
pub async fn open_job(
    api: &dyn VideoJobs,
    session: &mut Session,
    job_id: &str,
) -> Result<JobRecord, WorkflowError> {
    validate_job_id(job_id)?;
    let mut session = session.begin()?;

    let record = api.retrieve(job_id).await?;
    session.record(&record, None, HistorySource::Open);
    session.listing_mut().upsert_row(record.clone());
    Ok(record)
}

/// Permanently delete a job and drop every trace of it from the session.
pub async fn delete_job(
    api: &dyn VideoJobs,
    session: &mut Session,
    job_id: &str,
) -> Result<DeleteAck, WorkflowError> {
    validate_job_id(job_id)?;
    let mut session = session.begin()?;

    let ack = api.delete(job_id).await?;
    session.remove_history(job_id);
    session.listing_mut().remove_row(job_id);
    session.forget_job(job_id);
    Ok(ack)
}

fn validate_job_id(job_id: &str) -> Result<(), CoreError> {
    if job_id.trim().is_empty() {
        return Err(CoreError::Validation("Job id must not be empty".to_string()));
    }
    Ok(())
}

async fn resolve_media(api: &dyn VideoJobs, record: &JobRecord, job_id: &str) -> Media {
    if let Some(url) = &record.asset_url {
        return Media::Url(url.clone());
    }
    match api.download_content(job_id, None).await {
        Ok(bytes) => Media::Bytes(bytes),
        Err(e) => {
            tracing::warn!(job_id = %job_id, error = %e, "Media download failed");
            Media::Unavailable
        }
    }
}
