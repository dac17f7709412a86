//! Integration tests for the session-level job workflows: generate,
//! resume polling, open, delete, and the paged listing.

mod common;

use std::time::Duration;

use assert_matches::assert_matches;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use common::{job, ScriptedJobs};
use vidgen_core::error::CoreError;
use vidgen_core::job_status::StatusFilter;
use vidgen_core::video_request::CreateVideoRequest;
use vidgen_videos::api::{SortOrder, VideoApiError};
use vidgen_videos::history::HistorySource;
use vidgen_videos::listing::{load_more, refresh};
use vidgen_videos::poller::PollError;
use vidgen_videos::session::Session;
use vidgen_videos::workflow::{
    delete_job, generate, open_job, resume_polling, Media, WorkflowError,
};

const INTERVAL: Duration = Duration::from_millis(1);

fn request(prompt: &str) -> CreateVideoRequest {
    let mut request = CreateVideoRequest::new(prompt);
    request.seconds = 8;
    request
}

// ---------------------------------------------------------------------------
// Test: generate
// ---------------------------------------------------------------------------

/// A full run caches the final state, records history, and returns the
/// downloaded media when no URL is offered.
#[tokio::test]
async fn generate_runs_to_completion() {
    let api = ScriptedJobs::new()
        .on_create(job("video_1", "queued", 0))
        .on_retrieve(job("video_1", "in_progress", 50))
        .on_retrieve(job("video_1", "completed", 100))
        .on_download(Ok(b"mp4-bytes".to_vec()));
    let mut session = Session::new();
    let cancel = CancellationToken::new();
    let mut progress = Vec::new();

    let outcome = generate(
        &api,
        &mut session,
        &request("  a fox in the snow  "),
        INTERVAL,
        &cancel,
        |r| progress.push(r.progress),
    )
    .await
    .expect("generate should succeed");

    assert_eq!(progress, vec![0, 50, 100]);
    assert_eq!(outcome.media, Media::Bytes(b"mp4-bytes".to_vec()));
    assert!(outcome.record.status.is_success());

    assert!(!session.is_busy());
    assert_eq!(session.cached_job("video_1").unwrap().progress, 100);
    let history = session.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].source, HistorySource::Complete);
    assert_eq!(history[0].prompt, "a fox in the snow");
}

/// An asset URL in the final payload is used instead of downloading.
#[tokio::test]
async fn generate_prefers_asset_url() {
    let mut done = job("video_2", "completed", 100);
    done["assets"] = json!([{"url": "https://cdn.example.com/video_2.mp4"}]);
    let api = ScriptedJobs::new()
        .on_create(job("video_2", "queued", 0))
        .on_retrieve(done);
    let mut session = Session::new();

    let outcome = generate(
        &api,
        &mut session,
        &request("a lighthouse at dusk"),
        INTERVAL,
        &CancellationToken::new(),
        |_| {},
    )
    .await
    .expect("generate should succeed");

    assert_eq!(
        outcome.media,
        Media::Url("https://cdn.example.com/video_2.mp4".to_string())
    );
}

/// A failed fallback download still yields the finished record.
#[tokio::test]
async fn generate_tolerates_download_failure() {
    let api = ScriptedJobs::new()
        .on_create(job("video_3", "queued", 0))
        .on_retrieve(job("video_3", "completed", 100))
        .on_download(Err(VideoApiError::ApiError {
            status: 404,
            body: "not ready".to_string(),
        }));
    let mut session = Session::new();

    let outcome = generate(
        &api,
        &mut session,
        &request("rain on a tin roof"),
        INTERVAL,
        &CancellationToken::new(),
        |_| {},
    )
    .await
    .expect("generate should succeed");

    assert_eq!(outcome.media, Media::Unavailable);
    assert_eq!(outcome.record.id(), Some("video_3"));
}

/// Invalid input is rejected before any request and leaves no state.
#[tokio::test]
async fn generate_validates_before_network() {
    let api = ScriptedJobs::new().on_create(job("video_4", "queued", 0));
    let mut session = Session::new();

    let mut bad_duration = request("a prompt");
    bad_duration.seconds = 30;

    for bad in [request("   "), bad_duration] {
        let result = generate(
            &api,
            &mut session,
            &bad,
            INTERVAL,
            &CancellationToken::new(),
            |_| {},
        )
        .await;
        assert_matches!(result, Err(WorkflowError::Core(CoreError::Validation(_))));
    }

    assert_eq!(api.create_calls(), 0);
    assert_eq!(session.cached_job_count(), 0);
    assert!(!session.is_busy());
}

/// A job that fails mid-render keeps its last state in the cache and
/// releases the busy flag.
#[tokio::test]
async fn generate_failure_keeps_partial_state() {
    let api = ScriptedJobs::new()
        .on_create(job("video_5", "queued", 0))
        .on_retrieve(job("video_5", "in_progress", 30))
        .on_retrieve(job("video_5", "failed", 30));
    let mut session = Session::new();

    let result = generate(
        &api,
        &mut session,
        &request("a storm over the sea"),
        INTERVAL,
        &CancellationToken::new(),
        |_| {},
    )
    .await;

    assert_matches!(result, Err(WorkflowError::Poll(PollError::JobFailed { .. })));
    assert!(!session.is_busy());
    let cached = session.cached_job("video_5").unwrap();
    assert!(cached.status.is_failure());
    assert_eq!(session.history()[0].source, HistorySource::Poll);
}

/// A create response without any id is an error.
#[tokio::test]
async fn generate_requires_job_id() {
    let api = ScriptedJobs::new().on_create(json!({"status": "queued"}));
    let mut session = Session::new();

    let result = generate(
        &api,
        &mut session,
        &request("a quiet forest"),
        INTERVAL,
        &CancellationToken::new(),
        |_| {},
    )
    .await;

    assert_matches!(result, Err(WorkflowError::Api(VideoApiError::MissingId { .. })));
    assert_eq!(api.retrieve_calls(), 0);
}

// ---------------------------------------------------------------------------
// Test: resume / open / delete
// ---------------------------------------------------------------------------

/// Resumed jobs land at the top of the listing once finished.
#[tokio::test]
async fn resume_polling_upserts_listing_row() {
    let api = ScriptedJobs::new()
        .on_retrieve(job("video_6", "in_progress", 70))
        .on_retrieve(job("video_6", "completed", 100));
    let mut session = Session::new();

    let record = resume_polling(
        &api,
        &mut session,
        "video_6",
        INTERVAL,
        &CancellationToken::new(),
        |_| {},
    )
    .await
    .expect("resume should succeed");

    assert_eq!(record.progress, 100);
    assert_eq!(session.listing().rows()[0].id(), Some("video_6"));
    assert_eq!(session.history()[0].source, HistorySource::Complete);
}

#[tokio::test]
async fn open_and_delete_job() {
    let api = ScriptedJobs::new().on_retrieve(job("video_7", "completed", 100));
    let mut session = Session::new();

    let record = open_job(&api, &mut session, "video_7").await.unwrap();
    assert_eq!(record.id(), Some("video_7"));
    assert_eq!(session.history()[0].source, HistorySource::Open);
    assert!(session.listing().find_row("video_7").is_some());

    let ack = delete_job(&api, &mut session, "video_7").await.unwrap();
    assert!(ack.deleted);
    assert_eq!(api.deleted(), vec!["video_7".to_string()]);
    assert!(session.history().is_empty());
    assert!(session.listing().find_row("video_7").is_none());
    assert!(session.cached_job("video_7").is_none());
}

#[tokio::test]
async fn empty_job_id_is_rejected() {
    let api = ScriptedJobs::new();
    let mut session = Session::new();

    assert_matches!(
        open_job(&api, &mut session, " ").await,
        Err(WorkflowError::Core(CoreError::Validation(_)))
    );
    assert_matches!(
        delete_job(&api, &mut session, "").await,
        Err(WorkflowError::Core(CoreError::Validation(_)))
    );
    assert!(api.deleted().is_empty());
}

// ---------------------------------------------------------------------------
// Test: listing
// ---------------------------------------------------------------------------

/// Pages are fetched newest first, the cursor follows the last id, and
/// loading stops once the service reports no more pages.
#[tokio::test]
async fn listing_pages_through_cursor() {
    let api = ScriptedJobs::new()
        .on_list(json!({
            "data": [job("video_9", "completed", 100), job("video_8", "in_progress", 10)],
            "has_more": true
        }))
        .on_list(json!({
            "data": [job("video_7", "failed", 0)],
            "has_more": false
        }));
    let mut session = Session::new();
    session.listing_mut().set_filter(StatusFilter::Completed);

    assert_eq!(refresh(&api, &mut session).await.unwrap(), 2);
    assert_eq!(session.listing().cursor(), Some("video_8"));
    assert_eq!(load_more(&api, &mut session).await.unwrap(), 1);
    assert_eq!(load_more(&api, &mut session).await.unwrap(), 0);

    let queries = api.queries();
    assert_eq!(queries.len(), 2);
    assert_eq!(queries[0].order, SortOrder::Desc);
    assert_eq!(queries[0].after, None);
    assert_eq!(queries[0].status, StatusFilter::Completed);
    assert_eq!(queries[1].after.as_deref(), Some("video_8"));

    assert_eq!(session.listing().rows().len(), 3);
    assert_eq!(session.cached_job_count(), 3);
    assert!(session
        .history()
        .iter()
        .all(|entry| entry.source == HistorySource::Jobs));
    assert!(!session.is_busy());
}

/// A listing error leaves earlier rows intact.
#[tokio::test]
async fn listing_error_keeps_loaded_rows() {
    let api = ScriptedJobs::new().on_list(json!({
        "data": [job("video_1", "completed", 100)],
        "has_more": true
    }));
    let mut session = Session::new();

    refresh(&api, &mut session).await.unwrap();
    let result = load_more(&api, &mut session).await;

    assert_matches!(result, Err(WorkflowError::Api(VideoApiError::ApiError { .. })));
    assert_eq!(session.listing().rows().len(), 1);
    assert!(!session.is_busy());
}
