//! Per-user session state: job cache, recent history, listing state,
//! and the busy flag.
//!
//! One [`Session`] exists per user session and is passed explicitly to
//! every operation that reads or updates it. Nothing here is global and
//! nothing is persisted; dropping the session drops its state.

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

use vidgen_core::error::CoreError;
use vidgen_core::types::JobId;

use crate::history::{HistoryEntry, HistorySource, HISTORY_LIMIT};
use crate::listing::JobListing;
use crate::normalize::JobRecord;

#[derive(Debug, Default)]
pub struct Session {
    jobs: HashMap<JobId, JobRecord>,
    history: Vec<HistoryEntry>,
    listing: JobListing,
    busy: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- job cache ----

    /// Upsert the latest state of a job. Records without an id are
    /// skipped. The cache is never evicted within a session.
    pub fn cache_job(&mut self, record: &JobRecord) {
        let Some(id) = record.id() else {
            return;
        };
        self.jobs.insert(id.to_string(), record.clone());
    }

    pub fn cached_job(&self, id: &str) -> Option<&JobRecord> {
        self.jobs.get(id)
    }

    /// Like [`cached_job`](Self::cached_job) but reports a miss as
    /// [`CoreError::NotFound`].
    pub fn require_cached_job(&self, id: &str) -> Result<&JobRecord, CoreError> {
        self.cached_job(id).ok_or_else(|| CoreError::NotFound {
            entity: "video job",
            id: id.to_string(),
        })
    }

    pub fn cached_job_count(&self) -> usize {
        self.jobs.len()
    }

    pub fn forget_job(&mut self, id: &str) {
        self.jobs.remove(id);
    }

    // ---- history ----

    /// Insert or refresh a history entry at the front of the list.
    ///
    /// Any existing entry for the same id is removed first, and the list
    /// is capped at [`HISTORY_LIMIT`]. Records without an id are skipped.
    pub fn upsert_history(
        &mut self,
        record: &JobRecord,
        prompt: Option<&str>,
        source: HistorySource,
    ) {
        let Some(entry) = HistoryEntry::from_record(record, prompt, source) else {
            return;
        };
        self.history.retain(|existing| existing.id != entry.id);
        self.history.insert(0, entry);
        self.history.truncate(HISTORY_LIMIT);
    }

    pub fn remove_history(&mut self, id: &str) {
        if id.is_empty() {
            return;
        }
        self.history.retain(|entry| entry.id != id);
    }

    /// History entries, newest first.
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// The `n` most recent history entries.
    pub fn recent(&self, n: usize) -> &[HistoryEntry] {
        &self.history[..n.min(self.history.len())]
    }

    /// Cache the record and refresh its history entry in one step.
    pub fn record(&mut self, record: &JobRecord, prompt: Option<&str>, source: HistorySource) {
        self.cache_job(record);
        self.upsert_history(record, prompt, source);
    }

    // ---- listing ----

    pub fn listing(&self) -> &JobListing {
        &self.listing
    }

    pub fn listing_mut(&mut self) -> &mut JobListing {
        &mut self.listing
    }

    // ---- busy flag ----

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Mark the session busy for the lifetime of the returned guard.
    ///
    /// While the guard lives it is the only handle to the session, so a
    /// second request cannot start. Fails with [`CoreError::Conflict`] if
    /// the flag is still set from a guard that was never dropped.
    pub fn begin(&mut self) -> Result<BusyGuard<'_>, CoreError> {
        if self.busy {
            return Err(CoreError::Conflict(
                "Another request is already in flight for this session".to_string(),
            ));
        }
        self.busy = true;
        Ok(BusyGuard { session: self })
    }

    /// Drop all cached state, as at the end of a session.
    pub fn clear(&mut self) {
        self.jobs.clear();
        self.history.clear();
        self.listing = JobListing::default();
        self.busy = false;
    }
}

/// Exclusive access to a busy [`Session`]. Clears the busy flag on drop,
/// including when the owning future is cancelled.
#[derive(Debug)]
pub struct BusyGuard<'a> {
    session: &'a mut Session,
}

impl Deref for BusyGuard<'_> {
    type Target = Session;

    fn deref(&self) -> &Session {
        self.session
    }
}

impl DerefMut for BusyGuard<'_> {
    fn deref_mut(&mut self) -> &mut Session {
        self.session
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.session.busy = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn job(id: &str, status: &str) -> JobRecord {
        normalize(json!({"id": id, "status": status}))
    }

    // -- cache -----------------------------------------------------------------

    #[test]
    fn cache_upserts_by_id() {
        let mut session = Session::new();
        session.cache_job(&job("video_1", "queued"));
        session.cache_job(&job("video_1", "completed"));
        assert_eq!(session.cached_job_count(), 1);
        assert_eq!(session.cached_job("video_1").unwrap().progress, 100);
    }

    #[test]
    fn cache_skips_records_without_id() {
        let mut session = Session::new();
        session.cache_job(&normalize(json!({"status": "queued"})));
        assert_eq!(session.cached_job_count(), 0);
    }

    #[test]
    fn require_cached_job_reports_not_found() {
        let session = Session::new();
        assert_matches!(
            session.require_cached_job("video_x"),
            Err(CoreError::NotFound { .. })
        );
    }

    // -- history ---------------------------------------------------------------

    #[test]
    fn history_keeps_newest_twenty() {
        let mut session = Session::new();
        for i in 0..21 {
            session.upsert_history(&job(&format!("video_{i}"), "queued"), None, HistorySource::Jobs);
        }
        let ids: Vec<_> = session.history().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids.len(), 20);
        assert_eq!(ids[0], "video_20");
        assert_eq!(ids[19], "video_1");
        assert!(!ids.contains(&"video_0"));
    }

    #[test]
    fn reinsert_moves_to_front_without_duplicating() {
        let mut session = Session::new();
        for id in ["video_a", "video_b", "video_c"] {
            session.upsert_history(&job(id, "queued"), None, HistorySource::Generate);
        }
        session.upsert_history(&job("video_a", "completed"), None, HistorySource::Complete);

        let history = session.history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].id, "video_a");
        assert_eq!(history[0].source, HistorySource::Complete);
        assert_eq!(history[1].id, "video_c");
    }

    #[test]
    fn history_skips_records_without_id() {
        let mut session = Session::new();
        session.upsert_history(&normalize(json!({"id": ""})), None, HistorySource::Poll);
        assert!(session.history().is_empty());
    }

    #[test]
    fn remove_history_filters_entry() {
        let mut session = Session::new();
        session.upsert_history(&job("video_a", "queued"), None, HistorySource::Jobs);
        session.upsert_history(&job("video_b", "queued"), None, HistorySource::Jobs);
        session.remove_history("video_a");
        session.remove_history("");
        session.remove_history("video_missing");
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.history()[0].id, "video_b");
    }

    #[test]
    fn recent_is_bounded_by_len() {
        let mut session = Session::new();
        session.upsert_history(&job("video_a", "queued"), None, HistorySource::Jobs);
        assert_eq!(session.recent(5).len(), 1);
        assert_eq!(session.recent(0).len(), 0);
    }

    // -- busy flag -------------------------------------------------------------

    #[test]
    fn busy_guard_sets_and_clears_flag() {
        let mut session = Session::new();
        {
            let mut guard = session.begin().unwrap();
            assert!(guard.is_busy());
            guard.cache_job(&job("video_1", "queued"));
        }
        assert!(!session.is_busy());
        assert_eq!(session.cached_job_count(), 1);
    }

    #[test]
    fn leaked_guard_blocks_next_request() {
        let mut session = Session::new();
        std::mem::forget(session.begin().unwrap());
        assert_matches!(session.begin(), Err(CoreError::Conflict(_)));

        session.clear();
        assert!(session.begin().is_ok());
    }
}
