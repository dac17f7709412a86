//! Recent-job history entries shown to the user during a session.

use vidgen_core::job_status::JobStatus;
use vidgen_core::types::{JobId, UnixSeconds};

use crate::normalize::JobRecord;

/// Maximum number of entries kept in the session history.
pub const HISTORY_LIMIT: usize = 20;

/// Maximum prompt snippet length, in characters, including the marker.
pub const PROMPT_SNIPPET_LIMIT: usize = 80;

/// Appended to prompts that were cut short.
pub const ELLIPSIS: &str = "...";

/// Where a history entry was last refreshed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistorySource {
    /// Job was just submitted.
    Generate,
    /// Poll tick while rendering.
    Poll,
    /// Final state after polling finished.
    Complete,
    /// Loaded from a job listing page.
    Jobs,
    /// Fetched on demand for a single job.
    Open,
}

impl HistorySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generate => "generate",
            Self::Poll => "poll",
            Self::Complete => "complete",
            Self::Jobs => "jobs",
            Self::Open => "open",
        }
    }
}

/// One row of the session's recent-job list.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub id: JobId,
    pub prompt: String,
    pub status: JobStatus,
    pub size: String,
    pub seconds: String,
    pub source: HistorySource,
    pub updated_at: Option<UnixSeconds>,
}

impl HistoryEntry {
    /// Build an entry from a record. `prompt` overrides the record's own
    /// prompt. Returns `None` when the record has no id.
    pub fn from_record(
        record: &JobRecord,
        prompt: Option<&str>,
        source: HistorySource,
    ) -> Option<Self> {
        let id = record.id()?.to_string();
        let prompt_text = prompt
            .filter(|p| !p.is_empty())
            .or(record.prompt.as_deref())
            .unwrap_or("");

        Some(Self {
            id,
            prompt: prompt_snippet(prompt_text),
            status: record.status.clone(),
            size: record.size.clone(),
            seconds: record.seconds.clone(),
            source,
            updated_at: record.updated_at.or(record.created_at),
        })
    }

    /// Short label, e.g. `video_1 • 1280x720 • 8s • a fox in the snow`.
    pub fn describe(&self) -> String {
        let mut bits = vec![if self.id.is_empty() {
            "unknown".to_string()
        } else {
            self.id.clone()
        }];
        if !self.size.is_empty() {
            bits.push(self.size.clone());
        }
        if !self.seconds.is_empty() {
            bits.push(format!("{}s", self.seconds));
        }
        if !self.prompt.is_empty() {
            bits.push(self.prompt.clone());
        }
        bits.join(" • ")
    }
}

/// Collapse whitespace and cut the prompt to [`PROMPT_SNIPPET_LIMIT`]
/// characters, ending in [`ELLIPSIS`] when shortened.
pub fn prompt_snippet(prompt: &str) -> String {
    let collapsed = prompt.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= PROMPT_SNIPPET_LIMIT {
        return collapsed;
    }
    let keep = PROMPT_SNIPPET_LIMIT - ELLIPSIS.chars().count();
    let mut snippet: String = collapsed.chars().take(keep).collect();
    snippet.push_str(ELLIPSIS);
    snippet
}
