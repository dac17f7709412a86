//! Paged job listing: the loaded rows, the `after` cursor, and the
//! client-side date filter.

use chrono::{Local, NaiveDate};
use vidgen_core::job_status::StatusFilter;
use vidgen_core::types::{timestamp_from_unix, JobId};

use crate::api::{ListQuery, Page, SortOrder, VideoApiError, VideoJobs, DEFAULT_PAGE_LIMIT};
use crate::history::HistorySource;
use crate::normalize::JobRecord;
use crate::session::Session;
use crate::workflow::WorkflowError;

/// Fetch a single page of jobs.
///
/// `cursor` is the id of the last job on the previous page.
pub async fn fetch_page(
    api: &dyn VideoJobs,
    limit: u32,
    order: SortOrder,
    cursor: Option<&str>,
    status: StatusFilter,
) -> Result<Page, VideoApiError> {
    let query = ListQuery {
        limit,
        order,
        after: cursor.map(str::to_string),
        status,
    };
    api.list(&query).await
}

/// Jobs loaded so far for the listing view.
#[derive(Debug, Clone, Default)]
pub struct JobListing {
    rows: Vec<JobRecord>,
    cursor: Option<JobId>,
    has_more: bool,
    filter: StatusFilter,
    order: SortOrder,
    loaded_once: bool,
}

impl JobListing {
    pub fn rows(&self) -> &[JobRecord] {
        &self.rows
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    pub fn filter(&self) -> StatusFilter {
        self.filter
    }

    pub fn order(&self) -> SortOrder {
        self.order
    }

    /// True until the first page has been loaded for the current filter.
    pub fn needs_refresh(&self) -> bool {
        !self.loaded_once
    }

    /// Change the status filter. A different filter invalidates the rows
    /// loaded so far.
    pub fn set_filter(&mut self, filter: StatusFilter) {
        if filter != self.filter {
            self.filter = filter;
            self.loaded_once = false;
        }
    }

    /// Change the sort order. Like a filter change, this invalidates the
    /// rows loaded so far.
    pub fn set_order(&mut self, order: SortOrder) {
        if order != self.order {
            self.order = order;
            self.loaded_once = false;
        }
    }

    pub fn find_row(&self, id: &str) -> Option<&JobRecord> {
        self.rows.iter().find(|row| row.id() == Some(id))
    }

    /// Replace the row with the same id, or insert the record at the top.
    pub fn upsert_row(&mut self, record: JobRecord) {
        let Some(id) = record.id.clone() else {
            return;
        };
        match self.rows.iter_mut().find(|row| row.id() == Some(id.as_str())) {
            Some(row) => *row = record,
            None => self.rows.insert(0, record),
        }
    }

    pub fn remove_row(&mut self, id: &str) {
        self.rows.retain(|row| row.id() != Some(id));
    }

    /// Fold a fetched page into the listing. The cursor only advances
    /// while the service reports more pages.
    fn apply_page(&mut self, page: Page, reset: bool) -> usize {
        if reset {
            self.rows.clear();
        }
        let loaded = page.items.len();
        self.rows.extend(page.items);
        self.has_more = page.has_more;
        self.cursor = if page.has_more { page.next_cursor } else { None };
        self.loaded_once = true;
        loaded
    }
}

/// Reload the listing from the first page using the current filter and
/// sort order.
///
/// Returns the number of jobs loaded.
pub async fn refresh(api: &dyn VideoJobs, session: &mut Session) -> Result<usize, WorkflowError> {
    load(api, session, true).await
}

/// Load the next page after the stored cursor. Does nothing when the
/// service reported no further pages.
pub async fn load_more(api: &dyn VideoJobs, session: &mut Session) -> Result<usize, WorkflowError> {
    if !session.listing().has_more() {
        return Ok(0);
    }
    load(api, session, false).await
}

async fn load(api: &dyn VideoJobs, session: &mut Session, reset: bool) -> Result<usize, WorkflowError> {
    let mut session = session.begin()?;

    let filter = session.listing().filter();
    let order = session.listing().order();
    let cursor = if reset {
        None
    } else {
        session.listing().cursor().map(str::to_string)
    };

    let page = fetch_page(
        api,
        DEFAULT_PAGE_LIMIT,
        order,
        cursor.as_deref(),
        filter,
    )
    .await?;

    for item in &page.items {
        session.record(item, None, HistorySource::Jobs);
    }
    let loaded = session.listing_mut().apply_page(page, reset);

    tracing::debug!(
        loaded,
        has_more = session.listing().has_more(),
        filter = filter.label(),
        "Job page loaded",
    );
    Ok(loaded)
}

// ---------------------------------------------------------------------------
// Date filter
// ---------------------------------------------------------------------------

/// Inclusive range of local creation dates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// Whether the record's local creation date falls in the range.
    /// Records with no usable timestamp always match.
    pub fn contains(&self, record: &JobRecord) -> bool {
        let Some(created) = record
            .created_at
            .and_then(timestamp_from_unix)
            .map(|t| t.with_timezone(&Local).date_naive())
        else {
            return true;
        };
        if self.start.is_some_and(|start| created < start) {
            return false;
        }
        if self.end.is_some_and(|end| created > end) {
            return false;
        }
        true
    }

    pub fn apply<'a>(&self, rows: &'a [JobRecord]) -> Vec<&'a JobRecord> {
        rows.iter().filter(|row| self.contains(row)).collect()
    }
}
