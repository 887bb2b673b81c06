use tracing::debug;

use crate::api::ApiError;
use crate::models::StudentRecord;

use super::filter::{filter_by_email, FilterState};
use super::service::ShareService;

/// What the share page should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    /// The link worked but holds no records
    Empty,
    /// Records exist but none match the filter
    NoMatches,
    /// Number of records passing the filter
    Rows(usize),
}

/// One shared record set and the filter applied to it.
///
/// Records are replaced wholesale by each successful load and never edited.
#[derive(Debug, Clone, Default)]
pub struct ShareViewer {
    token: Option<String>,
    records: Vec<StudentRecord>,
    filter: FilterState,
}

impl ShareViewer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the records for `token`. On failure the previous records are
    /// dropped so a stale set is never shown under a new link.
    pub async fn load(&mut self, service: &ShareService, token: &str) -> Result<ViewState, ApiError> {
        self.token = Some(token.trim().to_string());
        match service.fetch_shared_data(token).await {
            Ok(records) => {
                debug!(count = records.len(), "Share viewer loaded records");
                self.records = records;
                Ok(self.view_state())
            }
            Err(e) => {
                self.records = Vec::new();
                Err(e)
            }
        }
    }

    /// Replace the record set directly.
    pub fn set_records(&mut self, records: Vec<StudentRecord>) {
        self.records = records;
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.filter = FilterState::new(query);
    }

    pub fn clear_query(&mut self) {
        self.filter = FilterState::default();
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn records(&self) -> &[StudentRecord] {
        &self.records
    }

    /// Records passing the current filter, in fetch order.
    pub fn visible(&self) -> Vec<&StudentRecord> {
        filter_by_email(&self.records, &self.filter.query)
    }

    pub fn view_state(&self) -> ViewState {
        if self.records.is_empty() {
            return ViewState::Empty;
        }
        match self.visible().len() {
            0 => ViewState::NoMatches,
            n => ViewState::Rows(n),
        }
    }
}
