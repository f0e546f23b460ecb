//! Dashboard state and the views derived from it.
//!
//! The state is a plain value. Every transition builds a new `DashboardState`
//! and the shared handle swaps it in wholesale; nothing is patched in place.
//! Views are recomputed from the current state on demand.

use chrono::{DateTime, Local, NaiveDate};
use serde::Serialize;
use std::sync::{Arc, RwLock};

use crate::config::FeedConfig;
use crate::error::FeedError;
use crate::filter::{FilterSpec, filter_records};
use crate::grouping::{GroupedCount, by_month, by_role, by_status};
use crate::metrics::{Kpi, compute_kpis_at};
use crate::options::OptionSets;
use crate::record::Record;
use crate::table::{TablePage, TableQuery, table_page};

/// Last fetch failure as shown to the user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorNotice {
    pub message: String,
    pub hints: Vec<String>,
    pub status: Option<u16>,
}

impl ErrorNotice {
    pub fn from_feed_error(err: &FeedError, feed: &FeedConfig) -> Self {
        Self {
            message: err.to_string(),
            hints: err.remediation_hints(feed),
            status: err.status(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct DashboardState {
    pub records: Arc<Vec<Record>>,
    pub filters: FilterSpec,
    pub last_updated: Option<DateTime<Local>>,
    pub last_error: Option<ErrorNotice>,
    pub refreshing: bool,
}

impl DashboardState {
    /// A successful fetch: new records, error cleared.
    #[must_use]
    pub fn with_records(&self, records: Vec<Record>, at: DateTime<Local>) -> Self {
        Self {
            records: Arc::new(records),
            filters: self.filters.clone(),
            last_updated: Some(at),
            last_error: None,
            refreshing: false,
        }
    }

    /// A failed fetch: the previous records stay visible.
    #[must_use]
    pub fn with_error(&self, error: ErrorNotice) -> Self {
        Self {
            last_error: Some(error),
            refreshing: false,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_filters(&self, filters: FilterSpec) -> Self {
        Self {
            filters,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_refreshing(&self, refreshing: bool) -> Self {
        Self {
            refreshing,
            ..self.clone()
        }
    }

    pub fn filtered(&self) -> Vec<Record> {
        filter_records(&self.records, &self.filters)
    }

    pub fn options(&self) -> OptionSets {
        OptionSets::from_records(&self.records)
    }

    pub fn table(&self, query: &TableQuery) -> TablePage {
        table_page(&self.filtered(), query)
    }
}

/// Everything the presentation layer needs, derived from one state snapshot.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub total_rows: usize,
    pub filtered_rows: usize,
    pub filters: FilterSpec,
    pub kpis: Kpi,
    pub options: OptionSets,
    pub by_status: Vec<GroupedCount>,
    pub by_role: Vec<GroupedCount>,
    pub by_month: Vec<GroupedCount>,
    pub filtered: Vec<Record>,
    pub last_updated: Option<DateTime<Local>>,
    pub error: Option<ErrorNotice>,
    pub refreshing: bool,
}

impl DashboardView {
    pub fn build(state: &DashboardState, today: NaiveDate) -> Self {
        let filtered = state.filtered();
        Self {
            total_rows: state.records.len(),
            filtered_rows: filtered.len(),
            filters: state.filters.clone(),
            kpis: compute_kpis_at(&filtered, today),
            options: state.options(),
            by_status: by_status(&filtered),
            by_role: by_role(&filtered),
            by_month: by_month(&filtered),
            filtered,
            last_updated: state.last_updated,
            error: state.last_error.clone(),
            refreshing: state.refreshing,
        }
    }

    pub fn build_now(state: &DashboardState) -> Self {
        Self::build(state, Local::now().date_naive())
    }
}

/// Shared handle to the current [`DashboardState`].
#[derive(Clone, Debug, Default)]
pub struct SharedDashboard {
    inner: Arc<RwLock<DashboardState>>,
}

impl SharedDashboard {
    pub fn new(state: DashboardState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    /// Clone of the current state. Records are behind an `Arc`, so this is
    /// cheap.
    pub fn snapshot(&self) -> DashboardState {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replace the state with `next(current)` and return the new state.
    pub fn replace<F>(&self, next: F) -> DashboardState
    where
        F: FnOnce(&DashboardState) -> DashboardState,
    {
        let mut guard = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let updated = next(&*guard);
        *guard = updated.clone();
        updated
    }
}
