/*!
# Candidate Pipeline Dashboard

Near-live analytics over a recruiting pipeline kept in a published Google
Sheet, built in Rust.

## Overview

The dashboard polls one sheet tab through the Google Visualization (GViz)
query endpoint, decodes each row into a typed [`Record`], and derives
everything else from that record set: filter choices, headline KPIs,
grouped counts for charts, and a searchable, sortable table.

## Architecture

### Row Source
- **Technologies**: reqwest, serde_json, regex
- **Key Components**:
  - Envelope stripping - removes the `setResponse(...)` JavaScript wrapper
  - Lenient column decode - every cell falls back to a declared default
  - Header-row drop - rows that repeat the column header are discarded

### Pipeline
- Filter Predicate Engine - equality filters plus a free-text query
- KPI Aggregator - status counts, high-priority count, median age in days
- Group-By Counter - frequency tables for status, role and year-month
- Option Sets - distinct, locale-sorted filter values
- Record Table - search, sort and cap for display

### State
- Immutable dashboard snapshots, replaced wholesale on every transition
- A background poller refreshing on an interval or on demand, never
  running two fetches at once

### Web Layer (feature `web`)
- **Technologies**: axum, tower-http, plotters
- JSON API over the current snapshot and PNG bar charts

## Modules

- **record**: Record struct and the fixed A-J column layout
- **config**: Feed and runtime configuration, read from the environment
- **error**: Feed errors and the remediation hints shown to users
- **feed**: GViz URL construction, fetch and decode
- **filter**: Filter specification, patches and the record predicate
- **metrics**: KPI summary and date handling
- **grouping**: Grouped counts
- **options**: Option sets and locale-style ordering
- **table**: Record table queries
- **dashboard**: Dashboard state, shared handle and derived view
- **poller**: Scheduled and manual refresh
- **graph**: Chart rendering (feature `web`)
- **app**: Routing and middleware (feature `web`)

## REST API Endpoints

- `GET /api/dashboard` - Full derived view for the stored filters
- `GET|POST|DELETE /api/filters` - Read, merge or clear filters
- `GET /api/options` - Filter choices
- `GET /api/records` - Table page with `sort`, `dir`, `search`, `limit`
- `POST /api/refresh` - Manual refresh trigger
- `GET /api/chart/{status|roles|months}` - PNG bar chart
*/

pub mod config;
pub mod dashboard;
pub mod error;
pub mod feed;
pub mod filter;
pub mod grouping;
pub mod metrics;
pub mod options;
pub mod poller;
pub mod record;
pub mod table;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod graph;

pub use config::{DashboardConfig, FeedConfig};
pub use dashboard::{DashboardState, DashboardView, ErrorNotice, SharedDashboard};
pub use error::{FeedError, FeedResult};
pub use feed::{GvizSource, RowSource};
pub use filter::{FilterPatch, FilterSpec, filter_records};
pub use grouping::GroupedCount;
pub use metrics::Kpi;
pub use options::OptionSets;
pub use poller::{Poller, PollerHandle, PollerStats};
pub use record::{Column, Record};
pub use table::{SortDirection, TablePage, TableQuery};
