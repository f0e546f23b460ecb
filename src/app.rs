use axum::{
    Json, Router,
    body::Body,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::{DashboardConfig, FeedConfig};
use crate::dashboard::{DashboardView, SharedDashboard};
use crate::feed::GvizSource;
use crate::filter::{FilterPatch, FilterSpec};
use crate::graph::{GraphOptions, render_bar_chart};
use crate::grouping::{by_month, by_role, by_status};
use crate::poller::{Poller, PollerHandle};
use crate::record::Column;
use crate::table::{MAX_TABLE_ROWS, SortDirection, TableQuery};

pub struct AppState {
    pub dashboard: SharedDashboard,
    /// `None` when no poller is attached; refresh requests are then refused.
    pub poller: Option<Arc<PollerHandle>>,
    pub feed: FeedConfig,
}

#[derive(Deserialize)]
struct RecordsQuery {
    sort: Option<String>,
    dir: Option<String>,
    search: Option<String>,
    limit: Option<usize>,
}

fn bad_request(message: String) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "status": "error", "message": message })),
    )
        .into_response()
}

/// Routes for the dashboard API.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/dashboard", get(get_dashboard))
        .route(
            "/api/filters",
            get(get_filters).post(update_filters).delete(clear_filters),
        )
        .route("/api/options", get(get_options))
        .route("/api/records", get(get_records))
        .route("/api/refresh", post(refresh))
        .route("/api/chart/:view", get(get_chart))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(config: DashboardConfig) -> Result<(), Box<dyn std::error::Error>> {
    let dashboard = SharedDashboard::default();
    let source = Arc::new(GvizSource::new(config.feed.clone()));
    let poller = Arc::new(
        Poller::new(
            source,
            config.feed.clone(),
            dashboard.clone(),
            config.refresh_interval(),
        )
        .spawn(),
    );

    let app_state = Arc::new(AppState {
        dashboard,
        poller: Some(Arc::clone(&poller)),
        feed: config.feed.clone(),
    });
    let app = router(app_state);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    log::info!(
        "Listening on http://{} (sheet '{}' of {})",
        config.bind_addr,
        config.feed.sheet_name,
        config.feed.spreadsheet_id
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    match Arc::try_unwrap(poller) {
        Ok(handle) => handle.shutdown().await,
        Err(_) => log::debug!("poller still shared at exit, dropping it"),
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::warn!("failed to listen for ctrl-c: {err}");
        std::future::pending::<()>().await;
    }
    log::info!("shutting down");
}

async fn get_dashboard(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(DashboardView::build_now(&state.dashboard.snapshot()))
}

async fn get_filters(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.dashboard.snapshot().filters)
}

async fn update_filters(
    State(state): State<Arc<AppState>>,
    Json(patch): Json<FilterPatch>,
) -> impl IntoResponse {
    let updated = state
        .dashboard
        .replace(|current| current.with_filters(current.filters.apply(&patch)));
    log::debug!("filters now {:?}", updated.filters);
    Json(updated.filters)
}

async fn clear_filters(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let updated = state
        .dashboard
        .replace(|current| current.with_filters(FilterSpec::default()));
    Json(updated.filters)
}

async fn get_options(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.dashboard.snapshot().options())
}

async fn get_records(
    Query(params): Query<RecordsQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let direction = match params.dir.as_deref() {
        None => SortDirection::Asc,
        Some(raw) => match SortDirection::parse(raw) {
            Some(direction) => direction,
            None => return bad_request(format!("unknown sort direction '{raw}'")),
        },
    };
    let sort = match params.sort.as_deref() {
        None | Some("") => None,
        Some(key) => match Column::from_key(key) {
            Some(column) => Some((column, direction)),
            None => return bad_request(format!("unknown sort column '{key}'")),
        },
    };

    let query = TableQuery {
        sort,
        search: params.search,
        limit: params.limit.unwrap_or(MAX_TABLE_ROWS).min(MAX_TABLE_ROWS),
    };
    Json(state.dashboard.snapshot().table(&query)).into_response()
}

async fn refresh(State(state): State<Arc<AppState>>) -> Response {
    match &state.poller {
        Some(poller) => {
            let started = poller.refresh_now();
            Json(serde_json::json!({
                "started": started,
                "stats": poller.stats(),
            }))
            .into_response()
        }
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({
                "status": "error",
                "message": format!("no poller attached for sheet '{}'", state.feed.sheet_name),
            })),
        )
            .into_response(),
    }
}

async fn get_chart(Path(view): Path<String>, State(state): State<Arc<AppState>>) -> Response {
    let filtered = state.dashboard.snapshot().filtered();
    let (data, options) = match view.as_str() {
        "status" => (by_status(&filtered), GraphOptions::titled("Status Mix")),
        "roles" => (by_role(&filtered), GraphOptions::titled("Top Roles")),
        "months" => (by_month(&filtered), GraphOptions::titled("Pipeline by Month")),
        _ => return StatusCode::NOT_FOUND.into_response(),
    };

    match render_bar_chart(&data, &options) {
        Ok(png) => ([(header::CONTENT_TYPE, "image/png")], Body::from(png)).into_response(),
        Err(e) => {
            log::error!("chart '{view}' failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "status": "error", "message": e.to_string() })),
            )
                .into_response()
        }
    }
}
