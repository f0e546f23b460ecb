//! Row Source Adapter for Google Sheets' GViz endpoint.
//!
//! The endpoint does not return plain JSON. The body looks like
//!
//! ```text
//! /*O_o*/
//! google.visualization.Query.setResponse({"version":"0.6","table":{...}});
//! ```
//!
//! so the adapter strips the call envelope, parses the table and decodes each
//! row positionally into a [`Record`]. Individual cells are decoded leniently
//! (missing or oddly-typed values fall back to the column default); only a
//! fundamentally malformed document is an error.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::config::FeedConfig;
use crate::error::{FeedError, FeedResult};
use crate::record::{Column, Record};

static NULL_CELL: Value = Value::Null;

lazy_static! {
    static ref ENVELOPE_PREFIX: Regex = Regex::new(r"(?s)^.*?setResponse\(").unwrap();
    static ref ENVELOPE_SUFFIX: Regex = Regex::new(r"\);?\s*$").unwrap();
}

/// Query-language projection requesting columns A through J.
pub fn column_projection() -> String {
    let letters: Vec<String> = Column::ALL.iter().map(|c| c.letter().to_string()).collect();
    format!("select {}", letters.join(","))
}

/// Full GViz URL for the configured sheet and tab.
pub fn feed_url(feed: &FeedConfig) -> String {
    format!(
        "{}/spreadsheets/d/{}/gviz/tq?sheet={}&tq={}",
        feed.base_url.trim_end_matches('/'),
        feed.spreadsheet_id,
        urlencoding::encode(&feed.sheet_name),
        urlencoding::encode(&column_projection()),
    )
}

/// Anything that can produce the current record collection.
#[async_trait]
pub trait RowSource: Send + Sync {
    async fn fetch_rows(&self) -> FeedResult<Vec<Record>>;
}

/// HTTP implementation of [`RowSource`] backed by the GViz endpoint.
#[derive(Clone, Debug)]
pub struct GvizSource {
    feed: FeedConfig,
    client: Client,
}

impl GvizSource {
    pub fn new(feed: FeedConfig) -> Self {
        let mut builder = Client::builder();
        if let Some(timeout) = feed.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().unwrap_or_else(|_| Client::new());
        Self { feed, client }
    }

    pub fn feed(&self) -> &FeedConfig {
        &self.feed
    }
}

#[async_trait]
impl RowSource for GvizSource {
    async fn fetch_rows(&self) -> FeedResult<Vec<Record>> {
        let url = feed_url(&self.feed);
        log::debug!("fetching sheet rows from {url}");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            log::warn!("sheet fetch returned HTTP {}", status.as_u16());
            return Err(FeedError::Fetch {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let records = decode_response(&body).inspect_err(|e| log::warn!("{e}"))?;
        log::info!(
            "fetched {} rows from sheet '{}'",
            records.len(),
            self.feed.sheet_name
        );
        Ok(records)
    }
}

#[derive(Debug, Default, Deserialize)]
struct GvizResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    errors: Option<Vec<GvizIssue>>,
    #[serde(default)]
    table: Option<GvizTable>,
}

#[derive(Debug, Default, Deserialize)]
struct GvizIssue {
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    detailed_message: Option<String>,
}

/// Rows and cells stay untyped so one odd row or cell decodes to defaults
/// instead of failing the whole document.
#[derive(Debug, Default, Deserialize)]
struct GvizTable {
    #[serde(default)]
    rows: Option<Vec<Value>>,
}

/// Strip the `...setResponse(` prefix and the trailing `);`.
pub fn strip_envelope(body: &str) -> FeedResult<&str> {
    let start = ENVELOPE_PREFIX
        .find(body)
        .ok_or_else(|| FeedError::Decode("response is missing the setResponse( envelope".into()))?
        .end();
    let rest = &body[start..];
    let end = ENVELOPE_SUFFIX
        .find(rest)
        .map(|m| m.start())
        .unwrap_or(rest.len());
    Ok(&rest[..end])
}

/// Decode a raw GViz response body into records, dropping a leaked header row.
pub fn decode_response(body: &str) -> FeedResult<Vec<Record>> {
    let json = strip_envelope(body)?;
    let response: GvizResponse = serde_json::from_str(json)?;

    if response.status.as_deref() == Some("error") {
        let detail = response
            .errors
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|issue| issue.detailed_message.or(issue.reason))
            .unwrap_or_else(|| "unknown error".to_string());
        return Err(FeedError::Decode(format!("feed reported an error: {detail}")));
    }

    let rows = response
        .table
        .and_then(|table| table.rows)
        .unwrap_or_default();

    Ok(rows
        .into_iter()
        .map(|row| decode_row(row_cells(&row)))
        .filter(|record| !is_header_row(record))
        .collect())
}

fn row_cells(row: &Value) -> &[Value] {
    row.get("c")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// The `v` of a `{"v": ...}` cell. Null, missing and non-object cells read as
/// null.
fn cell_value(cells: &[Value], column: Column) -> &Value {
    cells
        .get(column.index())
        .and_then(|cell| cell.get("v"))
        .unwrap_or(&NULL_CELL)
}

fn decode_row(cells: &[Value]) -> Record {
    let text = |column: Column| decode_text(cell_value(cells, column));

    Record {
        candidate_name: text(Column::CandidateName),
        role: text(Column::Role),
        client: text(Column::Client),
        interview_stage: text(Column::InterviewStage),
        status: text(Column::Status),
        submission_date: text(Column::SubmissionDate),
        priority: text(Column::Priority),
        location: text(Column::Location),
        month: text(Column::Month),
        year: decode_year(cell_value(cells, Column::Year)),
    }
}

fn is_header_row(record: &Record) -> bool {
    record.candidate_name.trim().to_lowercase()
        == Column::CandidateName.header_label().to_lowercase()
}

/// String column decode. Null and missing become `""`.
pub fn decode_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (_, Some(u), _) => u.to_string(),
            (_, _, Some(f)) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
                (f as i64).to_string()
            }
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

/// Year column decode. Anything that is not a finite number becomes `0`.
pub fn decode_year(value: &Value) -> i32 {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if !s.trim().is_empty() => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match number {
        Some(f) if f.is_finite() && f >= i32::MIN as f64 && f <= i32::MAX as f64 => f.trunc() as i32,
        _ => 0,
    }
}
