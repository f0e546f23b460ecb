use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::options::locale_cmp;
use crate::record::{Column, Record};

/// Rows returned per table page unless the caller asks for fewer.
pub const MAX_TABLE_ROWS: usize = 300;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

/// Sorting, search and row cap for the records table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableQuery {
    pub sort: Option<(Column, SortDirection)>,
    pub search: Option<String>,
    pub limit: usize,
}

impl Default for TableQuery {
    fn default() -> Self {
        Self {
            sort: None,
            search: None,
            limit: MAX_TABLE_ROWS,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TablePage {
    /// Rows handed to the table before its own search.
    pub total_rows: usize,
    /// Rows matching the table search, before the cap.
    pub matched_rows: usize,
    pub rows: Vec<Record>,
}

fn table_haystack(record: &Record) -> String {
    [
        record.candidate_name.as_str(),
        record.role.as_str(),
        record.client.as_str(),
        record.interview_stage.as_str(),
        record.status.as_str(),
        record.priority.as_str(),
        record.location.as_str(),
        record.month.as_str(),
        &record.year.to_string(),
    ]
    .join(" ")
    .to_lowercase()
}

fn compare_by(column: Column, a: &Record, b: &Record) -> Ordering {
    match column {
        Column::Year => a.year.cmp(&b.year),
        _ => locale_cmp(
            a.str_field(column).unwrap_or_default(),
            b.str_field(column).unwrap_or_default(),
        ),
    }
}

/// Search, sort and cap `records` for display.
pub fn table_page(records: &[Record], query: &TableQuery) -> TablePage {
    let needle = query
        .search
        .as_deref()
        .map(|q| q.trim().to_lowercase())
        .filter(|q| !q.is_empty());

    let mut matched: Vec<&Record> = records
        .iter()
        .filter(|record| {
            needle
                .as_deref()
                .is_none_or(|needle| table_haystack(record).contains(needle))
        })
        .collect();

    if let Some((column, direction)) = query.sort {
        matched.sort_by(|a, b| {
            let ord = compare_by(column, a, b);
            match direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        });
    }

    TablePage {
        total_rows: records.len(),
        matched_rows: matched.len(),
        rows: matched.into_iter().take(query.limit).cloned().collect(),
    }
}
