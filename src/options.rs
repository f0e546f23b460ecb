use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::record::Record;

/// Locale-style string ordering used for option lists and chart keys.
///
/// Three levels, like a collator: base letters compared case- and
/// accent-insensitively, then unaccented before accented, then lowercase
/// before uppercase (`"apple" < "Apple" < "Émile" < "Eve"`).
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    base_letters(a)
        .cmp(&base_letters(b))
        .then_with(|| accented(a).cmp(&accented(b)))
        .then_with(|| b.cmp(a))
}

fn base_letters(value: &str) -> String {
    value
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

fn accented(value: &str) -> String {
    value.nfd().collect::<String>().to_lowercase()
}

/// Distinct values available for each filter control, always derived from
/// the full record collection rather than the filtered one.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct OptionSets {
    pub roles: Vec<String>,
    pub clients: Vec<String>,
    pub statuses: Vec<String>,
    pub priorities: Vec<String>,
    pub months: Vec<String>,
    pub years: Vec<i32>,
}

impl OptionSets {
    pub fn from_records(records: &[Record]) -> Self {
        Self {
            roles: distinct_sorted(records.iter().map(|r| r.role.as_str())),
            clients: distinct_sorted(records.iter().map(|r| r.client.as_str())),
            statuses: distinct_sorted(records.iter().map(|r| r.status.as_str())),
            priorities: distinct_sorted(records.iter().map(|r| r.priority.as_str())),
            months: distinct_sorted(records.iter().map(|r| r.month.as_str())),
            years: records
                .iter()
                .map(|r| r.year)
                .filter(|year| *year != 0)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
        }
    }
}

fn distinct_sorted<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let unique: BTreeSet<&str> = values.filter(|v| !v.is_empty()).collect();
    let mut sorted: Vec<String> = unique.into_iter().map(str::to_string).collect();
    sorted.sort_by(|a, b| locale_cmp(a, b));
    sorted
}
