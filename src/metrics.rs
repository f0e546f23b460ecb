//! KPI aggregation over a record subset.
//!
//! Everything here is recomputed from scratch on each call. The age metric
//! depends on the current date, so two calls on the same subset a day apart
//! will report different medians.

use chrono::{Local, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::record::Record;

pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_IN_PROGRESS: &str = "in progress";
pub const STATUS_SCHEDULED: &str = "scheduled";
pub const STATUS_ACCEPTED: &str = "accepted";
pub const STATUS_REJECTED: &str = "rejected";
pub const PRIORITY_HIGH: &str = "high";

/// Fixed-shape summary statistics for a record subset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Kpi {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub scheduled: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub high_priority: usize,
    /// Median days since submission; `None` when no record has a usable date.
    pub median_age_days: Option<i64>,
}

fn norm(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Compute KPIs using today's local date as "now".
pub fn compute_kpis(records: &[Record]) -> Kpi {
    compute_kpis_at(records, Local::now().date_naive())
}

/// Compute KPIs with an explicit "today".
pub fn compute_kpis_at(records: &[Record], today: NaiveDate) -> Kpi {
    let mut kpi = Kpi {
        total: records.len(),
        ..Kpi::default()
    };

    let mut ages = Vec::with_capacity(records.len());
    for record in records {
        match norm(&record.status).as_str() {
            STATUS_COMPLETED => kpi.completed += 1,
            STATUS_IN_PROGRESS => kpi.in_progress += 1,
            STATUS_SCHEDULED => kpi.scheduled += 1,
            STATUS_ACCEPTED => kpi.accepted += 1,
            STATUS_REJECTED => kpi.rejected += 1,
            _ => {}
        }
        if norm(&record.priority) == PRIORITY_HIGH {
            kpi.high_priority += 1;
        }
        if let Some(age) = age_in_days(&record.submission_date, today) {
            ages.push(age);
        }
    }

    kpi.median_age_days = median(&mut ages);
    kpi
}

lazy_static! {
    // Zero-padded `YYYY`, `YYYY-MM` or `YYYY-MM-DD`; only a full date may
    // carry a time part.
    static ref ISO_DATE: Regex =
        Regex::new(r"^(\d{4})(?:-(\d{2})(?:-(\d{2})(?:[t ].*)?)?)?$").unwrap();
}

/// Parse an ISO-8601 calendar date, accepting an optional trailing time part
/// (`2025-01-28`, `2025-01-28T09:30:00Z`, `2025-01-28 09:30`) and the
/// reduced forms `2025-01` and `2025`, which mean the first of the period.
pub fn parse_submission_date(raw: &str) -> Option<NaiveDate> {
    let value = norm(raw);
    let caps = ISO_DATE.captures(&value)?;
    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps.get(2).map_or(Ok(1), |m| m.as_str().parse()).ok()?;
    let day: u32 = caps.get(3).map_or(Ok(1), |m| m.as_str().parse()).ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Calendar days between `today` and the submission date. Negative for
/// future dates, `None` for empty or unparsable input.
pub fn age_in_days(submission_date: &str, today: NaiveDate) -> Option<i64> {
    parse_submission_date(submission_date).map(|date| (today - date).num_days())
}

/// Median of `values`, sorting them in place.
///
/// For an even count the two central values are averaged and rounded half
/// toward positive infinity, so `[1, 2]` gives `2` and `[-3, -2]` gives `-2`.
pub fn median(values: &mut [i64]) -> Option<i64> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable();
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid] + 1).div_euclid(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    fn with_status(status: &str) -> Record {
        Record {
            status: status.into(),
            ..Record::default()
        }
    }

    #[test]
    fn median_handles_odd_even_and_empty() {
        assert_eq!(median(&mut [3]), Some(3));
        assert_eq!(median(&mut [4, 2]), Some(3));
        assert_eq!(median(&mut [8, 1, 4, 2]), Some(3));
        assert_eq!(median(&mut [1, 2]), Some(2));
        assert_eq!(median(&mut [-3, -2]), Some(-2));
        assert_eq!(median(&mut []), None);
    }

    #[test]
    fn status_labels_are_trimmed_and_case_folded() {
        let rows = vec![
            with_status("Completed"),
            with_status("completed "),
            with_status("Scheduled"),
        ];
        let kpi = compute_kpis_at(&rows, today());
        assert_eq!(
            kpi,
            Kpi {
                total: 3,
                completed: 2,
                scheduled: 1,
                ..Kpi::default()
            }
        );
    }

    #[test]
    fn unknown_statuses_only_count_toward_total() {
        let rows = vec![
            with_status("In Progress"),
            with_status("ACCEPTED"),
            with_status(" rejected"),
            with_status("On hold"),
            with_status(""),
        ];
        let kpi = compute_kpis_at(&rows, today());
        let labelled = kpi.completed + kpi.in_progress + kpi.scheduled + kpi.accepted + kpi.rejected;
        assert_eq!(kpi.total, 5);
        assert_eq!(labelled, 3);
    }

    #[test]
    fn high_priority_matches_exactly() {
        let rows: Vec<Record> = ["High", " high ", "Highest", "low"]
            .into_iter()
            .map(|p| Record {
                priority: p.into(),
                ..Record::default()
            })
            .collect();
        assert_eq!(compute_kpis_at(&rows, today()).high_priority, 2);
    }

    #[test]
    fn ages_skip_unparsable_dates() {
        let rows: Vec<Record> = ["2025-02-27", "", "not a date", "2025-02-25", "Date(2025,1,1)"]
            .into_iter()
            .map(|d| Record {
                submission_date: d.into(),
                ..Record::default()
            })
            .collect();
        // ages are 2 and 4
        assert_eq!(compute_kpis_at(&rows, today()).median_age_days, Some(3));
    }

    #[test]
    fn no_dates_means_no_median() {
        let rows = vec![with_status("Completed")];
        assert_eq!(compute_kpis_at(&rows, today()).median_age_days, None);
    }

    #[test]
    fn future_dates_give_negative_ages() {
        assert_eq!(age_in_days("2025-03-04", today()), Some(-3));
        assert_eq!(age_in_days(" 2025-02-28T23:59:00Z ", today()), Some(1));
        assert_eq!(age_in_days("2025-02-28 08:00", today()), Some(1));
        assert_eq!(age_in_days("2025-02-30", today()), None);
        assert_eq!(age_in_days("2025-02-280", today()), None);
    }

    #[test]
    fn dates_must_be_zero_padded() {
        assert_eq!(parse_submission_date("2025-1-5"), None);
        assert_eq!(parse_submission_date("2025-01-5"), None);
        assert_eq!(parse_submission_date("25-01-05"), None);
        assert_eq!(
            parse_submission_date("2025-01-05"),
            NaiveDate::from_ymd_opt(2025, 1, 5)
        );
    }

    #[test]
    fn reduced_precision_dates_start_the_period() {
        assert_eq!(
            parse_submission_date("2025-02"),
            NaiveDate::from_ymd_opt(2025, 2, 1)
        );
        assert_eq!(
            parse_submission_date(" 2025 "),
            NaiveDate::from_ymd_opt(2025, 1, 1)
        );
        assert_eq!(parse_submission_date("2025-13"), None);
        assert_eq!(parse_submission_date("2025-02T10:00"), None);
    }
}
