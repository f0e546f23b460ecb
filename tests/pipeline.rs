use candidate_dashboard::feed::decode_response;
use candidate_dashboard::grouping::{by_month, by_role, by_status};
use candidate_dashboard::metrics::{compute_kpis_at, median};
use candidate_dashboard::{
    DashboardState, DashboardView, FilterSpec, OptionSets, Record, filter_records,
};
use chrono::{Local, NaiveDate};
use serde_json::{Value, json};

fn envelope(rows: Vec<Value>) -> String {
    let doc = json!({ "version": "0.6", "status": "ok", "table": { "rows": rows } });
    format!("/*O_o*/\ngoogle.visualization.Query.setResponse({doc});")
}

fn sheet_row(name: &str, role: &str, status: &str, priority: &str, date: &str, year: Value) -> Value {
    json!({ "c": [
        { "v": name }, { "v": role }, { "v": "Acme" }, { "v": "Onsite" },
        { "v": status }, { "v": date }, { "v": priority }, { "v": "Remote" },
        { "v": "March" }, { "v": year }
    ]})
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
}

fn sample() -> Vec<Record> {
    let body = envelope(vec![
        sheet_row("Candidate Name", "Role", "Status", "Priority", "Submission Date", json!("Year")),
        sheet_row("Ada", "Engineer", "Completed", "High", "2025-03-07", json!(2025)),
        sheet_row("Grace", "Manager", "completed ", "low", "2025-03-01T10:00:00Z", json!(2025)),
        sheet_row("Linus", "Engineer", "Scheduled", "HIGH", "not a date", json!("2024")),
        sheet_row("Barbara", "Analyst", "In Progress", "", "", json!(null)),
    ]);
    decode_response(&body).unwrap()
}

#[test]
fn leaked_header_row_never_reaches_the_pipeline() {
    let records = sample();
    assert_eq!(records.len(), 4);
    assert!(records.iter().all(|r| r.candidate_name != "Candidate Name"));
    assert_eq!(records[2].year, 2024);
    assert_eq!(records[3].year, 0);
}

#[test]
fn status_counts_ignore_case_and_padding() {
    let records: Vec<Record> = sample().into_iter().take(3).collect();
    let kpi = compute_kpis_at(&records, today());
    assert_eq!(kpi.total, 3);
    assert_eq!(kpi.completed, 2);
    assert_eq!(kpi.scheduled, 1);
    assert_eq!(kpi.in_progress + kpi.accepted + kpi.rejected, 0);
    assert_eq!(kpi.high_priority, 2);
    // Ages 3 and 9; Linus has no usable date.
    assert_eq!(kpi.median_age_days, Some(6));
}

#[test]
fn kpi_statuses_never_exceed_total() {
    let records = sample();
    for spec in [
        FilterSpec::default(),
        FilterSpec::default().with_role("Engineer"),
        FilterSpec::default().with_query("acme"),
        FilterSpec::default().with_year(2030),
    ] {
        let subset = filter_records(&records, &spec);
        let kpi = compute_kpis_at(&subset, today());
        assert_eq!(kpi.total, subset.len());
        assert!(
            kpi.completed + kpi.in_progress + kpi.scheduled + kpi.accepted + kpi.rejected
                <= kpi.total
        );
    }
}

#[test]
fn medians_round_half_up() {
    assert_eq!(median(&mut [3]), Some(3));
    assert_eq!(median(&mut [4, 2]), Some(3));
    assert_eq!(median(&mut [8, 1, 4, 2]), Some(3));
    assert_eq!(median(&mut [1, 2]), Some(2));
    assert_eq!(median(&mut []), None);
}

#[test]
fn filtering_is_idempotent_and_order_preserving() {
    let records = sample();
    let spec = FilterSpec::default().with_query("e");
    let once = filter_records(&records, &spec);
    let twice = filter_records(&once, &spec);
    assert_eq!(once, twice);

    let positions: Vec<usize> = once
        .iter()
        .map(|r| records.iter().position(|x| x == r).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn grouped_counts_cover_the_subset() {
    let records = sample();
    let statuses = by_status(&records);
    assert_eq!(statuses.iter().map(|b| b.value).sum::<usize>(), records.len());
    assert!(statuses.windows(2).all(|w| w[0].value >= w[1].value));

    let roles = by_role(&records);
    assert_eq!(roles[0].name, "Engineer");
    assert_eq!(roles[0].value, 2);

    let months: Vec<String> = by_month(&records).into_iter().map(|b| b.name).collect();
    assert_eq!(months, vec!["0-March", "2024-March", "2025-March"]);
}

#[test]
fn options_come_from_the_full_set() {
    let records = sample();
    let options = OptionSets::from_records(&records);
    assert_eq!(options.roles, vec!["Analyst", "Engineer", "Manager"]);
    assert_eq!(options.years, vec![2024, 2025]);
    assert!(!options.priorities.contains(&String::new()));

    let state = DashboardState::default()
        .with_records(records, Local::now())
        .with_filters(FilterSpec::default().with_role("Analyst"));
    let view = DashboardView::build(&state, today());
    assert_eq!(view.filtered_rows, 1);
    assert_eq!(view.options, options);
}
