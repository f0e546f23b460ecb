use serde::Serialize;
use std::collections::HashMap;

use crate::options::locale_cmp;
use crate::record::Record;

/// Number of role buckets kept for the "top roles" view.
pub const TOP_ROLES: usize = 12;

/// One bucket of a frequency table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GroupedCount {
    pub name: String,
    pub value: usize,
}

/// Count records per key, largest bucket first.
///
/// Records whose key is empty are skipped entirely. Buckets with equal counts
/// keep first-seen order, but callers should not rely on that.
pub fn count_by<F>(records: &[Record], key_fn: F) -> Vec<GroupedCount>
where
    F: Fn(&Record) -> String,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut buckets: Vec<GroupedCount> = Vec::new();

    for record in records {
        let key = key_fn(record);
        if key.is_empty() {
            continue;
        }
        match index.get(&key) {
            Some(&slot) => buckets[slot].value += 1,
            None => {
                index.insert(key.clone(), buckets.len());
                buckets.push(GroupedCount {
                    name: key,
                    value: 1,
                });
            }
        }
    }

    buckets.sort_by(|a, b| b.value.cmp(&a.value));
    buckets
}

/// Status mix.
pub fn by_status(records: &[Record]) -> Vec<GroupedCount> {
    count_by(records, |r| r.status.clone())
}

/// The [`TOP_ROLES`] most frequent roles.
pub fn by_role(records: &[Record]) -> Vec<GroupedCount> {
    let mut roles = count_by(records, |r| r.role.clone());
    roles.truncate(TOP_ROLES);
    roles
}

/// Synthesized `"{year}-{month}"` key used for the time series.
pub fn year_month_key(record: &Record) -> String {
    format!("{}-{}", record.year, record.month)
}

/// Pipeline volume per year-month, ordered by key rather than by count.
pub fn by_month(records: &[Record]) -> Vec<GroupedCount> {
    let mut months = count_by(records, year_month_key);
    months.sort_by(|a, b| locale_cmp(&a.name, &b.name));
    months
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(role: &str, status: &str, month: &str, year: i32) -> Record {
        Record {
            role: role.into(),
            status: status.into(),
            month: month.into(),
            year,
            ..Record::default()
        }
    }

    #[test]
    fn empty_keys_are_excluded() {
        let rows = vec![
            row("Engineer", "", "", 0),
            row("", "Completed", "", 0),
            row("Engineer", "Completed", "", 0),
        ];
        let statuses = by_status(&rows);
        assert_eq!(
            statuses,
            vec![GroupedCount {
                name: "Completed".into(),
                value: 2
            }]
        );
        assert!(statuses.iter().all(|bucket| !bucket.name.is_empty()));
    }

    #[test]
    fn buckets_are_non_increasing() {
        let rows: Vec<Record> = ["a", "b", "b", "c", "c", "c", "a", "d"]
            .into_iter()
            .map(|s| row("", s, "", 0))
            .collect();
        let counts = by_status(&rows);
        assert!(counts.windows(2).all(|w| w[0].value >= w[1].value));
        assert_eq!(counts[0].name, "c");
        assert_eq!(counts.iter().map(|c| c.value).sum::<usize>(), rows.len());
    }

    #[test]
    fn roles_are_capped() {
        let rows: Vec<Record> = (0..20).map(|i| row(&format!("role-{i}"), "", "", 0)).collect();
        assert_eq!(by_role(&rows).len(), TOP_ROLES);
    }

    #[test]
    fn months_sort_by_key() {
        let rows = vec![
            row("", "", "March", 2025),
            row("", "", "February", 2025),
            row("", "", "March", 2025),
            row("", "", "December", 2024),
            row("", "", "", 0),
        ];
        let names: Vec<String> = by_month(&rows).into_iter().map(|b| b.name).collect();
        assert_eq!(names, vec!["0-", "2024-December", "2025-February", "2025-March"]);
    }
}
