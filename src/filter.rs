use serde::{Deserialize, Deserializer, Serialize};

use crate::record::Record;

/// Sparse set of active constraints.
///
/// A `None` field means "no constraint". Empty strings and `year == 0` are
/// normalized to `None` by every constructor in this module, so the engine
/// never sees a constraint that would require a field to equal `""`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "non_empty")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "non_empty")]
    pub client: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "non_empty")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "non_empty")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "non_empty")]
    pub month: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "non_zero")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "non_empty")]
    pub q: Option<String>,
}

/// Partial update applied on top of a [`FilterSpec`].
///
/// Each field is tri-state: missing leaves the current constraint alone,
/// `null` or `""` clears it, and any other value replaces it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct FilterPatch {
    #[serde(default, deserialize_with = "patch_text")]
    pub role: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch_text")]
    pub client: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch_text")]
    pub status: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch_text")]
    pub priority: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch_text")]
    pub month: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch_year")]
    pub year: Option<Option<i32>>,
    #[serde(default, deserialize_with = "patch_text")]
    pub q: Option<Option<String>>,
}

fn normalize_text(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn normalize_year(value: Option<i32>) -> Option<i32> {
    value.filter(|y| *y != 0)
}

fn non_empty<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
    Ok(normalize_text(Option::<String>::deserialize(de)?))
}

fn non_zero<'de, D: Deserializer<'de>>(de: D) -> Result<Option<i32>, D::Error> {
    Ok(normalize_year(Option::<i32>::deserialize(de)?))
}

fn patch_text<'de, D: Deserializer<'de>>(de: D) -> Result<Option<Option<String>>, D::Error> {
    Ok(Some(normalize_text(Option::<String>::deserialize(de)?)))
}

fn patch_year<'de, D: Deserializer<'de>>(de: D) -> Result<Option<Option<i32>>, D::Error> {
    Ok(Some(normalize_year(Option::<i32>::deserialize(de)?)))
}

impl FilterSpec {
    pub fn is_empty(&self) -> bool {
        self == &FilterSpec::default()
    }

    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = normalize_text(Some(role.into()));
        self
    }

    #[must_use]
    pub fn with_client(mut self, client: impl Into<String>) -> Self {
        self.client = normalize_text(Some(client.into()));
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = normalize_text(Some(status.into()));
        self
    }

    #[must_use]
    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = normalize_text(Some(priority.into()));
        self
    }

    #[must_use]
    pub fn with_month(mut self, month: impl Into<String>) -> Self {
        self.month = normalize_text(Some(month.into()));
        self
    }

    #[must_use]
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = normalize_year(Some(year));
        self
    }

    #[must_use]
    pub fn with_query(mut self, q: impl Into<String>) -> Self {
        self.q = normalize_text(Some(q.into()));
        self
    }

    /// Produce a new spec with `patch` merged over `self`.
    #[must_use]
    pub fn apply(&self, patch: &FilterPatch) -> FilterSpec {
        fn merge<T: Clone>(current: &Option<T>, update: &Option<Option<T>>) -> Option<T> {
            match update {
                Some(value) => value.clone(),
                None => current.clone(),
            }
        }

        FilterSpec {
            role: normalize_text(merge(&self.role, &patch.role)),
            client: normalize_text(merge(&self.client, &patch.client)),
            status: normalize_text(merge(&self.status, &patch.status)),
            priority: normalize_text(merge(&self.priority, &patch.priority)),
            month: normalize_text(merge(&self.month, &patch.month)),
            year: normalize_year(merge(&self.year, &patch.year)),
            q: normalize_text(merge(&self.q, &patch.q)),
        }
    }

    /// Trimmed, lowercased search needle; `None` when blank.
    pub fn needle(&self) -> Option<String> {
        self.q
            .as_deref()
            .map(|q| q.trim().to_lowercase())
            .filter(|q| !q.is_empty())
    }

    /// Whether a single record satisfies every present constraint.
    pub fn matches(&self, record: &Record) -> bool {
        self.matches_with_needle(record, self.needle().as_deref())
    }

    fn matches_with_needle(&self, record: &Record, needle: Option<&str>) -> bool {
        let equals = |constraint: &Option<String>, field: &str| {
            constraint.as_deref().is_none_or(|wanted| wanted == field)
        };

        if !equals(&self.role, &record.role)
            || !equals(&self.client, &record.client)
            || !equals(&self.status, &record.status)
            || !equals(&self.priority, &record.priority)
            || !equals(&self.month, &record.month)
        {
            return false;
        }
        if self.year.is_some_and(|year| year != record.year) {
            return false;
        }
        match needle {
            Some(needle) => search_haystack(record).contains(needle),
            None => true,
        }
    }
}

/// Lowercased text the free-text query is matched against.
fn search_haystack(record: &Record) -> String {
    [
        record.candidate_name.as_str(),
        record.location.as_str(),
        record.interview_stage.as_str(),
        record.client.as_str(),
        record.role.as_str(),
        record.status.as_str(),
        record.priority.as_str(),
    ]
    .join(" ")
    .to_lowercase()
}

/// Keep the records matching `spec`, preserving their relative order.
pub fn filter_records(records: &[Record], spec: &FilterSpec) -> Vec<Record> {
    if spec.is_empty() {
        return records.to_vec();
    }
    let needle = spec.needle();
    records
        .iter()
        .filter(|record| spec.matches_with_needle(record, needle.as_deref()))
        .cloned()
        .collect()
}
