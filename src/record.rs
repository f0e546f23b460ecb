use serde::{Deserialize, Serialize};

/// One candidate-pipeline entry decoded from a feed row.
///
/// String fields default to the empty string and `year` defaults to `0`, so a
/// record never carries "absent" values. Records have no identity beyond their
/// position in the collection; duplicates are counted independently.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub candidate_name: String,
    pub role: String,
    pub client: String,
    pub interview_stage: String,
    pub status: String,
    /// ISO-8601 calendar date such as `2025-01-28`; may be empty or garbage.
    pub submission_date: String,
    pub priority: String,
    pub location: String,
    pub month: String,
    pub year: i32,
}

/// The ten feed columns, A through J, in the order the feed returns them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Column {
    CandidateName,
    Role,
    Client,
    InterviewStage,
    Status,
    SubmissionDate,
    Priority,
    Location,
    Month,
    Year,
}

impl Column {
    pub const ALL: [Column; 10] = [
        Column::CandidateName,
        Column::Role,
        Column::Client,
        Column::InterviewStage,
        Column::Status,
        Column::SubmissionDate,
        Column::Priority,
        Column::Location,
        Column::Month,
        Column::Year,
    ];

    /// Zero-based cell position within a feed row.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Spreadsheet column letter (`A`..`J`).
    pub fn letter(self) -> char {
        (b'A' + self as u8) as char
    }

    /// Header label used in the sheet's first row.
    pub fn header_label(self) -> &'static str {
        match self {
            Column::CandidateName => "Candidate Name",
            Column::Role => "Role",
            Column::Client => "Client",
            Column::InterviewStage => "Interview Stage",
            Column::Status => "Status",
            Column::SubmissionDate => "Submission Date",
            Column::Priority => "Priority",
            Column::Location => "Location",
            Column::Month => "Month",
            Column::Year => "Year",
        }
    }

    /// JSON key of the matching `Record` field.
    pub fn key(self) -> &'static str {
        match self {
            Column::CandidateName => "candidateName",
            Column::Role => "role",
            Column::Client => "client",
            Column::InterviewStage => "interviewStage",
            Column::Status => "status",
            Column::SubmissionDate => "submissionDate",
            Column::Priority => "priority",
            Column::Location => "location",
            Column::Month => "month",
            Column::Year => "year",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Column::ALL.into_iter().find(|c| c.key() == key)
    }
}

impl Record {
    /// Text value of a column; `year` is rendered as decimal.
    pub fn text(&self, column: Column) -> String {
        match column {
            Column::Year => self.year.to_string(),
            other => self.str_field(other).unwrap_or_default().to_string(),
        }
    }

    /// Borrowed string field, or `None` for the numeric `year` column.
    pub fn str_field(&self, column: Column) -> Option<&str> {
        let value = match column {
            Column::CandidateName => &self.candidate_name,
            Column::Role => &self.role,
            Column::Client => &self.client,
            Column::InterviewStage => &self.interview_stage,
            Column::Status => &self.status,
            Column::SubmissionDate => &self.submission_date,
            Column::Priority => &self.priority,
            Column::Location => &self.location,
            Column::Month => &self.month,
            Column::Year => return None,
        };
        Some(value.as_str())
    }
}
