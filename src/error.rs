use thiserror::Error;

use crate::config::FeedConfig;

/// Feed-level failures. Per-cell problems never surface here: bad cells
/// decode to their column default instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    /// The endpoint answered with a non-success status.
    #[error("Failed to fetch sheet (HTTP {status})")]
    Fetch { status: u16 },
    /// The request never produced a status (DNS, refused connection, timeout).
    #[error("Failed to fetch sheet: {0}")]
    Transport(String),
    /// The body was not a `setResponse(...)` envelope around a JSON table.
    #[error("Failed to decode sheet response: {0}")]
    Decode(String),
}

impl FeedError {
    /// HTTP status carried by a [`FeedError::Fetch`].
    pub fn status(&self) -> Option<u16> {
        match self {
            FeedError::Fetch { status } => Some(*status),
            _ => None,
        }
    }

    /// Remediation hints shown next to the raw error message.
    pub fn remediation_hints(&self, feed: &FeedConfig) -> Vec<String> {
        vec![
            format!(
                "Confirm the tab is published to the web ({}).",
                feed.sheet_name
            ),
            format!(
                "Confirm spreadsheet id {} matches the /d/<ID>/ part of the sheet URL.",
                feed.spreadsheet_id
            ),
            format!(
                "Confirm sheet name \"{}\" matches the tab name exactly.",
                feed.sheet_name
            ),
        ]
    }
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => FeedError::Fetch {
                status: status.as_u16(),
            },
            None => FeedError::Transport(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        FeedError::Decode(err.to_string())
    }
}

pub type FeedResult<T> = Result<T, FeedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_message_carries_status() {
        let err = FeedError::Fetch { status: 404 };
        assert_eq!(err.to_string(), "Failed to fetch sheet (HTTP 404)");
        assert_eq!(err.status(), Some(404));
        assert_eq!(FeedError::Decode("x".into()).status(), None);
    }

    #[test]
    fn hints_name_the_configured_sheet() {
        let feed = FeedConfig::new("sheet-id", "Raw Data");
        let hints = FeedError::Decode("bad".into()).remediation_hints(&feed);
        assert_eq!(hints.len(), 3);
        assert!(hints[0].contains("Raw Data"));
        assert!(hints[1].contains("sheet-id"));
    }
}
