//! Analysis report data structures.

use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::SearchTarget;

/// Raw response of a search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultPage {
    /// Decoded response body
    pub body: String,

    /// Charset the body was decoded with, when fetched over HTTP
    pub charset: Option<String>,
}

impl ResultPage {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            charset: None,
        }
    }
}

/// One parsed water-quality analysis report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Self-contained styled HTML document; not part of the serialized record
    #[serde(skip)]
    pub html: String,

    /// Character encoding declared by the source page
    pub charset: String,

    /// Sampling date and time
    pub sampled_at: NaiveDateTime,

    /// Commune where the sample was taken
    pub commune: String,

    /// Installation name
    pub installation: String,

    /// Public distribution service
    pub distribution_service: String,

    /// Distribution operator
    pub operator: String,

    /// Distribution owner
    pub owner: String,
}

impl Report {
    /// Sampling year, used as the archive directory.
    pub fn archive_year(&self) -> i32 {
        self.sampled_at.year()
    }

    /// File name without extension, e.g. `2024-03-01_143000`.
    pub fn file_stem(&self) -> String {
        self.sampled_at.format("%Y-%m-%d_%H%M%S").to_string()
    }
}

/// Position of a paginator within the results of one search target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationCursor {
    pub target: SearchTarget,
    pub position: usize,
}

impl PaginationCursor {
    pub fn new(target: SearchTarget) -> Self {
        Self {
            target,
            position: 0,
        }
    }

    /// Move to the next result.
    pub fn advance(&mut self) {
        self.position += 1;
    }
}
