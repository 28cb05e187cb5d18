//! Report export sinks.
//!
//! Each format writes into its own subtree, keyed by the sampling date:
//!
//! ```text
//! {root}/
//! ├── HTML/
//! │   └── 2024/
//! │       └── 2024-03-01_143000.html
//! ├── PDF/
//! │   └── 2024/
//! │       └── 2024-03-01_143000.pdf
//! └── JSON/
//!     └── 2024/
//!         └── 2024-03-01_143000.json
//! ```
//!
//! Exporting the same report again overwrites the previous file.

mod sink;

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::Report;

pub use sink::ExportSink;

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Html,
    Pdf,
    Json,
}

impl ExportFormat {
    /// Directory holding this format's files.
    pub fn prefix(&self) -> &'static str {
        match self {
            ExportFormat::Html => "HTML",
            ExportFormat::Pdf => "PDF",
            ExportFormat::Json => "JSON",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Html => "html",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Json => "json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Writes each report with every configured sink.
#[derive(Debug, Clone, Default)]
pub struct ReportExporter {
    sinks: Vec<ExportSink>,
}

impl ReportExporter {
    /// One sink per distinct format, rooted at `root`.
    pub fn new(root: &Path, formats: &[ExportFormat], renderer: &str) -> Self {
        let formats: BTreeSet<_> = formats.iter().copied().collect();
        Self {
            sinks: formats
                .into_iter()
                .map(|format| ExportSink::new(format, root, renderer))
                .collect(),
        }
    }

    /// An exporter without sinks: reports are processed but nothing is written.
    pub fn dry_run() -> Self {
        Self::default()
    }

    pub fn is_dry_run(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn sinks(&self) -> &[ExportSink] {
        &self.sinks
    }

    /// Export a report in all configured formats, returning the written files.
    pub fn export(&self, report: &Report) -> Result<Vec<PathBuf>> {
        self.sinks.iter().map(|sink| sink.export(report)).collect()
    }
}
