// src/pipeline/download.rs

//! Report download pipeline.

use std::path::PathBuf;

use crate::error::Result;
use crate::export::ReportExporter;
use crate::models::SearchTarget;
use crate::services::{Portal, ReportPaginator, ReportParser};

/// Outcome of a download run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DownloadSummary {
    /// Reports fetched and parsed
    pub report_count: usize,
    /// Files written across all sinks
    pub files: Vec<PathBuf>,
}

/// Fetch every report for `target` and hand each one to `exporter`.
///
/// Stops at the first fatal error; files already written stay in place.
pub fn run_download<P, R>(
    portal: &P,
    parser: &R,
    target: &SearchTarget,
    exporter: &ReportExporter,
) -> Result<DownloadSummary>
where
    P: Portal + ?Sized,
    R: ReportParser + ?Sized,
{
    log::info!("Downloading reports for {}", target);
    if exporter.is_dry_run() {
        log::info!("Dry run: no file will be written");
    }

    let mut summary = DownloadSummary::default();
    for report in ReportPaginator::new(portal, parser, target.clone()) {
        let report = report?;
        log::info!("Export report: {}", report.sampled_at);
        summary.files.extend(exporter.export(&report)?);
        summary.report_count += 1;
    }

    log::info!(
        "Processed {} reports, wrote {} files",
        summary.report_count,
        summary.files.len()
    );
    Ok(summary)
}
