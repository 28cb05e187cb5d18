//! Service layer for portal access and report extraction.
//!
//! - `Portal`: the cascade queries and the search request
//! - `FormSession`: the live HTTP implementation of `Portal`
//! - `ReportParser`: classifies a result page and extracts its report
//! - `ReportPaginator`: walks the results of one search target

mod cascade;
mod paginator;
mod parser;
mod session;

pub use cascade::validate_selection;
pub use paginator::ReportPaginator;
pub use parser::{BlockReportParser, ReportParser, parse_sampling_date};
pub use session::{FormSession, parse_regions, parse_select_options};

use crate::error::Result;
use crate::models::{CascadeLevel, OptionMap, ResultPage, SearchTarget, Selection};

/// Everything the downloader needs from the water-quality portal.
///
/// Calls must be issued in cascade order within one session, since each
/// response depends on the selections submitted before it.
pub trait Portal {
    /// Regions offered by the portal.
    fn list_regions(&self) -> Result<OptionMap>;

    /// Departments of a region.
    fn list_departments(&self, region: &str) -> Result<OptionMap>;

    /// Communes of a department.
    fn list_communes(&self, region: &str, department: &str) -> Result<OptionMap>;

    /// Distribution networks serving a commune.
    fn list_networks(&self, region: &str, department: &str, commune: &str) -> Result<OptionMap>;

    /// Result page at a zero-based position for a search target.
    fn fetch_result_page(&self, target: &SearchTarget, position: usize) -> Result<ResultPage>;

    /// Options of `level`, given the levels above it in `selection`.
    fn list_options(&self, level: CascadeLevel, selection: &Selection) -> Result<OptionMap> {
        selection.require_parents(level)?;
        let field = |level: CascadeLevel| selection.get(level).unwrap_or_default();
        let region = field(CascadeLevel::Region);
        let department = field(CascadeLevel::Department);
        let commune = field(CascadeLevel::Commune);
        match level {
            CascadeLevel::Region => self.list_regions(),
            CascadeLevel::Department => self.list_departments(region),
            CascadeLevel::Commune => self.list_communes(region, department),
            CascadeLevel::Network => self.list_networks(region, department, commune),
        }
    }
}
