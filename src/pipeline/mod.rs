//! Pipeline entry points for the CLI commands.
//!
//! - `run_download`: page through the reports of a search target and export them
//! - `run_listing`: print the options of one cascade level

pub mod download;
pub mod listing;

pub use download::{DownloadSummary, run_download};
pub use listing::{listing_heading, run_listing};
