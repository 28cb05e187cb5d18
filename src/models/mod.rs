// src/models/mod.rs

//! Domain models for the report downloader.
//!
//! Plain data shared by the portal session, the parser, the paginator and
//! the export sinks.

mod config;
mod report;
mod selection;

// Re-export all public types
pub use config::{Config, ExportConfig, ParserConfig, PortalConfig};
pub use report::{PaginationCursor, Report, ResultPage};
pub use selection::{CascadeLevel, OptionMap, SearchTarget, Selection};
