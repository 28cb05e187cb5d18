//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};
use crate::export::ExportFormat;
use crate::utils::parse_selector;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Portal endpoints and HTTP settings
    #[serde(default)]
    pub portal: PortalConfig,

    /// Export formats and renderer
    #[serde(default)]
    pub export: ExportConfig,

    /// Report page matching rules
    #[serde(default)]
    pub parser: ParserConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("portal.regions_url", &self.portal.regions_url),
            ("portal.menu_url", &self.portal.menu_url),
            ("portal.search_url", &self.portal.search_url),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::config(format!("{name} is empty")));
            }
            Url::parse(value)?;
        }
        if self.portal.program.trim().is_empty() {
            return Err(AppError::config("portal.program is empty"));
        }
        if self.portal.user_agent.trim().is_empty() {
            return Err(AppError::config("portal.user_agent is empty"));
        }
        if self.portal.timeout_secs == Some(0) {
            return Err(AppError::config("portal.timeout_secs must be > 0"));
        }
        if self.export.wkhtmltopdf.trim().is_empty() {
            return Err(AppError::config("export.wkhtmltopdf is empty"));
        }
        self.parser.validate()
    }
}

/// Portal endpoints and HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    /// Informational page listing the regions
    #[serde(default = "defaults::regions_url")]
    pub regions_url: String,

    /// Menu page, also used to prime the session
    #[serde(default = "defaults::menu_url")]
    pub menu_url: String,

    /// Form endpoint for cascade actions and searches
    #[serde(default = "defaults::search_url")]
    pub search_url: String,

    /// Water program code sent as `usd`
    #[serde(default = "defaults::program")]
    pub program: String,

    /// Region used by the bootstrap request
    #[serde(default = "defaults::bootstrap_region")]
    pub bootstrap_region: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds; unset keeps the transport default
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            regions_url: defaults::regions_url(),
            menu_url: defaults::menu_url(),
            search_url: defaults::search_url(),
            program: defaults::program(),
            bootstrap_region: defaults::bootstrap_region(),
            user_agent: defaults::user_agent(),
            timeout_secs: None,
        }
    }
}

/// Export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Formats used when none are given on the command line
    #[serde(default = "defaults::formats")]
    pub formats: Vec<ExportFormat>,

    /// HTML to PDF renderer program
    #[serde(default = "defaults::wkhtmltopdf")]
    pub wkhtmltopdf: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            formats: defaults::formats(),
            wkhtmltopdf: defaults::wkhtmltopdf(),
        }
    }
}

/// CSS selectors used to recognise and slice result pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Content block container
    #[serde(default = "defaults::block_selector")]
    pub block_selector: String,

    /// Heading marking the block holding the report summary
    #[serde(default = "defaults::info_heading")]
    pub info_heading: String,

    /// Headings marking blocks copied into the exported document
    #[serde(default = "defaults::content_headings")]
    pub content_headings: Vec<String>,

    /// Class set on every table of the exported document
    #[serde(default = "defaults::table_class")]
    pub table_class: String,
}

impl ParserConfig {
    /// Check that every selector parses.
    pub fn validate(&self) -> Result<()> {
        std::iter::once(&self.block_selector)
            .chain(std::iter::once(&self.info_heading))
            .chain(self.content_headings.iter())
            .try_for_each(|s| parse_selector(s).map(|_| ()))?;
        if self.content_headings.is_empty() {
            return Err(AppError::config("parser.content_headings is empty"));
        }
        if self.table_class.trim().is_empty() {
            return Err(AppError::config("parser.table_class is empty"));
        }
        Ok(())
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            block_selector: defaults::block_selector(),
            info_heading: defaults::info_heading(),
            content_headings: defaults::content_headings(),
            table_class: defaults::table_class(),
        }
    }
}

mod defaults {
    use crate::export::ExportFormat;

    // Portal defaults
    pub fn regions_url() -> String {
        "https://sante.gouv.fr/sante-et-environnement/eaux/eau".into()
    }
    pub fn menu_url() -> String {
        "https://orobnat.sante.gouv.fr/orobnat/afficherPage.do".into()
    }
    pub fn search_url() -> String {
        "https://orobnat.sante.gouv.fr/orobnat/rechercherResultatQualite.do".into()
    }
    pub fn program() -> String {
        "AEP".into()
    }
    pub fn bootstrap_region() -> String {
        "27".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; orobnat/0.1)".into()
    }

    // Export defaults
    pub fn formats() -> Vec<ExportFormat> {
        vec![ExportFormat::Pdf]
    }
    pub fn wkhtmltopdf() -> String {
        "wkhtmltopdf".into()
    }

    // Parser defaults
    pub fn block_selector() -> String {
        "div.block-content".into()
    }
    pub fn info_heading() -> String {
        "h3.infos".into()
    }
    pub fn content_headings() -> Vec<String> {
        vec!["h3.infos".into(), "h3.common".into(), "h3.params".into()]
    }
    pub fn table_class() -> String {
        "styled-table".into()
    }
}
