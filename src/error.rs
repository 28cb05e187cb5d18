// src/error.rs

//! Unified error handling for the report downloader.

use std::fmt;

use thiserror::Error;

use crate::models::CascadeLevel;

/// Result type alias for downloader operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// An expected element is missing from a fetched page
    #[error("Parse error: {0}")]
    Parse(String),

    /// The sampling date of a report matches none of the known formats
    #[error("Unrecognised sampling date '{0}'")]
    Timestamp(String),

    /// The fetched page holds no report. Ends pagination.
    #[error("Page does not contain an analysis report")]
    InvalidReport,

    /// A selected ID is not offered by the portal at its cascade level
    #[error("Unknown {level} '{id}'")]
    UnknownOption { level: CascadeLevel, id: String },

    /// Selection or argument validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// An export sink failed
    #[error("Export error for {context}: {message}")]
    Export { context: String, message: String },
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a parse error for a missing page element.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an export error with context.
    pub fn export(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Export {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Whether this is the end-of-results signal rather than a fault.
    pub fn is_termination(&self) -> bool {
        matches!(self, Self::InvalidReport)
    }

    /// Whether this error stems from user input and deserves a usage message.
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::UnknownOption { .. } | Self::Validation(_))
    }
}
