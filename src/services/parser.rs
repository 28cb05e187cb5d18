// src/services/parser.rs

//! Result page classification and report extraction.
//!
//! A result page is a report when one of its content blocks carries the
//! summary heading. Any other page marks the end of the results.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{ParserConfig, Report, ResultPage};
use crate::utils::{elem_text, normalize_whitespace, parse_selector};

/// Sampling date formats tried in order before falling back to the bare date.
const DATETIME_FORMATS: [&str; 2] = ["%d/%m/%Y %Hh%M", "%d/%m/%Y %H:%M"];

/// Number of summary cells read positionally.
const SUMMARY_FIELDS: usize = 6;

static RE_LEADING_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+/\d+/\d+)").expect("invalid regex: leading date"));

static RE_META_CHARSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)charset\s*=\s*["']?([^\s;"']+)"#).expect("invalid regex: meta charset")
});

static RE_TABLE_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<table\b([^>]*)>").expect("invalid regex: table tag"));

static RE_CLASS_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\s+class\s*=\s*("[^"]*"|'[^']*'|[^\s>]+)"#).expect("invalid regex: class")
});

const DOCUMENT_STYLE: &str = "\
.{class} {border-collapse: collapse;margin: 25px 0;font-size: 0.9em;font-family: sans-serif;\
min-width: 400px;box-shadow: 0 0 20px rgba(0, 0, 0, 0.15);}\
.{class} thead tr {background-color: #009879;color: #ffffff;text-align: left;}\
.{class} th,.{class} td {padding: 12px 15px;}\
.{class} tbody tr {border-bottom: 1px solid #dddddd;}\
.{class} tbody tr:nth-of-type(even) {background-color: #f3f3f3;}\
.{class} tbody tr:last-of-type {border-bottom: 2px solid #009879;}";

/// Turns a fetched result page into a [`Report`].
///
/// Implementations return [`AppError::InvalidReport`] when the page holds
/// no report; any other error is a genuine failure.
pub trait ReportParser {
    fn parse(&self, page: &ResultPage) -> Result<Report>;
}

/// Parser matching the portal's `div.block-content` layout.
#[derive(Debug, Clone)]
pub struct BlockReportParser {
    block: Selector,
    info_heading: Selector,
    content_headings: Vec<Selector>,
    cell: Selector,
    meta: Selector,
    table_class: String,
}

impl BlockReportParser {
    /// Compile the configured selectors.
    pub fn new(config: &ParserConfig) -> Result<Self> {
        Ok(Self {
            block: parse_selector(&config.block_selector)?,
            info_heading: parse_selector(&config.info_heading)?,
            content_headings: config
                .content_headings
                .iter()
                .map(|s| parse_selector(s))
                .collect::<Result<_>>()?,
            cell: parse_selector("td")?,
            meta: parse_selector("meta")?,
            table_class: config.table_class.clone(),
        })
    }

    fn has_heading(block: &ElementRef, heading: &Selector) -> bool {
        block.select(heading).next().is_some()
    }

    /// Charset declared by the page's `<meta>` tags.
    fn declared_charset(&self, document: &Html) -> Option<String> {
        document.select(&self.meta).find_map(|meta| {
            let element = meta.value();
            element
                .attr("charset")
                .map(|c| c.trim().to_string())
                .or_else(|| {
                    let content = element.attr("content")?;
                    RE_META_CHARSET
                        .captures(content)
                        .map(|caps| caps[1].to_string())
                })
                .filter(|c| !c.is_empty())
        })
    }

    /// Six summary fields of the first info block, in page order.
    fn summary_cells(&self, block: &ElementRef) -> Result<Vec<String>> {
        let cells: Vec<String> = block
            .select(&self.cell)
            .take(SUMMARY_FIELDS)
            .map(|td| normalize_whitespace(&elem_text(td)))
            .collect();
        if cells.len() < SUMMARY_FIELDS {
            return Err(AppError::parse(format!(
                "report summary has {} cells, expected {}",
                cells.len(),
                SUMMARY_FIELDS
            )));
        }
        Ok(cells)
    }

    /// Self-contained styled document built from the exportable blocks.
    fn assemble_document<'a>(&self, blocks: impl Iterator<Item = ElementRef<'a>>) -> Result<String> {
        let body: Vec<String> = blocks
            .filter(|block| {
                self.content_headings
                    .iter()
                    .any(|heading| Self::has_heading(block, heading))
            })
            .map(|block| {
                RE_TABLE_OPEN
                    .replace_all(&block.html(), |caps: &regex::Captures| {
                        let attrs = RE_CLASS_ATTR.replace_all(&caps[1], "");
                        format!(r#"<table class="{}"{}>"#, self.table_class, attrs)
                    })
                    .into_owned()
            })
            .collect();

        if body.is_empty() {
            return Err(AppError::parse("report page has no exportable content block"));
        }

        Ok(format!(
            "<html><head><META HTTP-EQUIV=\"Content-Type\" CONTENT=\"text/html; charset=UTF-8\">\
             <style>{}</style></head><body>{}</body></html>",
            DOCUMENT_STYLE.replace("{class}", &self.table_class),
            body.concat()
        ))
    }
}

impl ReportParser for BlockReportParser {
    fn parse(&self, page: &ResultPage) -> Result<Report> {
        let document = Html::parse_document(&page.body);

        let info_block = document
            .select(&self.block)
            .find(|block| Self::has_heading(block, &self.info_heading))
            .ok_or(AppError::InvalidReport)?;

        let charset = self
            .declared_charset(&document)
            .or_else(|| page.charset.clone())
            .unwrap_or_else(|| "UTF-8".to_string());

        let mut cells = self.summary_cells(&info_block)?.into_iter();
        let mut next_cell = || cells.next().unwrap_or_default();
        let sampled_at = parse_sampling_date(&next_cell())?;

        Ok(Report {
            html: self.assemble_document(document.select(&self.block))?,
            charset,
            sampled_at,
            commune: next_cell(),
            installation: next_cell(),
            distribution_service: next_cell(),
            operator: next_cell(),
            owner: next_cell(),
        })
    }
}

/// Parse a sampling date such as `01/03/2024 14h30`.
///
/// Accepts `dd/mm/yyyy HHhMM`, `dd/mm/yyyy HH:MM`, and finally a bare
/// `dd/mm/yyyy` (at midnight) with any trailing text ignored.
pub fn parse_sampling_date(raw: &str) -> Result<NaiveDateTime> {
    let raw = raw.trim();
    if let Some(parsed) = DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
    {
        return Ok(parsed);
    }

    RE_LEADING_DATE
        .captures(raw)
        .and_then(|caps| NaiveDate::parse_from_str(&caps[1], "%d/%m/%Y").ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| AppError::Timestamp(raw.to_string()))
}
