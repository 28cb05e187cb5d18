// src/services/paginator.rs

//! Sequential walk over the reports of one search target.

use std::iter::FusedIterator;

use crate::error::Result;
use crate::models::{PaginationCursor, Report, SearchTarget};
use crate::services::{Portal, ReportParser};

/// Lazy, finite, forward-only sequence of reports.
///
/// Fetches position 0, 1, 2, ... one at a time and stops at the first page
/// that is not a report. Any other error is yielded once and ends the
/// sequence. A new paginator is needed to scan again.
pub struct ReportPaginator<'a, P: Portal + ?Sized, R: ReportParser + ?Sized> {
    portal: &'a P,
    parser: &'a R,
    cursor: PaginationCursor,
    finished: bool,
}

impl<'a, P: Portal + ?Sized, R: ReportParser + ?Sized> ReportPaginator<'a, P, R> {
    pub fn new(portal: &'a P, parser: &'a R, target: SearchTarget) -> Self {
        Self {
            portal,
            parser,
            cursor: PaginationCursor::new(target),
            finished: false,
        }
    }

    /// Position of the next page to fetch.
    pub fn position(&self) -> usize {
        self.cursor.position
    }
}

impl<P: Portal + ?Sized, R: ReportParser + ?Sized> Iterator for ReportPaginator<'_, P, R> {
    type Item = Result<Report>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let position = self.cursor.position;
        let outcome = self
            .portal
            .fetch_result_page(&self.cursor.target, position)
            .and_then(|page| self.parser.parse(&page));

        match outcome {
            Ok(report) => {
                log::debug!("Parsed report at position {}: {}", position, report.sampled_at);
                self.cursor.advance();
                Some(Ok(report))
            }
            Err(e) if e.is_termination() => {
                log::debug!("No report at position {}, end of results", position);
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

impl<P: Portal + ?Sized, R: ReportParser + ?Sized> FusedIterator for ReportPaginator<'_, P, R> {}
