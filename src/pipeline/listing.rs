// src/pipeline/listing.rs

//! Option listing for one cascade level.

use std::io::Write;

use crate::error::Result;
use crate::models::{CascadeLevel, Selection};
use crate::services::Portal;

/// Heading printed above a listing.
pub fn listing_heading(level: CascadeLevel) -> &'static str {
    match level {
        CascadeLevel::Region => "Régions disponibles :",
        CascadeLevel::Department => "Départements disponibles pour cette région :",
        CascadeLevel::Commune => "Communes disponibles pour ce département :",
        CascadeLevel::Network => "Réseaux disponibles pour cette commune :",
    }
}

/// Write the options of `level` as `id: label` lines.
pub fn run_listing<P, W>(portal: &P, level: CascadeLevel, selection: &Selection, out: &mut W) -> Result<()>
where
    P: Portal + ?Sized,
    W: Write,
{
    let options = portal.list_options(level, selection)?;
    log::debug!("{} {} options", options.len(), level);

    writeln!(out, "{}", listing_heading(level))?;
    for (id, label) in &options {
        writeln!(out, "{}: {}", id, label)?;
    }
    Ok(())
}
