//! Validation of a selection against the portal's live options.

use crate::error::{AppError, Result};
use crate::models::{CascadeLevel, Selection};
use crate::services::Portal;

/// Check every selected ID against the options offered for its level.
///
/// Levels are queried top-down and the walk stops at the first unknown ID,
/// so no query is issued below a rejected level.
pub fn validate_selection<P: Portal + ?Sized>(portal: &P, selection: &Selection) -> Result<()> {
    for level in CascadeLevel::ALL {
        let Some(id) = selection.get(level) else {
            continue;
        };
        let options = portal.list_options(level, selection)?;
        if !options.contains_key(id) {
            return Err(AppError::UnknownOption {
                level,
                id: id.to_string(),
            });
        }
        log::debug!("Selected {} {}: {}", level, id, options[id]);
    }
    Ok(())
}
