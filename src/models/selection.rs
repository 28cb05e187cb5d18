//! Cascade selection state.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Option IDs mapped to their labels for one cascade level.
///
/// Rebuilt on every query; the portal's options depend on the current
/// selection.
pub type OptionMap = BTreeMap<String, String>;

/// The four dependent levels of the portal form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CascadeLevel {
    Region,
    Department,
    Commune,
    Network,
}

impl CascadeLevel {
    /// All levels in dependency order.
    pub const ALL: [CascadeLevel; 4] = [
        CascadeLevel::Region,
        CascadeLevel::Department,
        CascadeLevel::Commune,
        CascadeLevel::Network,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CascadeLevel::Region => "region",
            CascadeLevel::Department => "department",
            CascadeLevel::Commune => "commune",
            CascadeLevel::Network => "network",
        }
    }

    /// The level this one depends on.
    pub fn parent(&self) -> Option<CascadeLevel> {
        match self {
            CascadeLevel::Region => None,
            CascadeLevel::Department => Some(CascadeLevel::Region),
            CascadeLevel::Commune => Some(CascadeLevel::Department),
            CascadeLevel::Network => Some(CascadeLevel::Commune),
        }
    }
}

impl fmt::Display for CascadeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A possibly partial choice of region, department, commune and network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub region: Option<String>,
    pub department: Option<String>,
    pub commune: Option<String>,
    pub network: Option<String>,
}

impl Selection {
    /// The ID chosen at a level, if any.
    pub fn get(&self, level: CascadeLevel) -> Option<&str> {
        match level {
            CascadeLevel::Region => self.region.as_deref(),
            CascadeLevel::Department => self.department.as_deref(),
            CascadeLevel::Commune => self.commune.as_deref(),
            CascadeLevel::Network => self.network.as_deref(),
        }
    }

    /// Fail unless every level above `level` is set.
    pub fn require_parents(&self, level: CascadeLevel) -> Result<()> {
        let mut current = level.parent();
        while let Some(parent) = current {
            if self.get(parent).is_none() {
                return Err(AppError::validation(format!(
                    "a {parent} must be selected before choosing a {level}"
                )));
            }
            current = parent.parent();
        }
        Ok(())
    }

    /// Turn a fully populated selection into a search target.
    pub fn to_target(&self) -> Result<SearchTarget> {
        let field = |level: CascadeLevel| {
            self.get(level)
                .map(str::to_string)
                .ok_or_else(|| AppError::validation(format!("missing {level} selection")))
        };
        Ok(SearchTarget {
            region: field(CascadeLevel::Region)?,
            department: field(CascadeLevel::Department)?,
            commune: field(CascadeLevel::Commune)?,
            network: field(CascadeLevel::Network)?,
        })
    }
}

/// A complete selection, ready to be searched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchTarget {
    pub region: String,
    pub department: String,
    pub commune: String,
    pub network: String,
}

impl fmt::Display for SearchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "region={} department={} commune={} network={}",
            self.region, self.department, self.commune, self.network
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selection(parts: [Option<&str>; 4]) -> Selection {
        let [region, department, commune, network] = parts.map(|p| p.map(str::to_string));
        Selection {
            region,
            department,
            commune,
            network,
        }
    }

    #[test]
    fn test_require_parents() {
        let sel = selection([Some("27"), None, Some("21231"), None]);
        assert!(sel.require_parents(CascadeLevel::Department).is_ok());
        assert!(sel.require_parents(CascadeLevel::Commune).is_err());
        assert!(sel.require_parents(CascadeLevel::Region).is_ok());
    }

    #[test]
    fn test_to_target_requires_all_levels() {
        let partial = selection([Some("27"), Some("021"), Some("21231"), None]);
        assert!(matches!(partial.to_target(), Err(AppError::Validation(_))));

        let full = selection([Some("27"), Some("021"), Some("21231"), Some("021000123")]);
        let target = full.to_target().unwrap();
        assert_eq!(target.network, "021000123");
    }
}
