//! Shared domain models.

use serde::{Deserialize, Serialize};

/// Published file identifier assigned by the workshop.
pub type WorkshopId = u64;

/// One workshop-hosted map tracked by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MapEntry {
    /// Stable workshop identifier.
    pub workshop_id: WorkshopId,
    /// Level name reported by the server once the content has loaded.
    pub map_name: Option<String>,
}

impl MapEntry {
    /// Create an entry whose level name is not known yet.
    pub fn new(workshop_id: WorkshopId) -> Self {
        Self {
            workshop_id,
            map_name: None,
        }
    }

    /// Create an entry with an already resolved level name.
    pub fn resolved(workshop_id: WorkshopId, map_name: impl Into<String>) -> Self {
        Self {
            workshop_id,
            map_name: Some(map_name.into()),
        }
    }

    /// Whether a non-empty level name has been recorded.
    pub fn is_resolved(&self) -> bool {
        self.resolved_name().is_some()
    }

    /// The recorded level name, ignoring empty strings.
    pub fn resolved_name(&self) -> Option<&str> {
        self.map_name.as_deref().filter(|name| !name.is_empty())
    }

    /// Case-insensitive comparison against the resolved level name.
    pub fn matches_name(&self, name: &str) -> bool {
        self.resolved_name()
            .map(|resolved| resolved.eq_ignore_ascii_case(name))
            .unwrap_or(false)
    }
}

/// On-disk shape of a catalog record before validation.
///
/// Ids are read signed so that placeholder rows (`0`, negatives) can be
/// detected and dropped instead of failing the whole file.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawMapEntry {
    #[serde(
        rename = "WorkshopId",
        alias = "workshopId",
        alias = "workshop_id",
        alias = "workshopid",
        default
    )]
    pub workshop_id: i64,
    #[serde(
        rename = "MapName",
        alias = "mapName",
        alias = "map_name",
        alias = "mapname",
        default
    )]
    pub map_name: Option<String>,
}

impl RawMapEntry {
    pub(crate) fn into_entry(self) -> Option<MapEntry> {
        if self.workshop_id <= 0 {
            return None;
        }
        Some(MapEntry {
            workshop_id: self.workshop_id as WorkshopId,
            map_name: self.map_name,
        })
    }
}
