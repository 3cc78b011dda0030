//! Ordered list of workshop maps persisted as `maplist.json`.

use std::{collections::HashSet, fs, path::Path};

use anyhow::{Context, Result};
use tracing::warn;

use crate::models::{MapEntry, RawMapEntry, WorkshopId};

/// In-memory catalog of workshop maps, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<MapEntry>,
}

impl Catalog {
    /// Build a catalog from entries, dropping duplicate ids after the first.
    pub fn new(entries: impl IntoIterator<Item = MapEntry>) -> Self {
        let mut seen = HashSet::new();
        let mut kept = Vec::new();
        for entry in entries {
            if !seen.insert(entry.workshop_id) {
                warn!(
                    "Duplicate workshop map {} in maplist, keeping the first entry",
                    entry.workshop_id
                );
                continue;
            }
            kept.push(entry);
        }
        Self { entries: kept }
    }

    /// Load the catalog from the given path, returning `None` if it does not exist.
    ///
    /// The file is parsed as JSON5, so comments and trailing commas are accepted.
    /// Records with a non-positive id are skipped.
    pub fn load(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read maplist {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to parse maplist {}", path.display()))
            .map(Some)
    }

    /// Parse catalog records from JSON5 text.
    pub fn parse(contents: &str) -> Result<Self> {
        let raw: Vec<RawMapEntry> = json5::from_str(contents)?;
        let total = raw.len();
        let entries: Vec<MapEntry> = raw
            .into_iter()
            .filter_map(RawMapEntry::into_entry)
            .collect();
        let dropped = total - entries.len();
        if dropped > 0 {
            warn!("Ignoring {dropped} maplist entries without a workshop id");
        }
        Ok(Self::new(entries))
    }

    /// Rewrite the whole catalog to the given file, creating parent directories if needed.
    pub fn persist(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create maplist directory {}", parent.display())
            })?;
        }

        let serialized =
            serde_json::to_string_pretty(&self.entries).context("failed to serialize maplist")?;
        fs::write(path, serialized)
            .with_context(|| format!("failed to write maplist {}", path.display()))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &MapEntry> {
        self.entries.iter()
    }

    /// Entries with a known level name, in catalog order.
    pub fn resolved(&self) -> impl Iterator<Item = &MapEntry> {
        self.entries.iter().filter(|entry| entry.is_resolved())
    }

    /// Look up an entry by workshop id.
    pub fn get(&self, workshop_id: WorkshopId) -> Option<&MapEntry> {
        self.entries
            .iter()
            .find(|entry| entry.workshop_id == workshop_id)
    }

    /// First entry whose resolved name matches `name`, ignoring case.
    pub fn find_by_name(&self, name: &str) -> Option<&MapEntry> {
        self.entries.iter().find(|entry| entry.matches_name(name))
    }

    /// Record the resolved level name for an entry. Returns `false` for unknown ids.
    pub(crate) fn set_map_name(&mut self, workshop_id: WorkshopId, name: &str) -> bool {
        match self
            .entries
            .iter_mut()
            .find(|entry| entry.workshop_id == workshop_id)
        {
            Some(entry) => {
                entry.map_name = Some(name.to_string());
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parses_lenient_json() -> Result<()> {
        let catalog = Catalog::parse(
            r#"[
                // resolved already
                { "WorkshopId": 3070244931, "MapName": "de_dust_ws", },
                { "workshopId": 100, "mapName": null },
                { "WorkshopId": 0, "MapName": "placeholder" },
                { "WorkshopId": -5 },
                { "WorkshopId": 100, "MapName": "duplicate" },
            ]"#,
        )?;

        assert_eq!(catalog.len(), 2);
        let ids: Vec<_> = catalog.iter().map(|entry| entry.workshop_id).collect();
        assert_eq!(ids, vec![3070244931, 100]);
        assert_eq!(catalog.get(100).and_then(|e| e.map_name.clone()), None);
        assert_eq!(catalog.resolved().count(), 1);
        Ok(())
    }

    #[test]
    fn missing_file_is_none() -> Result<()> {
        let dir = tempdir()?;
        assert!(Catalog::load(dir.path().join("maplist.json"))?.is_none());
        Ok(())
    }

    #[test]
    fn malformed_file_is_an_error() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("maplist.json");
        fs::write(&path, "{ not a list")?;
        assert!(Catalog::load(&path).is_err());
        Ok(())
    }

    #[test]
    fn persist_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("configs/wsmaps/maplist.json");
        let mut catalog = Catalog::new(vec![MapEntry::new(100), MapEntry::new(200)]);
        assert!(catalog.set_map_name(200, "cs_office_ws"));
        assert!(!catalog.set_map_name(300, "nope"));

        catalog.persist(&path)?;
        let written = fs::read_to_string(&path)?;
        assert!(written.contains("\"WorkshopId\": 100"));
        assert!(written.contains("\"MapName\": null"));

        let loaded = Catalog::load(&path)?.expect("catalog should exist");
        assert_eq!(loaded, catalog);
        Ok(())
    }

    #[test]
    fn finds_entries_by_name() {
        let catalog = Catalog::new(vec![MapEntry::new(1), MapEntry::resolved(2, "de_Inferno_WS")]);
        assert_eq!(
            catalog.find_by_name("de_inferno_ws").map(|e| e.workshop_id),
            Some(2)
        );
        assert!(catalog.find_by_name("de_nuke").is_none());
    }
}
