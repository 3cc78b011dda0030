//! Durable catalog persistence and the derived files generated from it.

use std::{
    fmt::Write as _,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::{catalog::Catalog, config::ModulePaths, models::WorkshopId};

/// Result of generating a derived artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// The file was written with `count` maps.
    Written {
        /// Number of resolved maps included.
        count: usize,
        /// Destination file.
        path: PathBuf,
    },
    /// No map had a resolved name, nothing was written.
    Skipped,
}

/// Writes the catalog and its derived formats.
pub trait ArtifactWriter: Send + Sync {
    /// Rewrite the durable catalog in full.
    fn save_catalog(&self, catalog: &Catalog) -> Result<()>;

    /// Generate the map-group definition consumed by the server's rotation.
    fn write_gamemodes(&self, catalog: &Catalog) -> Result<ExportOutcome>;

    /// Generate the list consumed by the map manager plugin.
    fn write_mapmanager_list(&self, catalog: &Catalog) -> Result<ExportOutcome>;
}

/// Persist the catalog, logging instead of propagating failures.
pub fn save_catalog_logged(writer: &dyn ArtifactWriter, catalog: &Catalog) {
    if let Err(err) = writer.save_catalog(catalog) {
        error!("Failed to save maplist: {err:#}");
    }
}

/// Generate the map-group definition, logging instead of propagating failures.
pub fn write_gamemodes_logged(writer: &dyn ArtifactWriter, catalog: &Catalog) {
    if let Err(err) = writer.write_gamemodes(catalog) {
        error!("Failed to write gamemodes_server.txt: {err:#}");
    }
}

/// Generate the map manager list, logging instead of propagating failures.
pub fn write_mapmanager_list_logged(writer: &dyn ArtifactWriter, catalog: &Catalog) {
    if let Err(err) = writer.write_mapmanager_list(catalog) {
        error!("Failed to write maplist.jsonc: {err:#}");
    }
}

/// [`ArtifactWriter`] backed by files under the module paths.
#[derive(Debug, Clone)]
pub struct FileArtifactWriter {
    maplist_path: PathBuf,
    gamemodes_path: PathBuf,
    mapmanager_path: PathBuf,
}

impl FileArtifactWriter {
    /// Writer targeting the standard file locations.
    pub fn new(paths: &ModulePaths) -> Self {
        Self {
            maplist_path: paths.maplist_path(),
            gamemodes_path: paths.gamemodes_path(),
            mapmanager_path: paths.mapmanager_path(),
        }
    }
}

impl ArtifactWriter for FileArtifactWriter {
    fn save_catalog(&self, catalog: &Catalog) -> Result<()> {
        catalog.persist(&self.maplist_path)?;
        info!(
            "Saved maplist with resolved map names to {}",
            self.maplist_path.display()
        );
        Ok(())
    }

    fn write_gamemodes(&self, catalog: &Catalog) -> Result<ExportOutcome> {
        let names = map_group_names(catalog);
        let Some(contents) = render_map_group(&names) else {
            warn!("No workshop maps with resolved names, cannot generate gamemodes_server.txt");
            return Ok(ExportOutcome::Skipped);
        };

        write_file(&self.gamemodes_path, &contents)?;
        let count = names.len();
        info!(
            "Generated gamemodes_server.txt with {count} maps at {}",
            self.gamemodes_path.display()
        );
        Ok(ExportOutcome::Written {
            count,
            path: self.gamemodes_path.clone(),
        })
    }

    fn write_mapmanager_list(&self, catalog: &Catalog) -> Result<ExportOutcome> {
        let Some(contents) = render_mapmanager_list(catalog)? else {
            warn!("No workshop maps with resolved names. Run ms_wsmaps_download first");
            return Ok(ExportOutcome::Skipped);
        };

        write_file(&self.mapmanager_path, &contents)?;
        let count = catalog.resolved().count();
        info!(
            "Generated maplist.jsonc with {count} maps at {}",
            self.mapmanager_path.display()
        );
        Ok(ExportOutcome::Written {
            count,
            path: self.mapmanager_path.clone(),
        })
    }
}

/// Render the `workshop` map group in KeyValues form, or `None` when nothing is resolved.
///
/// Names containing a double quote cannot be written as KeyValues tokens and are left out.
pub fn render_gamemodes(catalog: &Catalog) -> Option<String> {
    render_map_group(&map_group_names(catalog))
}

fn map_group_names(catalog: &Catalog) -> Vec<&str> {
    catalog
        .resolved()
        .filter_map(|entry| {
            let name = entry.resolved_name()?;
            if name.contains('"') {
                warn!(
                    "Workshop map {} has an unquotable name {name:?}, leaving it out of gamemodes_server.txt",
                    entry.workshop_id
                );
                return None;
            }
            Some(name)
        })
        .collect()
}

fn render_map_group(names: &[&str]) -> Option<String> {
    if names.is_empty() {
        return None;
    }

    let mut out = String::new();
    out.push_str("\"GameModes_Server.txt\"\n");
    out.push_str("{\n");
    out.push_str("    \"mapgroups\"\n");
    out.push_str("    {\n");
    out.push_str("        \"workshop\"\n");
    out.push_str("        {\n");
    out.push_str("            \"name\"    \"workshop\"\n");
    out.push_str("            \"maps\"\n");
    out.push_str("            {\n");
    for name in names {
        // Writing into a String cannot fail.
        let _ = writeln!(out, "                \"{name}\"    \"\"");
    }
    out.push_str("            }\n");
    out.push_str("        }\n");
    out.push_str("    }\n");
    out.push_str("}\n");
    Some(out)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct MapManagerEntry<'a> {
    map_name: &'a str,
    workshop_id: WorkshopId,
    is_workshop_map: bool,
}

/// Render the map manager list as pretty JSON, or `None` when nothing is resolved.
pub fn render_mapmanager_list(catalog: &Catalog) -> Result<Option<String>> {
    let entries: Vec<MapManagerEntry<'_>> = catalog
        .resolved()
        .filter_map(|entry| {
            entry.resolved_name().map(|name| MapManagerEntry {
                map_name: name,
                workshop_id: entry.workshop_id,
                is_workshop_map: true,
            })
        })
        .collect();
    if entries.is_empty() {
        return Ok(None);
    }

    let serialized =
        serde_json::to_string_pretty(&entries).context("failed to serialize map manager list")?;
    Ok(Some(serialized))
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}
