//! File locations and module settings.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use config::{Config, File, FileFormat};
use serde::Deserialize;
use tracing::{error, info};

/// Default per-entry download timeout.
pub const DEFAULT_CYCLE_TIMEOUT: Duration = Duration::from_secs(600);
/// Default interval between empty-server reload checks.
pub const DEFAULT_SWITCHER_INTERVAL: Duration = Duration::from_secs(900);

/// Directory under the user's config directory used when no sharp path is given.
pub const DEFAULT_SHARP_DIR: &str = "wsmaps/sharp";

const DEFAULT_CONFIG_TEMPLATE: &str = r#"// Workshop map downloader settings.
{
    // Level to switch to after the first download scan. Leave blank to stay put.
    "DefaultMap": "",
    // Pick a random resolved workshop map instead of DefaultMap (one-shot).
    "RandomMap": false,
    // Reload the current level every SwitcherIntervalSeconds while nobody is connected.
    "EmptyMapSwitcher": false,
    "CycleTimeoutSeconds": 600,
    "SwitcherIntervalSeconds": 900,
}
"#;

/// Locations of every file the module reads or writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModulePaths {
    /// Root of the modding framework installation.
    pub sharp_path: PathBuf,
    /// Root of the game server installation.
    pub root_path: PathBuf,
}

impl ModulePaths {
    /// Paths for a framework directory, with the server root as its parent.
    pub fn new(sharp_path: impl Into<PathBuf>) -> Self {
        let sharp_path = sharp_path.into();
        let root_path = sharp_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".."));
        Self {
            sharp_path,
            root_path,
        }
    }

    /// Paths with an explicit server root.
    pub fn with_root(sharp_path: impl Into<PathBuf>, root_path: impl Into<PathBuf>) -> Self {
        Self {
            sharp_path: sharp_path.into(),
            root_path: root_path.into(),
        }
    }

    /// Default framework directory under the user's config directory.
    pub fn default_sharp_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_SHARP_DIR)
    }

    fn module_dir(&self) -> PathBuf {
        self.sharp_path.join("configs").join("wsmaps")
    }

    /// Durable catalog.
    pub fn maplist_path(&self) -> PathBuf {
        self.module_dir().join("maplist.json")
    }

    /// Module settings.
    pub fn config_path(&self) -> PathBuf {
        self.module_dir().join("config.json")
    }

    /// Map-group definition read by the server.
    pub fn gamemodes_path(&self) -> PathBuf {
        self.root_path.join("csgo").join("gamemodes_server.txt")
    }

    /// List read by the map manager plugin.
    pub fn mapmanager_path(&self) -> PathBuf {
        self.sharp_path
            .join("configs")
            .join("mapmanager")
            .join("maplist.jsonc")
    }
}

/// Settings read from `config.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleConfig {
    /// One-shot level to switch to on the next activation.
    pub default_map: Option<String>,
    /// One-shot random pick among resolved workshop maps.
    pub random_map: bool,
    /// Periodically reload the level while the server is empty.
    pub empty_map_switcher: bool,
    /// How long to wait for a queued map before skipping it.
    pub cycle_timeout: Duration,
    /// Interval of the empty-server check.
    pub switcher_interval: Duration,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            default_map: None,
            random_map: false,
            empty_map_switcher: false,
            cycle_timeout: DEFAULT_CYCLE_TIMEOUT,
            switcher_interval: DEFAULT_SWITCHER_INTERVAL,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawModuleConfig {
    #[serde(rename = "DefaultMap", alias = "defaultmap", alias = "default_map")]
    default_map: Option<String>,
    #[serde(rename = "RandomMap", alias = "randommap", alias = "random_map")]
    random_map: Option<bool>,
    #[serde(
        rename = "EmptyMapSwitcher",
        alias = "emptymapswitcher",
        alias = "empty_map_switcher"
    )]
    empty_map_switcher: Option<bool>,
    #[serde(
        rename = "CycleTimeoutSeconds",
        alias = "cycletimeoutseconds",
        alias = "cycle_timeout_seconds"
    )]
    cycle_timeout_seconds: Option<u64>,
    #[serde(
        rename = "SwitcherIntervalSeconds",
        alias = "switcherintervalseconds",
        alias = "switcher_interval_seconds"
    )]
    switcher_interval_seconds: Option<u64>,
}

impl From<RawModuleConfig> for ModuleConfig {
    fn from(raw: RawModuleConfig) -> Self {
        Self {
            default_map: raw
                .default_map
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
            random_map: raw.random_map.unwrap_or(false),
            empty_map_switcher: raw.empty_map_switcher.unwrap_or(false),
            cycle_timeout: raw
                .cycle_timeout_seconds
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_CYCLE_TIMEOUT),
            switcher_interval: raw
                .switcher_interval_seconds
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_SWITCHER_INTERVAL),
        }
    }
}

impl ModuleConfig {
    /// Load settings from the given file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Json5).required(false))
            .build()
            .with_context(|| format!("failed to read settings {}", path.display()))?;
        let raw: RawModuleConfig = settings
            .try_deserialize()
            .with_context(|| format!("failed to parse settings {}", path.display()))?;
        Ok(raw.into())
    }

    /// Load settings, logging failures and falling back to the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(err) => {
                error!("Failed to parse config.json: {err:#}");
                Self::default()
            }
        }
    }

    /// Log the optional features that are switched on.
    pub fn log_enabled_features(&self) {
        if let Some(map) = &self.default_map {
            info!("Default map configured: {map}");
        }
        if self.random_map {
            info!("Random default map enabled");
        }
        if self.empty_map_switcher {
            info!(
                "Empty map switcher enabled (interval: {}s)",
                self.switcher_interval.as_secs()
            );
        }
    }
}

/// Write a commented settings template if none exists yet.
pub fn ensure_default_config(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if path.exists() {
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create settings directory {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG_TEMPLATE)
        .with_context(|| format!("failed to write settings {}", path.display()))?;
    info!("Wrote default settings to {}", path.display());
    Ok(())
}
