//! Module entry point wiring the cycler, switcher and exporters to the host.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::{
    catalog::Catalog,
    commands::{CommandAction, OperatorCommand},
    config::{ModuleConfig, ModulePaths},
    cycler::{CompletionHook, DownloadCycler},
    default_map::DefaultMapSelector,
    export::{write_gamemodes_logged, write_mapmanager_list_logged, ArtifactWriter},
    host::{DownloadResult, HostAdapter, HostCommand, TimerToken},
    models::WorkshopId,
    switcher::EmptyServerSwitcher,
};

/// Map group generated for workshop maps.
pub const WORKSHOP_MAPGROUP: &str = "workshop";

/// Workshop map downloader module.
///
/// Owns the catalog through the cycler; exporters and the switcher only
/// ever see it by shared reference.
pub struct WsMapsModule {
    writer: Arc<dyn ArtifactWriter>,
    config: ModuleConfig,
    cycler: DownloadCycler,
    switcher: Option<EmptyServerSwitcher>,
    selector: DefaultMapSelector,
}

impl WsMapsModule {
    /// Load the catalog and settings from `paths` and build the module.
    ///
    /// Missing or broken files are logged and treated as empty.
    pub fn init(
        paths: &ModulePaths,
        host: Arc<dyn HostAdapter>,
        writer: Arc<dyn ArtifactWriter>,
    ) -> Self {
        let catalog_path = paths.maplist_path();
        let catalog = match Catalog::load(&catalog_path) {
            Ok(Some(catalog)) => {
                info!("Loaded {} workshop maps from maplist.json", catalog.len());
                catalog
            }
            Ok(None) => {
                warn!(
                    "maplist.json not found at {}, no workshop maps to manage",
                    catalog_path.display()
                );
                Catalog::default()
            }
            Err(err) => {
                error!("Failed to parse maplist.json: {err:#}");
                Catalog::default()
            }
        };

        let config = ModuleConfig::load_or_default(paths.config_path());
        config.log_enabled_features();

        Self::new(catalog, config, host, writer)
    }

    /// Build the module from an already loaded catalog and settings.
    pub fn new(
        catalog: Catalog,
        config: ModuleConfig,
        host: Arc<dyn HostAdapter>,
        writer: Arc<dyn ArtifactWriter>,
    ) -> Self {
        let on_complete = workshop_mapgroup_hook(Arc::clone(&host), Arc::clone(&writer));
        let cycler = DownloadCycler::new(
            Arc::clone(&host),
            Arc::clone(&writer),
            catalog,
            config.cycle_timeout,
            on_complete,
        );
        let switcher = config
            .empty_map_switcher
            .then(|| EmptyServerSwitcher::new(Arc::clone(&host), config.switcher_interval));
        let selector = DefaultMapSelector::from_config(&config);

        Self {
            writer,
            config,
            cycler,
            switcher,
            selector,
        }
    }

    /// Start background timers and return the commands to register.
    pub fn post_init(&mut self) -> &'static [OperatorCommand] {
        if let Some(switcher) = self.switcher.as_mut() {
            switcher.start();
        }
        &OperatorCommand::ALL
    }

    /// Cancel every timer owned by the module.
    pub fn shutdown(&mut self) {
        if let Some(switcher) = self.switcher.as_mut() {
            switcher.stop();
        }
        self.cycler.cleanup();
    }

    /// Read-only view of the catalog.
    pub fn catalog(&self) -> &Catalog {
        self.cycler.catalog()
    }

    /// The download cycler.
    pub fn cycler(&self) -> &DownloadCycler {
        &self.cycler
    }

    /// Settings the module was built with.
    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }

    /// Whether the empty-server switcher has a tick scheduled.
    pub fn switcher_running(&self) -> bool {
        self.switcher
            .as_ref()
            .map(EmptyServerSwitcher::is_running)
            .unwrap_or(false)
    }

    /// A level finished loading.
    pub fn on_server_activate(&mut self) {
        if self.catalog().is_empty() {
            return;
        }

        let default_map = self
            .selector
            .resolve(self.cycler.catalog(), &mut rand::rng());
        self.cycler.on_world_loaded(default_map.as_deref());
    }

    /// A workshop item finished installing.
    pub fn on_item_installed(&mut self, workshop_id: WorkshopId) {
        info!("Workshop map {workshop_id} installed");
    }

    /// The host reported the outcome of a workshop download.
    pub fn on_download_item_result(&mut self, workshop_id: WorkshopId, result: DownloadResult) {
        match result {
            DownloadResult::Success => {
                info!("Workshop map {workshop_id} download succeeded");
            }
            DownloadResult::Failed(reason) => {
                error!("Workshop map {workshop_id} download failed: {reason}");
                self.cycler.on_download_failed(workshop_id);
            }
        }
    }

    /// A scheduled timer fired.
    pub fn on_timer(&mut self, token: TimerToken) {
        match token {
            TimerToken::CycleTimeout {
                workshop_id,
                generation,
            } => self.cycler.on_timeout(workshop_id, generation),
            TimerToken::EmptyServerSwitch { generation } => {
                if let Some(switcher) = self.switcher.as_mut() {
                    switcher.on_tick(
                        generation,
                        self.cycler.is_cycling(),
                        self.cycler.catalog(),
                    );
                }
            }
        }
    }

    /// Run one of the module's console commands.
    pub fn run_command(&mut self, command: OperatorCommand) -> CommandAction {
        match command {
            OperatorCommand::ForceDownload => {
                if self.catalog().is_empty() {
                    warn!("No workshop maps configured");
                    return CommandAction::Stopped;
                }
                info!(
                    "Force downloading all {} workshop maps",
                    self.catalog().len()
                );
                self.cycler.force_download_all();
            }
            OperatorCommand::Gamemodes => {
                write_gamemodes_logged(self.writer.as_ref(), self.cycler.catalog());
            }
            OperatorCommand::Maplist => {
                write_mapmanager_list_logged(self.writer.as_ref(), self.cycler.catalog());
            }
        }
        CommandAction::Stopped
    }

    /// Dispatch a console command by name; names owned by others pass through.
    pub fn handle_console_command(&mut self, name: &str) -> CommandAction {
        match OperatorCommand::from_name(name) {
            Ok(command) => self.run_command(command),
            Err(_) => CommandAction::Continue,
        }
    }
}

fn workshop_mapgroup_hook(
    host: Arc<dyn HostAdapter>,
    writer: Arc<dyn ArtifactWriter>,
) -> CompletionHook {
    Box::new(move |catalog: &Catalog, _owes_map_change: bool| {
        write_gamemodes_logged(writer.as_ref(), catalog);
        host.execute(HostCommand::MapGroup(WORKSHOP_MAPGROUP.to_string()));
        info!("Set mapgroup to {WORKSHOP_MAPGROUP}");
    })
}
