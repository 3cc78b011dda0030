//! Download cycle state machine.
//!
//! Workshop maps can only be fetched by hosting them, so unresolved entries
//! are loaded one after another. Each load reveals the level name, which is
//! written back to the catalog. A single timeout is armed per in-flight
//! entry; a failure or timeout skips the entry for the rest of the cycle.

use std::{collections::VecDeque, sync::Arc, time::Duration};

use tracing::{debug, info, warn};

use crate::{
    catalog::Catalog,
    export::{save_catalog_logged, ArtifactWriter},
    host::{HostAdapter, HostCommand, TimerHandle, TimerToken},
    models::WorkshopId,
};

/// Invoked when a cycle ends. The flag reports whether a map change follows.
pub type CompletionHook = Box<dyn FnMut(&Catalog, bool) + Send>;

#[derive(Debug, Clone, Copy)]
struct ArmedTimeout {
    handle: TimerHandle,
    workshop_id: WorkshopId,
    generation: u64,
}

/// Drives the one-at-a-time download cycle and owns the catalog.
pub struct DownloadCycler {
    host: Arc<dyn HostAdapter>,
    writer: Arc<dyn ArtifactWriter>,
    catalog: Catalog,
    on_complete: CompletionHook,
    cycle_timeout: Duration,
    queue: VecDeque<WorkshopId>,
    current: Option<WorkshopId>,
    return_target: Option<String>,
    timeout: Option<ArmedTimeout>,
    generation: u64,
    cycling: bool,
    has_run_once: bool,
}

impl DownloadCycler {
    /// Create an idle cycler.
    pub fn new(
        host: Arc<dyn HostAdapter>,
        writer: Arc<dyn ArtifactWriter>,
        catalog: Catalog,
        cycle_timeout: Duration,
        on_complete: CompletionHook,
    ) -> Self {
        Self {
            host,
            writer,
            catalog,
            on_complete,
            cycle_timeout,
            queue: VecDeque::new(),
            current: None,
            return_target: None,
            timeout: None,
            generation: 0,
            cycling: false,
            has_run_once: false,
        }
    }

    /// Read-only view of the catalog.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Whether a cycle is in progress.
    pub fn is_cycling(&self) -> bool {
        self.cycling
    }

    /// Entry currently being downloaded.
    pub fn current(&self) -> Option<WorkshopId> {
        self.current
    }

    /// Entries still waiting, in download order.
    pub fn queued(&self) -> impl Iterator<Item = WorkshopId> + '_ {
        self.queue.iter().copied()
    }

    /// Level to return to when the cycle ends.
    pub fn return_target(&self) -> Option<&str> {
        self.return_target.as_deref()
    }

    /// Queue every entry that is missing or has no known level name.
    ///
    /// With nothing to fetch the completion hook runs immediately and, if a
    /// default map was given, the server switches to it.
    pub fn start_missing_downloads(&mut self, default_map: Option<&str>) {
        if self.cycling {
            debug!("Download cycle already running, ignoring scan request");
            return;
        }

        for entry in self.catalog.iter() {
            let state = self.host.item_state(entry.workshop_id);
            let installed = state.is_installed();

            if installed {
                if let Some(name) = entry.resolved_name() {
                    info!(
                        "Workshop map {} ({name}) already installed, skipping",
                        entry.workshop_id
                    );
                    continue;
                }
                info!(
                    "Workshop map {} installed but name unknown, queuing",
                    entry.workshop_id
                );
            } else {
                info!(
                    "Workshop map {} not installed, queuing (state: {state})",
                    entry.workshop_id
                );
            }
            self.queue.push_back(entry.workshop_id);
        }

        let default_map = default_map.filter(|map| !map.is_empty());
        if self.queue.is_empty() {
            info!("All workshop maps are already installed");
            (self.on_complete)(&self.catalog, default_map.is_some());
            if let Some(map) = default_map {
                info!("Changing to default map {map}");
                self.change_to_map(map);
            }
            return;
        }

        self.return_target = default_map
            .map(str::to_string)
            .or_else(|| self.host.current_map());
        info!("{} workshop maps need downloading", self.queue.len());
        self.cycling = true;
        self.advance();
    }

    /// Restart the cycle with every catalog entry, resolved or not.
    pub fn force_download_all(&mut self) {
        self.cancel_timeout();
        self.return_target = self.host.current_map();
        self.queue.clear();
        self.current = None;
        self.queue
            .extend(self.catalog.iter().map(|entry| entry.workshop_id));

        self.cycling = true;
        self.advance();
    }

    /// React to a level becoming active.
    ///
    /// The first activation after construction runs the missing-download scan
    /// instead. Later activations during a cycle record the active level as
    /// the in-flight entry's name and move on.
    pub fn on_world_loaded(&mut self, default_map: Option<&str>) {
        if !self.has_run_once {
            self.has_run_once = true;
            if !self.cycling {
                self.start_missing_downloads(default_map);
                return;
            }
        }

        if !self.cycling {
            return;
        }

        self.cancel_timeout();

        if let Some(workshop_id) = self.current.take() {
            match self.host.current_map().filter(|name| !name.is_empty()) {
                Some(map_name) => {
                    info!("Resolved workshop map {workshop_id} -> {map_name}");
                    if self.catalog.set_map_name(workshop_id, &map_name) {
                        save_catalog_logged(self.writer.as_ref(), &self.catalog);
                    }
                }
                None => warn!("Workshop map {workshop_id} loaded without a level name"),
            }
        }

        self.advance();
    }

    /// Skip the in-flight entry after the host reports its download failed.
    ///
    /// Failures for any other id are ignored.
    pub fn on_download_failed(&mut self, workshop_id: WorkshopId) {
        if !self.cycling || self.current != Some(workshop_id) {
            debug!("Ignoring download failure for workshop map {workshop_id}, not in flight");
            return;
        }

        warn!("Skipping failed workshop map {workshop_id}");
        self.cancel_timeout();
        self.current = None;
        self.advance();
    }

    /// Handle a fired timeout. Stale fires are dropped.
    pub fn on_timeout(&mut self, workshop_id: WorkshopId, generation: u64) {
        let armed = match self.timeout {
            Some(armed) if armed.generation == generation && armed.workshop_id == workshop_id => {
                armed
            }
            _ => {
                debug!("Ignoring stale timeout for workshop map {workshop_id}");
                return;
            }
        };
        if !self.cycling || self.current != Some(armed.workshop_id) {
            debug!("Ignoring stale timeout for workshop map {workshop_id}");
            return;
        }

        self.timeout = None;
        warn!(
            "Workshop map {workshop_id} timed out after {}s, skipping",
            self.cycle_timeout.as_secs()
        );
        self.current = None;
        self.advance();
    }

    /// Cancel the outstanding timeout, if any.
    pub fn cleanup(&mut self) {
        self.cancel_timeout();
    }

    fn advance(&mut self) {
        if let Some(next) = self.queue.pop_front() {
            self.current = Some(next);
            info!(
                "Cycling to workshop map {next}, {} remaining",
                self.queue.len()
            );
            self.host.execute(HostCommand::HostWorkshopMap(next));
            self.arm_timeout(next);
            return;
        }

        self.cycling = false;
        self.current = None;
        save_catalog_logged(self.writer.as_ref(), &self.catalog);

        let return_target = self.return_target.take().filter(|map| !map.is_empty());
        (self.on_complete)(&self.catalog, return_target.is_some());
        info!("Workshop map download cycle complete");

        if let Some(map) = return_target {
            info!("Returning to map {map}");
            self.change_to_map(&map);
        }
    }

    fn change_to_map(&self, map_name: &str) {
        let command = match self.catalog.find_by_name(map_name) {
            Some(entry) => HostCommand::HostWorkshopMap(entry.workshop_id),
            None => HostCommand::ChangeLevel(map_name.to_string()),
        };
        self.host.execute(command);
    }

    fn arm_timeout(&mut self, workshop_id: WorkshopId) {
        self.cancel_timeout();
        self.generation += 1;
        let generation = self.generation;
        let handle = self.host.schedule(
            self.cycle_timeout,
            TimerToken::CycleTimeout {
                workshop_id,
                generation,
            },
        );
        self.timeout = Some(ArmedTimeout {
            handle,
            workshop_id,
            generation,
        });
    }

    fn cancel_timeout(&mut self) {
        if let Some(armed) = self.timeout.take() {
            self.host.cancel(armed.handle);
        }
    }
}
