//! Recording doubles for the host and artifact writer.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
    time::Duration,
};

use anyhow::{anyhow, Result};
use parking_lot::Mutex;

use crate::{
    catalog::Catalog,
    export::{ArtifactWriter, ExportOutcome},
    host::{HostAdapter, HostCommand, ItemState, Scheduler, TimerHandle, TimerToken},
    models::WorkshopId,
};

#[derive(Default)]
struct HostState {
    states: HashMap<WorkshopId, ItemState>,
    current_map: Option<String>,
    clients: usize,
    commands: Vec<HostCommand>,
    next_handle: u64,
    pending: Vec<(TimerHandle, Duration, TimerToken)>,
    cancelled: Vec<TimerHandle>,
}

/// Host that records commands and timers instead of acting on them.
#[derive(Default)]
pub(crate) struct RecordingHost {
    state: Mutex<HostState>,
}

impl RecordingHost {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_state(&self, workshop_id: WorkshopId, state: ItemState) {
        self.state.lock().states.insert(workshop_id, state);
    }

    pub(crate) fn set_current_map(&self, map: Option<&str>) {
        self.state.lock().current_map = map.map(str::to_string);
    }

    pub(crate) fn set_clients(&self, clients: usize) {
        self.state.lock().clients = clients;
    }

    pub(crate) fn commands(&self) -> Vec<HostCommand> {
        self.state.lock().commands.clone()
    }

    pub(crate) fn pending_timers(&self) -> Vec<(TimerHandle, TimerToken)> {
        self.state
            .lock()
            .pending
            .iter()
            .map(|(handle, _, token)| (*handle, *token))
            .collect()
    }

    pub(crate) fn pending_delays(&self) -> Vec<Duration> {
        self.state
            .lock()
            .pending
            .iter()
            .map(|(_, delay, _)| *delay)
            .collect()
    }

    pub(crate) fn cancelled(&self) -> Vec<TimerHandle> {
        self.state.lock().cancelled.clone()
    }

    /// Drop a pending timer as if it had fired.
    pub(crate) fn fire(&self, token: TimerToken) {
        self.state
            .lock()
            .pending
            .retain(|(_, _, pending)| *pending != token);
    }
}

impl Scheduler for RecordingHost {
    fn schedule(&self, delay: Duration, token: TimerToken) -> TimerHandle {
        let mut state = self.state.lock();
        state.next_handle += 1;
        let handle = TimerHandle(state.next_handle);
        state.pending.push((handle, delay, token));
        handle
    }

    fn cancel(&self, handle: TimerHandle) {
        let mut state = self.state.lock();
        let before = state.pending.len();
        state.pending.retain(|(pending, _, _)| *pending != handle);
        if state.pending.len() != before {
            state.cancelled.push(handle);
        }
    }
}

impl HostAdapter for RecordingHost {
    fn item_state(&self, workshop_id: WorkshopId) -> ItemState {
        self.state
            .lock()
            .states
            .get(&workshop_id)
            .copied()
            .unwrap_or_default()
    }

    fn current_map(&self) -> Option<String> {
        self.state.lock().current_map.clone()
    }

    fn connected_clients(&self) -> usize {
        self.state.lock().clients
    }

    fn execute(&self, command: HostCommand) {
        self.state.lock().commands.push(command);
    }
}

/// Writer that counts calls and keeps the last saved catalog.
#[derive(Default)]
pub(crate) struct RecordingWriter {
    saves: AtomicUsize,
    gamemodes: AtomicUsize,
    mapmanager: AtomicUsize,
    fail_saves: AtomicBool,
    last_saved: Mutex<Option<Catalog>>,
}

impl RecordingWriter {
    pub(crate) fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub(crate) fn gamemodes_writes(&self) -> usize {
        self.gamemodes.load(Ordering::SeqCst)
    }

    pub(crate) fn mapmanager_writes(&self) -> usize {
        self.mapmanager.load(Ordering::SeqCst)
    }

    pub(crate) fn last_saved(&self) -> Option<Catalog> {
        self.last_saved.lock().clone()
    }

    pub(crate) fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

impl ArtifactWriter for RecordingWriter {
    fn save_catalog(&self, catalog: &Catalog) -> Result<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(anyhow!("disk full"));
        }
        *self.last_saved.lock() = Some(catalog.clone());
        Ok(())
    }

    fn write_gamemodes(&self, catalog: &Catalog) -> Result<ExportOutcome> {
        self.gamemodes.fetch_add(1, Ordering::SeqCst);
        Ok(outcome(catalog))
    }

    fn write_mapmanager_list(&self, catalog: &Catalog) -> Result<ExportOutcome> {
        self.mapmanager.fetch_add(1, Ordering::SeqCst);
        Ok(outcome(catalog))
    }
}

fn outcome(catalog: &Catalog) -> ExportOutcome {
    match catalog.resolved().count() {
        0 => ExportOutcome::Skipped,
        count => ExportOutcome::Written {
            count,
            path: "memory".into(),
        },
    }
}
