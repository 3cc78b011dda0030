//! Simulated game server used by the console.
//!
//! Timers run as tokio tasks that post their token back over a channel;
//! the main loop feeds them into the module, so every module call happens
//! on the same task.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use parking_lot::Mutex;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::info;
use wsmaps_core::{
    HostAdapter, HostCommand, ItemState, Scheduler, TimerHandle, TimerToken, WorkshopId,
};

/// Timer fire delivered to the main loop.
pub type TimerFire = (TimerHandle, TimerToken);

#[derive(Debug, Default)]
struct ServerState {
    items: HashMap<WorkshopId, ItemState>,
    current_map: Option<String>,
    clients: usize,
    last_command: Option<HostCommand>,
}

/// In-process stand-in for the game server.
pub struct ConsoleHost {
    state: Mutex<ServerState>,
    timers: Mutex<HashMap<TimerHandle, JoinHandle<()>>>,
    next_handle: AtomicU64,
    fired: mpsc::UnboundedSender<TimerFire>,
}

impl ConsoleHost {
    /// Create a host that reports timer fires on `fired`.
    pub fn new(fired: mpsc::UnboundedSender<TimerFire>) -> Self {
        Self {
            state: Mutex::new(ServerState::default()),
            timers: Mutex::new(HashMap::new()),
            next_handle: AtomicU64::new(1),
            fired,
        }
    }

    /// Report `map` as the active level.
    pub fn set_current_map(&self, map: Option<String>) {
        self.state.lock().current_map = map;
    }

    /// Mark a workshop item with the given state.
    pub fn set_item_state(&self, workshop_id: WorkshopId, state: ItemState) {
        self.state.lock().items.insert(workshop_id, state);
    }

    /// Set the number of connected clients.
    pub fn set_clients(&self, clients: usize) {
        self.state.lock().clients = clients;
    }

    /// Most recent console command issued by the module.
    pub fn last_command(&self) -> Option<HostCommand> {
        self.state.lock().last_command.clone()
    }

    /// Number of timers that have not fired or been cancelled.
    pub fn pending_timers(&self) -> usize {
        self.timers.lock().len()
    }

    /// Drop bookkeeping for a timer that has fired.
    pub fn forget(&self, handle: TimerHandle) {
        self.timers.lock().remove(&handle);
    }
}

impl Scheduler for ConsoleHost {
    fn schedule(&self, delay: Duration, token: TimerToken) -> TimerHandle {
        let handle = TimerHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        let fired = self.fired.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // The receiver only goes away on shutdown.
            let _ = fired.send((handle, token));
        });
        self.timers.lock().insert(handle, task);
        handle
    }

    fn cancel(&self, handle: TimerHandle) {
        if let Some(task) = self.timers.lock().remove(&handle) {
            task.abort();
        }
    }
}

impl HostAdapter for ConsoleHost {
    fn item_state(&self, workshop_id: WorkshopId) -> ItemState {
        self.state
            .lock()
            .items
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
        info!("> {command}");
        self.state.lock().last_command = Some(command);
    }
}
