//! Periodic level reload while the server sits empty.
//!
//! Long idle uptime lets engine state drift, so every interval the current
//! level is reloaded if nobody is connected. The check yields to an active
//! download cycle, which owns level changes while it runs.

use std::{sync::Arc, time::Duration};

use tracing::{debug, info};

use crate::{
    catalog::Catalog,
    host::{HostAdapter, HostCommand, TimerHandle, TimerToken},
};

/// Self-rescheduling empty-server reload timer.
pub struct EmptyServerSwitcher {
    host: Arc<dyn HostAdapter>,
    interval: Duration,
    timer: Option<(TimerHandle, u64)>,
    generation: u64,
}

impl EmptyServerSwitcher {
    /// Create a stopped switcher.
    pub fn new(host: Arc<dyn HostAdapter>, interval: Duration) -> Self {
        Self {
            host,
            interval,
            timer: None,
            generation: 0,
        }
    }

    /// Whether a tick is scheduled.
    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    /// Schedule the first tick, replacing any pending one.
    pub fn start(&mut self) {
        self.schedule_next();
    }

    /// Cancel the pending tick.
    pub fn stop(&mut self) {
        if let Some((handle, _)) = self.timer.take() {
            self.host.cancel(handle);
        }
    }

    /// Handle a fired tick and schedule the next one.
    pub fn on_tick(&mut self, generation: u64, is_cycling: bool, catalog: &Catalog) {
        match self.timer {
            Some((_, armed)) if armed == generation => {}
            _ => {
                debug!("Ignoring stale empty-server tick");
                return;
            }
        }
        self.timer = None;

        if !is_cycling {
            self.reload_if_empty(catalog);
        }

        self.schedule_next();
    }

    fn reload_if_empty(&self, catalog: &Catalog) {
        if self.host.connected_clients() > 0 {
            return;
        }
        let Some(current_map) = self.host.current_map().filter(|map| !map.is_empty()) else {
            return;
        };

        info!("Empty server, reloading map {current_map} to prevent desync");
        let command = if catalog.find_by_name(&current_map).is_some() {
            HostCommand::WorkshopChangeLevel(current_map)
        } else {
            HostCommand::ChangeLevel(current_map)
        };
        self.host.execute(command);
    }

    fn schedule_next(&mut self) {
        self.stop();
        self.generation += 1;
        let generation = self.generation;
        let handle = self
            .host
            .schedule(self.interval, TimerToken::EmptyServerSwitch { generation });
        self.timer = Some((handle, generation));
    }
}
