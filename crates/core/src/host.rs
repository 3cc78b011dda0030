//! Boundary to the game server hosting the module.
//!
//! The core never talks to the engine directly. Everything it needs
//! (item install state, the active level, console commands, one-shot
//! timers) goes through [`HostAdapter`], which the embedding process
//! supplies at construction time.

use std::{fmt, time::Duration};

use crate::models::WorkshopId;

/// Opaque handle to a scheduled one-shot timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub u64);

/// Identity carried by a scheduled timer and handed back when it fires.
///
/// Owners compare the generation against the timer they currently consider
/// armed, so a fire that raced a cancellation is recognised and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerToken {
    /// Per-entry download timeout armed by the cycler.
    CycleTimeout {
        /// Entry the timeout was armed for.
        workshop_id: WorkshopId,
        /// Arm counter at the time of scheduling.
        generation: u64,
    },
    /// Periodic empty-server reload check.
    EmptyServerSwitch {
        /// Arm counter at the time of scheduling.
        generation: u64,
    },
}

/// One-shot timer facility provided by the host runtime.
pub trait Scheduler {
    /// Fire `token` back into the module after `delay`.
    fn schedule(&self, delay: Duration, token: TimerToken) -> TimerHandle;

    /// Cancel a pending timer. Unknown or already fired handles are ignored.
    fn cancel(&self, handle: TimerHandle);
}

/// Everything the module asks of the game server.
pub trait HostAdapter: Scheduler + Send + Sync {
    /// Install state of a workshop item.
    fn item_state(&self, workshop_id: WorkshopId) -> ItemState;

    /// Name of the currently active level, if any.
    fn current_map(&self) -> Option<String>;

    /// Number of connected human clients.
    fn connected_clients(&self) -> usize;

    /// Run a server console command.
    fn execute(&self, command: HostCommand);
}

/// Console commands issued by the module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    /// Download (if needed) and host a workshop item.
    HostWorkshopMap(WorkshopId),
    /// Reload a level that lives in workshop content.
    WorkshopChangeLevel(String),
    /// Change to a stock level.
    ChangeLevel(String),
    /// Select the active map group.
    MapGroup(String),
}

impl fmt::Display for HostCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostCommand::HostWorkshopMap(id) => write!(f, "host_workshop_map {id}"),
            HostCommand::WorkshopChangeLevel(map) => write!(f, "ds_workshop_changelevel {map}"),
            HostCommand::ChangeLevel(map) => write!(f, "changelevel {map}"),
            HostCommand::MapGroup(group) => write!(f, "mapgroup {group}"),
        }
    }
}

/// Outcome of a workshop download reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadResult {
    /// The item finished downloading.
    Success,
    /// The download failed with the host's reason code.
    Failed(String),
}

impl DownloadResult {
    /// Whether the download succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, DownloadResult::Success)
    }
}

/// Workshop item state flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ItemState(u32);

impl ItemState {
    /// No flags set; the item is unknown to the server.
    pub const NONE: Self = Self(0);
    /// The server is subscribed to the item.
    pub const SUBSCRIBED: Self = Self(1);
    /// Legacy workshop item.
    pub const LEGACY: Self = Self(2);
    /// Item content is installed locally.
    pub const INSTALLED: Self = Self(4);
    /// A newer version is available.
    pub const NEEDS_UPDATE: Self = Self(8);
    /// A download is running.
    pub const DOWNLOADING: Self = Self(16);
    /// A download has been queued.
    pub const DOWNLOAD_PENDING: Self = Self(32);

    const NAMES: [(Self, &'static str); 6] = [
        (Self::SUBSCRIBED, "subscribed"),
        (Self::LEGACY, "legacy"),
        (Self::INSTALLED, "installed"),
        (Self::NEEDS_UPDATE, "needs-update"),
        (Self::DOWNLOADING, "downloading"),
        (Self::DOWNLOAD_PENDING, "download-pending"),
    ];

    /// Whether every flag in `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether the item content is present on disk.
    pub const fn is_installed(self) -> bool {
        self.contains(Self::INSTALLED)
    }
}

impl std::ops::BitOr for ItemState {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            return f.write_str("none");
        }
        let mut first = true;
        for (flag, name) in Self::NAMES {
            if self.contains(flag) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}
