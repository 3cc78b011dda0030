#![warn(clippy::all, missing_docs)]

//! Core logic for the workshop map downloader.
//!
//! This crate hosts the catalog model, the download cycle state machine,
//! the empty-server switcher, settings handling and the files generated
//! from the catalog. The game server is reached only through the
//! [`host::HostAdapter`] trait supplied by the embedding process.

pub mod catalog;
pub mod commands;
pub mod config;
pub mod cycler;
pub mod default_map;
pub mod export;
pub mod host;
pub mod models;
pub mod module;
pub mod switcher;

#[cfg(test)]
pub(crate) mod test_support;

pub use catalog::Catalog;
pub use commands::{CommandAction, CommandError, OperatorCommand};
pub use config::{ModuleConfig, ModulePaths};
pub use cycler::DownloadCycler;
pub use default_map::DefaultMapSelector;
pub use export::{ArtifactWriter, ExportOutcome, FileArtifactWriter};
pub use host::{
    DownloadResult, HostAdapter, HostCommand, ItemState, Scheduler, TimerHandle, TimerToken,
};
pub use models::{MapEntry, WorkshopId};
pub use module::WsMapsModule;
pub use switcher::EmptyServerSwitcher;
