//! Operator console commands.

use std::{fmt, str::FromStr};

use thiserror::Error;

/// Errors raised while parsing operator commands.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    /// The name does not belong to this module.
    #[error("unknown command `{0}`")]
    Unknown(String),
}

/// What the host command pipeline should do after a handler ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandAction {
    /// Let other handlers see the command.
    Continue,
    /// The command was consumed.
    Stopped,
}

/// Console commands registered by the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorCommand {
    /// Re-download and re-resolve every catalog entry.
    ForceDownload,
    /// Regenerate `gamemodes_server.txt`.
    Gamemodes,
    /// Regenerate the map manager list.
    Maplist,
}

impl OperatorCommand {
    /// Every command, in registration order.
    pub const ALL: [OperatorCommand; 3] = [
        OperatorCommand::ForceDownload,
        OperatorCommand::Gamemodes,
        OperatorCommand::Maplist,
    ];

    /// Console name.
    pub fn name(self) -> &'static str {
        match self {
            OperatorCommand::ForceDownload => "ms_wsmaps_download",
            OperatorCommand::Gamemodes => "ms_wsmaps_gamemodes",
            OperatorCommand::Maplist => "ms_wsmaps_maplist",
        }
    }

    /// Help text shown by the console.
    pub fn description(self) -> &'static str {
        match self {
            OperatorCommand::ForceDownload => "Force re-download all workshop maps",
            OperatorCommand::Gamemodes => "Generate gamemodes_server.txt with workshop maps",
            OperatorCommand::Maplist => "Generate maplist.jsonc for MapManager with workshop maps",
        }
    }

    /// Look a command up by its console name, ignoring case.
    pub fn from_name(name: &str) -> Result<Self, CommandError> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|command| command.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| CommandError::Unknown(name.to_string()))
    }
}

impl FromStr for OperatorCommand {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

impl fmt::Display for OperatorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
