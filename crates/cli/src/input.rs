//! Parsing of console lines into simulated server events.

use thiserror::Error;
use wsmaps_core::{CommandError, DownloadResult, OperatorCommand, WorkshopId};

/// Errors produced while reading a console line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    /// Blank line.
    #[error("empty input")]
    Empty,
    /// A verb was given without its argument.
    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),
    /// Not a positive integer.
    #[error("invalid workshop id `{0}`")]
    InvalidId(String),
    /// Not a non-negative integer.
    #[error("invalid client count `{0}`")]
    InvalidCount(String),
    /// Neither a simulation verb nor a module command.
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// One line typed at the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleInput {
    /// A level became active.
    Activate(String),
    /// A workshop item finished installing.
    Installed(WorkshopId),
    /// A workshop download finished.
    Download(WorkshopId, DownloadResult),
    /// Set the connected client count.
    Clients(usize),
    /// Print cycle progress.
    Status,
    /// Print the verb list.
    Help,
    /// Leave the console.
    Quit,
    /// One of the module's operator commands.
    Command(OperatorCommand),
}

impl ConsoleInput {
    /// Parse a console line.
    pub fn parse(line: &str) -> Result<Self, InputError> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Err(InputError::Empty);
        };

        let input = match verb.to_ascii_lowercase().as_str() {
            "activate" | "map" => {
                let map = words.next().ok_or(InputError::MissingArgument("activate"))?;
                ConsoleInput::Activate(map.to_string())
            }
            "installed" => ConsoleInput::Installed(parse_id(words.next(), "installed")?),
            "downloaded" => ConsoleInput::Download(
                parse_id(words.next(), "downloaded")?,
                DownloadResult::Success,
            ),
            "failed" => {
                let id = parse_id(words.next(), "failed")?;
                let reason = words.collect::<Vec<_>>().join(" ");
                let reason = if reason.is_empty() {
                    "failure".to_string()
                } else {
                    reason
                };
                ConsoleInput::Download(id, DownloadResult::Failed(reason))
            }
            "clients" => {
                let raw = words.next().ok_or(InputError::MissingArgument("clients"))?;
                let count = raw
                    .parse()
                    .map_err(|_| InputError::InvalidCount(raw.to_string()))?;
                ConsoleInput::Clients(count)
            }
            "status" => ConsoleInput::Status,
            "help" | "?" => ConsoleInput::Help,
            "quit" | "exit" => ConsoleInput::Quit,
            _ => ConsoleInput::Command(OperatorCommand::from_name(verb)?),
        };
        Ok(input)
    }
}

fn parse_id(word: Option<&str>, verb: &'static str) -> Result<WorkshopId, InputError> {
    let raw = word.ok_or(InputError::MissingArgument(verb))?;
    match raw.parse::<WorkshopId>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(InputError::InvalidId(raw.to_string())),
    }
}

const VERBS: &str = "\
activate <map>          report <map> as the newly active level
installed <id>          report a workshop item as installed
downloaded <id>         report a successful workshop download
failed <id> [reason]    report a failed workshop download
clients <n>             set the connected client count
status                  show download cycle progress
quit                    shut the module down and exit";

/// Verb summary printed by `help`, followed by the module's commands.
pub fn help_text() -> String {
    let mut text = VERBS.to_string();
    for command in OperatorCommand::ALL {
        text.push_str(&format!("\n{:<24}{}", command.name(), command.description()));
    }
    text
}
