mod host;
mod input;

use std::{
    fs::{self, OpenOptions},
    path::PathBuf,
    sync::{Arc, Mutex},
};

use anyhow::{Context, Result};
use clap::Parser;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tracing::{info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};
use wsmaps_core::{
    config::{self, ModulePaths},
    FileArtifactWriter, ItemState, WsMapsModule,
};

use crate::{
    host::ConsoleHost,
    input::{help_text, ConsoleInput, InputError},
};

/// Drive the workshop map downloader against a simulated server console.
#[derive(Debug, Parser)]
#[command(name = "wsmaps", version)]
struct Args {
    /// Framework directory holding `configs/wsmaps`.
    #[arg(long)]
    sharp_path: Option<PathBuf>,
    /// Game server root; defaults to the parent of the framework directory.
    #[arg(long)]
    root_path: Option<PathBuf>,
    /// Level reported as active at startup.
    #[arg(long)]
    map: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_logging()?;
    let args = Args::parse();

    let sharp_path = args
        .sharp_path
        .unwrap_or_else(ModulePaths::default_sharp_path);
    let paths = match args.root_path {
        Some(root) => ModulePaths::with_root(sharp_path, root),
        None => ModulePaths::new(sharp_path),
    };
    config::ensure_default_config(paths.config_path())?;

    let (timer_tx, mut timer_rx) = mpsc::unbounded_channel();
    let host = Arc::new(ConsoleHost::new(timer_tx));
    host.set_current_map(args.map);
    let writer = Arc::new(FileArtifactWriter::new(&paths));

    let mut module = WsMapsModule::init(&paths, host.clone(), writer);
    for command in module.post_init() {
        info!("Registered {command}: {}", command.description());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read console input")? else {
                    break;
                };
                match ConsoleInput::parse(&line) {
                    Ok(ConsoleInput::Quit) => break,
                    Ok(input) => dispatch(&mut module, &host, input),
                    Err(InputError::Empty) => {}
                    Err(err) => warn!("{err}, type `help` for a list of commands"),
                }
            }
            Some((handle, token)) = timer_rx.recv() => {
                host.forget(handle);
                module.on_timer(token);
            }
        }
    }

    module.shutdown();
    Ok(())
}

fn dispatch(module: &mut WsMapsModule, host: &ConsoleHost, input: ConsoleInput) {
    match input {
        ConsoleInput::Activate(map) => {
            host.set_current_map(Some(map));
            module.on_server_activate();
        }
        ConsoleInput::Installed(workshop_id) => {
            host.set_item_state(workshop_id, ItemState::SUBSCRIBED | ItemState::INSTALLED);
            module.on_item_installed(workshop_id);
        }
        ConsoleInput::Download(workshop_id, result) => {
            if result.is_success() {
                host.set_item_state(workshop_id, ItemState::SUBSCRIBED | ItemState::INSTALLED);
            }
            module.on_download_item_result(workshop_id, result);
        }
        ConsoleInput::Clients(count) => host.set_clients(count),
        ConsoleInput::Status => print_status(module, host),
        ConsoleInput::Help => println!("{}", help_text()),
        ConsoleInput::Command(command) => {
            module.run_command(command);
        }
        ConsoleInput::Quit => {}
    }
}

fn print_status(module: &WsMapsModule, host: &ConsoleHost) {
    let catalog = module.catalog();
    let cycler = module.cycler();
    info!(
        "{} of {} workshop maps resolved",
        catalog.resolved().count(),
        catalog.len()
    );
    match cycler.current() {
        Some(current) if cycler.is_cycling() => info!(
            "Downloading workshop map {current}, {} queued",
            cycler.queued().count()
        ),
        _ => info!("No download cycle running"),
    }
    if let Some(command) = host.last_command() {
        info!("Last server command: {command}");
    }
    info!("{} timers pending", host.pending_timers());
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("wsmaps.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(std::io::stdout);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .compact()
        .with_ansi(false)
        .with_writer(Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    Ok(())
}
