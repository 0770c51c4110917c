// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::error::Error;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use clap::{crate_version, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use vpiano::controller::{script, terminal, Controller, Driver};
use vpiano::notes::ALL_NOTES;
use vpiano::{audio, config, verify};

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A virtual piano keyboard."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Starts the keyboard in the terminal.
    Play {
        /// The path to the piano config.
        #[arg[short, long]]
        config: Option<PathBuf>,
    },
    /// Plays input events read from a script, one command per line.
    Script {
        /// The path to the piano config.
        #[arg[short, long]]
        config: Option<PathBuf>,
        /// The script to play. Reads standard input if not given.
        file: Option<PathBuf>,
    },
    /// Loads every sample and reports the ones that fail.
    Verify {
        /// The path to the piano config.
        #[arg[short, long]]
        config: Option<PathBuf>,
    },
    /// Lists the notes, where their samples live and the keys that play them.
    Notes {
        /// The path to the piano config.
        #[arg[short, long]]
        config: Option<PathBuf>,
    },
    /// Lists the available audio output devices.
    Devices {},
}

/// Logs go to the given file, or to stderr if there is none.
fn init_logging(log_file: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match log_file {
        Some(path) => builder
            .with_writer(Mutex::new(File::create(path)?))
            .with_ansi(false)
            .try_init()
            .map_err(|e| e as Box<dyn Error>)?,
        None => builder
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| e as Box<dyn Error>)?,
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Play { config } => {
            let config = config::Piano::load(config.as_deref())?;
            init_logging(Some(&config.log_file()))?;

            let session = config::init_session(&config)?;
            let driver: Arc<dyn Driver> = Arc::new(terminal::Driver::new(
                session.piano.keyboard().clone(),
                session.mapping.clone(),
                session.piano.bank().clone(),
            ));
            Controller::new(session.piano, session.mapping, driver)
                .join()
                .await?;
        }
        Commands::Script { config, file } => {
            init_logging(None)?;
            let config = config::Piano::load(config.as_deref())?;

            let session = config::init_session(&config)?;
            let report = session.loads.wait().await;
            info!(
                loaded = report.loaded.len(),
                failed = report.failed.len(),
                "Samples loaded."
            );
            if !report.is_complete() {
                warn!("Some notes have no sample and will stay silent.");
            }

            let driver: Arc<dyn Driver> = match file {
                Some(path) => Arc::new(script::Driver::from_file(&path)?),
                None => Arc::new(script::Driver::stdin()),
            };
            Controller::new(session.piano, session.mapping, driver)
                .join()
                .await?;
        }
        Commands::Verify { config } => {
            init_logging(None)?;
            let config = config::Piano::load(config.as_deref())?;

            let report = verify::verify(&config).await?;
            verify::print_report(&report);
            if report.has_errors() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Notes { config } => {
            let config = config::Piano::load(config.as_deref())?;
            let mapping = config.key_mapping()?;

            println!("Notes (count: {}):", ALL_NOTES.len());
            for note in ALL_NOTES.iter() {
                let key = mapping.label_for(note).unwrap_or("-");
                println!(
                    "- {:<3} key: {:<2} {}",
                    note.to_string(),
                    key,
                    config.sample_location(note).display()
                );
            }
        }
        Commands::Devices {} => {
            let devices = audio::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(ExitCode::SUCCESS);
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
