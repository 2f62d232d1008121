//! # CLI
//!
//! clap-based command interface: `serve`, `init`, `status`, `export`,
//! `import`.
//!
//! The command functions are plain `Result`-returning functions so the
//! integration tests can drive them directly without spawning a process.

use crate::api::{serve, AppState};
use crate::error::AppError;
use crate::store::{open_store, Backend, JsonStore, RosterPersist};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tally_core::formats::{export_canonical, import_canonical};
use tally_core::pulse::PulseConfig;
use tally_core::storage::RedbRoster;
use tally_core::{Roster, DEFAULT_PULSE_CLASS, DEFAULT_PULSE_DURATION_MS};

/// Tally - party drink counter.
#[derive(Debug, Parser)]
#[command(name = "tally", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP server.
    Serve {
        /// Address to bind.
        #[arg(long, default_value = "127.0.0.1:5001")]
        addr: SocketAddr,
        /// Data file path.
        #[arg(long, default_value = "data.json")]
        data: PathBuf,
        /// Persistence backend.
        #[arg(long, value_enum, default_value_t = Backend::Json)]
        backend: Backend,
        /// Marker class applied by a pulse.
        #[arg(long, default_value = DEFAULT_PULSE_CLASS)]
        pulse_class: String,
        /// Pulse duration in milliseconds.
        #[arg(long, default_value_t = DEFAULT_PULSE_DURATION_MS)]
        pulse_duration_ms: u64,
    },
    /// Create an empty data store.
    Init {
        /// Data file path.
        data: PathBuf,
        /// Persistence backend.
        #[arg(long, value_enum, default_value_t = Backend::Json)]
        backend: Backend,
        /// Overwrite an existing store.
        #[arg(long)]
        force: bool,
    },
    /// Show a roster summary.
    Status {
        /// Data file path.
        data: PathBuf,
        /// Persistence backend.
        #[arg(long, value_enum, default_value_t = Backend::Json)]
        backend: Backend,
        /// Emit JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Export a roster snapshot.
    Export {
        /// Data file path.
        data: PathBuf,
        /// Output file path.
        output: PathBuf,
        /// Persistence backend.
        #[arg(long, value_enum, default_value_t = Backend::Json)]
        backend: Backend,
        /// Snapshot format: canonical or json.
        #[arg(long, default_value = "canonical")]
        format: String,
    },
    /// Import a canonical snapshot into a JSON store.
    Import {
        /// Data file path to write.
        data: PathBuf,
        /// Snapshot file to read.
        input: PathBuf,
        /// Persistence backend.
        #[arg(long, value_enum, default_value_t = Backend::Json)]
        backend: Backend,
    },
}

/// Dispatch a parsed command line.
pub async fn run(cli: Cli) -> Result<(), AppError> {
    match cli.command {
        Command::Serve {
            addr,
            data,
            backend,
            pulse_class,
            pulse_duration_ms,
        } => {
            let store: Arc<dyn RosterPersist> = Arc::from(open_store(&data, backend)?);
            let roster = store.load()?;
            let pulse = PulseConfig::new(pulse_class, Duration::from_millis(pulse_duration_ms));
            let state = AppState::new(roster, store, pulse).await;
            serve(addr, state).await
        }
        Command::Init {
            data,
            backend,
            force,
        } => cmd_init(&data, backend, force),
        Command::Status {
            data,
            backend,
            json,
        } => cmd_status(&data, backend, json),
        Command::Export {
            data,
            output,
            backend,
            format,
        } => cmd_export(&data, backend, &output, &format),
        Command::Import {
            data,
            input,
            backend,
        } => cmd_import(&data, backend, &input),
    }
}

// =============================================================================
// COMMANDS
// =============================================================================

/// Create an empty store at `data`.
pub fn cmd_init(data: &Path, backend: Backend, force: bool) -> Result<(), AppError> {
    if backend == Backend::Memory {
        return Err(AppError::InvalidArgument(String::from(
            "the memory backend has nothing to initialize",
        )));
    }

    if data.exists() {
        if !force {
            return Err(AppError::InvalidArgument(format!(
                "{} already exists (use --force to overwrite)",
                data.display()
            )));
        }
        fs::remove_file(data)?;
    }

    match backend {
        Backend::Json => JsonStore::new(data).save(&Roster::new())?,
        Backend::Redb => RedbRoster::open(data)?.init()?,
        Backend::Memory => {}
    }

    tracing::info!(path = %data.display(), backend = ?backend, "initialized store");
    Ok(())
}

/// Load the roster from a store, yielding an empty roster if the store has
/// no data yet.
///
/// A missing store file reads as empty without touching the filesystem, so
/// read-only commands never create one as a side effect.
pub fn load_or_create_roster(data: &Path, backend: Backend) -> Result<Roster, AppError> {
    if backend != Backend::Memory && !data.exists() {
        return Ok(Roster::new());
    }
    open_store(data, backend)?.load()
}

/// Persist a roster to a store.
pub fn save_roster(roster: &Roster, data: &Path, backend: Backend) -> Result<(), AppError> {
    open_store(data, backend)?.save(roster)
}

/// Print a roster summary.
pub fn cmd_status(data: &Path, backend: Backend, json: bool) -> Result<(), AppError> {
    let roster = load_or_create_roster(data, backend)?;
    let total: u64 = roster.iter().map(|(_, count)| count.value()).sum();

    if json {
        let summary = json!({
            "participants": roster.len(),
            "total_drinks": total,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("participants: {}", roster.len());
        println!("total drinks: {total}");
        for (name, count) in roster.leaderboard() {
            println!("  {name}: {count}");
        }
    }
    Ok(())
}

/// Export the roster to `output` in the requested format.
pub fn cmd_export(
    data: &Path,
    backend: Backend,
    output: &Path,
    format: &str,
) -> Result<(), AppError> {
    let roster = load_or_create_roster(data, backend)?;

    match format {
        "canonical" => fs::write(output, export_canonical(&roster)?)?,
        "json" => fs::write(output, serde_json::to_string_pretty(&roster)?)?,
        other => {
            return Err(AppError::InvalidArgument(format!(
                "unknown export format: {other}"
            )))
        }
    }

    tracing::info!(path = %output.display(), format, "exported roster");
    Ok(())
}

/// Import a canonical snapshot into a JSON store.
///
/// Importing into redb is not supported; export/import is a data-file
/// exchange format, not a database migration path.
pub fn cmd_import(data: &Path, backend: Backend, input: &Path) -> Result<(), AppError> {
    if backend != Backend::Json {
        return Err(AppError::InvalidArgument(String::from(
            "import only supports the json backend",
        )));
    }

    let bytes = fs::read(input)?;
    let roster = import_canonical(&bytes)?;
    save_roster(&roster, data, backend)?;

    tracing::info!(path = %data.display(), participants = roster.len(), "imported roster");
    Ok(())
}
