//! Command line front-end over one dataset table.
//!
//! # Responsibility
//! - Open a database file and bind one Map or Bag table.
//! - Run a single dataset operation with JSON values and print the outcome.

mod json;

use clap::{Parser, Subcommand, ValueEnum};
use log::warn;
use rowvault_core::db::open_db_with;
use rowvault_core::{
    init_logging_with, Dataset, DatasetKind, LoggingConfig, OpenOptions, Schema, Term,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "rowvault", version, about = "Opaque-value records on SQLite tables")]
struct Cli {
    /// SQLite database file; created when missing.
    #[arg(long)]
    db: PathBuf,
    #[arg(long, default_value = "records")]
    table: String,
    #[arg(long, value_enum, default_value_t = Kind::Map)]
    kind: Kind,
    #[arg(long, default_value_t = OpenOptions::default().busy_timeout_ms)]
    busy_timeout_ms: u64,
    /// Absolute directory for rotating log files; logging is off without it.
    #[arg(long)]
    log_dir: Option<PathBuf>,
    #[arg(long, default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Kind {
    Map,
    Bag,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create the table if it does not exist.
    Init,
    /// Insert a JSON value under a key.
    Put { key: String, value: String },
    /// Print the first record under a key.
    Get { key: String },
    /// Print every record under a key.
    GetAll { key: String },
    /// Overwrite every record under a key.
    Set { key: String, value: String },
    /// Atomically add to integer values under a key.
    Incr {
        key: String,
        #[arg(default_value_t = 1, allow_negative_numbers = true)]
        by: i64,
    },
    /// Delete every record under a key.
    Delete { key: String },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("rowvault: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    if let Some(log_dir) = &cli.log_dir {
        init_logging_with(&LoggingConfig::new(cli.log_level.as_str(), log_dir.clone()))?;
    }

    let options = OpenOptions {
        busy_timeout_ms: cli.busy_timeout_ms,
        ..OpenOptions::default()
    };
    let conn = open_db_with(&cli.db, &options)?;
    let kind = match cli.kind {
        Kind::Map => DatasetKind::Map,
        Kind::Bag => DatasetKind::Bag,
    };
    let dataset = Dataset::try_new(&conn, cli.table.as_str(), Schema::for_kind(kind))?;

    match cli.command {
        Command::Init => {
            dataset.ensure_table()?;
            println!("ok");
        }
        Command::Put { key, value } => {
            let record = dataset.put(key.as_bytes(), parse_value(&value)?)?;
            println!("{}", json::record_to_json(&record));
        }
        Command::Get { key } => match dataset.get::<Term>(key.as_bytes())? {
            Some(record) => println!("{}", json::record_to_json(&record)),
            None => return Err(format!("no record for key `{key}`").into()),
        },
        Command::GetAll { key } => {
            for record in dataset.get_all::<Term>(key.as_bytes())? {
                println!("{}", json::record_to_json(&record));
            }
        }
        Command::Set { key, value } => {
            let changed = dataset.set(key.as_bytes(), &parse_value(&value)?)?;
            println!("{changed}");
        }
        Command::Incr { key, by } => {
            let mut skipped = 0;
            let changed = dataset.set_with(key.as_bytes(), |current: Term| match current {
                Term::Int(value) => Term::Int(value.saturating_add(by)),
                other => {
                    skipped += 1;
                    other
                }
            })?;
            if skipped > 0 {
                warn!("event=cli_incr module=cli status=partial skipped={skipped}");
                return Err(format!("{skipped} of {changed} values under `{key}` are not integers").into());
            }
            println!("{changed}");
        }
        Command::Delete { key } => {
            println!("{}", dataset.delete(key.as_bytes())?);
        }
    }
    Ok(())
}

fn parse_value(text: &str) -> Result<Term, serde_json::Error> {
    serde_json::from_str(text).map(json::term_from_json)
}
