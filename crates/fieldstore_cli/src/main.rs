//! fieldstore command-line tools.
//!
//! # Commands
//!
//! - `new` - Create an empty database with the marker table
//! - `check` - Open a database and report its marker rows
//! - `backup` - Copy a database through the online backup API
//! - `convert` - Convert a value between two units
//! - `units` - List the units of a dimension

use clap::{Parser, Subcommand};
use fieldstore_core::db::ConnectionConfig;
use fieldstore_core::repo::info_repo::InfoRepository;
use fieldstore_core::service::data_source::DataSource;
use fieldstore_core::text::TextCatalog;
use fieldstore_core::units::UnitCatalog;
use fieldstore_core::{core_version, default_log_level, init_logging};
use log::info;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

/// Marker row written by `new` so `check` has something to report.
const CREATED_BY_KEY: &str = "CreatedBy";

#[derive(Parser)]
#[command(name = "fieldstore")]
#[command(version, about = "fieldstore database and unit tools", long_about = None)]
struct Cli {
    /// Absolute directory for rolling log files. Logging is off without it.
    #[arg(global = true, long)]
    log_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(global = true, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new database file
    New {
        path: PathBuf,
    },

    /// Open a database and list its marker rows
    Check {
        path: PathBuf,
    },

    /// Copy a database to another file
    Backup {
        path: PathBuf,
        destination: PathBuf,
    },

    /// Convert a value, units given as `dimension:unit`
    Convert {
        value: f64,
        from: String,
        to: String,
    },

    /// List the units of a dimension, sorted by label
    Units {
        dimension: String,

        /// Unit enum value listed first when labels collide
        #[arg(short, long)]
        current: Option<i32>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(log_dir) = &cli.log_dir {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        if let Err(message) = init_logging(level, log_dir) {
            eprintln!("logging disabled: {message}");
        }
    }

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<(), Box<dyn Error>> {
    match command {
        Commands::New { path } => {
            let source = manual_source();
            source.create(&path)?;
            source.set_info_value(CREATED_BY_KEY, format!("fieldstore {}", core_version()))?;
            source.close()?;
            info!("event=cli_new module=cli status=ok");
            println!("created {}", path.display());
        }
        Commands::Check { path } => {
            let source = manual_source();
            source.open(&path)?;
            let records = source.info_repository()?.list()?;
            println!("{} ok, {} marker rows", path.display(), records.len());
            for record in records {
                println!("  {} = {}", record.info_name, record.value);
            }
            source.close()?;
        }
        Commands::Backup { path, destination } => {
            let source = manual_source();
            source.open(&path)?;
            let copied = source.backup(&destination)?;
            source.close()?;
            if !copied {
                return Err(format!("no backup written to {}", destination.display()).into());
            }
            println!("copied {} to {}", path.display(), destination.display());
        }
        Commands::Convert { value, from, to } => {
            let catalog = UnitCatalog::standard()?;
            let from = catalog.unit_from_serialized(&from)?;
            let to = catalog.unit_from_serialized(&to)?;
            let converted = to.convert_from(value, &from)?;
            let labels = labels();
            println!(
                "{value} {} = {converted} {}",
                from.short_label(&labels),
                to.short_label(&labels)
            );
        }
        Commands::Units { dimension, current } => {
            let catalog = UnitCatalog::standard()?;
            let dimension = catalog
                .dimension_by_name(&dimension)
                .ok_or_else(|| format!("unknown dimension `{dimension}`"))?;
            let labels = labels();
            let units = match current {
                Some(current) => {
                    catalog.available_units_sorted_with(dimension.index(), current, &labels)
                }
                None => catalog.available_units_sorted(dimension.index(), &labels),
            };
            for unit in units {
                println!(
                    "{:>3}  {:<16} {}",
                    unit.enum_value(),
                    unit.to_serialized_string(),
                    unit.label(&labels)
                );
            }
        }
    }
    Ok(())
}

fn manual_source() -> DataSource {
    // One-shot commands flush on close.
    DataSource::new(ConnectionConfig::default().auto_flush(false))
}

fn labels() -> TextCatalog {
    TextCatalog::from_pairs([
        ("none", "None"),
        ("currency", "Currency"),
        ("percent", "Percent"),
        ("unitless", "Unitless"),
        ("dollars", "%1"),
        ("dollars_short", "%1"),
        ("percentPercent", "Percent"),
        ("percentPercent_short", "%%"),
        ("unitlessPercent", "Fraction"),
        ("unitlessPercent_short", "frac"),
        ("unitlessUnit", "Unitless"),
        ("unitlessUnit_short", ""),
    ])
}
