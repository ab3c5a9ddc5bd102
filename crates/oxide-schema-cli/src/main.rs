//! oxide-schema CLI
//!
//! Renders DDL for a platform from JSON schema files. SQL goes to stdout,
//! logs to stderr.

mod commands;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use oxide_schema::prelude::*;

/// Portable schema DDL generator.
#[derive(Parser)]
#[command(name = "oxide-schema")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Target platform (oracle, postgresql, sqlite).
    #[arg(short, long, env = "OXIDE_SCHEMA_PLATFORM", default_value = "postgresql")]
    platform: PlatformKind,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the script creating every table and sequence of a schema.
    Create {
        /// Schema file.
        schema: PathBuf,
    },

    /// Print the migration script between two schema snapshots.
    Diff {
        /// Current schema file.
        from: PathBuf,
        /// Target schema file.
        to: PathBuf,

        /// Report renamed columns as drop and add.
        #[arg(long)]
        no_column_renames: bool,
    },

    /// Print a DROP TABLE statement.
    DropTable {
        /// Table name, in double quotes to force quoting.
        name: String,
    },

    /// Print the statement emptying a table.
    Truncate {
        /// Table name, in double quotes to force quoting.
        name: String,
    },

    /// Report names that are reserved words.
    ReservedWords {
        /// Schema file.
        schema: PathBuf,

        /// Platform whose keywords to check; repeatable, all when omitted.
        #[arg(short, long = "list", value_name = "PLATFORM")]
        lists: Vec<PlatformKind>,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let platform = cli.platform.platform();
    let mut stdout = io::stdout().lock();

    match cli.command {
        Commands::Create { schema } => {
            let sql = commands::create(platform.as_ref(), &schema)?;
            commands::write_statements(&mut stdout, &sql)?;
        }

        Commands::Diff {
            from,
            to,
            no_column_renames,
        } => {
            let sql = commands::diff(platform.as_ref(), &from, &to, !no_column_renames)?;
            if sql.is_empty() {
                info!("Schemas are in sync.");
            }
            commands::write_statements(&mut stdout, &sql)?;
        }

        Commands::DropTable { name } => {
            commands::write_statements(&mut stdout, &[platform.drop_table_sql(&name)])?;
        }

        Commands::Truncate { name } => {
            commands::write_statements(&mut stdout, &[platform.truncate_table_sql(&name)])?;
        }

        Commands::ReservedWords { schema, lists } => {
            let violations = commands::reserved_words(&schema, &lists)?;
            if violations.is_empty() {
                info!("No reserved word violations in {}.", schema.display());
                return Ok(ExitCode::SUCCESS);
            }
            for violation in &violations {
                writeln!(stdout, "{violation}")?;
            }
            info!("{} reserved word violation(s) found.", violations.len());
            return Ok(ExitCode::FAILURE);
        }
    }

    Ok(ExitCode::SUCCESS)
}
