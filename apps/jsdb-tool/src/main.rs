//! CLI tool for jsdb database files.
//!
//! Provides commands for:
//! - Schema and metadata inspection
//! - Dumping table rows
//! - Integrity checks

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use jsdb_core::{Connection, DbConfig};

/// Command-line arguments for the database tool.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print tables, fields, keys, row counts and autoincrement counters
    Inspect {
        /// Database file
        file: PathBuf,
    },
    /// Print the rows of one table
    Dump {
        /// Database file
        file: PathBuf,
        /// Table name
        table: String,
        /// Print stored JSON rows instead of decoded values
        #[arg(long)]
        raw: bool,
    },
    /// Scan stored rows for unreadable values and broken keys
    Check {
        /// Database file
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt::init();

    match args.command {
        Command::Inspect { file } => {
            let connection = open(file).await?;
            print!("{}", inspect(&connection)?);
        }
        Command::Dump { file, table, raw } => {
            let connection = open(file).await?;
            print!("{}", dump(&connection, &table, raw)?);
        }
        Command::Check { file } => {
            let connection = open(file).await?;
            let issues = connection.check_integrity()?;
            for issue in &issues {
                println!("{}", issue);
            }
            if !issues.is_empty() {
                bail!("{} integrity issue(s) found", issues.len());
            }
            println!("ok");
        }
    }

    Ok(())
}

async fn open(file: PathBuf) -> Result<Connection> {
    Connection::load_with_config(&file, DbConfig::default())
        .await
        .with_context(|| format!("Failed to load {}", file.display()))
}

/// Renders the schema summary of an open database.
fn inspect(connection: &Connection) -> Result<String> {
    let document = connection.document()?;
    let mut out = String::new();

    for table in connection.table_names()? {
        let descriptor = connection.table(&table)?;
        writeln!(
            out,
            "{} ({} rows, primary key {})",
            table,
            connection.row_count(&table)?,
            descriptor.primary_key_name()
        )?;
        for field in descriptor.fields() {
            write!(out, "  {}: {}", field.name, field.type_id())?;
            let flags = field.flags.to_string();
            if !flags.is_empty() {
                write!(out, " [{}]", flags)?;
            }
            if let Some(fk) = &field.foreign_key {
                write!(out, " -> {}.{}", fk.to_table, fk.to_field)?;
            }
            writeln!(out)?;
        }
    }

    if !document.meta.autoincrement.is_empty() {
        writeln!(out, "autoincrement:")?;
        for (key, next) in &document.meta.autoincrement {
            writeln!(out, "  {} = {}", key, next)?;
        }
    }

    Ok(out)
}

/// Renders every row of `table`, one per line.
fn dump(connection: &Connection, table: &str, raw: bool) -> Result<String> {
    let mut out = String::new();
    if raw {
        let document = connection.document()?;
        for row in document.rows(table)? {
            writeln!(out, "{}", serde_json::Value::from(row.clone()))?;
        }
    } else {
        for bean in connection.all(table, |_| true)? {
            writeln!(out, "{}", bean)?;
        }
    }
    Ok(out)
}
