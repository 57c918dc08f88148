//! CLI command definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Subcommand, ValueEnum};

fn parse_day(raw: &str) -> Result<NaiveDate, String> {
    crate::form::parse_date(raw).ok_or_else(|| format!("expected YYYY-MM-DD, got `{raw}`"))
}

/// Serve command arguments.
#[derive(Debug, Args)]
pub struct ServeCommand {
    /// Address to listen on, overriding `server.bind`
    #[arg(short, long, value_name = "ADDR")]
    pub bind: Option<String>,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,

    /// Day to report on (defaults to today)
    #[arg(short, long, value_parser = parse_day)]
    pub date: Option<NaiveDate>,
}

/// Export command arguments.
#[derive(Debug, Args)]
pub struct ExportCommand {
    /// Which records to export
    #[arg(value_enum)]
    pub kind: ExportKind,

    /// Only inspections of this site
    #[arg(short, long)]
    pub site: Option<String>,

    /// Only records of this day (inspection date or permit entry date)
    #[arg(short, long, value_parser = parse_day)]
    pub date: Option<NaiveDate>,

    /// Write to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Record kind for export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportKind {
    /// Checklist inspections
    Inspections,
    /// Visitor permits
    Permits,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}
