//! `sitecheck` - CLI for the inspection and permit service
//!
//! This binary runs the HTTP server and offers a few maintenance commands
//! against the same database.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::fs::File;
use std::io::{self, BufWriter, Write};

use anyhow::Context;
use clap::Parser;
use serde::Serialize;

use sitecheck::cli::{Cli, Command, ConfigCommand, ExportCommand, ExportKind, StatusCommand};
use sitecheck::storage::{InspectionFilter, PermitFilter};
use sitecheck::{init_logging, web, Config, RecordService, Shift};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let mut config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    match cli.command {
        Command::Serve(cmd) => {
            if let Some(bind) = cmd.bind {
                config.server.bind = bind;
            }
            handle_serve(&config)
        }
        Command::Status(cmd) => handle_status(&config, &cmd),
        Command::Export(cmd) => handle_export(&config, &cmd),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn handle_serve(config: &Config) -> anyhow::Result<()> {
    let addr = config.bind_addr()?;
    let service = RecordService::from_config(config)?;
    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
    runtime.block_on(web::serve(service, addr))?;
    Ok(())
}

fn handle_status(config: &Config, cmd: &StatusCommand) -> anyhow::Result<()> {
    let service = RecordService::from_config(config)?;
    let status = match cmd.date {
        Some(date) => service.status_on(date)?,
        None => service.today_status()?,
    };
    let totals = service.storage().stats()?;

    if cmd.json {
        let report = serde_json::json!({
            "status": status,
            "database_path": service.storage().path(),
            "schema_version": totals.schema_version,
            "total_inspections": totals.total_inspections,
            "total_permits": totals.total_permits,
            "newest_inspection": totals.newest_inspection,
            "db_size_bytes": totals.db_size_bytes,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("sitecheck status for {}", status.date);
    println!("------------------------------");
    for site in service.sites() {
        let shifts: Vec<String> = Shift::ALL
            .iter()
            .map(|&shift| {
                let state = if status.is_done(site, shift) { "done" } else { "pending" };
                format!("{shift}: {state}")
            })
            .collect();
        println!("{site:<6} {}", shifts.join("   "));
    }
    println!();
    println!("Pending:       {}", status.pending());
    println!("Inspections:   {}", totals.total_inspections);
    println!("Permits:       {}", totals.total_permits);
    if let Some(newest) = totals.newest_inspection {
        println!("Last recorded: {}", newest.to_rfc3339());
    }
    println!("Database:      {}", service.storage().path().display());
    println!("Schema:        v{}", totals.schema_version);
    Ok(())
}

fn handle_export(config: &Config, cmd: &ExportCommand) -> anyhow::Result<()> {
    let service = RecordService::from_config(config)?;
    match cmd.kind {
        ExportKind::Inspections => {
            let filter = InspectionFilter {
                site: cmd.site.clone(),
                date: cmd.date,
            };
            write_json(&service.export_inspections(&filter)?, cmd)
        }
        ExportKind::Permits => {
            let filter = PermitFilter {
                entry_date: cmd.date,
            };
            write_json(&service.export_permits(&filter)?, cmd)
        }
    }
}

fn write_json<T: Serialize>(records: &[T], cmd: &ExportCommand) -> anyhow::Result<()> {
    let mut out: Box<dyn Write> = match &cmd.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };
    serde_json::to_writer_pretty(&mut out, records)?;
    writeln!(out)?;
    out.flush()?;
    if let Some(path) = &cmd.output {
        eprintln!("Exported {} records to {}", records.len(), path.display());
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Server]");
                println!("  Bind:               {}", config.server.bind);
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!("  List limit:         {}", config.storage.list_limit);
                println!();
                println!("[Inspection]");
                println!("  Sites:              {}", config.inspection.sites.join(", "));
                match &config.inspection.checklist_path {
                    Some(path) => println!("  Checklist:          {}", path.display()),
                    None => println!("  Checklist:          built-in"),
                }
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(loaded) => match sitecheck::Catalog::load_or_default(
                    loaded.inspection.checklist_path.as_deref(),
                ) {
                    Ok(catalog) => println!(
                        "Configuration is valid ({} checklist items).",
                        catalog.len()
                    ),
                    Err(e) => println!("Checklist error: {e}"),
                },
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
