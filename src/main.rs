use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Parser;
use std::fs;
use std::path::Path;

use healthcare_dashboard::config::{CliArgs, Command};
use healthcare_dashboard::logging::{init_logging, LoggingConfig};
use healthcare_dashboard::{
    export_dataset, verify_counts, AnalyticsSnapshot, ImportSummary, RecordStore, ReportDocument,
    SqliteStore,
};

fn main() -> Result<()> {
    let args = CliArgs::parse();
    let command = args.command.unwrap_or(Command::Tui);

    let mut logging = LoggingConfig::new(args.store.log_format);
    if matches!(command, Command::Tui) {
        logging = logging.quiet();
    }
    init_logging(&logging)?;

    let store = SqliteStore::open(&args.store.db, args.store.duplicate_policy)
        .with_context(|| format!("failed to open database {}", args.store.db.display()))?;

    match command {
        Command::Import { clients, programs } => {
            if clients.is_none() && programs.is_none() {
                bail!("nothing to import: pass --clients and/or --programs");
            }
            if let Some(path) = programs {
                let summary = store
                    .import_programs_csv(&path)
                    .with_context(|| format!("failed to import programs from {}", path.display()))?;
                print_import("programs", &path, &summary);
            }
            if let Some(path) = clients {
                let summary = store
                    .import_clients_csv(&path)
                    .with_context(|| format!("failed to import clients from {}", path.display()))?;
                print_import("clients", &path, &summary);
            }

            let (clients, programs, enrollments) = verify_counts(store.connection())?;
            println!(
                "✓ Database contains {} clients, {} programs, {} enrollments",
                clients, programs, enrollments
            );
        }
        Command::Analytics { window } => {
            let dataset = store.load_dataset()?;
            let snapshot = AnalyticsSnapshot::compute(&dataset, window.window().as_ref());
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        Command::Report { window, json } => {
            let dataset = store.load_dataset()?;
            let document = ReportDocument::assemble(&dataset, window.window().as_ref(), Utc::now());
            if json {
                println!("{}", serde_json::to_string_pretty(&document)?);
            } else {
                print!("{}", document.to_plain_text());
            }
        }
        Command::Export { kind, window, out_dir } => {
            let dataset = store.load_dataset()?;
            let payloads = export_dataset(kind, &dataset, window.window().as_ref())?;
            fs::create_dir_all(&out_dir)
                .with_context(|| format!("failed to create {}", out_dir.display()))?;

            for payload in payloads {
                let path = out_dir.join(&payload.filename);
                fs::write(&path, payload.content)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                println!("✓ Wrote {}", path.display());
            }
        }
        Command::Tui => run_ui_mode(&store)?,
    }

    Ok(())
}

fn print_import(label: &str, path: &Path, summary: &ImportSummary) {
    println!("📂 {} ({})", label, path.display());
    println!("  ✓ Inserted:   {}", summary.inserted);
    println!("  ✓ Duplicates: {}", summary.duplicates);
    if !summary.rejected.is_empty() {
        println!("  ✗ Rejected:   {}", summary.rejected.len());
        for (line, reason) in &summary.rejected {
            println!("    line {}: {}", line, reason);
        }
    }
}

#[cfg(feature = "tui")]
fn run_ui_mode(store: &SqliteStore) -> Result<()> {
    use healthcare_dashboard::ui;

    let dataset = store.load_dataset()?;
    let mut app = ui::App::new(dataset, Utc::now());
    ui::run_ui(&mut app)?;
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_store: &SqliteStore) -> Result<()> {
    bail!("TUI mode not available: rebuild with --features tui, or run healthcare-server --features server")
}
