//! `chorus-import`: CSV sheet imports from the command line.
//!
//! Reads a sheet, shows the server-side preview, asks for
//! confirmation, then submits the import and renders job progress as
//! a bar with the server log lines beneath it.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chorus_client::api::ImportApi;
use chorus_client::workflow::{ImportTarget, ImportWorkflow, Phase, Preview};
use chorus_core::EventKind;

#[derive(Parser, Debug)]
#[command(
    name = "chorus-import",
    version,
    about = "CSV sheet imports for the choir administration"
)]
struct Cli {
    /// Base URL of the import API server
    #[arg(long, default_value = "http://localhost:3000")]
    server: String,

    /// Skip the confirmation prompt
    #[arg(short, long, default_value_t = false)]
    yes: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Import an event sheet (rehearsals or services)
    Events {
        /// Path to the semicolon-delimited CSV sheet
        file: PathBuf,

        /// Event kind: REHEARSAL or SERVICE
        #[arg(short = 't', long = "type", value_parser = parse_event_kind)]
        kind: EventKind,
    },
    /// Import a piece sheet into a collection
    Collection {
        /// Path to the semicolon-delimited CSV sheet
        file: PathBuf,

        /// Id of the target collection
        #[arg(short, long)]
        collection_id: i64,

        /// Path to a JSON file with match resolutions keyed by row index
        #[arg(long)]
        resolutions: Option<PathBuf>,
    },
}

fn parse_event_kind(s: &str) -> Result<EventKind, String> {
    match s {
        "REHEARSAL" => Ok(EventKind::Rehearsal),
        "SERVICE" => Ok(EventKind::Service),
        other => Err(format!(
            "unknown event type \"{other}\", expected REHEARSAL or SERVICE"
        )),
    }
}

#[tokio::main]
async fn main() {
    // Quiet by default; RUST_LOG opts into the tracing output.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chorus_client=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}

/// Drive one import end to end. `Ok(true)` means there is nothing to
/// report as a failure: the job completed, or the user declined the
/// confirmation prompt.
async fn run(cli: Cli) -> anyhow::Result<bool> {
    let api = ImportApi::new(cli.server.clone());

    let (file, target) = match cli.command {
        Commands::Events { file, kind } => (file, ImportTarget::Events { kind }),
        Commands::Collection {
            file,
            collection_id,
            resolutions,
        } => {
            let resolutions = match resolutions {
                Some(path) => Some(std::fs::read_to_string(&path).with_context(|| {
                    format!("Failed to read resolutions file {}", path.display())
                })?),
                None => None,
            };
            (
                file,
                ImportTarget::Collection {
                    collection_id,
                    resolutions,
                },
            )
        }
    };

    let sheet = std::fs::read(&file)
        .with_context(|| format!("Failed to read sheet {}", file.display()))?;

    let mut workflow = ImportWorkflow::new(api, target);

    // Ctrl-C tears the poll loop down.
    let cancel = workflow.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    if !workflow.select_file(sheet).await {
        print_notices(&mut workflow);
        return Ok(false);
    }

    if let Some(preview) = workflow.preview() {
        println!("Vorschau ({} Zeilen):", preview.len());
        print_preview(preview);
    }

    if !cli.yes {
        let confirmed = Confirm::new()
            .with_prompt("Import starten?")
            .default(false)
            .interact()
            .context("Confirmation prompt failed")?;
        if !confirmed {
            println!("Abgebrochen.");
            return Ok(true);
        }
    }

    if !workflow.submit().await {
        print_notices(&mut workflow);
        return Ok(false);
    }

    // The start placeholder; every later line comes from the server.
    for line in workflow.logs() {
        println!("{line}");
    }

    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut shown = 0usize;
    let phase = workflow
        .poll_to_end(|percent, logs| {
            bar.set_position(u64::from(percent));
            for line in logs.iter().skip(shown) {
                bar.println(line);
            }
            shown = logs.len();
        })
        .await;

    bar.finish_and_clear();

    // The failure path appends an ERROR line after the last snapshot.
    for line in workflow.logs().iter().skip(shown) {
        println!("{line}");
    }
    print_notices(&mut workflow);

    Ok(phase == Phase::Done)
}

fn print_notices(workflow: &mut ImportWorkflow) {
    for notice in workflow.take_notices() {
        println!("{notice}");
    }
}

fn print_preview(preview: &Preview) {
    match preview {
        Preview::Events(rows) => {
            println!("{:<12} {:<40} {:<12}", "Referenz", "Titel", "Datum");
            for row in rows {
                println!(
                    "{:<12} {:<40} {:<12}",
                    row.reference,
                    row.title.as_deref().unwrap_or("-"),
                    row.date
                );
            }
        }
        Preview::Collection(rows) => {
            println!(
                "{:<8} {:<40} {:<28} {:<16}",
                "Nummer", "Titel", "Komponist", "Kategorie"
            );
            for row in rows {
                println!(
                    "{:<8} {:<40} {:<28} {:<16}",
                    row.number.as_deref().unwrap_or("-"),
                    row.title.as_deref().unwrap_or("-"),
                    row.composer.as_deref().unwrap_or("-"),
                    row.category.as_deref().unwrap_or("-")
                );
            }
        }
    }
}
