//! ZotNotes CLI

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use zotnotes::NoteImporter;
use zotnotes_core::ImportConfig;

/// ZotNotes - Zotero annotations as Markdown literature notes
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the Better-BibTeX JSON export (overrides the config file)
    #[arg(short, long, env = "ZOTNOTES_LIBRARY")]
    library: Option<PathBuf>,

    /// Vault root directory
    #[arg(short, long, env = "ZOTNOTES_VAULT", default_value = ".")]
    vault: PathBuf,

    /// Configuration file (YAML); defaults are used when it does not exist
    #[arg(short, long, default_value = "zotnotes.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import or refresh the note for a single entry
    Import {
        /// Citation key of the entry, e.g. smith2020
        citation_key: String,
    },
    /// Refresh every note whose entry changed since the last update
    Update,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = ImportConfig::load(&args.config)
        .await
        .with_context(|| format!("loading configuration from {}", args.config.display()))?;
    if let Some(library) = args.library {
        config.bib_path = library;
    }

    let importer = NoteImporter::new(config, &args.vault)?;
    let library = importer.load_library().await?;
    log::info!(
        "Library loaded: {} entries, vault {}",
        library.items.len(),
        args.vault.display()
    );

    match args.command {
        Command::Import { citation_key } => {
            let report = importer.import_entry(&library, &citation_key).await?;
            for warning in &report.warnings {
                eprintln!("warning: {}", warning);
            }
            println!("Imported {} -> {}", report.citation_key, report.path.display());
        }
        Command::Update => {
            let report = importer.update_library(&library).await?;
            for key in &report.failed {
                eprintln!("failed: {}", key);
            }
            println!("Updated {} entries", report.updated.len());
        }
    }

    Ok(())
}
