use std::path::PathBuf;

use clap::Parser;
use ragline_cli::{load_settings, open_store};
use ragline_core::config::expand_path;
use ragline_pipeline::{IndexStatus, Indexer};

/// Build the vector index from a folder of PDF, DOCX and text documents.
#[derive(Parser, Debug)]
#[command(name = "ragline-indexer", version)]
struct Args {
    /// Documents folder; defaults to `data.documents_dir`.
    #[arg(long)]
    folder: Option<String>,

    /// Drop and rebuild an existing collection.
    #[arg(long)]
    overwrite: bool,

    /// Show a progress bar while embedding.
    #[arg(long)]
    progress: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let settings = load_settings()?;
    let folder: PathBuf = match &args.folder {
        Some(f) => expand_path(f),
        None => settings.data.documents_dir(),
    };

    let (embedder, index) = open_store(&settings).await?;
    let indexer = Indexer::new(embedder, index, settings.data.collection.clone(), settings.embedding.batch_size)
        .with_progress(args.progress);

    println!("📂 Documents: {}", folder.display());
    println!("🗂️  Collection: {}", settings.data.collection);
    let report = indexer.build_index(&folder, args.overwrite).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    match report.status {
        IndexStatus::Success => {
            println!("\n✅ Indexed {} chunks in {:.2}s", report.total_chunks, report.processing_time_seconds)
        }
        IndexStatus::NoDocuments => println!("\n⚠️  No documents with content found"),
        IndexStatus::Failed => {
            eprintln!("\n❌ Indexing failed: {}", report.error.as_deref().unwrap_or("unknown error"));
            std::process::exit(1);
        }
    }
    Ok(())
}
