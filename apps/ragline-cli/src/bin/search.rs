use clap::Parser;
use ragline_cli::{load_settings, open_store, print_results};
use ragline_pipeline::Retriever;

/// Semantic search over the indexed collection.
#[derive(Parser, Debug)]
#[command(name = "ragline-search", version)]
struct Args {
    query: String,

    /// Maximum results; defaults to `retrieval.limit`.
    #[arg(long)]
    limit: Option<usize>,

    /// Minimum cosine score; defaults to `retrieval.score_threshold`.
    #[arg(long)]
    threshold: Option<f32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let settings = load_settings()?;
    let limit = args.limit.unwrap_or(settings.retrieval.limit);
    let threshold = args.threshold.unwrap_or(settings.retrieval.score_threshold);

    let (embedder, index) = open_store(&settings).await?;
    let retriever = Retriever::new(embedder, index, settings.data.collection.clone());

    println!("🗂️  Collection: {}", retriever.collection());
    println!("🔍 Query: {}", args.query);
    let results = retriever.try_retrieve(&args.query, limit, threshold).await?;
    println!("Found {} results (limit {limit}, threshold {threshold})", results.len());
    print_results(&results);
    Ok(())
}
