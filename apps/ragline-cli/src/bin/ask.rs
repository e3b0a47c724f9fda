use std::io::{self, BufRead, Write};
use std::sync::Arc;

use clap::Parser;
use ragline_cli::{load_settings, open_store, print_results};
use ragline_core::types::{ConversationTurn, PipelineOutcome};
use ragline_llm::language_model_from_settings;
use ragline_pipeline::{FastResponses, Orchestrator, Retriever};
use tracing::info;

/// Ask questions answered from the indexed documents.
///
/// With a question argument, answers once and exits. Without one, starts an
/// interactive session that keeps the conversation history in memory.
#[derive(Parser, Debug)]
#[command(name = "ragline-ask", version)]
struct Args {
    question: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let settings = load_settings()?;

    let (embedder, index) = open_store(&settings).await?;
    let model = language_model_from_settings(&settings.llm)?;
    info!(model = model.model_name(), "language model ready");
    let retriever = Retriever::new(embedder, index, settings.data.collection.clone());
    let fast = Arc::new(FastResponses::new(&settings.fast_responses));
    let orchestrator = Orchestrator::new(model, retriever, fast, &settings);

    if let Some(question) = args.question {
        let outcome = orchestrator.run_pipeline(&question, &[]).await;
        show(&outcome);
        return Ok(());
    }

    let mut history: Vec<ConversationTurn> = Vec::new();
    let stdin = io::stdin();
    println!("Ask a question (empty line or Ctrl-D to quit).");
    loop {
        print!("\n> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 || line.trim().is_empty() {
            break;
        }
        let outcome = orchestrator.run_pipeline(line.trim(), &history).await;
        show(&outcome);
        history.push(ConversationTurn::new(line.trim(), outcome.response_text));
    }
    Ok(())
}

fn show(outcome: &PipelineOutcome) {
    println!("\n{}", outcome.response_text);
    if !outcome.sources.is_empty() {
        println!("\n📚 Sources:");
        print_results(&outcome.sources);
    }
}
