use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;
use smart_librarian::{
    config::Config,
    scripts::index_books::{index_books, print_index_stats, IndexOptions},
    telemetry,
};
use std::path::PathBuf;

/// Populate the vector index from the book corpus.
#[derive(Debug, Parser)]
#[command(name = "index-books", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Corpus file; defaults to the configured `corpus_path`
    #[arg(long, env = "APP_CORPUS_PATH")]
    corpus: Option<PathBuf>,

    /// Number of books embedded and upserted per request
    #[arg(long, default_value_t = 25)]
    batch_size: usize,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print dimension and vector counts of the index
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing("smart_librarian=info,index_books=info");

    let cli = Cli::parse();
    let config = Config::load()?;

    if let Some(Command::Stats) = cli.command {
        return print_index_stats(&config).await;
    }

    let corpus = cli
        .corpus
        .unwrap_or_else(|| PathBuf::from(&config.corpus_path));
    let options = IndexOptions {
        batch_size: cli.batch_size,
        ..IndexOptions::default()
    };

    let report = index_books(&config, &corpus, &options).await?;
    info!(
        "Done: {} indexed, {} skipped, {} failed batches",
        report.indexed_books, report.skipped_books, report.failed_batches
    );

    if report.failed_batches > 0 {
        anyhow::bail!("{} batches failed to index", report.failed_batches);
    }
    Ok(())
}
