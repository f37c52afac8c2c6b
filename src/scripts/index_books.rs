use crate::{
    config::Config,
    services::{
        corpus::CorpusStore,
        pinecone::{book_metadata, PineconeClient, Vector},
        Embedder, OpenAiClient,
    },
};
use anyhow::Result;
use futures::FutureExt;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::{collections::HashSet, path::Path};
use tokio::time::{sleep, Duration};

/// Tuning knobs for a single ingestion run.
#[derive(Debug, Clone)]
pub struct IndexOptions {
    pub batch_size: usize,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    /// Pause between batches to stay under provider rate limits.
    pub batch_pause: Duration,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            batch_size: 25,
            max_retries: 3,
            retry_delay_ms: 1000,
            batch_pause: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IndexReport {
    pub total_books: usize,
    pub skipped_books: usize,
    pub indexed_books: usize,
    pub successful_batches: usize,
    pub failed_batches: usize,
}

/// Stable vector id for a title: lowercase ASCII words joined by `-`.
pub fn book_id(title: &str) -> String {
    title
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Retry operation with exponential backoff
async fn retry_with_backoff<F, T, E>(operation: F, max_retries: u32, base_delay_ms: u64) -> Result<T>
where
    F: Fn() -> futures::future::BoxFuture<'static, std::result::Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                attempt += 1;
                if attempt >= max_retries {
                    return Err(anyhow::anyhow!(
                        "Operation failed after {} attempts: {}",
                        max_retries,
                        e
                    ));
                }
                let delay = base_delay_ms * 2u64.pow(attempt - 1);
                error!("Attempt {} failed, retrying in {}ms: {}", attempt, delay, e);
                sleep(Duration::from_millis(delay)).await;
            }
        }
    }
}

/// Embed every short summary and upsert it, keyed by title.
pub async fn index_corpus(
    corpus: &CorpusStore,
    embedder: &dyn Embedder,
    pinecone: &PineconeClient,
    options: &IndexOptions,
) -> Result<IndexReport> {
    let mut report = IndexReport {
        total_books: corpus.len(),
        ..IndexReport::default()
    };

    // Titles are the join key with the corpus, so one vector per title.
    let mut seen_ids = HashSet::new();
    let books: Vec<_> = corpus
        .books()
        .iter()
        .filter(|book| {
            let id = book_id(&book.title);
            let keep = !id.is_empty() && !book.short_summary.trim().is_empty() && seen_ids.insert(id);
            if !keep {
                warn!("Skipping '{}': empty or duplicate title, or no summary", book.title);
            }
            keep
        })
        .collect();
    report.skipped_books = report.total_books - books.len();

    if books.is_empty() {
        warn!("No books to index");
        return Ok(report);
    }

    let batch_size = options.batch_size.max(1);
    let total_batches = (books.len() + batch_size - 1) / batch_size;
    info!(
        "Processing {} books in {} batches of {}",
        books.len(),
        total_batches,
        batch_size
    );

    let progress = ProgressBar::new(books.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} {msg}")
            .progress_chars("=> "),
    );

    for (batch_index, batch) in books.chunks(batch_size).enumerate() {
        let batch_num = batch_index + 1;
        let texts: Vec<String> = batch.iter().map(|book| book.short_summary.clone()).collect();

        let embeddings = match embedder.embed(&texts).await {
            Ok(embeddings) => embeddings,
            Err(e) => {
                error!("Failed to embed batch {}: {}", batch_num, e);
                report.failed_batches += 1;
                progress.inc(batch.len() as u64);
                continue;
            }
        };

        let vectors: Vec<Vector> = batch
            .iter()
            .zip(embeddings)
            .map(|(book, values)| Vector {
                id: book_id(&book.title),
                values,
                metadata: Some(book_metadata(&book.title, &book.short_summary)),
            })
            .collect();

        let client = pinecone.clone();
        let upsert = retry_with_backoff(
            || {
                let client = client.clone();
                let vectors = vectors.clone();
                async move { client.upsert(&vectors).await }.boxed()
            },
            options.max_retries,
            options.retry_delay_ms,
        )
        .await;

        match upsert {
            Ok(_) => {
                report.successful_batches += 1;
                report.indexed_books += vectors.len();
                progress.set_message(format!("batch {}/{}", batch_num, total_batches));
            }
            Err(e) => {
                error!("Failed to index batch {} after retries: {}", batch_num, e);
                report.failed_batches += 1;
            }
        }
        progress.inc(batch.len() as u64);

        if batch_num < total_batches {
            sleep(options.batch_pause).await;
        }
    }
    progress.finish_and_clear();

    info!(
        "Indexed {} of {} books ({} batches ok, {} failed)",
        report.indexed_books, report.total_books, report.successful_batches, report.failed_batches
    );
    if report.failed_batches > 0 {
        warn!("Some batches failed to index. Consider re-running for complete indexing.");
    }

    Ok(report)
}

/// Load the corpus file and index it with the configured clients.
pub async fn index_books(
    config: &Config,
    corpus_path: &Path,
    options: &IndexOptions,
) -> Result<IndexReport> {
    info!("Starting book indexing from {}", corpus_path.display());

    let corpus = CorpusStore::load(corpus_path)?;
    let embedder = OpenAiClient::new(config)?;
    let pinecone = PineconeClient::from_config(config)?;

    index_corpus(&corpus, &embedder, &pinecone, options).await
}

/// Log dimension and vector counts of the configured index.
pub async fn print_index_stats(config: &Config) -> Result<()> {
    let pinecone = PineconeClient::from_config(config)?;
    let stats = pinecone.describe_index_stats().await?;
    stats.log_summary();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::ApiError, models::BookRecord};
    use async_trait::async_trait;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct CountingEmbedder {
        fail: bool,
    }

    #[async_trait]
    impl Embedder for CountingEmbedder {
        async fn embed(&self, texts: &[String]) -> crate::error::Result<Vec<Vec<f32>>> {
            if self.fail {
                return Err(ApiError::ExternalServiceError("quota exceeded".into()));
            }
            Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
        }
    }

    fn record(title: &str, short_summary: &str) -> BookRecord {
        BookRecord {
            title: title.to_string(),
            short_summary: short_summary.to_string(),
            full_summary: format!("All about {}", title),
        }
    }

    fn fast_options(batch_size: usize) -> IndexOptions {
        IndexOptions {
            batch_size,
            max_retries: 2,
            retry_delay_ms: 1,
            batch_pause: Duration::from_millis(0),
        }
    }

    #[test]
    fn test_book_id_slugs_titles() {
        assert_eq!(book_id("The Hobbit"), "the-hobbit");
        assert_eq!(book_id("  1984 "), "1984");
        assert_eq!(book_id("To Kill a Mockingbird!"), "to-kill-a-mockingbird");
        assert_eq!(book_id("???"), "");
    }

    #[tokio::test]
    async fn test_index_corpus_upserts_in_batches() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/vectors/upsert"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"upsertedCount": 2})))
            .expect(2)
            .mount(&server)
            .await;

        let corpus = CorpusStore::from_records(vec![
            record("Dune", "Spice."),
            record("1984", "Big Brother."),
            record("Emma", "Matchmaking."),
            record("dune", "Duplicate."),
        ]);
        let pinecone = PineconeClient::new("k", &server.uri(), None, Duration::from_secs(5)).unwrap();

        let report = index_corpus(
            &corpus,
            &CountingEmbedder { fail: false },
            &pinecone,
            &fast_options(2),
        )
        .await
        .unwrap();

        assert_eq!(report.total_books, 4);
        assert_eq!(report.skipped_books, 1);
        assert_eq!(report.indexed_books, 3);
        assert_eq!(report.successful_batches, 2);
        assert_eq!(report.failed_batches, 0);
    }

    #[tokio::test]
    async fn test_embedding_failure_counts_failed_batches() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/vectors/upsert"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"upsertedCount": 1})))
            .expect(0)
            .mount(&server)
            .await;

        let corpus = CorpusStore::from_records(vec![record("Dune", "Spice.")]);
        let pinecone = PineconeClient::new("k", &server.uri(), None, Duration::from_secs(5)).unwrap();

        let report = index_corpus(
            &corpus,
            &CountingEmbedder { fail: true },
            &pinecone,
            &fast_options(10),
        )
        .await
        .unwrap();

        assert_eq!(report.failed_batches, 1);
        assert_eq!(report.indexed_books, 0);
    }

    #[tokio::test]
    async fn test_upsert_is_retried_before_giving_up() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/vectors/upsert"))
            .respond_with(ResponseTemplate::new(500))
            .expect(2)
            .mount(&server)
            .await;

        let corpus = CorpusStore::from_records(vec![record("Dune", "Spice.")]);
        let pinecone = PineconeClient::new("k", &server.uri(), None, Duration::from_secs(5)).unwrap();

        let report = index_corpus(
            &corpus,
            &CountingEmbedder { fail: false },
            &pinecone,
            &fast_options(10),
        )
        .await
        .unwrap();

        assert_eq!(report.successful_batches, 0);
        assert_eq!(report.failed_batches, 1);
    }
}
