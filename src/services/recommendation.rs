use crate::{
    error::{ApiError, Result},
    models::{NewHistoryEntry, RecommendationResult},
    services::{
        composer::RecommendationComposer, corpus::CorpusStore, history::HistoryLedger,
        title_resolver, VectorIndex,
    },
};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Number of neighbours requested from the vector index; only the best one
/// is used.
pub const SEARCH_K: usize = 4;

pub const NO_MATCH_TITLE: &str = "No match found";
pub const NO_MATCH_MESSAGE: &str = "I couldn't find a good match. Try wording it differently \
     (e.g., 'friendship and magic', 'war and honor').";

/// Retrieval, generation and local lookup for a single query.
#[derive(Clone)]
pub struct RecommendationService {
    index: Arc<dyn VectorIndex>,
    composer: RecommendationComposer,
    corpus: Arc<CorpusStore>,
    history: HistoryLedger,
}

impl RecommendationService {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        composer: RecommendationComposer,
        corpus: Arc<CorpusStore>,
        history: HistoryLedger,
    ) -> Self {
        Self {
            index,
            composer,
            corpus,
            history,
        }
    }

    /// Build a recommendation and record it in the history ledger.
    ///
    /// Exactly one history entry is appended per successful call, match or
    /// no match. Nothing is recorded when retrieval itself fails.
    pub async fn recommend(&self, query: &str) -> Result<RecommendationResult> {
        let query = query.trim();
        let result = self.suggest(query).await?;

        let stored = self
            .history
            .append(NewHistoryEntry::from_result(query, &result))
            .await?;
        debug!("Recorded recommendation as history entry {}", stored.id);

        Ok(result)
    }

    /// Same pipeline as [`recommend`](Self::recommend) without persisting.
    pub async fn suggest(&self, query: &str) -> Result<RecommendationResult> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ApiError::InvalidInput("Empty query.".to_string()));
        }

        info!("Searching vector index for '{}'", query);
        let documents = self
            .index
            .similarity_search(query, SEARCH_K)
            .await
            .map_err(|e| {
                error!("Vector search failed: {}", e);
                ApiError::RetrievalUnavailable(e.to_string())
            })?;

        let Some(candidate) = title_resolver::resolve(&documents) else {
            info!("No candidate for '{}'", query);
            return Ok(no_match());
        };

        debug!(
            "Top candidate '{}' (title from {:?})",
            candidate.title, candidate.source
        );

        let composition = self
            .composer
            .compose(query, &candidate.title, &candidate.content)
            .await;
        let detailed_summary = self.corpus.summary_for(&candidate.title).to_string();

        info!(
            "Recommending '{}' (fallback text: {})",
            candidate.title,
            composition.is_fallback()
        );

        Ok(RecommendationResult {
            title: candidate.title,
            short_recommendation: composition.into_text(),
            detailed_summary: Some(detailed_summary),
        })
    }
}

fn no_match() -> RecommendationResult {
    RecommendationResult {
        title: NO_MATCH_TITLE.to_string(),
        short_recommendation: NO_MATCH_MESSAGE.to_string(),
        detailed_summary: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{BookRecord, RetrievedDocument},
        services::{corpus::SUMMARY_UNAVAILABLE, TextGenerator},
    };
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct StaticIndex {
        documents: Option<Vec<RetrievedDocument>>,
        requested_k: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl VectorIndex for StaticIndex {
        async fn similarity_search(&self, _query: &str, k: usize) -> Result<Vec<RetrievedDocument>> {
            self.requested_k.lock().unwrap().push(k);
            self.documents
                .clone()
                .ok_or_else(|| ApiError::ExternalServiceError("connection refused".into()))
        }
    }

    struct EchoGenerator {
        fail: bool,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TextGenerator for EchoGenerator {
        async fn complete(&self, _system: &str, user: &str, _temperature: f32) -> Result<String> {
            self.prompts.lock().unwrap().push(user.to_string());
            if self.fail {
                Err(ApiError::ExternalServiceError("model overloaded".into()))
            } else {
                Ok("A sweeping desert epic.".to_string())
            }
        }
    }

    struct Fixture {
        service: RecommendationService,
        index: Arc<StaticIndex>,
        generator: Arc<EchoGenerator>,
        history: HistoryLedger,
    }

    async fn fixture(documents: Option<Vec<RetrievedDocument>>, fail_generation: bool) -> Fixture {
        let index = Arc::new(StaticIndex {
            documents,
            requested_k: Mutex::new(Vec::new()),
        });
        let generator = Arc::new(EchoGenerator {
            fail: fail_generation,
            prompts: Mutex::new(Vec::new()),
        });
        let corpus = CorpusStore::from_records(vec![BookRecord {
            title: "Dune".to_string(),
            short_summary: "Spice and sand.".to_string(),
            full_summary: "Paul Atreides arrives on Arrakis...".to_string(),
        }]);
        let history = HistoryLedger::in_memory().await.unwrap();

        let service = RecommendationService::new(
            index.clone(),
            RecommendationComposer::new(generator.clone()),
            Arc::new(corpus),
            history.clone(),
        );

        Fixture {
            service,
            index,
            generator,
            history,
        }
    }

    fn dune() -> RetrievedDocument {
        RetrievedDocument::new("Spice and sand.").with_metadata("title", "dune")
    }

    #[tokio::test]
    async fn test_empty_query_is_rejected_before_search() {
        let f = fixture(Some(vec![dune()]), false).await;

        let result = f.service.recommend("   ").await;
        assert!(matches!(result, Err(ApiError::InvalidInput(_))));
        assert!(f.index.requested_k.lock().unwrap().is_empty());
        assert_eq!(f.history.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_match_combines_generation_and_summary() {
        let f = fixture(Some(vec![dune()]), false).await;

        let result = f.service.recommend("  desert planet  ").await.unwrap();
        assert_eq!(result.title, "dune");
        assert_eq!(result.short_recommendation, "A sweeping desert epic.");
        assert_eq!(
            result.detailed_summary.as_deref(),
            Some("Paul Atreides arrives on Arrakis...")
        );
        assert_eq!(*f.index.requested_k.lock().unwrap(), vec![SEARCH_K]);

        let history = f.history.list().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].query, "desert planet");
        assert_eq!(history[0].title, "dune");
    }

    #[tokio::test]
    async fn test_composer_gets_retrieved_content_not_summary() {
        let f = fixture(Some(vec![dune()]), false).await;
        f.service.recommend("desert").await.unwrap();

        let prompts = f.generator.prompts.lock().unwrap();
        assert!(prompts[0].contains("Spice and sand."));
        assert!(!prompts[0].contains("Paul Atreides"));
    }

    #[tokio::test]
    async fn test_no_documents_records_no_match() {
        let f = fixture(Some(Vec::new()), false).await;

        let result = f.service.recommend("something obscure").await.unwrap();
        assert_eq!(result.title, NO_MATCH_TITLE);
        assert_eq!(result.short_recommendation, NO_MATCH_MESSAGE);
        assert_eq!(result.detailed_summary, None);
        assert!(f.generator.prompts.lock().unwrap().is_empty());

        let history = f.history.list().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].title, NO_MATCH_TITLE);
        assert_eq!(history[0].detailed_summary, None);
    }

    #[tokio::test]
    async fn test_generation_failure_degrades_to_fallback() {
        let f = fixture(Some(vec![dune()]), true).await;

        let result = f.service.recommend("desert").await.unwrap();
        assert_eq!(result.short_recommendation, "dune might fit your request.");
        assert_eq!(f.history.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_search_failure_is_surfaced_and_not_recorded() {
        let f = fixture(None, false).await;

        let result = f.service.recommend("desert").await;
        assert!(matches!(result, Err(ApiError::RetrievalUnavailable(_))));
        assert_eq!(f.history.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_title_gets_unavailable_summary() {
        let doc = RetrievedDocument::new("A story with no heading");
        let f = fixture(Some(vec![doc]), false).await;

        let result = f.service.suggest("anything").await.unwrap();
        assert_eq!(result.title, title_resolver::UNKNOWN_TITLE);
        assert_eq!(result.detailed_summary.as_deref(), Some(SUMMARY_UNAVAILABLE));
        assert_eq!(f.history.count().await.unwrap(), 0);
    }
}
