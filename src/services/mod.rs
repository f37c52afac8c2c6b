pub mod composer;
pub mod corpus;
pub mod cover;
pub mod history;
pub mod openai;
pub mod pinecone;
pub mod recommendation;
pub mod title_resolver;

use crate::{error::Result, models::RetrievedDocument};
use async_trait::async_trait;

// Re-export public types
pub use composer::{Composition, RecommendationComposer};
pub use corpus::CorpusStore;
pub use cover::CoverService;
pub use history::HistoryLedger;
pub use openai::OpenAiClient;
pub use pinecone::{PineconeClient, PineconeIndex};
pub use recommendation::RecommendationService;
pub use title_resolver::{Candidate, TitleSource};

/// Ranked similarity search over the indexed corpus.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Return at most `k` documents, best match first.
    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<RetrievedDocument>>;
}

/// Turns text into embedding vectors, one per input, in input order.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Chat-style text generation.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_prompt: &str, temperature: f32)
        -> Result<String>;
}

/// Image synthesis returning base64 encoded PNG bytes.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, size: &str) -> Result<String>;
}
