use serde::{Deserialize, Serialize};

pub use book::BookRecord;
pub use history::{HistoryEntry, NewHistoryEntry};
pub use retrieval::RetrievedDocument;

mod book;
mod history;
mod retrieval;

/// Request structure for a book recommendation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationRequest {
    /// Free-text description of what the reader is looking for
    pub query: String,
}

/// Recommendation returned by `POST /recommend` and persisted to history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub title: String,
    pub short_recommendation: String,
    pub detailed_summary: Option<String>,
}

/// Request structure for cover generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverRequest {
    pub title: String,
    #[serde(default)]
    pub theme: Option<String>,
}

/// Either a data URL for the generated cover or the reason it failed.
///
/// Both variants are sent with a 200 status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CoverOutcome {
    Generated { image_url: String },
    Failed { error: String },
}

/// Health check response structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// Current timestamp in RFC3339 format
    pub timestamp: String,
}
