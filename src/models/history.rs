use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted query and the recommendation produced for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct HistoryEntry {
    pub id: i64,
    pub query: String,
    pub title: String,
    pub short_recommendation: Option<String>,
    pub detailed_summary: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The caller-supplied part of a history entry; id and timestamp are
/// assigned by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewHistoryEntry {
    pub query: String,
    pub title: String,
    pub short_recommendation: Option<String>,
    pub detailed_summary: Option<String>,
}

impl NewHistoryEntry {
    pub fn from_result(query: &str, result: &super::RecommendationResult) -> Self {
        Self {
            query: query.to_string(),
            title: result.title.clone(),
            short_recommendation: Some(result.short_recommendation.clone()),
            detailed_summary: result.detailed_summary.clone(),
        }
    }
}
