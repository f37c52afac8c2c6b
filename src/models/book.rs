use serde::{Deserialize, Serialize};

/// One entry of the static corpus.
///
/// `short_summary` is what gets embedded into the vector index, and
/// `full_summary` is returned verbatim when a recommendation lands on this
/// title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    pub title: String,
    #[serde(alias = "shortSummary")]
    pub short_summary: String,
    #[serde(alias = "fullSummary")]
    pub full_summary: String,
}
