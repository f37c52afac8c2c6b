use crate::{
    error::{ApiError, Result},
    models::BookRecord,
};
use std::{collections::HashSet, fs, path::Path};
use tracing::{info, warn};

/// Returned by [`CorpusStore::summary_for`] when no book carries the title.
pub const SUMMARY_UNAVAILABLE: &str = "Summary for this title does not exist.";

/// Read-only set of books loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct CorpusStore {
    books: Vec<BookRecord>,
}

impl CorpusStore {
    pub fn from_records(books: Vec<BookRecord>) -> Self {
        let mut seen = HashSet::with_capacity(books.len());
        for book in &books {
            if !seen.insert(book.title.to_lowercase()) {
                warn!(
                    "Duplicate title '{}' in corpus, only the first entry is reachable",
                    book.title
                );
            }
        }

        Self { books }
    }

    /// Load the corpus from a JSON array of `{title, short_summary, full_summary}`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            ApiError::ConfigError(format!("Failed to read corpus {}: {}", path.display(), e))
        })?;
        let books: Vec<BookRecord> = serde_json::from_str(&raw)?;

        info!("Loaded {} books from {}", books.len(), path.display());
        Ok(Self::from_records(books))
    }

    /// Full summary for an exact, case-insensitive title match.
    pub fn summary_for(&self, title: &str) -> &str {
        let wanted = title.to_lowercase();
        self.books
            .iter()
            .find(|book| book.title.to_lowercase() == wanted)
            .map(|book| book.full_summary.as_str())
            .unwrap_or(SUMMARY_UNAVAILABLE)
    }

    pub fn books(&self) -> &[BookRecord] {
        &self.books
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}
