//! Top-1 candidate selection over vector search hits.

use crate::models::RetrievedDocument;
use once_cell::sync::Lazy;
use regex::Regex;

pub const UNKNOWN_TITLE: &str = "Unknown title";

/// Number of content lines inspected for a `Title:` heading.
const HEADING_SCAN_LINES: usize = 3;

static TITLE_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(?:## )?title:").unwrap());

/// Where the resolved title came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleSource {
    /// `title` metadata field
    Metadata,
    /// `bookTitle` (or legacy `book_title`) metadata field
    BookTitleMetadata,
    /// `Title:` / `## Title:` line near the top of the content
    ContentHeading,
    Unknown,
}

/// The single document a recommendation is built from.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub title: String,
    pub source: TitleSource,
    pub content: String,
}

/// Pick the highest-ranked document and work out its display title.
///
/// Lower-ranked documents are ignored entirely. Returns `None` only when
/// there is nothing to pick from.
pub fn resolve(documents: &[RetrievedDocument]) -> Option<Candidate> {
    let top = documents.first()?;
    let (title, source) = extract_title(top);

    Some(Candidate {
        title,
        source,
        content: top.content.clone(),
    })
}

fn extract_title(document: &RetrievedDocument) -> (String, TitleSource) {
    if let Some(title) = document.metadata_str("title") {
        return (title.to_string(), TitleSource::Metadata);
    }

    if let Some(title) = document
        .metadata_str("bookTitle")
        .or_else(|| document.metadata_str("book_title"))
    {
        return (title.to_string(), TitleSource::BookTitleMetadata);
    }

    match heading_title(&document.content) {
        Some(title) => (title, TitleSource::ContentHeading),
        None => (UNKNOWN_TITLE.to_string(), TitleSource::Unknown),
    }
}

/// The first heading line within the scan window decides; an empty value
/// after its colon means no title.
fn heading_title(content: &str) -> Option<String> {
    let line = content
        .lines()
        .take(HEADING_SCAN_LINES)
        .find(|line| TITLE_HEADING.is_match(line.trim()))?;

    let (_, rest) = line.split_once(':')?;
    let title = rest.trim();
    (!title.is_empty()).then(|| title.to_string())
}
