use crate::services::TextGenerator;
use std::sync::Arc;
use tracing::{debug, warn};

/// Maximum number of characters of retrieved context placed in the prompt.
pub const MAX_CONTEXT_CHARS: usize = 1200;

const SYSTEM_PROMPT: &str = "You recommend books concisely and helpfully.";
const TEMPERATURE: f32 = 0.4;

/// Outcome of asking the language model for a recommendation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Composition {
    Generated(String),
    /// Generation failed; `text` is the canned sentence used instead.
    Fallback { text: String, reason: String },
}

impl Composition {
    pub fn text(&self) -> &str {
        match self {
            Composition::Generated(text) | Composition::Fallback { text, .. } => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Composition::Generated(text) | Composition::Fallback { text, .. } => text,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Composition::Fallback { .. })
    }
}

/// Writes the short, spoiler-free pitch for the resolved title.
#[derive(Clone)]
pub struct RecommendationComposer {
    generator: Arc<dyn TextGenerator>,
}

impl RecommendationComposer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Never fails: any generation error turns into [`Composition::Fallback`].
    pub async fn compose(&self, query: &str, title: &str, context: &str) -> Composition {
        let prompt = build_prompt(query, title, context);

        match self
            .generator
            .complete(SYSTEM_PROMPT, &prompt, TEMPERATURE)
            .await
        {
            Ok(text) if !text.trim().is_empty() => {
                debug!("Generated recommendation for '{}'", title);
                Composition::Generated(text.trim().to_string())
            }
            Ok(_) => fallback(title, "model returned an empty completion".to_string()),
            Err(e) => fallback(title, e.to_string()),
        }
    }
}

fn fallback(title: &str, reason: String) -> Composition {
    warn!("LLM recommendation failed for '{}': {}", title, reason);
    Composition::Fallback {
        text: fallback_text(title),
        reason,
    }
}

pub fn fallback_text(title: &str) -> String {
    format!("{} might fit your request.", title)
}

/// Hard cut at [`MAX_CONTEXT_CHARS`] characters, never splitting a character.
pub fn truncate_context(context: &str) -> &str {
    match context.char_indices().nth(MAX_CONTEXT_CHARS) {
        Some((idx, _)) => &context[..idx],
        None => context,
    }
}

pub fn build_prompt(query: &str, title: &str, context: &str) -> String {
    format!(
        "You are a helpful book recommender. A user asked: \"{query}\"\n\
         \n\
         Top match from the vector store is the book: \"{title}\".\n\
         \n\
         Context (may be partial):\n\
         ---\n\
         {context}\n\
         ---\n\
         \n\
         Write a concise recommendation (2-3 sentences, English). \
         Mention the title once and why it fits the user's request.\n\
         Avoid spoilers.\n",
        query = query,
        title = title,
        context = truncate_context(context),
    )
}
