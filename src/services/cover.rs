use crate::{
    error::{ApiError, Result},
    models::CoverOutcome,
    services::{recommendation::NO_MATCH_TITLE, ImageGenerator},
};
use std::sync::Arc;
use tracing::{info, warn};

const DEFAULT_THEME: &str = "literary, elegant";
const COVER_SIZE: &str = "1024x1024";

/// Generates cover art for a recommended title.
#[derive(Clone)]
pub struct CoverService {
    generator: Arc<dyn ImageGenerator>,
}

impl CoverService {
    pub fn new(generator: Arc<dyn ImageGenerator>) -> Self {
        Self { generator }
    }

    /// Only invalid input is an `Err`; generation failures come back as
    /// [`CoverOutcome::Failed`].
    pub async fn generate_cover(&self, title: &str, theme: Option<&str>) -> Result<CoverOutcome> {
        let title = title.trim();
        if title.is_empty() || title.eq_ignore_ascii_case(NO_MATCH_TITLE) {
            return Err(ApiError::InvalidInput(
                "Invalid or missing 'title'.".to_string(),
            ));
        }

        let prompt = cover_prompt(title, theme);
        info!("Generating cover for '{}'", title);

        match self.generator.generate(&prompt, COVER_SIZE).await {
            Ok(b64) => Ok(CoverOutcome::Generated {
                image_url: format!("data:image/png;base64,{}", b64),
            }),
            Err(e) => {
                warn!("Image generation failed for '{}': {}", title, e);
                Ok(CoverOutcome::Failed {
                    error: e.to_string(),
                })
            }
        }
    }
}

pub fn cover_prompt(title: &str, theme: Option<&str>) -> String {
    let theme = theme
        .map(str::trim)
        .filter(|theme| !theme.is_empty())
        .unwrap_or(DEFAULT_THEME);

    format!(
        "A stylish, minimalist book cover for '{}'. Theme: {}. \
         Flat illustration, high-contrast, balanced typography, no text overlays.",
        title, theme
    )
}
