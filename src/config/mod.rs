use crate::error::Result;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_IMAGE_MODEL: &str = "gpt-image-1";

/// Application settings.
///
/// Sources, lowest priority first: built-in defaults, an optional
/// `librarian.toml` next to the binary, then `APP_*` environment variables
/// (`APP_OPENAI_API_KEY`, `APP_PINECONE_HOST`, ...).
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Comma separated list of allowed origins; empty allows any origin.
    pub cors_origins: String,

    pub openai_api_key: String,
    pub openai_base_url: String,
    pub embedding_model: String,
    pub chat_model: String,
    pub image_model: String,

    pub pinecone_api_key: String,
    pub pinecone_host: String,
    pub pinecone_namespace: Option<String>,

    pub database_url: String,
    pub corpus_path: String,

    pub search_timeout_secs: u64,
    pub generation_timeout_secs: u64,
    pub image_timeout_secs: u64,
}

impl Config {
    /// Load configuration from `.env`, `librarian.toml` and the environment.
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let builder = config::Config::builder()
            .add_source(config::File::with_name("librarian").required(false))
            .add_source(config::Environment::with_prefix("APP"));

        Self::from_builder(builder)
    }

    /// Apply defaults underneath the given sources and deserialize.
    pub fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self> {
        let settings = builder
            .set_default("host", "127.0.0.1")?
            .set_default("port", 8000)?
            .set_default("cors_origins", "")?
            .set_default("openai_base_url", DEFAULT_OPENAI_BASE_URL)?
            .set_default("embedding_model", DEFAULT_EMBEDDING_MODEL)?
            .set_default("chat_model", DEFAULT_CHAT_MODEL)?
            .set_default("image_model", DEFAULT_IMAGE_MODEL)?
            .set_default("database_url", "sqlite://smart_librarian.db")?
            .set_default("corpus_path", "data/book_summaries.json")?
            .set_default("search_timeout_secs", 15)?
            .set_default("generation_timeout_secs", 30)?
            .set_default("image_timeout_secs", 120)?
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.openai_api_key.trim().is_empty() {
            return Err(crate::error::ApiError::ConfigError(
                "APP_OPENAI_API_KEY is empty".to_string(),
            ));
        }
        if self.pinecone_api_key.trim().is_empty() || self.pinecone_host.trim().is_empty() {
            return Err(crate::error::ApiError::ConfigError(
                "APP_PINECONE_API_KEY and APP_PINECONE_HOST must be set".to_string(),
            ));
        }
        Ok(())
    }

    pub fn allowed_origins(&self) -> Vec<String> {
        self.cors_origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    pub fn image_timeout(&self) -> Duration {
        Duration::from_secs(self.image_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};

    fn from_toml(toml: &str) -> Result<Config> {
        Config::from_builder(
            config::Config::builder().add_source(File::from_str(toml, FileFormat::Toml)),
        )
    }

    #[test]
    fn test_defaults_fill_optional_settings() {
        let config = from_toml(
            r#"
            openai_api_key = "sk-test"
            pinecone_api_key = "pc-test"
            pinecone_host = "https://books.svc.pinecone.io"
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 8000);
        assert_eq!(config.chat_model, "gpt-4o-mini");
        assert_eq!(config.embedding_model, "text-embedding-3-small");
        assert_eq!(config.search_timeout(), Duration::from_secs(15));
        assert!(config.pinecone_namespace.is_none());
        assert!(config.allowed_origins().is_empty());
    }

    #[test]
    fn test_origins_are_split_and_trimmed() {
        let config = from_toml(
            r#"
            openai_api_key = "sk-test"
            pinecone_api_key = "pc-test"
            pinecone_host = "https://books.svc.pinecone.io"
            cors_origins = "http://localhost:3000, http://127.0.0.1:3000,"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.allowed_origins(),
            vec!["http://localhost:3000", "http://127.0.0.1:3000"]
        );
    }

    #[test]
    fn test_missing_api_key_is_rejected() {
        let result = from_toml(
            r#"
            pinecone_api_key = "pc-test"
            pinecone_host = "https://books.svc.pinecone.io"
            "#,
        );
        assert!(matches!(result, Err(crate::error::ApiError::ConfigError(_))));
    }

    #[test]
    fn test_blank_api_key_is_rejected() {
        let result = from_toml(
            r#"
            openai_api_key = "  "
            pinecone_api_key = "pc-test"
            pinecone_host = "https://books.svc.pinecone.io"
            "#,
        );
        assert!(result.is_err());
    }
}
