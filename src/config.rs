use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub database: DatabaseConfig,
    pub minio: MinioConfig,
    pub ai: AiConfig,
    pub study: StudyConfig,
    pub features: FeatureFlags,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// When disabled, requests run as a fixed local user. Meant for
    /// development against a database without a token issuer.
    pub enabled: bool,
    pub jwt_secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MinioConfig {
    pub endpoint: String,
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket_name: String,
}

/// OpenAI-compatible gateway settings. `model` drives flashcard and concept
/// generation, `quiz_model` the MCQ prompts, `embedding_model` the chunk
/// annotation pass.
#[derive(Debug, Deserialize, Clone)]
pub struct AiConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub quiz_model: String,
    pub embedding_model: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StudyConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// How many chunks feed a single generation prompt.
    pub generation_chunk_limit: usize,
    /// Character cap on the concatenated context for concept extraction.
    pub concept_context_chars: usize,
    pub default_card_count: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeatureFlags {
    pub pdf_upload_enabled: bool,
    pub embeddings_enabled: bool,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        Config::builder()
            .add_source(File::with_name("config/default"))
            .add_source(File::with_name(&format!("config/{environment}")).required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_loads() {
        let config = AppConfig::load();
        assert!(config.is_ok(), "default config should load: {config:?}");

        let config = config.unwrap();
        assert_eq!(config.server.port, 3000);
        assert!(config.features.pdf_upload_enabled);
    }

    #[test]
    fn test_study_defaults_are_consistent() {
        let config = AppConfig::load().unwrap();
        assert_eq!(config.study.chunk_size, 1000);
        assert_eq!(config.study.chunk_overlap, 100);
        assert!(
            config.study.chunk_overlap < config.study.chunk_size,
            "overlap must leave the window a positive stride"
        );
        assert!(config.study.default_card_count > 0);
    }
}
