use std::sync::Arc;

use anyhow::Result;
use sqlx::PgPool;

use crate::config::AppConfig;
use crate::db::models::book::BookRepository;
use crate::db::models::card::CardRepository;
use crate::db::models::chunk::ChunkRepository;
use crate::db::models::concept::ConceptRepository;
use crate::db::models::deck::DeckRepository;
use crate::db::models::material::MaterialRepository;
use crate::db::models::review::ReviewRepository;
use crate::services::ai::AiService;
use crate::services::storage::StorageService;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub book_repo: BookRepository,
    pub material_repo: MaterialRepository,
    pub chunk_repo: ChunkRepository,
    pub deck_repo: DeckRepository,
    pub card_repo: CardRepository,
    pub concept_repo: ConceptRepository,
    pub review_repo: ReviewRepository,
    pub storage: StorageService,
    pub ai: AiService,
}

impl AppState {
    /// Builds the shared service bundle. Connects to MinIO (creating the
    /// bucket when missing) and validates the AI gateway settings, so a
    /// misconfigured deployment fails at startup rather than mid-request.
    pub async fn from_config(config: AppConfig, pool: PgPool) -> Result<Self> {
        let storage = StorageService::new(&config.minio).await?;
        let ai = AiService::new(&config.ai)?;

        Ok(Self {
            config: Arc::new(config),
            book_repo: BookRepository::new(pool.clone()),
            material_repo: MaterialRepository::new(pool.clone()),
            chunk_repo: ChunkRepository::new(pool.clone()),
            deck_repo: DeckRepository::new(pool.clone()),
            card_repo: CardRepository::new(pool.clone()),
            concept_repo: ConceptRepository::new(pool.clone()),
            review_repo: ReviewRepository::new(pool),
            storage,
            ai,
        })
    }
}
