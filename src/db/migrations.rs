use anyhow::{Context, Result};
use sqlx::PgPool;

pub async fn run_all(pool: &PgPool) -> Result<()> {
    create_books_table(pool).await?;
    create_materials_table(pool).await?;
    create_chunks_table(pool).await?;
    create_decks_table(pool).await?;
    create_cards_table(pool).await?;
    create_concepts_table(pool).await?;
    create_reviews_table(pool).await?;
    tracing::info!("Database migrations completed");
    Ok(())
}

async fn create_books_table(pool: &PgPool) -> Result<()> {
    sqlx::raw_sql(
        "CREATE TABLE IF NOT EXISTS books (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            title TEXT NOT NULL,
            author TEXT,
            created_at TIMESTAMPTZ NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_books_user ON books(user_id);",
    )
    .execute(pool)
    .await
    .context("Failed to create books table")?;
    Ok(())
}

async fn create_materials_table(pool: &PgPool) -> Result<()> {
    sqlx::raw_sql(
        "CREATE TABLE IF NOT EXISTS materials (
            id TEXT PRIMARY KEY,
            book_id TEXT NOT NULL,
            filename TEXT NOT NULL,
            storage_path TEXT NOT NULL,
            content_type TEXT NOT NULL,
            size_bytes BIGINT NOT NULL,
            pages INTEGER,
            status TEXT NOT NULL CHECK(status IN ('uploading', 'processing', 'ready', 'failed')),
            error_message TEXT,
            created_at TIMESTAMPTZ NOT NULL,
            processed_at TIMESTAMPTZ,
            FOREIGN KEY(book_id) REFERENCES books(id) ON DELETE CASCADE
        );
        CREATE INDEX IF NOT EXISTS idx_materials_book ON materials(book_id);
        CREATE INDEX IF NOT EXISTS idx_materials_status ON materials(status);",
    )
    .execute(pool)
    .await
    .context("Failed to create materials table")?;
    Ok(())
}

async fn create_chunks_table(pool: &PgPool) -> Result<()> {
    sqlx::raw_sql(
        "CREATE TABLE IF NOT EXISTS chunks (
            id TEXT PRIMARY KEY,
            material_id TEXT NOT NULL,
            book_id TEXT NOT NULL,
            page_from INTEGER NOT NULL,
            page_to INTEGER NOT NULL,
            topic TEXT,
            difficulty INTEGER NOT NULL,
            text TEXT NOT NULL,
            embedding TEXT,
            created_at TIMESTAMPTZ NOT NULL,
            FOREIGN KEY(material_id) REFERENCES materials(id) ON DELETE CASCADE,
            FOREIGN KEY(book_id) REFERENCES books(id) ON DELETE CASCADE
        );
        CREATE INDEX IF NOT EXISTS idx_chunks_material ON chunks(material_id);
        CREATE INDEX IF NOT EXISTS idx_chunks_book ON chunks(book_id);",
    )
    .execute(pool)
    .await
    .context("Failed to create chunks table")?;
    Ok(())
}

async fn create_decks_table(pool: &PgPool) -> Result<()> {
    sqlx::raw_sql(
        "CREATE TABLE IF NOT EXISTS decks (
            id TEXT PRIMARY KEY,
            book_id TEXT NOT NULL,
            title TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL,
            FOREIGN KEY(book_id) REFERENCES books(id) ON DELETE CASCADE,
            UNIQUE(book_id, title)
        );
        CREATE INDEX IF NOT EXISTS idx_decks_book ON decks(book_id);",
    )
    .execute(pool)
    .await
    .context("Failed to create decks table")?;
    Ok(())
}

async fn create_cards_table(pool: &PgPool) -> Result<()> {
    sqlx::raw_sql(
        "CREATE TABLE IF NOT EXISTS cards (
            id TEXT PRIMARY KEY,
            deck_id TEXT NOT NULL,
            book_id TEXT NOT NULL,
            card_type TEXT NOT NULL CHECK(card_type IN ('flashcard', 'mcq')),
            question TEXT NOT NULL,
            answer TEXT NOT NULL,
            distractors TEXT[] NOT NULL DEFAULT '{}',
            difficulty INTEGER NOT NULL,
            source_chunk_ids TEXT[] NOT NULL DEFAULT '{}',
            created_at TIMESTAMPTZ NOT NULL,
            FOREIGN KEY(deck_id) REFERENCES decks(id) ON DELETE CASCADE,
            FOREIGN KEY(book_id) REFERENCES books(id) ON DELETE CASCADE
        );
        CREATE INDEX IF NOT EXISTS idx_cards_deck ON cards(deck_id);
        CREATE INDEX IF NOT EXISTS idx_cards_book ON cards(book_id);",
    )
    .execute(pool)
    .await
    .context("Failed to create cards table")?;
    Ok(())
}

async fn create_concepts_table(pool: &PgPool) -> Result<()> {
    sqlx::raw_sql(
        "CREATE TABLE IF NOT EXISTS concepts (
            id TEXT PRIMARY KEY,
            book_id TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT,
            parent_id TEXT,
            level INTEGER NOT NULL,
            order_index INTEGER NOT NULL,
            created_at TIMESTAMPTZ NOT NULL,
            FOREIGN KEY(book_id) REFERENCES books(id) ON DELETE CASCADE,
            FOREIGN KEY(parent_id) REFERENCES concepts(id) ON DELETE CASCADE
        );
        CREATE INDEX IF NOT EXISTS idx_concepts_book ON concepts(book_id);",
    )
    .execute(pool)
    .await
    .context("Failed to create concepts table")?;
    Ok(())
}

async fn create_reviews_table(pool: &PgPool) -> Result<()> {
    sqlx::raw_sql(
        "CREATE TABLE IF NOT EXISTS reviews (
            id TEXT PRIMARY KEY,
            card_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            grade INTEGER NOT NULL,
            interval_days INTEGER NOT NULL,
            ease_factor DOUBLE PRECISION NOT NULL,
            due_at TIMESTAMPTZ NOT NULL,
            reviewed_at TIMESTAMPTZ NOT NULL,
            created_at TIMESTAMPTZ NOT NULL,
            FOREIGN KEY(card_id) REFERENCES cards(id) ON DELETE CASCADE
        );
        CREATE INDEX IF NOT EXISTS idx_reviews_card ON reviews(card_id, reviewed_at DESC);
        CREATE INDEX IF NOT EXISTS idx_reviews_user ON reviews(user_id);",
    )
    .execute(pool)
    .await
    .context("Failed to create reviews table")?;
    Ok(())
}
