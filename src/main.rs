use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::{
    middleware as axum_mw,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use bookbrain_backend::config::AppConfig;
use bookbrain_backend::db::{connection, migrations};
use bookbrain_backend::middleware::auth::auth_middleware;
use bookbrain_backend::routes::{
    books, cards, concepts, decks, generate, health, materials, reviews,
};
use bookbrain_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    tracing::info!(
        "Configuration loaded (env: {})",
        std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into())
    );

    let pool = connection::create_pool(&config.database)
        .await
        .context("Failed to create database pool")?;

    migrations::run_all(&pool)
        .await
        .context("Failed to run migrations")?;

    let addr = format!("{}:{}", config.server.host, config.server.port);

    let state = AppState::from_config(config, pool)
        .await
        .context("Failed to build application state")?;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let public_routes = Router::new().route("/api/health", get(health::health_check));

    let protected_routes = Router::new()
        .route("/api/books", post(books::create_book).get(books::list_books))
        .route("/api/books/{id}", get(books::get_book))
        .route(
            "/api/books/{id}/materials",
            post(materials::upload).get(materials::list_materials),
        )
        .route("/api/materials/{id}/process", post(materials::process))
        .route("/api/materials/{id}", delete(materials::delete_material))
        .route(
            "/api/books/{id}/generate/flashcards",
            post(generate::flashcards),
        )
        .route("/api/books/{id}/generate/quiz", post(generate::quiz))
        .route("/api/books/{id}/generate/concepts", post(generate::concepts))
        .route("/api/books/{id}/concepts", get(concepts::list_concepts))
        .route("/api/books/{id}/decks", get(decks::list_decks))
        .route("/api/decks/{id}/cards", get(cards::list_cards))
        .route("/api/cards/{id}/reviews", post(reviews::create_review))
        .route("/api/cards/{id}/answer", post(reviews::answer_card))
        .layer(axum_mw::from_fn_with_state(state.clone(), auth_middleware));

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(materials::MAX_FILE_SIZE + 1024 * 1024))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    #[cfg(feature = "openapi")]
    let app = {
        use utoipa::OpenApi;
        use utoipa_redoc::{Redoc, Servable};

        app.merge(Redoc::with_url(
            "/api/docs",
            bookbrain_backend::openapi::ApiDoc::openapi(),
        ))
    };

    tracing::info!("Starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
