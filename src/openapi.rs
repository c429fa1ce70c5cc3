use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::db::models::card::CardType;
use crate::db::models::material::MaterialStatus;
use crate::dto::book::{BookResponse, BookSummaryResponse, CreateBookRequest};
use crate::dto::card::{CardResponse, StudyCardResponse};
use crate::dto::concept::{ConceptTreeNode, SubConceptNode};
use crate::dto::material::{MaterialResponse, ProcessResponse};
use crate::dto::review::{AnswerRequest, AnswerResponse, CreateReviewRequest, ReviewResponse};
use crate::errors::ErrorResponse;
use crate::routes::decks::DeckSummaryResponse;
use crate::routes::generate::{GenerateCardsResponse, GenerateConceptsResponse, GenerateRequest};
use crate::routes::health::HealthResponse;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "BookBrain API",
        version = "0.1.0",
        description = "Study-aid backend — PDF upload and chunking, AI-generated flashcards, quizzes, and concept maps, spaced-repetition review."
    ),
    modifiers(&SecurityAddon),
    paths(
        // Public
        crate::routes::health::health_check,
        // Books
        crate::routes::books::create_book,
        crate::routes::books::list_books,
        crate::routes::books::get_book,
        // Materials
        crate::routes::materials::upload,
        crate::routes::materials::list_materials,
        crate::routes::materials::process,
        crate::routes::materials::delete_material,
        // Generation
        crate::routes::generate::flashcards,
        crate::routes::generate::quiz,
        crate::routes::generate::concepts,
        // Study
        crate::routes::concepts::list_concepts,
        crate::routes::decks::list_decks,
        crate::routes::cards::list_cards,
        // Reviews
        crate::routes::reviews::create_review,
        crate::routes::reviews::answer_card,
    ),
    components(
        schemas(
            // Books
            CreateBookRequest, BookResponse, BookSummaryResponse,
            // Materials
            MaterialResponse, MaterialStatus, ProcessResponse,
            // Generation
            GenerateRequest, GenerateCardsResponse, GenerateConceptsResponse,
            // Study
            CardResponse, CardType, StudyCardResponse,
            ConceptTreeNode, SubConceptNode, DeckSummaryResponse,
            // Reviews
            CreateReviewRequest, ReviewResponse, AnswerRequest, AnswerResponse,
            // Misc
            HealthResponse, ErrorResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check"),
        (name = "Books", description = "Book library management"),
        (name = "Materials", description = "PDF upload and processing"),
        (name = "Generate", description = "AI generation of flashcards, quizzes, and concept maps"),
        (name = "Concepts", description = "Key-concept maps"),
        (name = "Decks", description = "Card decks and due counts"),
        (name = "Cards", description = "Study cards"),
        (name = "Reviews", description = "Spaced-repetition grading"),
    )
)]
pub struct ApiDoc;
