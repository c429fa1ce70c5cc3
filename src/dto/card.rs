use rand::seq::SliceRandom;
use serde::Serialize;

use crate::db::models::card::{Card, CardType};

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CardResponse {
    pub id: String,
    pub deck_id: String,
    pub book_id: String,
    pub card_type: CardType,
    pub question: String,
    pub answer: String,
    pub distractors: Vec<String>,
    pub difficulty: i32,
    pub source_chunk_ids: Vec<String>,
    pub created_at: String,
}

impl From<Card> for CardResponse {
    fn from(card: Card) -> Self {
        Self {
            id: card.id,
            deck_id: card.deck_id,
            book_id: card.book_id,
            card_type: card.card_type,
            question: card.question,
            answer: card.answer,
            distractors: card.distractors,
            difficulty: card.difficulty,
            source_chunk_ids: card.source_chunk_ids,
            created_at: card.created_at,
        }
    }
}

/// A card as served to a study session. MCQ cards carry a pre-shuffled
/// `options` list (the answer mixed among the distractors) so clients can
/// render choices without knowing which position holds the answer.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StudyCardResponse {
    #[serde(flatten)]
    pub card: CardResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl StudyCardResponse {
    pub fn new(card: Card) -> Self {
        let options = match card.card_type {
            CardType::Mcq => {
                let mut options: Vec<String> = std::iter::once(card.answer.clone())
                    .chain(card.distractors.iter().cloned())
                    .collect();
                options.shuffle(&mut rand::rng());
                Some(options)
            }
            CardType::Flashcard => None,
        };

        Self {
            card: card.into(),
            options,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mcq_card() -> Card {
        Card {
            id: "card-1".to_string(),
            deck_id: "deck-1".to_string(),
            book_id: "book-1".to_string(),
            card_type: CardType::Mcq,
            question: "What does a ribosome do?".to_string(),
            answer: "Synthesizes proteins".to_string(),
            distractors: vec![
                "Stores genetic material".to_string(),
                "Produces ATP".to_string(),
                "Breaks down waste".to_string(),
            ],
            difficulty: 3,
            source_chunk_ids: vec![],
            created_at: "2025-03-01T12:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_mcq_options_hold_answer_and_all_distractors() {
        let response = StudyCardResponse::new(mcq_card());

        let mut options = response.options.unwrap();
        assert_eq!(options.len(), 4);
        options.sort();

        let mut expected = vec![
            "Synthesizes proteins".to_string(),
            "Stores genetic material".to_string(),
            "Produces ATP".to_string(),
            "Breaks down waste".to_string(),
        ];
        expected.sort();
        assert_eq!(options, expected);
    }

    #[test]
    fn test_flashcards_carry_no_options() {
        let mut card = mcq_card();
        card.card_type = CardType::Flashcard;
        card.distractors.clear();

        let response = StudyCardResponse::new(card);
        assert!(response.options.is_none());
    }
}
