use anyhow::Result;
use serde::Deserialize;
use uuid::Uuid;

use crate::db::models::card::{Card, CardType, NewCard};
use crate::db::models::chunk::{Chunk, NewChunk};
use crate::db::models::concept::NewConcept;
use crate::db::models::deck::Deck;
use crate::db::models::material::{Material, MaterialStatus};
use crate::errors::AppError;
use crate::services::ai::ChatRequest;
use crate::services::{chunker, pdf};
use crate::state::AppState;

const FLASHCARD_SYSTEM_PROMPT: &str = "You are an expert educational content creator. Generate flashcards from the provided text.
Each flashcard should:
- Have a clear, focused question
- Provide a concise but complete answer
- Be based on key concepts from the text
- Include the source chunk IDs for citation

Return ONLY valid JSON in this exact format:
{
  \"flashcards\": [
    {
      \"question\": \"What is...\",
      \"answer\": \"...\",
      \"difficulty\": 3,
      \"sourceChunkIds\": [\"chunk-id-1\", \"chunk-id-2\"]
    }
  ]
}";

const MCQ_SYSTEM_PROMPT: &str = "You are an expert educational assessment designer specializing in effective multiple-choice questions using evidence-based assessment principles.

Generate high-quality MCQs that:
1. Test genuine understanding, not just memorization
2. Have ONE clearly correct answer based on the content
3. Include three plausible but incorrect distractors that:
   - Represent common misconceptions or errors
   - Are similar in length and complexity to the correct answer
   - Are not obviously wrong
   - Do not overlap or contradict each other
4. Use clear, unambiguous language
5. Avoid negative phrasing (e.g., \"Which is NOT...\") unless essential
6. Progressive difficulty across questions

Question stem guidelines:
- Be specific and focused on one concept
- Provide sufficient context
- Avoid \"all of the above\" or \"none of the above\"
- Test application and analysis, not just recall

Difficulty scale:
- 1-2: Basic recall and comprehension
- 3: Application of concepts
- 4-5: Analysis, evaluation, and synthesis

Return ONLY valid JSON in this exact format:
{
  \"mcqs\": [
    {
      \"question\": \"Clear, specific question testing understanding\",
      \"answer\": \"The single correct answer\",
      \"distractors\": [\"Plausible wrong answer 1\", \"Plausible wrong answer 2\", \"Plausible wrong answer 3\"],
      \"difficulty\": 3,
      \"sourceChunkIds\": [\"chunk-id-1\"]
    }
  ]
}";

const CONCEPT_SYSTEM_PROMPT: &str = "You are an expert at analyzing educational content and extracting key concepts in a hierarchical structure.";

/// Runs the ingestion pipeline for one uploaded material: download, extract
/// the text layer, chunk, best-effort embed, persist. Replaces any chunks
/// left over from an earlier run, so it doubles as the retry path. Returns
/// the number of chunks written; the caller records a failure on the material
/// row if this errors.
pub async fn process_material(state: &AppState, material: &Material) -> Result<usize> {
    state
        .material_repo
        .update_status(&material.id, &MaterialStatus::Processing, None)
        .await?;

    let bytes = state.storage.download(&material.storage_path).await?;
    let text = pdf::extract_text(bytes, &material.filename).await?;
    if text.trim().is_empty() {
        anyhow::bail!("No text could be extracted from '{}'", material.filename);
    }

    let study = &state.config.study;
    let windows = chunker::chunk_text(&text, study.chunk_size, study.chunk_overlap);

    let mut chunks = Vec::with_capacity(windows.len());
    for window in windows {
        let embedding = embed_chunk(state, &window.content).await;
        chunks.push(NewChunk {
            page_from: window.page_from,
            page_to: window.page_to,
            topic: window.topic,
            difficulty: window.difficulty,
            text: window.content,
            embedding,
        });
    }

    let pages = chunks.last().map(|c| c.page_to).unwrap_or(0);

    state.chunk_repo.delete_by_material(&material.id).await?;
    state
        .chunk_repo
        .create_batch(&material.id, &material.book_id, &chunks)
        .await?;
    state.material_repo.update_pages(&material.id, pages).await?;
    state
        .material_repo
        .update_status(&material.id, &MaterialStatus::Ready, None)
        .await?;

    tracing::info!(
        material_id = %material.id,
        chunks = chunks.len(),
        pages,
        "Material processed"
    );

    Ok(chunks.len())
}

/// Fetches an embedding for one chunk, serialized for its row. Failures are
/// logged and degrade to `None`: a chunk without an embedding is still usable
/// for generation.
async fn embed_chunk(state: &AppState, text: &str) -> Option<String> {
    if !state.config.features.embeddings_enabled {
        return None;
    }

    match state.ai.embed(text).await {
        Ok(vector) => serde_json::to_string(&vector).ok(),
        Err(e) => {
            tracing::warn!("Embedding generation failed, storing chunk without one: {e:#}");
            None
        }
    }
}

/// The deck a generation run wrote into, with the cards it inserted.
pub struct GeneratedCards {
    pub deck: Deck,
    pub cards: Vec<Card>,
}

pub async fn generate_flashcards(
    state: &AppState,
    book_id: &str,
    count: usize,
    topic: Option<&str>,
) -> Result<GeneratedCards, AppError> {
    let chunks = load_generation_chunks(state, book_id).await?;
    let context = generation_context(&chunks);
    let prompt = format!("Generate {count} flashcards from this content:\n\n{context}");

    let reply = state
        .ai
        .chat_completion(ChatRequest {
            model: &state.config.ai.model,
            system: FLASHCARD_SYSTEM_PROMPT,
            user: &prompt,
            json_response: true,
            temperature: None,
        })
        .await
        .map_err(upstream)?;

    let payload: FlashcardPayload = serde_json::from_str(&reply)
        .map_err(|_| AppError::Upstream("AI returned malformed flashcard JSON".to_string()))?;

    let cards: Vec<NewCard> = payload
        .flashcards
        .into_iter()
        .map(|card| NewCard {
            card_type: CardType::Flashcard,
            question: card.question,
            answer: card.answer,
            distractors: Vec::new(),
            difficulty: card.difficulty,
            source_chunk_ids: filter_chunk_ids(&card.source_chunk_ids),
        })
        .collect();

    store_cards(state, book_id, topic.unwrap_or("Generated Flashcards"), cards).await
}

pub async fn generate_quiz(
    state: &AppState,
    book_id: &str,
    count: usize,
    topic: Option<&str>,
) -> Result<GeneratedCards, AppError> {
    let chunks = load_generation_chunks(state, book_id).await?;
    let context = generation_context(&chunks);
    let prompt = format!(
        "Generate {count} high-quality multiple-choice questions from this educational content. \
         Ensure variety in difficulty and well-crafted distractors:\n\n{context}"
    );

    let reply = state
        .ai
        .chat_completion(ChatRequest {
            model: &state.config.ai.quiz_model,
            system: MCQ_SYSTEM_PROMPT,
            user: &prompt,
            json_response: true,
            temperature: Some(0.7),
        })
        .await
        .map_err(upstream)?;

    let payload: McqPayload = serde_json::from_str(&reply)
        .map_err(|_| AppError::Upstream("AI returned malformed MCQ JSON".to_string()))?;

    let cards: Vec<NewCard> = payload
        .mcqs
        .into_iter()
        .map(|card| NewCard {
            card_type: CardType::Mcq,
            question: card.question,
            answer: card.answer,
            distractors: card.distractors,
            difficulty: card.difficulty,
            source_chunk_ids: filter_chunk_ids(&card.source_chunk_ids),
        })
        .collect();

    store_cards(state, book_id, topic.unwrap_or("Generated Quiz"), cards).await
}

/// Extracts a fresh two-level concept map for the book and atomically
/// replaces the stored one. Returns the number of concept rows written.
pub async fn generate_concepts(state: &AppState, book_id: &str) -> Result<usize, AppError> {
    let chunks = state.chunk_repo.find_all_by_book(book_id).await?;
    if chunks.is_empty() {
        return Err(AppError::Validation(
            "No content found for this book".to_string(),
        ));
    }

    let full_context: String = chunks
        .iter()
        .map(|chunk| chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    let context = truncate_chars(&full_context, state.config.study.concept_context_chars);

    let prompt = format!(
        "Analyze this content and extract 5-8 main key concepts, with 2-4 sub-concepts for each main concept. Format as JSON array:\n\
         [{{\n\
         \x20 \"title\": \"Main Concept Title\",\n\
         \x20 \"description\": \"Brief description\",\n\
         \x20 \"subConcepts\": [\n\
         \x20   {{\n\
         \x20     \"title\": \"Sub-concept Title\",\n\
         \x20     \"description\": \"Brief description\"\n\
         \x20   }}\n\
         \x20 ]\n\
         }}]\n\n\
         Content:\n{context}"
    );

    let reply = state
        .ai
        .chat_completion(ChatRequest {
            model: &state.config.ai.model,
            system: CONCEPT_SYSTEM_PROMPT,
            user: &prompt,
            json_response: false,
            temperature: Some(0.7),
        })
        .await
        .map_err(upstream)?;

    let array = extract_json_array(&reply)
        .ok_or_else(|| AppError::Upstream("AI reply contained no JSON array".to_string()))?;
    let concepts: Vec<GeneratedConcept> = serde_json::from_str(array)
        .map_err(|_| AppError::Upstream("AI returned malformed concept JSON".to_string()))?;

    let rows = flatten_concepts(concepts);
    state.concept_repo.replace_for_book(book_id, &rows).await?;

    tracing::info!(book_id = %book_id, concepts = rows.len(), "Replaced concept map");

    Ok(rows.len())
}

/// Chunks that feed a card-generation prompt, in reading order, capped by
/// config. An empty result is a user problem (nothing uploaded or processing
/// failed), not a server one.
async fn load_generation_chunks(state: &AppState, book_id: &str) -> Result<Vec<Chunk>, AppError> {
    let limit = state.config.study.generation_chunk_limit as i64;
    let chunks = state.chunk_repo.find_by_book(book_id, limit).await?;
    if chunks.is_empty() {
        return Err(AppError::Validation(
            "No content found. Please upload and process a PDF first.".to_string(),
        ));
    }
    Ok(chunks)
}

/// Prompt context with each chunk tagged by id, so the model can cite its
/// sources in `sourceChunkIds`.
fn generation_context(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .map(|chunk| format!("[Chunk {}]: {}", chunk.id, chunk.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

async fn store_cards(
    state: &AppState,
    book_id: &str,
    deck_title: &str,
    cards: Vec<NewCard>,
) -> Result<GeneratedCards, AppError> {
    let deck = state.deck_repo.get_or_create(book_id, deck_title).await?;
    let cards = state.card_repo.create_batch(&deck.id, book_id, cards).await?;

    tracing::info!(deck_id = %deck.id, cards = cards.len(), "Stored generated cards");

    Ok(GeneratedCards { deck, cards })
}

fn upstream(e: anyhow::Error) -> AppError {
    AppError::Upstream(format!("{e:#}"))
}

#[derive(Debug, Deserialize)]
struct FlashcardPayload {
    flashcards: Vec<GeneratedFlashcard>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneratedFlashcard {
    question: String,
    answer: String,
    #[serde(default = "default_difficulty")]
    difficulty: i32,
    #[serde(default)]
    source_chunk_ids: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct McqPayload {
    mcqs: Vec<GeneratedMcq>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneratedMcq {
    question: String,
    answer: String,
    #[serde(default)]
    distractors: Vec<String>,
    #[serde(default = "default_difficulty")]
    difficulty: i32,
    #[serde(default)]
    source_chunk_ids: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneratedConcept {
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    sub_concepts: Vec<GeneratedSubConcept>,
}

#[derive(Debug, Deserialize)]
struct GeneratedSubConcept {
    title: String,
    #[serde(default)]
    description: Option<String>,
}

fn default_difficulty() -> i32 {
    3
}

/// Keeps only cited ids that contain a parseable UUID. The model sometimes
/// returns placeholders like "chunk-id-1" or decorates real ids ("[Chunk
/// 123e...]"); non-string entries are skipped outright.
fn filter_chunk_ids(ids: &[serde_json::Value]) -> Vec<String> {
    ids.iter()
        .filter_map(|id| id.as_str())
        .filter_map(extract_uuid)
        .collect()
}

/// Finds the first hyphenated UUID inside `raw`, normalized to lowercase.
fn extract_uuid(raw: &str) -> Option<String> {
    const UUID_LEN: usize = 36;
    if raw.len() < UUID_LEN {
        return None;
    }
    for start in 0..=raw.len() - UUID_LEN {
        if !raw.is_char_boundary(start) || !raw.is_char_boundary(start + UUID_LEN) {
            continue;
        }
        if let Ok(uuid) = Uuid::parse_str(&raw[start..start + UUID_LEN]) {
            return Some(uuid.to_string());
        }
    }
    None
}

/// The concept prompt asks for a bare JSON array, but models often wrap it in
/// prose or a code fence. Take everything from the first '[' to the last ']'.
fn extract_json_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Truncates to at most `max_chars` Unicode scalar values, never bytes.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Flattens the generated hierarchy into rows: each main concept becomes a
/// level 1 root in list order, its sub-concepts level 2 children in sibling
/// order.
fn flatten_concepts(concepts: Vec<GeneratedConcept>) -> Vec<NewConcept> {
    let mut rows = Vec::new();
    for (main_index, main) in concepts.into_iter().enumerate() {
        let root = NewConcept::root(main.title, main.description, main_index as i32);
        let root_id = root.id.clone();
        rows.push(root);

        for (sub_index, sub) in main.sub_concepts.into_iter().enumerate() {
            rows.push(NewConcept::child(
                &root_id,
                sub.title,
                sub.description,
                sub_index as i32,
            ));
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHUNK_ID: &str = "123e4567-e89b-12d3-a456-426614174000";

    #[test]
    fn test_extract_uuid_from_decorated_string() {
        assert_eq!(
            extract_uuid(&format!("[Chunk {CHUNK_ID}]")),
            Some(CHUNK_ID.to_string())
        );
        assert_eq!(extract_uuid(CHUNK_ID), Some(CHUNK_ID.to_string()));
    }

    #[test]
    fn test_extract_uuid_normalizes_case() {
        let upper = CHUNK_ID.to_uppercase();
        assert_eq!(extract_uuid(&upper), Some(CHUNK_ID.to_string()));
    }

    #[test]
    fn test_extract_uuid_rejects_placeholders() {
        assert_eq!(extract_uuid("chunk-id-1"), None);
        assert_eq!(extract_uuid(""), None);
        assert_eq!(extract_uuid("almost-a-uuid-but-not-hex-zzzzzzzzzzzz"), None);
    }

    #[test]
    fn test_filter_chunk_ids_skips_non_strings() {
        let ids = vec![
            serde_json::json!(format!("chunk {CHUNK_ID} cited")),
            serde_json::json!(42),
            serde_json::json!(null),
            serde_json::json!("chunk-id-1"),
        ];

        assert_eq!(filter_chunk_ids(&ids), vec![CHUNK_ID.to_string()]);
    }

    #[test]
    fn test_flashcard_payload_fills_defaults() {
        let payload: FlashcardPayload = serde_json::from_str(
            r#"{"flashcards": [{"question": "What is mitosis?", "answer": "Cell division"}]}"#,
        )
        .unwrap();

        assert_eq!(payload.flashcards.len(), 1);
        assert_eq!(payload.flashcards[0].difficulty, 3);
        assert!(payload.flashcards[0].source_chunk_ids.is_empty());
    }

    #[test]
    fn test_mcq_payload_parses_distractors() {
        let payload: McqPayload = serde_json::from_str(
            r#"{"mcqs": [{
                "question": "Which organelle synthesizes proteins?",
                "answer": "Ribosome",
                "distractors": ["Nucleus", "Mitochondrion", "Lysosome"],
                "difficulty": 4,
                "sourceChunkIds": ["123e4567-e89b-12d3-a456-426614174000"]
            }]}"#,
        )
        .unwrap();

        let mcq = &payload.mcqs[0];
        assert_eq!(mcq.distractors.len(), 3);
        assert_eq!(mcq.difficulty, 4);
        assert_eq!(filter_chunk_ids(&mcq.source_chunk_ids), vec![CHUNK_ID.to_string()]);
    }

    #[test]
    fn test_extract_json_array_strips_prose_and_fences() {
        let reply = "Here are the concepts:\n```json\n[{\"title\": \"Cells\"}]\n```\nDone.";
        assert_eq!(extract_json_array(reply), Some("[{\"title\": \"Cells\"}]"));
    }

    #[test]
    fn test_extract_json_array_spans_nested_arrays() {
        assert_eq!(extract_json_array("x [1, [2], 3] y"), Some("[1, [2], 3]"));
    }

    #[test]
    fn test_extract_json_array_absent() {
        assert_eq!(extract_json_array("no array in sight"), None);
        assert_eq!(extract_json_array("] reversed ["), None);
    }

    #[test]
    fn test_flatten_concepts_assigns_levels_and_order() {
        let concepts: Vec<GeneratedConcept> = serde_json::from_str(
            r#"[
                {"title": "Cell Structure", "description": "Parts of a cell", "subConcepts": [
                    {"title": "Membrane"},
                    {"title": "Nucleus", "description": "Control center"}
                ]},
                {"title": "Energy"}
            ]"#,
        )
        .unwrap();

        let rows = flatten_concepts(concepts);

        assert_eq!(rows.len(), 4);

        assert_eq!(rows[0].title, "Cell Structure");
        assert_eq!((rows[0].level, rows[0].order_index), (1, 0));
        assert!(rows[0].parent_id.is_none());

        assert_eq!(rows[1].title, "Membrane");
        assert_eq!((rows[1].level, rows[1].order_index), (2, 0));
        assert_eq!(rows[1].parent_id.as_deref(), Some(rows[0].id.as_str()));

        assert_eq!(rows[2].title, "Nucleus");
        assert_eq!((rows[2].level, rows[2].order_index), (2, 1));

        assert_eq!(rows[3].title, "Energy");
        assert_eq!((rows[3].level, rows[3].order_index), (1, 1));
    }

    #[test]
    fn test_truncate_chars_counts_chars_not_bytes() {
        assert_eq!(truncate_chars("αβγδ", 2), "αβ");
        assert_eq!(truncate_chars("short", 100), "short");
        assert_eq!(truncate_chars("", 10), "");
    }

    #[test]
    fn test_generation_context_tags_each_chunk() {
        let chunks = vec![
            Chunk {
                id: "c1".to_string(),
                material_id: "m1".to_string(),
                book_id: "b1".to_string(),
                page_from: 1,
                page_to: 1,
                topic: Some("Chapter 1".to_string()),
                difficulty: 2,
                text: "First window".to_string(),
                embedding: None,
                created_at: "2025-03-01T12:00:00Z".to_string(),
            },
            Chunk {
                id: "c2".to_string(),
                material_id: "m1".to_string(),
                book_id: "b1".to_string(),
                page_from: 1,
                page_to: 2,
                topic: Some("Chapter 1".to_string()),
                difficulty: 3,
                text: "Second window".to_string(),
                embedding: None,
                created_at: "2025-03-01T12:00:00Z".to_string(),
            },
        ];

        assert_eq!(
            generation_context(&chunks),
            "[Chunk c1]: First window\n\n[Chunk c2]: Second window"
        );
    }
}
