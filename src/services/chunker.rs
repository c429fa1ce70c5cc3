use rand::Rng;

/// A window of extracted text together with the metadata stored alongside it.
///
/// Page numbers are synthetic: they are derived from character offsets at
/// `chunk_size` characters per "page", not from the PDF's real page breaks.
#[derive(Debug, Clone, PartialEq)]
pub struct TextChunk {
    pub content: String,
    pub page_from: i32,
    pub page_to: i32,
    pub topic: String,
    pub difficulty: i32,
}

/// Splits `text` into overlapping character windows.
///
/// Chunk `i` starts at character `i * (chunk_size - overlap)` and spans up to
/// `chunk_size` characters. The sequence ends with the chunk that reaches the
/// end of the text, so consecutive chunks share exactly `overlap` characters
/// except possibly at the tail. Callers must keep `overlap < chunk_size`.
///
/// Characters are Unicode scalar values, never bytes. Empty input yields no
/// chunks.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<TextChunk> {
    if text.is_empty() {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    let mut chunks = Vec::new();
    let mut rng = rand::rng();

    let mut start = 0;
    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        let content: String = chars[start..end].iter().collect();

        let page_from = (start / chunk_size + 1) as i32;
        let page_to = (end / chunk_size + 1) as i32;

        chunks.push(TextChunk {
            content,
            page_from,
            page_to,
            topic: format!("Chapter {page_from}"),
            difficulty: rng.random_range(2..=4),
        });

        if end >= chars.len() {
            break;
        }

        start += chunk_size - overlap;
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_text(len: usize) -> String {
        ('a'..='z').cycle().take(len).collect()
    }

    #[test]
    fn test_chunk_text_windows() {
        let chunks = chunk_text("ABCDEFGHIJ", 4, 1);

        let contents: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["ABCD", "DEFG", "GHIJ"]);
    }

    #[test]
    fn test_chunk_text_empty() {
        assert!(chunk_text("", 1000, 100).is_empty());
    }

    #[test]
    fn test_chunk_text_short_input_is_single_chunk() {
        let chunks = chunk_text("hello", 1000, 100);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "hello");
        assert_eq!(chunks[0].page_from, 1);
        assert_eq!(chunks[0].topic, "Chapter 1");
    }

    #[test]
    fn test_chunk_count_formula() {
        // ceil((len - overlap) / (chunk_size - overlap)) for non-empty input
        for (len, size, overlap) in [(10, 4, 1), (100, 30, 5), (1003, 100, 20), (1000, 1000, 100)]
        {
            let chunks = chunk_text(&sample_text(len), size, overlap);
            let expected = (len - overlap).div_ceil(size - overlap);
            assert_eq!(chunks.len(), expected, "len={len} size={size} overlap={overlap}");
        }
    }

    #[test]
    fn test_consecutive_chunks_share_overlap() {
        let chunks = chunk_text(&sample_text(250), 100, 20);

        for pair in chunks.windows(2) {
            let prev: Vec<char> = pair[0].content.chars().collect();
            let next: Vec<char> = pair[1].content.chars().collect();
            assert_eq!(prev[prev.len() - 20..], next[..20]);
        }
    }

    #[test]
    fn test_chunks_reconstruct_input() {
        let text = sample_text(1003);
        let chunks = chunk_text(&text, 100, 20);

        let mut rebuilt = chunks[0].content.clone();
        for chunk in &chunks[1..] {
            rebuilt.extend(chunk.content.chars().skip(20));
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_page_ranges_are_monotonic() {
        let chunks = chunk_text(&sample_text(5000), 1000, 100);

        assert_eq!(chunks[0].page_from, 1);
        for chunk in &chunks {
            assert!(chunk.page_from <= chunk.page_to);
            assert_eq!(chunk.topic, format!("Chapter {}", chunk.page_from));
        }
        for pair in chunks.windows(2) {
            assert!(pair[0].page_from <= pair[1].page_from);
        }
    }

    #[test]
    fn test_difficulty_stays_in_band() {
        let chunks = chunk_text(&sample_text(5000), 100, 20);

        for chunk in &chunks {
            assert!((2..=4).contains(&chunk.difficulty));
        }
    }

    #[test]
    fn test_chunking_counts_chars_not_bytes() {
        let chunks = chunk_text("αβγδεζηθικ", 4, 1);

        let contents: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["αβγδ", "δεζη", "ηθικ"]);
    }
}
