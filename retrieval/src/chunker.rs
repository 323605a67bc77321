//! Fixed-window text chunking.
//!
//! Splits input into order-preserving slices of at most `max_chars`
//! characters (not bytes, so multibyte text never splits inside a char).
//! Concatenating the output in order reproduces the input exactly; the last
//! chunk may be shorter. Whitespace-only chunks are filtered later, at
//! embedding time, without renumbering the surviving indices.

/// Default maximum chunk length, in characters.
pub const DEFAULT_CHUNK_CHARS: usize = 2000;

/// A contiguous slice of a document, identified by its position index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    pub index: usize,
    pub text: String,
}

/// Splits `text` into chunks of at most `max_chars` characters.
///
/// Empty input produces no chunks.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<Chunk> {
    debug_assert!(max_chars > 0);

    // Byte offsets of every max_chars-th character boundary.
    let mut starts: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .step_by(max_chars.max(1))
        .collect();
    starts.push(text.len());

    starts
        .windows(2)
        .enumerate()
        .map(|(index, w)| Chunk {
            index,
            text: text[w[0]..w[1]].to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concatenation_reproduces_input() {
        let text = "abc".repeat(1700); // 5100 chars
        let chunks = chunk_text(&text, DEFAULT_CHUNK_CHARS);
        let joined: String = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(joined, text);
    }

    #[test]
    fn all_but_last_chunk_are_full_width() {
        let text = "x".repeat(4500);
        let chunks = chunk_text(&text, 2000);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].text.chars().count(), 2000);
        assert_eq!(chunks[1].text.chars().count(), 2000);
        assert_eq!(chunks[2].text.chars().count(), 500);
        assert_eq!(chunks[2].index, 2);
    }

    #[test]
    fn counts_characters_not_bytes() {
        // 'é' is two bytes; a byte-based splitter would panic or misalign.
        let text = "é".repeat(2500);
        let chunks = chunk_text(&text, 2000);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text.chars().count(), 2000);
        assert_eq!(chunks[1].text.chars().count(), 500);
        let joined: String = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(joined, text);
    }

    #[test]
    fn exact_multiple_has_no_empty_tail() {
        let text = "y".repeat(4000);
        let chunks = chunk_text(&text, 2000);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| !c.text.is_empty()));
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(chunk_text("", 2000).is_empty());
    }

    #[test]
    fn short_input_is_a_single_chunk() {
        let chunks = chunk_text("hello", 2000);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], Chunk { index: 0, text: "hello".into() });
    }
}
