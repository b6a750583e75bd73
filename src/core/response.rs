//! Splitting replies into Discord-sized messages
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

/// Discord message content limit (bytes are a safe upper bound for chars)
pub const MESSAGE_LIMIT: usize = 2000;

/// Split `text` into pieces of at most `max_size` bytes.
///
/// Each cut lands on a UTF-8 boundary and prefers the last newline inside the
/// window so paragraphs stay whole where possible. Whitespace-only pieces are dropped,
/// so empty input yields no chunks and no chunk is ever empty.
pub fn chunk_text(text: &str, max_size: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut rest = text.trim_end();

    while !rest.is_empty() {
        if rest.len() <= max_size {
            chunks.push(rest.to_string());
            break;
        }

        let mut end = max_size;
        while end > 0 && !rest.is_char_boundary(end) {
            end -= 1;
        }
        if end == 0 {
            // max_size smaller than a single char: emit that char alone
            end = rest.chars().next().map(char::len_utf8).unwrap_or(rest.len());
        }

        let cut = match rest[..end].rfind('\n') {
            Some(newline) if newline > 0 => newline,
            _ => end,
        };

        let piece = rest[..cut].trim_end();
        if !piece.is_empty() {
            chunks.push(piece.to_string());
        }
        rest = rest[cut..].trim_start_matches('\n');
    }

    chunks
}

/// Chunk text for message content (2000 character limit)
pub fn chunk_for_message(text: &str) -> Vec<String> {
    chunk_text(text, MESSAGE_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_single_chunk() {
        assert_eq!(chunk_text("Ahoy!", 100), vec!["Ahoy!"]);
    }

    #[test]
    fn test_empty_text_no_chunks() {
        assert!(chunk_text("", 100).is_empty());
        assert!(chunk_for_message("\n\n").is_empty());
    }

    #[test]
    fn test_prefers_newline_cuts() {
        let text = "first line\nsecond line\nthird";
        let chunks = chunk_text(text, 15);
        assert_eq!(chunks, vec!["first line", "second line", "third"]);
    }

    #[test]
    fn test_long_line_hard_split() {
        let chunks = chunk_text(&"a".repeat(65), 30);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.len() <= 30));
        assert_eq!(chunks.concat().len(), 65);
    }

    #[test]
    fn test_multibyte_never_split() {
        let text = "é".repeat(20); // 40 bytes
        let chunks = chunk_text(&text, 7);
        for chunk in &chunks {
            assert!(chunk.len() <= 7);
            assert!(chunk.chars().all(|c| c == 'é'));
        }
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_message_limit() {
        let chunks = chunk_for_message(&"x".repeat(4500));
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), MESSAGE_LIMIT);
    }

    #[test]
    fn test_blank_run_after_hard_split_is_dropped() {
        let text = format!("{}   \n{}", "a".repeat(2000), "b".repeat(2500));
        let chunks = chunk_for_message(&text);

        let lens: Vec<usize> = chunks.iter().map(String::len).collect();
        assert_eq!(lens, vec![2000, 2000, 500]);
        assert!(chunks.iter().all(|c| !c.trim().is_empty()));
    }
}
