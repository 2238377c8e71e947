//! Fixed-size overlapping text chunker.
//!
//! Splits page text into windows of `chunk_size` characters with
//! `chunk_overlap` characters carried over between consecutive windows
//! (1000/200 by default). Windows are measured in characters, not bytes,
//! so splits always land on UTF-8 boundaries.

/// Split `text` into overlapping character windows. Whitespace-only input
/// yields no chunks; anything shorter than `chunk_size` yields exactly one.
pub fn split_text(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    assert!(chunk_overlap < chunk_size, "overlap must be below chunk size");

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let chars: Vec<char> = trimmed.chars().collect();
    if chars.len() <= chunk_size {
        return vec![trimmed.to_string()];
    }

    let step = chunk_size - chunk_overlap;
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        let piece: String = chars[start..end].iter().collect();
        let piece = piece.trim().to_string();
        if !piece.is_empty() {
            chunks.push(piece);
        }
        if end == chars.len() {
            break;
        }
        start += step;
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_single_chunk() {
        let chunks = split_text("Hello, world!", 1000, 200);
        assert_eq!(chunks, vec!["Hello, world!"]);
    }

    #[test]
    fn whitespace_only_yields_nothing() {
        assert!(split_text("   \n\t ", 1000, 200).is_empty());
    }

    #[test]
    fn windows_respect_size_and_overlap() {
        let text: String = ('a'..='z').cycle().take(250).collect();
        let chunks = split_text(&text, 100, 20);
        // Steps of 80: starts at 0, 80, 160; the window at 160 reaches the
        // end of the text, so no further window opens.
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].chars().count(), 100);
        assert_eq!(chunks[1].chars().count(), 100);
        assert_eq!(chunks[2].chars().count(), 90);
        // The last 20 chars of one window open the next.
        let tail: String = chunks[0].chars().skip(80).collect();
        let head: String = chunks[1].chars().take(20).collect();
        assert_eq!(tail, head);
    }

    #[test]
    fn multibyte_text_splits_on_char_boundaries() {
        let text: String = std::iter::repeat('é').take(150).collect();
        let chunks = split_text(&text, 100, 20);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chars().count(), 100);
    }

    #[test]
    fn deterministic() {
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(40);
        assert_eq!(split_text(&text, 300, 50), split_text(&text, 300, 50));
    }
}
