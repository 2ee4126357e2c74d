use serde_json::Map;
use std::collections::VecDeque;

use crate::application::ports::{TextChunk, TextSplitter};
use crate::domain::value_objects::ChunkingConfig;

/// Recursive character splitter.
///
/// Text is cut on the coarsest separator that brings every piece under
/// `chunk_size` characters, then pieces are packed back into chunks, each one
/// repeating up to `chunk_overlap` characters from the end of the previous.
#[derive(Debug, Clone)]
pub struct RTSplitter {
    separators: Vec<&'static str>,
}

impl Default for RTSplitter {
    fn default() -> Self {
        Self {
            separators: vec![
                "\n\n", // paragraphs
                "\n",
                ". ",
                " ",
            ],
        }
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

impl RTSplitter {
    fn split_by_length(text: &str, max_chunk_size: usize, out: &mut Vec<String>) {
        let chars: Vec<char> = text.chars().collect();
        for window in chars.chunks(max_chunk_size) {
            out.push(window.iter().collect());
        }
    }

    /// Breaks `text` into pieces no longer than `max_chunk_size` whose
    /// concatenation is `text`.
    fn pieces(&self, text: &str, max_chunk_size: usize, separator_index: usize, out: &mut Vec<String>) {
        if char_len(text) <= max_chunk_size {
            out.push(text.to_string());
            return;
        }

        match self.separators.get(separator_index) {
            Some(separator) if text.contains(separator) => {
                for part in text.split_inclusive(separator) {
                    self.pieces(part, max_chunk_size, separator_index + 1, out);
                }
            }
            Some(_) => self.pieces(text, max_chunk_size, separator_index + 1, out),
            None => Self::split_by_length(text, max_chunk_size, out),
        }
    }
}

impl TextSplitter for RTSplitter {
    fn split(&self, text: &str, config: &ChunkingConfig) -> Vec<TextChunk> {
        if text.trim().is_empty() || config.validate().is_err() {
            return Vec::new();
        }

        let mut pieces = Vec::new();
        self.pieces(text, config.chunk_size, 0, &mut pieces);

        let mut chunks = Vec::new();
        let mut window: VecDeque<String> = VecDeque::new();
        let mut window_len = 0;

        for piece in pieces {
            let len = char_len(&piece);
            if !window.is_empty() && window_len + len > config.chunk_size {
                push_chunk(&window, &mut chunks);
                while let Some(front) = window.front() {
                    if window_len <= config.chunk_overlap && window_len + len <= config.chunk_size {
                        break;
                    }
                    window_len -= char_len(front);
                    window.pop_front();
                }
            }
            window.push_back(piece);
            window_len += len;
        }
        if !window.is_empty() {
            push_chunk(&window, &mut chunks);
        }

        chunks
    }
}

/// Chunk metadata carries no offsets: it feeds the chunk fingerprint, and a
/// chunk whose text did not change must keep its fingerprint when an edit
/// elsewhere shifts it.
fn push_chunk(window: &VecDeque<String>, chunks: &mut Vec<TextChunk>) {
    let raw: String = window.iter().map(String::as_str).collect();
    let content = raw.trim();
    if content.is_empty() {
        return;
    }

    chunks.push(TextChunk {
        content: content.to_string(),
        metadata: Map::new(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(size: usize, overlap: usize) -> ChunkingConfig {
        ChunkingConfig::new(size, overlap).unwrap()
    }

    #[test]
    fn test_basic_splitting() {
        let splitter = RTSplitter::default();
        let text = "This is a test.\n\nThis is another paragraph.\n\nAnd a third one.";
        let chunks = splitter.split(text, &config(30, 0));

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(char_len(&chunk.content) <= 30);
        }
        assert_eq!(chunks[0].content, "This is a test.");
    }

    #[test]
    fn test_short_text() {
        let splitter = RTSplitter::default();
        let chunks = splitter.split("Short text", &config(100, 10));

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "Short text");
        assert!(chunks[0].metadata.is_empty());
    }

    #[test]
    fn test_blank_text_yields_nothing() {
        assert!(RTSplitter::default().split(" \n\n ", &config(10, 0)).is_empty());
    }

    #[test]
    fn test_overlap_repeats_tail_of_previous_chunk() {
        let splitter = RTSplitter::default();
        let text = "one two three four five six seven eight nine ten";
        let chunks = splitter.split(text, &config(20, 8));

        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            let first_word_of_next = pair[1].content.split(' ').next().unwrap();
            assert!(
                pair[0].content.contains(first_word_of_next),
                "{:?} should overlap {:?}",
                pair[0].content,
                pair[1].content
            );
        }
        for chunk in &chunks {
            assert!(char_len(&chunk.content) <= 20);
        }
    }

    #[test]
    fn test_without_overlap_pieces_cover_text_once() {
        let splitter = RTSplitter::default();
        let text = "alpha beta gamma delta epsilon zeta eta theta";
        let chunks = splitter.split(text, &config(12, 0));

        let joined: Vec<&str> = chunks
            .iter()
            .flat_map(|chunk| chunk.content.split(' '))
            .collect();
        assert_eq!(joined.join(" "), text);
    }

    #[test]
    fn test_unbroken_text_falls_back_to_fixed_windows() {
        let splitter = RTSplitter::default();
        let text = "x".repeat(25);
        let chunks = splitter.split(&text, &config(10, 0));

        let sizes: Vec<usize> = chunks.iter().map(|c| c.content.len()).collect();
        assert_eq!(sizes, vec![10, 10, 5]);
    }

    #[test]
    fn test_split_is_deterministic() {
        let splitter = RTSplitter::default();
        let text = "Paragraph one.\n\nParagraph two is a little longer. It has two sentences.";
        assert_eq!(
            splitter.split(text, &config(25, 5)),
            splitter.split(text, &config(25, 5))
        );
    }

    #[test]
    fn test_prepend_keeps_later_chunks_identical() {
        let splitter = RTSplitter::default();
        let body: Vec<String> = (0..5)
            .map(|i| format!("Paragraph {} talks about topic {}.", i, i))
            .collect();
        let original = body.join("\n\n");
        let edited = format!("A brand new opening paragraph.\n\n{}", original);

        let before = splitter.split(&original, &config(40, 0));
        let after = splitter.split(&edited, &config(40, 0));

        assert_eq!(after.len(), before.len() + 1);
        assert_eq!(&after[1..], &before[..]);
    }
}
