//! Boundary-aware text chunker.
//!
//! Sizes are counted in characters, offsets are reported in bytes so callers
//! can slice the original content directly. A cut prefers a paragraph break,
//! then a sentence end, inside the boundary window before the hard limit.

use crate::config::ChunkingSettings;
use crate::error::{Error, Result};

/// Half-open byte range `[start, end)` into the chunked content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSpan {
    pub start: usize,
    pub end: usize,
}

impl ChunkSpan {
    pub fn text<'a>(&self, content: &'a str) -> &'a str {
        &content[self.start..self.end]
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    chunk_size: usize,
    overlap: usize,
    boundary_window: usize,
}

impl Chunker {
    pub fn new(chunk_size: usize, overlap: usize, boundary_window: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be > 0".into()));
        }
        if overlap >= chunk_size {
            return Err(Error::InvalidConfig(format!(
                "overlap ({overlap}) must be smaller than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self { chunk_size, overlap, boundary_window })
    }

    pub fn from_settings(settings: &ChunkingSettings) -> Result<Self> {
        Self::new(settings.chunk_size, settings.overlap, settings.boundary_window)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split `content` into overlapping spans. Whitespace-only content yields none.
    pub fn chunk(&self, content: &str) -> Vec<ChunkSpan> {
        if content.trim().is_empty() {
            return Vec::new();
        }

        let chars: Vec<char> = content.chars().collect();
        let offsets: Vec<usize> = content
            .char_indices()
            .map(|(idx, _)| idx)
            .chain(std::iter::once(content.len()))
            .collect();
        let total = chars.len();

        let mut spans = Vec::new();
        let mut start = 0usize;
        loop {
            let hard_end = (start + self.chunk_size).min(total);
            if hard_end == total {
                spans.push(ChunkSpan { start: offsets[start], end: offsets[total] });
                break;
            }
            let cut = self.find_cut(&chars, start, hard_end);
            spans.push(ChunkSpan { start: offsets[start], end: offsets[cut] });
            start = cut - self.overlap;
        }
        spans
    }

    // `cut` is kept above `start + overlap` so the next chunk always advances.
    fn find_cut(&self, chars: &[char], start: usize, hard_end: usize) -> usize {
        let floor = (start + self.overlap + 1).max(hard_end.saturating_sub(self.boundary_window));
        if floor > hard_end {
            return hard_end;
        }

        let paragraph = (floor..=hard_end)
            .rev()
            .find(|&c| c >= 2 && chars[c - 2] == '\n' && chars[c - 1] == '\n');
        if let Some(cut) = paragraph {
            return cut;
        }

        let sentence = (floor..=hard_end).rev().find(|&c| {
            c >= 1
                && c < chars.len()
                && matches!(chars[c - 1], '.' | '!' | '?')
                && chars[c].is_whitespace()
        });
        sentence.unwrap_or(hard_end)
    }
}

/// Convenience wrapper with the default boundary window.
pub fn chunk(content: &str, chunk_size: usize, overlap: usize) -> Result<Vec<ChunkSpan>> {
    let window = ChunkingSettings::default().boundary_window;
    Ok(Chunker::new(chunk_size, overlap, window)?.chunk(content))
}
