use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use docqa_core::types::{Chunk, EmbeddingSource, IndexStats, IndexWarning};

/// Build the stats snapshot over `chunks`. O(n).
pub fn compute_stats(chunks: &[Arc<Chunk>], generation: u64, min_average_chunk_chars: usize) -> IndexStats {
    let mut files = HashSet::new();
    let mut by_system = BTreeMap::new();
    let mut by_subsystem = BTreeMap::new();
    let mut tag_counts = BTreeMap::new();
    let mut total_chars = 0usize;
    let mut fallback = 0usize;

    for chunk in chunks {
        files.insert(chunk.file_name.as_str());
        *by_system.entry(label(&chunk.system)).or_insert(0) += 1;
        *by_subsystem.entry(label(&chunk.subsystem)).or_insert(0) += 1;
        for tag in &chunk.tags {
            *tag_counts.entry(tag.clone()).or_insert(0) += 1;
        }
        total_chars += chunk.char_len();
        if chunk.embedding_source == EmbeddingSource::LexicalFallback {
            fallback += 1;
        }
    }

    let total = chunks.len();
    let average_chunk_size = if total == 0 { 0.0 } else { total_chars as f64 / total as f64 };

    let mut warnings = Vec::new();
    if total > 0 && average_chunk_size < min_average_chunk_chars as f64 {
        warnings.push(IndexWarning::SmallAverageChunk { average: average_chunk_size, minimum: min_average_chunk_chars });
    }
    if total > 0 && fallback * 2 > total {
        warnings.push(IndexWarning::FallbackHeavy { fallback, total });
    }

    IndexStats {
        total_chunks: total,
        unique_files: files.len(),
        by_system,
        by_subsystem,
        average_chunk_size,
        tag_counts,
        fallback_embeddings: fallback,
        generation,
        warnings,
    }
}

fn label(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() { "unspecified".to_string() } else { trimmed.to_string() }
}
