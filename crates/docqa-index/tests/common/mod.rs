#![allow(dead_code)]

use std::collections::BTreeSet;

use docqa_core::types::{EmbeddingSource, NewChunk};
use docqa_embed::HashingEmbedder;

pub const DIM: usize = 256;

pub fn lexical_chunk(file_name: &str, system: &str, text: &str) -> NewChunk {
    let v = HashingEmbedder::new(DIM).embed(text);
    NewChunk {
        text: text.to_string(),
        start_offset: 0,
        end_offset: text.len(),
        vector: v.clone(),
        lexical_vector: v,
        embedding_source: EmbeddingSource::Lexical,
        file_name: file_name.to_string(),
        system: system.to_string(),
        subsystem: String::new(),
        mime_type: "text/plain".to_string(),
        tags: BTreeSet::new(),
        content_hash: String::new(),
        chunk_index: 0,
        total_chunks: 1,
    }
}

pub fn with_tags(mut chunk: NewChunk, tags: &[&str]) -> NewChunk {
    chunk.tags = tags.iter().map(|t| t.to_string()).collect();
    chunk
}
