//! The process-wide chunk store.
//!
//! `clear` and `insert` are the only mutators. Every `clear` bumps the
//! generation; `insert_at` refuses chunks prepared against an older generation
//! so a clear racing with a slow ingest cannot bring cleared documents back.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use docqa_core::error::{Error, Result};
use docqa_core::types::{Chunk, IndexStats, NewChunk};

use crate::stats::compute_stats;

#[derive(Default)]
struct Inner {
    chunks: Vec<Arc<Chunk>>,
    generation: u64,
    // never reset, so ids stay unique across clears
    next_seq: u64,
}

#[derive(Default)]
pub struct IndexStore {
    inner: RwLock<Inner>,
}

impl IndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append chunks unconditionally. Returns the number inserted.
    pub async fn insert(&self, chunks: Vec<NewChunk>) -> usize {
        let mut inner = self.inner.write().await;
        Self::append(&mut inner, chunks)
    }

    /// Append chunks if no `clear` happened since `generation` was read.
    pub async fn insert_at(&self, generation: u64, chunks: Vec<NewChunk>) -> Result<usize> {
        let mut inner = self.inner.write().await;
        if inner.generation != generation {
            return Err(Error::IndexState(format!(
                "index was cleared while the request was in flight (generation {generation} -> {})",
                inner.generation
            )));
        }
        Ok(Self::append(&mut inner, chunks))
    }

    /// Remove everything. Returns the previous chunk count.
    pub async fn clear(&self) -> usize {
        let mut inner = self.inner.write().await;
        let previous = inner.chunks.len();
        inner.chunks.clear();
        inner.generation += 1;
        info!(previous, generation = inner.generation, "index cleared");
        previous
    }

    pub async fn generation(&self) -> u64 {
        self.inner.read().await.generation
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.chunks.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.chunks.is_empty()
    }

    /// Cheap read-only view for one query; later writes do not affect it.
    pub async fn snapshot(&self) -> Vec<Arc<Chunk>> {
        self.inner.read().await.chunks.clone()
    }

    pub async fn stats(&self, min_average_chunk_chars: usize) -> IndexStats {
        let inner = self.inner.read().await;
        compute_stats(&inner.chunks, inner.generation, min_average_chunk_chars)
    }

    fn append(inner: &mut Inner, chunks: Vec<NewChunk>) -> usize {
        let count = chunks.len();
        for new in chunks {
            let seq = inner.next_seq;
            inner.next_seq += 1;
            inner.chunks.push(Arc::new(Chunk::from_new(new, seq)));
        }
        debug!(count, total = inner.chunks.len(), "chunks inserted");
        count
    }
}
