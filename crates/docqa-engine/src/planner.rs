//! Multi-strategy retrieval: run each strategy in order and stop at the first
//! one that returns hits. The planner only reads from the index.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::{debug, info};

use docqa_core::config::PlannerSettings;
use docqa_core::types::{Chunk, EmptyReason, Query, QueryVectors, ScoredChunk, StrategyKind};
use docqa_embed::Embedder;
use docqa_index::Retriever;

use crate::strategy::{default_strategies, Strategy};

/// One retrieval pass for an already reformulated query.
#[async_trait]
pub trait Retrieve: Send + Sync {
    async fn retrieve(&self, query: &Query) -> Vec<ScoredChunk>;
}

/// Retrieval over a fixed snapshot of the index. Query vectors are embedded
/// once per distinct text, so a step that only changes k costs no provider call.
pub struct IndexRetriever {
    chunks: Vec<Arc<Chunk>>,
    retriever: Retriever,
    embedder: Embedder,
    vectors: Mutex<HashMap<String, QueryVectors>>,
}

impl IndexRetriever {
    pub fn new(chunks: Vec<Arc<Chunk>>, retriever: Retriever, embedder: Embedder) -> Self {
        Self { chunks, retriever, embedder, vectors: Mutex::new(HashMap::new()) }
    }

    fn cached(&self, text: &str) -> Option<QueryVectors> {
        self.vectors.lock().ok()?.get(text).cloned()
    }

    async fn vectors_for(&self, text: &str) -> QueryVectors {
        if let Some(vectors) = self.cached(text) {
            return vectors;
        }
        let vectors = self.embedder.embed_query(text).await;
        if let Ok(mut cache) = self.vectors.lock() {
            cache.insert(text.to_string(), vectors.clone());
        }
        vectors
    }
}

#[async_trait]
impl Retrieve for IndexRetriever {
    async fn retrieve(&self, query: &Query) -> Vec<ScoredChunk> {
        let vectors = self.vectors_for(&query.text).await;
        self.retriever.search(&self.chunks, query, &vectors)
    }
}

#[derive(Debug, Clone)]
pub enum PlanOutcome {
    Found { hits: Vec<ScoredChunk>, strategy: StrategyKind, attempts: Vec<StrategyKind> },
    Empty { reason: EmptyReason, attempts: Vec<StrategyKind> },
}

impl PlanOutcome {
    pub fn attempts(&self) -> &[StrategyKind] {
        match self {
            PlanOutcome::Found { attempts, .. } | PlanOutcome::Empty { attempts, .. } => attempts,
        }
    }
}

pub struct Planner {
    strategies: Vec<Box<dyn Strategy>>,
}

impl Planner {
    pub fn new(strategies: Vec<Box<dyn Strategy>>) -> Self {
        Self { strategies }
    }

    pub fn from_settings(settings: &PlannerSettings) -> Self {
        Self::new(default_strategies(settings))
    }

    /// Reformulations identical to an earlier step are skipped and not recorded.
    pub async fn plan_and_search(&self, query: &Query, retrieve: &dyn Retrieve) -> PlanOutcome {
        let mut tried: Vec<Query> = Vec::new();
        let mut attempts = Vec::new();

        for strategy in &self.strategies {
            let kind = strategy.kind();
            let Some(candidate) = strategy.reformulate(query) else {
                debug!(strategy = %kind, "nothing to try");
                continue;
            };
            if tried.contains(&candidate) {
                debug!(strategy = %kind, "same as an earlier step, skipped");
                continue;
            }

            attempts.push(kind);
            let hits = retrieve.retrieve(&candidate).await;
            debug!(strategy = %kind, text = %candidate.text, k = candidate.k, hits = hits.len(), "strategy attempted");
            if !hits.is_empty() {
                if kind != StrategyKind::Verbatim {
                    info!(strategy = %kind, original = %query.text, "fallback strategy found results");
                }
                return PlanOutcome::Found { hits, strategy: kind, attempts };
            }
            tried.push(candidate);
        }

        PlanOutcome::Empty { reason: EmptyReason::NoMatch, attempts }
    }
}
