//! `RagService`: the ingest, clear, stats and query boundaries over one index.
//!
//! Writes are serialized through `writer`. A plain ingest prepares its chunks
//! without the lock and commits them against the generation it started from,
//! so an ingest that overlaps a clear is rejected instead of repopulating the
//! cleared index. `replace_corpus` holds the lock for its whole clear + insert
//! sequence.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{info, warn};

use docqa_core::chunker::Chunker;
use docqa_core::config::Settings;
use docqa_core::error::{Error, IngestIssue, Result};
use docqa_core::traits::{EmbedProvider, LlmProvider};
use docqa_core::types::{
    Document, EmbeddingSource, EmptyReason, FileOutcome, IndexStats, IngestReport, NewChunk, Query,
    QueryRequest, QueryResponse,
};
use docqa_core::validate::validate_document;
use docqa_embed::Embedder;
use docqa_index::{IndexStore, Retriever};
use docqa_text::{extract_tags, Analyzer};

use crate::planner::{IndexRetriever, PlanOutcome, Planner};
use crate::synth::Synthesizer;

/// Outcome of replacing the whole corpus.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceReport {
    pub cleared: usize,
    pub files: Vec<FileOutcome>,
}

/// A validated, chunked and embedded document waiting to be inserted.
struct Prepared {
    chunks: Vec<NewChunk>,
    report: IngestReport,
}

pub struct RagService {
    settings: Settings,
    store: Arc<IndexStore>,
    chunker: Chunker,
    analyzer: Analyzer,
    embedder: Embedder,
    retriever: Retriever,
    planner: Planner,
    synthesizer: Synthesizer,
    writer: Mutex<()>,
}

impl RagService {
    pub fn new(
        settings: Settings,
        store: Arc<IndexStore>,
        embed_provider: Option<Arc<dyn EmbedProvider>>,
        llm: Option<Arc<dyn LlmProvider>>,
    ) -> Result<Self> {
        settings.validate()?;
        let service = Self {
            chunker: Chunker::from_settings(&settings.chunking)?,
            analyzer: Analyzer::new(),
            embedder: Embedder::from_settings(&settings.embedding, embed_provider),
            retriever: Retriever::new(settings.scoring.clone()),
            planner: Planner::from_settings(&settings.planner),
            synthesizer: Synthesizer::new(llm, &settings.llm),
            store,
            settings,
            writer: Mutex::new(()),
        };
        let embeddings = if service.embedder.has_provider() { "provider" } else { "lexical" };
        info!(embeddings, llm = service.synthesizer.has_llm(), "rag service configured");
        Ok(service)
    }

    /// Fresh store, HTTP providers for the configured endpoints.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let embed = Embedder::provider_from_settings(&settings.embedding);
        let llm = Synthesizer::provider_from_settings(&settings.llm);
        Self::new(settings, Arc::new(IndexStore::new()), embed, llm)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<IndexStore> {
        &self.store
    }

    pub async fn ingest(&self, doc: Document) -> Result<IngestReport> {
        let generation = self.store.generation().await;
        let prepared = self.prepare(doc).await?;
        let _guard = self.writer.lock().await;
        self.commit(generation, prepared).await
    }

    /// Ingest several documents concurrently; a rejected file never aborts the batch.
    pub async fn ingest_batch(&self, docs: Vec<Document>) -> Vec<FileOutcome> {
        let outcomes: Vec<FileOutcome> = stream::iter(docs)
            .map(|doc| async move {
                let file_name = doc.file_name.clone();
                FileOutcome::from_result(&file_name, self.ingest(doc).await)
            })
            .buffered(self.settings.ingest.concurrency)
            .collect()
            .await;
        log_batch(&outcomes);
        outcomes
    }

    /// Clear the index and ingest `docs` as the new corpus, as one write sequence.
    pub async fn replace_corpus(&self, docs: Vec<Document>) -> ReplaceReport {
        let _guard = self.writer.lock().await;
        let cleared = self.store.clear().await;
        let generation = self.store.generation().await;

        let prepared: Vec<(String, Result<Prepared>)> = stream::iter(docs)
            .map(|doc| async move {
                let file_name = doc.file_name.clone();
                (file_name, self.prepare(doc).await)
            })
            .buffered(self.settings.ingest.concurrency)
            .collect()
            .await;

        let mut files = Vec::with_capacity(prepared.len());
        for (file_name, result) in prepared {
            let committed = match result {
                Ok(p) => self.commit(generation, p).await,
                Err(e) => Err(e),
            };
            files.push(FileOutcome::from_result(&file_name, committed));
        }
        log_batch(&files);
        ReplaceReport { cleared, files }
    }

    pub async fn clear(&self) -> usize {
        let _guard = self.writer.lock().await;
        self.store.clear().await
    }

    pub async fn stats(&self) -> IndexStats {
        self.store.stats(self.settings.ingest.min_average_chunk_chars).await
    }

    /// Never fails: invalid input becomes `QueryResponse::Error`, no hits or an
    /// overrun cascade become `QueryResponse::Empty`.
    pub async fn query(&self, request: QueryRequest) -> QueryResponse {
        let query = match self.build_query(&request) {
            Ok(q) => q,
            Err(e) => {
                warn!(error = %e, "query rejected");
                return QueryResponse::error(&e);
            }
        };

        let snapshot = self.store.snapshot().await;
        let total = snapshot.len();
        if total == 0 {
            info!(query = %query.text, "query against empty index");
            return QueryResponse::empty(EmptyReason::EmptyIndex, 0);
        }

        let deadline = Instant::now() + Duration::from_millis(self.settings.planner.query_timeout_ms);
        let retrieve = IndexRetriever::new(snapshot, self.retriever.clone(), self.embedder.clone());
        let outcome = match tokio::time::timeout_at(deadline, self.planner.plan_and_search(&query, &retrieve)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(query = %query.text, timeout_ms = self.settings.planner.query_timeout_ms, "retrieval timed out");
                return QueryResponse::empty(EmptyReason::TimedOut, total);
            }
        };

        match outcome {
            PlanOutcome::Empty { reason, attempts } => {
                info!(query = %query.text, attempts = attempts.len(), "no relevant documents");
                QueryResponse::empty(reason, total)
            }
            PlanOutcome::Found { hits, strategy, attempts } => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                let synthesis = self.synthesizer.synthesize_within(&query.text, &hits, remaining).await;
                info!(
                    query = %query.text,
                    strategy = %strategy,
                    attempts = attempts.len(),
                    hits = hits.len(),
                    used = synthesis.sources.len(),
                    degraded = synthesis.degraded,
                    "query answered"
                );
                QueryResponse::Found {
                    answer: synthesis.answer,
                    used: synthesis.sources.len(),
                    sources: synthesis.sources,
                    total_indexed: total,
                    strategy,
                    degraded: synthesis.degraded,
                }
            }
        }
    }

    fn build_query(&self, request: &QueryRequest) -> Result<Query> {
        let text = request.query.trim();
        if text.is_empty() {
            return Err(Error::InvalidQuery("query is required".into()));
        }
        let k = request.k.unwrap_or(self.settings.planner.default_k);
        if k == 0 {
            return Err(Error::InvalidQuery("k must be at least 1".into()));
        }
        let mut query = Query::new(text, k.min(self.settings.planner.max_k));
        query.system = non_empty(request.system.as_deref());
        query.subsystem = non_empty(request.subsystem.as_deref());
        query.tags = request
            .tags
            .iter()
            .flatten()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        Ok(query)
    }

    async fn prepare(&self, doc: Document) -> Result<Prepared> {
        if let Err(e) = validate_document(&doc, &self.settings.ingest) {
            warn!(file = %doc.file_name, error = %e, "document rejected");
            return Err(e);
        }

        let spans = self.chunker.chunk(&doc.content);
        if spans.is_empty() {
            return Err(Error::ingest(doc.file_name, IngestIssue::NoChunks));
        }
        let texts: Vec<String> = spans.iter().map(|s| s.text(&doc.content).to_string()).collect();
        let embeddings = self.embedder.embed_all(&texts).await;

        let total = texts.len();
        let mut chunks = Vec::with_capacity(total);
        for (index, ((span, text), embedding)) in spans.iter().zip(texts).zip(embeddings).enumerate() {
            let lexical_vector = if embedding.source.is_lexical() {
                embedding.vector.clone()
            } else {
                self.embedder.embed_lexical(&text)
            };
            chunks.push(NewChunk {
                tags: extract_tags(&self.analyzer, &text, self.settings.chunking.max_tags).into_iter().collect(),
                content_hash: blake3::hash(text.as_bytes()).to_hex().to_string(),
                text,
                start_offset: span.start,
                end_offset: span.end,
                vector: embedding.vector,
                lexical_vector,
                embedding_source: embedding.source,
                file_name: doc.file_name.clone(),
                system: doc.system.trim().to_string(),
                subsystem: doc.subsystem.trim().to_string(),
                mime_type: doc.mime_type.clone(),
                chunk_index: index,
                total_chunks: total,
            });
        }

        let report = self.report_for(&doc.file_name, &chunks);
        Ok(Prepared { chunks, report })
    }

    async fn commit(&self, generation: u64, prepared: Prepared) -> Result<IngestReport> {
        let inserted = self.store.insert_at(generation, prepared.chunks).await?;
        let report = prepared.report;
        info!(
            file = %report.file_name,
            chunks = inserted,
            fallback = report.fallback_embeddings,
            avg_chars = report.average_chunk_size,
            "document indexed"
        );
        Ok(report)
    }

    fn report_for(&self, file_name: &str, chunks: &[NewChunk]) -> IngestReport {
        let total = chunks.len();
        let chars: usize = chunks.iter().map(|c| c.text.chars().count()).sum();
        let average_chunk_size = chars as f64 / total.max(1) as f64;
        let fallback_embeddings =
            chunks.iter().filter(|c| c.embedding_source == EmbeddingSource::LexicalFallback).count();

        let mut warnings = Vec::new();
        let minimum = self.settings.ingest.min_average_chunk_chars;
        if average_chunk_size < minimum as f64 {
            warnings.push(format!(
                "average chunk size {average_chunk_size:.0} chars is below {minimum}; retrieval quality may suffer"
            ));
        }
        if fallback_embeddings > 0 {
            warnings.push(format!(
                "{fallback_embeddings} of {total} chunks use lexical fallback embeddings (provider unavailable)"
            ));
        }

        IngestReport {
            file_name: file_name.to_string(),
            chunks: total,
            fallback_embeddings,
            average_chunk_size,
            warnings,
            ingested_at: Utc::now(),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

fn log_batch(outcomes: &[FileOutcome]) {
    let indexed = outcomes.iter().filter(|o| o.is_indexed()).count();
    info!(files = outcomes.len(), indexed, rejected = outcomes.len() - indexed, "batch ingest finished");
}
