//! Domain types shared by the chunker, index, planner and synthesizer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use crate::error::Error;

pub type ChunkId = String;

/// A plain-text document handed over by the upload/extraction layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub file_name: String,
    #[serde(default = "default_mime_type")]
    pub mime_type: String,
    #[serde(default)]
    pub system: String,
    #[serde(default)]
    pub subsystem: String,
    pub content: String,
}

fn default_mime_type() -> String {
    "text/plain".to_string()
}

impl Document {
    pub fn new(file_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: default_mime_type(),
            system: String::new(),
            subsystem: String::new(),
            content: content.into(),
        }
    }

    pub fn with_system(mut self, system: impl Into<String>, subsystem: impl Into<String>) -> Self {
        self.system = system.into();
        self.subsystem = subsystem.into();
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }
}

/// Which path produced a chunk's retrieval vector.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingSource {
    Provider,
    /// No provider configured.
    Lexical,
    /// The provider failed for this text.
    LexicalFallback,
}

impl EmbeddingSource {
    /// True when the vector lives in the hashed lexical space.
    pub fn is_lexical(self) -> bool {
        !matches!(self, EmbeddingSource::Provider)
    }
}

/// Output of the embedder for one text.
#[derive(Debug, Clone)]
pub struct Embedding {
    pub vector: Vec<f32>,
    pub source: EmbeddingSource,
}

/// Query-side vectors. `semantic` is absent when no provider is configured or
/// the provider failed for this query.
#[derive(Debug, Clone)]
pub struct QueryVectors {
    pub semantic: Option<Vec<f32>>,
    pub lexical: Vec<f32>,
}

/// A chunk that is embedded and tagged but not yet stored.
#[derive(Debug, Clone)]
pub struct NewChunk {
    pub text: String,
    pub start_offset: usize,
    pub end_offset: usize,
    pub vector: Vec<f32>,
    pub lexical_vector: Vec<f32>,
    pub embedding_source: EmbeddingSource,
    pub file_name: String,
    pub system: String,
    pub subsystem: String,
    pub mime_type: String,
    pub tags: BTreeSet<String>,
    pub content_hash: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
}

/// An indexed chunk.
///
/// - `id`/`seq`: assigned by the store at insertion; `seq` is the insertion order
/// - `start_offset`/`end_offset`: byte offsets into the parent document content
/// - `vector`: retrieval vector (provider embedding, or the lexical one on fallback)
/// - `lexical_vector`: hashed term vector, always present
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    pub id: ChunkId,
    pub seq: u64,
    pub text: String,
    pub start_offset: usize,
    pub end_offset: usize,
    #[serde(skip)]
    pub vector: Vec<f32>,
    #[serde(skip)]
    pub lexical_vector: Vec<f32>,
    pub embedding_source: EmbeddingSource,
    pub file_name: String,
    pub system: String,
    pub subsystem: String,
    pub mime_type: String,
    pub tags: BTreeSet<String>,
    pub content_hash: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
}

impl Chunk {
    pub fn from_new(new: NewChunk, seq: u64) -> Self {
        Self {
            id: format!("chunk-{seq:06}"),
            seq,
            text: new.text,
            start_offset: new.start_offset,
            end_offset: new.end_offset,
            vector: new.vector,
            lexical_vector: new.lexical_vector,
            embedding_source: new.embedding_source,
            file_name: new.file_name,
            system: new.system,
            subsystem: new.subsystem,
            mime_type: new.mime_type,
            tags: new.tags,
            content_hash: new.content_hash,
            chunk_index: new.chunk_index,
            total_chunks: new.total_chunks,
        }
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// First `max_chars` characters with whitespace runs collapsed.
    pub fn preview(&self, max_chars: usize) -> String {
        let collapsed = self.text.split_whitespace().collect::<Vec<_>>().join(" ");
        match collapsed.char_indices().nth(max_chars) {
            Some((idx, _)) => format!("{}...", &collapsed[..idx]),
            None => collapsed,
        }
    }
}

/// A search request after defaults are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub text: String,
    pub k: usize,
    pub system: Option<String>,
    pub subsystem: Option<String>,
    pub tags: Vec<String>,
}

impl Query {
    pub fn new(text: impl Into<String>, k: usize) -> Self {
        Self { text: text.into(), k, system: None, subsystem: None, tags: Vec::new() }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_subsystem(mut self, subsystem: impl Into<String>) -> Self {
        self.subsystem = Some(subsystem.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Same filters, different text and k.
    pub fn reformulated(&self, text: impl Into<String>, k: usize) -> Self {
        Self { text: text.into(), k, ..self.clone() }
    }
}

/// Query boundary payload as received from the UI/API layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub k: Option<usize>,
    #[serde(default)]
    pub system: Option<String>,
    #[serde(default)]
    pub subsystem: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self { query: query.into(), ..Self::default() }
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = Some(k);
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// One retrieved chunk with its score breakdown.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Arc<Chunk>,
    pub score: f32,
    pub raw_score: f32,
    pub boost: f32,
}

/// Citation returned to the caller; always points at a chunk that was given to the LLM.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SourceRef {
    pub chunk_id: ChunkId,
    pub file_name: String,
    pub system: String,
    pub subsystem: String,
    pub score: f32,
    pub preview: String,
    pub embedding_source: EmbeddingSource,
}

impl SourceRef {
    pub fn from_scored(hit: &ScoredChunk, preview_chars: usize) -> Self {
        Self {
            chunk_id: hit.chunk.id.clone(),
            file_name: hit.chunk.file_name.clone(),
            system: hit.chunk.system.clone(),
            subsystem: hit.chunk.subsystem.clone(),
            score: hit.score,
            preview: hit.chunk.preview(preview_chars),
            embedding_source: hit.chunk.embedding_source,
        }
    }
}

/// Query reformulation steps of the multi-strategy planner, in cascade order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Verbatim,
    ReducedK,
    Keywords,
    SingleKeyword,
}

impl StrategyKind {
    /// 1-based position in the cascade.
    pub fn ordinal(self) -> u8 {
        match self {
            StrategyKind::Verbatim => 1,
            StrategyKind::ReducedK => 2,
            StrategyKind::Keywords => 3,
            StrategyKind::SingleKeyword => 4,
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StrategyKind::Verbatim => "verbatim",
            StrategyKind::ReducedK => "reduced_k",
            StrategyKind::Keywords => "keywords",
            StrategyKind::SingleKeyword => "single_keyword",
        };
        f.write_str(label)
    }
}

/// Why a query produced no results. Never an error.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EmptyReason {
    EmptyIndex,
    NoMatch,
    TimedOut,
}

impl EmptyReason {
    pub fn message(self) -> &'static str {
        match self {
            EmptyReason::EmptyIndex => "No documents are indexed. Select and ingest files first.",
            EmptyReason::NoMatch => "No relevant documents found for this query.",
            EmptyReason::TimedOut => {
                "No relevant documents found for this query before the time limit."
            }
        }
    }
}

/// Response of the query boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryResponse {
    Found {
        answer: String,
        sources: Vec<SourceRef>,
        used: usize,
        #[serde(rename = "totalIndexed")]
        total_indexed: usize,
        strategy: StrategyKind,
        degraded: bool,
    },
    Empty {
        reason: EmptyReason,
        message: String,
        #[serde(rename = "totalIndexed")]
        total_indexed: usize,
    },
    Error {
        detail: String,
    },
}

impl QueryResponse {
    pub fn empty(reason: EmptyReason, total_indexed: usize) -> Self {
        QueryResponse::Empty { reason, message: reason.message().to_string(), total_indexed }
    }

    pub fn error(err: &Error) -> Self {
        QueryResponse::Error { detail: err.to_string() }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, QueryResponse::Found { .. })
    }
}

/// Result of ingesting one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub file_name: String,
    pub chunks: usize,
    pub fallback_embeddings: usize,
    pub average_chunk_size: f64,
    pub warnings: Vec<String>,
    pub ingested_at: DateTime<Utc>,
}

/// Per-file outcome of a batch ingest; a rejected file never aborts the batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Indexed(IngestReport),
    Rejected {
        #[serde(rename = "fileName")]
        file_name: String,
        detail: String,
    },
}

impl FileOutcome {
    pub fn from_result(file_name: &str, result: Result<IngestReport, Error>) -> Self {
        match result {
            Ok(report) => FileOutcome::Indexed(report),
            Err(err) => FileOutcome::Rejected { file_name: file_name.to_string(), detail: err.to_string() },
        }
    }

    pub fn is_indexed(&self) -> bool {
        matches!(self, FileOutcome::Indexed(_))
    }
}

/// Diagnostic flags raised by `IndexStats`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IndexWarning {
    SmallAverageChunk { average: f64, minimum: usize },
    FallbackHeavy { fallback: usize, total: usize },
}

/// Read-only snapshot of the index for health checks and the UI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    pub total_chunks: usize,
    pub unique_files: usize,
    pub by_system: BTreeMap<String, usize>,
    pub by_subsystem: BTreeMap<String, usize>,
    pub average_chunk_size: f64,
    pub tag_counts: BTreeMap<String, usize>,
    pub fallback_embeddings: usize,
    pub generation: u64,
    pub warnings: Vec<IndexWarning>,
}
