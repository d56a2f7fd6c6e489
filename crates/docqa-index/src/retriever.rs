//! Scoring and ranking of stored chunks against a query.
//!
//! `score = clamp(raw + boost, -1, max_score)` where `raw` is the cosine
//! similarity in the space the chunk was embedded in and `boost` sums the
//! metadata, tag, keyword and phrase signals. Filters run before scoring.

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::debug;

use docqa_core::config::ScoringSettings;
use docqa_core::types::{Chunk, Query, QueryVectors, ScoredChunk};
use docqa_text::{contains_phrase, keyword_fraction, normalize, Analyzer};

use crate::math::cosine_similarity;

#[derive(Clone)]
pub struct Retriever {
    scoring: ScoringSettings,
    analyzer: Analyzer,
}

/// Per-query values computed once and reused for every chunk.
struct QueryTerms {
    normalized: String,
    words: Vec<String>,
    keywords: Vec<String>,
}

impl Retriever {
    pub fn new(scoring: ScoringSettings) -> Self {
        Self { scoring, analyzer: Analyzer::new() }
    }

    /// Top `query.k` chunks at or above `min_score`, best first; equal scores
    /// keep insertion order.
    pub fn search(&self, chunks: &[Arc<Chunk>], query: &Query, vectors: &QueryVectors) -> Vec<ScoredChunk> {
        if query.k == 0 {
            return Vec::new();
        }
        let terms = QueryTerms {
            normalized: normalize(&query.text),
            words: words(&query.text),
            keywords: self.analyzer.content_words(&query.text),
        };

        let mut hits: Vec<ScoredChunk> = chunks
            .iter()
            .filter(|chunk| passes_filters(chunk, query))
            .map(|chunk| self.score(chunk, query, &terms, vectors))
            .filter(|hit| hit.score >= self.scoring.min_score)
            .collect();

        hits.sort_by(|a, b| match b.score.total_cmp(&a.score) {
            Ordering::Equal => a.chunk.seq.cmp(&b.chunk.seq),
            other => other,
        });
        hits.truncate(query.k);
        debug!(query = %query.text, k = query.k, hits = hits.len(), "retrieval finished");
        hits
    }

    fn score(&self, chunk: &Arc<Chunk>, query: &Query, terms: &QueryTerms, vectors: &QueryVectors) -> ScoredChunk {
        let raw_score = match &vectors.semantic {
            Some(semantic) if !chunk.embedding_source.is_lexical() => cosine_similarity(semantic, &chunk.vector),
            _ => cosine_similarity(&vectors.lexical, &chunk.lexical_vector),
        };
        let boost = self.boost(chunk, query, terms);
        let score = (raw_score + boost).clamp(-1.0, self.scoring.max_score);
        ScoredChunk { chunk: Arc::clone(chunk), score, raw_score, boost }
    }

    fn boost(&self, chunk: &Chunk, query: &Query, terms: &QueryTerms) -> f32 {
        let s = &self.scoring;
        let mut boost = 0.0;

        if metadata_match(&chunk.system, query.system.as_deref(), &terms.words) {
            boost += s.system_boost;
        }
        if metadata_match(&chunk.subsystem, query.subsystem.as_deref(), &terms.words) {
            boost += s.subsystem_boost;
        }

        let tag_hits = terms.keywords.iter().chain(query.tags.iter()).filter(|t| chunk.tags.contains(t.as_str())).count();
        boost += (tag_hits as f32 * s.tag_boost).min(s.max_tag_boost);

        let text = normalize(&chunk.text);
        boost += s.lexical_weight * keyword_fraction(&terms.keywords, &text);
        if contains_phrase(&terms.normalized, &text) {
            boost += s.phrase_boost;
        }
        boost
    }
}

/// Chunk metadata equals the filter, or its words appear as whole words in the query.
fn metadata_match(value: &str, filter: Option<&str>, query_words: &[String]) -> bool {
    let value_words = words(value);
    if value_words.is_empty() {
        return false;
    }
    match filter.map(str::trim).filter(|f| !f.is_empty()) {
        Some(f) if same_label(value, f) => true,
        _ => query_words.windows(value_words.len()).any(|w| w == value_words.as_slice()),
    }
}

/// Trimmed, Unicode case-insensitive equality.
fn same_label(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Lowercased alphanumeric runs.
fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn passes_filters(chunk: &Chunk, query: &Query) -> bool {
    if !field_matches(&chunk.system, query.system.as_deref()) {
        return false;
    }
    if !field_matches(&chunk.subsystem, query.subsystem.as_deref()) {
        return false;
    }
    if query.tags.is_empty() {
        return true;
    }
    query.tags.iter().any(|t| chunk.tags.contains(t.trim().to_lowercase().as_str()))
}

fn field_matches(value: &str, filter: Option<&str>) -> bool {
    match filter.map(str::trim).filter(|f| !f.is_empty()) {
        None => true,
        Some(f) => same_label(value, f),
    }
}
