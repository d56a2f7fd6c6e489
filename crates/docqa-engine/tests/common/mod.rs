#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use docqa_core::config::Settings;
use docqa_core::error::ProviderError;
use docqa_core::traits::{CompletionRequest, EmbedProvider, LlmProvider};
use docqa_core::types::{Chunk, EmbeddingSource, NewChunk, ScoredChunk};
use docqa_embed::HashingEmbedder;
use docqa_engine::RagService;
use docqa_index::IndexStore;

pub const DIM: usize = 256;

pub fn test_settings() -> Settings {
    let mut s = Settings::default();
    s.embedding.dim = DIM;
    s.embedding.timeout_ms = 2_000;
    s.embedding.backoff_ms = 1;
    s.llm.timeout_ms = 200;
    s.llm.backoff_ms = 1;
    s
}

pub fn service(
    settings: Settings,
    embed: Option<Arc<dyn EmbedProvider>>,
    llm: Option<Arc<dyn LlmProvider>>,
) -> RagService {
    RagService::new(settings, Arc::new(IndexStore::new()), embed, llm).expect("valid settings")
}

/// Provider-side embeddings that live in the hashed space, with an optional
/// delay for texts shorter than `slow_below` bytes.
pub struct CountingEmbed {
    pub calls: AtomicUsize,
    inner: HashingEmbedder,
    delay: Duration,
    slow_below: usize,
}

impl CountingEmbed {
    pub fn new() -> Self {
        Self::slow(Duration::ZERO, 0)
    }

    pub fn slow(delay: Duration, slow_below: usize) -> Self {
        Self { calls: AtomicUsize::new(0), inner: HashingEmbedder::new(DIM), delay, slow_below }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbedProvider for CountingEmbed {
    fn name(&self) -> &str {
        "counting"
    }
    fn dim(&self) -> usize {
        DIM
    }
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if text.len() < self.slow_below {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.inner.embed(text))
    }
}

pub enum LlmBehavior {
    Answer(String),
    Empty,
    Fail,
    Sleep(Duration),
}

/// Scripted LLM that records every prompt it receives.
pub struct ScriptedLlm {
    pub calls: AtomicUsize,
    pub prompts: Mutex<Vec<String>>,
    behavior: LlmBehavior,
}

impl ScriptedLlm {
    pub fn new(behavior: LlmBehavior) -> Self {
        Self { calls: AtomicUsize::new(0), prompts: Mutex::new(Vec::new()), behavior }
    }

    pub fn answering(text: &str) -> Self {
        Self::new(LlmBehavior::Answer(text.to_string()))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> String {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    fn name(&self) -> &str {
        "scripted"
    }
    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let prompt = request.messages.iter().map(|m| m.content.as_str()).collect::<Vec<_>>().join("\n");
        self.prompts.lock().unwrap().push(prompt);
        match &self.behavior {
            LlmBehavior::Answer(text) => Ok(text.clone()),
            LlmBehavior::Empty => Ok("   ".to_string()),
            LlmBehavior::Fail => Err(ProviderError::Unavailable("mock outage".into())),
            LlmBehavior::Sleep(d) => {
                tokio::time::sleep(*d).await;
                Ok("too late".to_string())
            }
        }
    }
}

pub fn scored(seq: u64, file_name: &str, text: &str, score: f32) -> ScoredChunk {
    let v = HashingEmbedder::new(DIM).embed(text);
    let new = NewChunk {
        text: text.to_string(),
        start_offset: 0,
        end_offset: text.len(),
        vector: v.clone(),
        lexical_vector: v,
        embedding_source: EmbeddingSource::Lexical,
        file_name: file_name.to_string(),
        system: "plant".to_string(),
        subsystem: String::new(),
        mime_type: "text/plain".to_string(),
        tags: BTreeSet::new(),
        content_hash: String::new(),
        chunk_index: 0,
        total_chunks: 1,
    };
    ScoredChunk { chunk: Arc::new(Chunk::from_new(new, seq)), score, raw_score: score, boost: 0.0 }
}
