//! Answer synthesis over retrieved chunks.
//!
//! Chunks go to the LLM as numbered context blocks in score order until the
//! context budget is spent. `sources` lists exactly those blocks. When the LLM
//! is missing, fails, times out or answers with nothing, the answer falls back
//! to an excerpt of the best chunk and the result is marked degraded.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use docqa_core::config::{api_key_from_env, LlmSettings};
use docqa_core::error::{Error, ProviderError};
use docqa_core::policy::CallPolicy;
use docqa_core::traits::{ChatMessage, CompletionRequest, LlmProvider};
use docqa_core::types::{ScoredChunk, SourceRef};

use crate::llm::HttpLlmProvider;

const EXCERPT_CHARS: usize = 600;

const SYSTEM_PROMPT: &str = "You answer questions about the user's documents. \
Use only the numbered context blocks below and cite them as [n]. \
If the context does not contain the answer, say that it is not in the documents.";

#[derive(Debug, Clone)]
pub struct Synthesis {
    pub answer: String,
    pub sources: Vec<SourceRef>,
    pub degraded: bool,
    /// Why the LLM answer was replaced by an excerpt, when a call was made.
    pub error: Option<Error>,
}

#[derive(Clone)]
pub struct Synthesizer {
    llm: Option<Arc<dyn LlmProvider>>,
    policy: CallPolicy,
    settings: LlmSettings,
}

impl Synthesizer {
    pub fn new(llm: Option<Arc<dyn LlmProvider>>, settings: &LlmSettings) -> Self {
        let policy = CallPolicy::from_millis(settings.timeout_ms, settings.retries, settings.backoff_ms);
        Self { llm, policy, settings: settings.clone() }
    }

    pub fn provider_from_settings(settings: &LlmSettings) -> Option<Arc<dyn LlmProvider>> {
        let endpoint = settings.endpoint.as_deref()?;
        let key = api_key_from_env(settings.api_key_env.as_deref());
        Some(Arc::new(HttpLlmProvider::new(endpoint, &settings.model, key)))
    }

    pub fn has_llm(&self) -> bool {
        self.llm.is_some()
    }

    /// Leading hits whose texts fit in `max_context_chars`; the first hit is always kept.
    pub fn select_context<'a>(&self, hits: &'a [ScoredChunk]) -> &'a [ScoredChunk] {
        let mut used = 0usize;
        let mut take = 0usize;
        for hit in hits {
            let len = hit.chunk.char_len();
            if take > 0 && used + len > self.settings.max_context_chars {
                break;
            }
            used += len;
            take += 1;
        }
        &hits[..take]
    }

    pub fn build_messages(question: &str, context: &[ScoredChunk]) -> Vec<ChatMessage> {
        let mut prompt = String::from("Context:\n");
        for (i, hit) in context.iter().enumerate() {
            let c = &hit.chunk;
            prompt.push_str(&format!("\n[{}] {}", i + 1, c.file_name));
            if !c.system.is_empty() {
                prompt.push_str(&format!(" ({}", c.system));
                if !c.subsystem.is_empty() {
                    prompt.push_str(&format!(" / {}", c.subsystem));
                }
                prompt.push(')');
            }
            prompt.push('\n');
            prompt.push_str(c.text.trim());
            prompt.push('\n');
        }
        prompt.push_str(&format!("\nQuestion: {}", question.trim()));
        vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)]
    }

    pub async fn synthesize(&self, question: &str, hits: &[ScoredChunk]) -> Synthesis {
        self.run(question, hits, None).await
    }

    /// Like `synthesize`, but the whole LLM phase (attempts, retries and
    /// backoff) ends within `remaining`.
    pub async fn synthesize_within(&self, question: &str, hits: &[ScoredChunk], remaining: Duration) -> Synthesis {
        self.run(question, hits, Some(remaining)).await
    }

    async fn run(&self, question: &str, hits: &[ScoredChunk], budget: Option<Duration>) -> Synthesis {
        let context = self.select_context(hits);
        let sources: Vec<SourceRef> =
            context.iter().map(|hit| SourceRef::from_scored(hit, self.settings.preview_chars)).collect();
        if context.is_empty() {
            return Synthesis { answer: String::new(), sources, degraded: true, error: None };
        }

        let Some(llm) = &self.llm else {
            debug!("no LLM configured, answering with an excerpt");
            return Synthesis { answer: excerpt_answer(&context[0]), sources, degraded: true, error: None };
        };
        let policy = match budget {
            Some(remaining) => self.policy.capped(remaining),
            None => self.policy,
        };
        if policy.timeout.is_zero() {
            let err = Error::SynthesisProvider(ProviderError::Timeout { after_ms: 0 });
            warn!(error = %err, "no time left for synthesis, answering with an excerpt");
            return Synthesis { answer: excerpt_answer(&context[0]), sources, degraded: true, error: Some(err) };
        }

        let mut request = CompletionRequest::new(Self::build_messages(question, context));
        request.temperature = Some(self.settings.temperature);
        request.max_tokens = Some(self.settings.max_tokens);

        let call = policy.run("complete", || llm.complete(request.clone()));
        let outcome = match budget {
            Some(remaining) => tokio::time::timeout(remaining, call).await.unwrap_or_else(|_| {
                Err(ProviderError::Timeout { after_ms: u64::try_from(remaining.as_millis()).unwrap_or(u64::MAX) })
            }),
            None => call.await,
        }
        .and_then(|text| {
            let text = text.trim().to_string();
            if text.is_empty() { Err(ProviderError::Malformed("empty completion".into())) } else { Ok(text) }
        });

        match outcome {
            Ok(answer) => Synthesis { answer, sources, degraded: false, error: None },
            Err(e) => {
                let err = Error::SynthesisProvider(e);
                warn!(provider = llm.name(), error = %err, "synthesis failed, answering with an excerpt");
                Synthesis { answer: excerpt_answer(&context[0]), sources, degraded: true, error: Some(err) }
            }
        }
    }
}

fn excerpt_answer(best: &ScoredChunk) -> String {
    format!(
        "An answer could not be generated. Most relevant excerpt from {}:\n\n{}",
        best.chunk.file_name,
        best.chunk.preview(EXCERPT_CHARS)
    )
}
