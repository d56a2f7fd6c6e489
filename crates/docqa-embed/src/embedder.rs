//! Provider embedding with retry and lexical fallback.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use docqa_core::config::{api_key_from_env, EmbeddingSettings};
use docqa_core::error::{Error, ProviderError};
use docqa_core::policy::CallPolicy;
use docqa_core::traits::EmbedProvider;
use docqa_core::types::{Embedding, EmbeddingSource, QueryVectors};

use crate::http::HttpEmbedProvider;
use crate::lexical::HashingEmbedder;

/// Never fails: a provider error after the policy's retries yields the lexical
/// vector tagged `LexicalFallback`. Without a provider every vector is `Lexical`.
#[derive(Clone)]
pub struct Embedder {
    provider: Option<Arc<dyn EmbedProvider>>,
    lexical: HashingEmbedder,
    policy: CallPolicy,
    concurrency: usize,
}

impl Embedder {
    pub fn new(
        provider: Option<Arc<dyn EmbedProvider>>,
        lexical: HashingEmbedder,
        policy: CallPolicy,
        concurrency: usize,
    ) -> Self {
        Self { provider, lexical, policy, concurrency: concurrency.max(1) }
    }

    /// Lexical-only embedder; makes no network calls.
    pub fn lexical_only(dim: usize) -> Self {
        Self::new(None, HashingEmbedder::new(dim), CallPolicy::from_millis(0, 0, 0), 1)
    }

    pub fn from_settings(settings: &EmbeddingSettings, provider: Option<Arc<dyn EmbedProvider>>) -> Self {
        let policy = CallPolicy::from_millis(settings.timeout_ms, settings.retries, settings.backoff_ms);
        Self::new(provider, HashingEmbedder::new(settings.dim), policy, settings.concurrency)
    }

    /// HTTP provider from config, or `None` when no endpoint is set.
    pub fn provider_from_settings(settings: &EmbeddingSettings) -> Option<Arc<dyn EmbedProvider>> {
        let endpoint = settings.endpoint.as_deref()?;
        let key = api_key_from_env(settings.api_key_env.as_deref());
        Some(Arc::new(HttpEmbedProvider::new(endpoint, &settings.model, settings.dim, key)))
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    pub fn embed_lexical(&self, text: &str) -> Vec<f32> {
        self.lexical.embed(text)
    }

    pub async fn embed(&self, text: &str) -> Embedding {
        match self.provider_embedding(text).await {
            Some(Ok(vector)) => Embedding { vector, source: EmbeddingSource::Provider },
            Some(Err(e)) => {
                warn!(error = %e, "embedding provider failed, using lexical fallback");
                Embedding { vector: self.lexical.embed(text), source: EmbeddingSource::LexicalFallback }
            }
            None => Embedding { vector: self.lexical.embed(text), source: EmbeddingSource::Lexical },
        }
    }

    /// Embed every text with at most `concurrency` provider calls in flight.
    /// Output order matches input order.
    pub async fn embed_all(&self, texts: &[String]) -> Vec<Embedding> {
        let futures: Vec<_> = texts.iter().map(|t| self.embed(t)).collect();
        stream::iter(futures)
            .buffered(self.concurrency)
            .collect()
            .await
    }

    /// Query vectors: the semantic one is absent when the provider is missing or failed.
    pub async fn embed_query(&self, text: &str) -> QueryVectors {
        let lexical = self.lexical.embed(text);
        let semantic = match self.provider_embedding(text).await {
            Some(Ok(vector)) => Some(vector),
            Some(Err(e)) => {
                warn!(error = %e, "query embedding failed, searching lexically");
                None
            }
            None => None,
        };
        QueryVectors { semantic, lexical }
    }

    /// One provider call under the policy, dimension checked. `None` without a provider.
    pub async fn provider_embedding(&self, text: &str) -> Option<Result<Vec<f32>, Error>> {
        let provider = self.provider.as_ref()?;
        let expected = provider.dim();
        let result = self
            .policy
            .run("embed", || provider.embed(text))
            .await
            .and_then(|vector| {
                if vector.len() == expected {
                    Ok(vector)
                } else {
                    Err(ProviderError::Dimension { expected, got: vector.len() })
                }
            });
        debug!(provider = provider.name(), ok = result.is_ok(), "embedding call finished");
        Some(result.map_err(Error::EmbeddingProvider))
    }
}
