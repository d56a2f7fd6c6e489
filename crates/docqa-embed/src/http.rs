use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use docqa_core::error::ProviderError;
use docqa_core::traits::EmbedProvider;

/// Client for an OpenAI-compatible `/v1/embeddings` endpoint.
#[derive(Clone)]
pub struct HttpEmbedProvider {
    base_url: String,
    model: String,
    api_key: Option<String>,
    dim: usize,
    name: String,
    client: Client,
}

impl HttpEmbedProvider {
    pub fn new(base_url: &str, model: &str, dim: usize, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
            dim,
            name: format!("http:{model}"),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl EmbedProvider for HttpEmbedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn dim(&self) -> usize {
        self.dim
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let url = format!("{}/v1/embeddings", self.base_url);
        let body = json!({
            "model": self.model,
            "input": text,
        });

        let mut req = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let res = req.send().await.map_err(ProviderError::http)?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(ProviderError::Status { status: status.as_u16(), body });
        }

        let payload: Value = res.json().await.map_err(|e| ProviderError::Malformed(e.to_string()))?;
        let values = payload["data"][0]["embedding"]
            .as_array()
            .ok_or_else(|| ProviderError::Malformed("missing data[0].embedding".into()))?;
        let vector: Vec<f32> = values.iter().filter_map(|v| v.as_f64().map(|f| f as f32)).collect();
        if vector.len() != self.dim {
            return Err(ProviderError::Dimension { expected: self.dim, got: vector.len() });
        }
        Ok(vector)
    }
}
