use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use docqa_core::error::ProviderError;
use docqa_core::traits::{CompletionRequest, LlmProvider};

/// Client for an OpenAI-compatible `/v1/chat/completions` endpoint (non-streaming).
#[derive(Clone)]
pub struct HttpLlmProvider {
    base_url: String,
    model: String,
    api_key: Option<String>,
    name: String,
    client: Client,
}

impl HttpLlmProvider {
    pub fn new(base_url: &str, model: &str, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
            name: format!("http:{model}"),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl LlmProvider for HttpLlmProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let mut body = json!({
            "model": self.model,
            "messages": request.messages,
            "stream": false,
        });
        if let Some(obj) = body.as_object_mut() {
            if let Some(t) = request.temperature { obj.insert("temperature".to_string(), json!(t)); }
            if let Some(t) = request.max_tokens { obj.insert("max_tokens".to_string(), json!(t)); }
        }

        let mut req = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let res = req.send().await.map_err(ProviderError::http)?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(ProviderError::Status { status: status.as_u16(), body: text });
        }

        let payload: Value = res.json().await.map_err(|e| ProviderError::Malformed(e.to_string()))?;
        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ProviderError::Malformed("missing choices[0].message.content".into()))
    }
}
