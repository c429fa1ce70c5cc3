use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::config::AiConfig;

/// Client for an OpenAI-compatible AI gateway (chat completions plus
/// embeddings). All study-content generation goes through here.
#[derive(Clone)]
pub struct AiService {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    embedding_model: String,
}

/// One chat-completion call. `json_response` asks the gateway for a JSON
/// object body, which the generation prompts rely on.
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub system: &'a str,
    pub user: &'a str,
    pub json_response: bool,
    pub temperature: Option<f64>,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Deserialize)]
struct EmbeddingRow {
    embedding: Vec<f32>,
}

impl AiService {
    pub fn new(config: &AiConfig) -> Result<Self> {
        Url::parse(&config.base_url).context("Invalid AI gateway base URL")?;

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            embedding_model: config.embedding_model.clone(),
        })
    }

    pub async fn chat_completion(&self, request: ChatRequest<'_>) -> Result<String> {
        let mut body = json!({
            "model": request.model,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.user },
            ],
        });
        if request.json_response {
            body["response_format"] = json!({ "type": "json_object" });
        }
        if let Some(temperature) = request.temperature {
            body["temperature"] = json!(temperature);
        }

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("AI gateway request failed")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("AI gateway returned {status}: {detail}");
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .context("Failed to decode AI gateway response")?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .context("AI gateway returned no choices")
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = json!({
            "input": text,
            "model": self.embedding_model,
        });

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("Embedding request failed")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("Embedding request returned {status}: {detail}");
        }

        let embeddings: EmbeddingResponse = response
            .json()
            .await
            .context("Failed to decode embedding response")?;

        embeddings
            .data
            .into_iter()
            .next()
            .map(|row| row.embedding)
            .context("Embedding response contained no data")
    }
}
