use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;

use super::Generation;

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

/// OpenAI-compatible chat-completions client.
pub struct GenerationClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GenerationClient {
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        model: &str,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
        }
    }

    /// Resolve the chat completions endpoint from the base URL.
    fn endpoint(&self) -> String {
        if self.base_url.ends_with("/chat/completions") {
            self.base_url.clone()
        } else if self.base_url.ends_with("/v1") {
            format!("{}/chat/completions", self.base_url)
        } else {
            format!("{}/v1/chat/completions", self.base_url)
        }
    }
}

#[async_trait]
impl Generation for GenerationClient {
    async fn complete(&self, system: &str, user: &str, temperature: f32) -> Result<String> {
        let messages = vec![
            Message { role: "system", content: system.to_string() },
            Message { role: "user", content: user.to_string() },
        ];
        let body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": temperature,
        });

        let mut req = self.client.post(self.endpoint()).json(&body);
        if let Some(key) = &self.api_key {
            req = req.header("Authorization", format!("Bearer {}", key));
        }

        let resp = req.send().await.context("generation request failed")?;
        let data: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse generation response")?;

        let content = data["choices"]
            .get(0)
            .and_then(|c| c["message"]["content"].as_str())
            .unwrap_or("")
            .to_string();

        Ok(content)
    }
}
