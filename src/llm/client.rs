use crate::config::LlmSettings;
use crate::error::{KpiBenchmarkError, Result};
use crate::llm::types::*;
use crate::llm::CompletionProvider;
use async_trait::async_trait;
use log::debug;
use reqwest::Client;

/// OpenAI-compatible `/chat/completions` client (Groq by default).
#[derive(Clone)]
pub struct ChatCompletionsClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
}

impl ChatCompletionsClient {
    pub fn new(settings: &LlmSettings) -> Self {
        Self {
            client: Client::new(),
            api_key: settings.api_key.clone(),
            base_url: settings.base_url.clone(),
            model: settings.model.clone(),
            temperature: settings.temperature,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl CompletionProvider for ChatCompletionsClient {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let payload = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(system_prompt), ChatMessage::user(user_prompt)],
            temperature: self.temperature,
            response_format: ResponseFormat::json_object(),
            stream: false,
        };

        debug!("POST {} (model {})", self.endpoint(), self.model);
        let res = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;
        let status = res.status();

        if !status.is_success() {
            let err_text = res.text().await?;
            return Err(KpiBenchmarkError::Llm(format!(
                "Chat completions API error (status {}): {}",
                status, err_text
            )));
        }

        let body: ChatCompletionResponse = res.json().await?;
        let content = body
            .first_content()
            .ok_or_else(|| KpiBenchmarkError::Llm("No content in completion response".to_string()))?;

        debug!("Completion returned {} characters", content.len());
        Ok(content.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_from_settings() {
        let settings = LlmSettings::new("key").with_base_url("http://localhost:9000/v1/");
        let client = ChatCompletionsClient::new(&settings);
        assert_eq!(client.endpoint(), "http://localhost:9000/v1/chat/completions");
        assert_eq!(client.model(), "llama-3.3-70b-versatile");
    }
}
