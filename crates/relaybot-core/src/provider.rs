use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::error;

use crate::config::OpenAiConfig;
use crate::error::ProviderError;
use crate::types::Turn;
use crate::util::http;

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// A chat-completion backend.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Send the transcript and return the assistant's reply text.
    async fn chat(
        &self,
        turns: &[Turn],
        extra_params: &Map<String, Value>,
    ) -> Result<String, ProviderError>;
}

/// Client for OpenAI-compatible chat completion endpoints.
pub struct OpenAiProvider {
    api_key: String,
    api_base: String,
    model: String,
}

impl OpenAiProvider {
    pub fn new(config: &OpenAiConfig) -> Self {
        let api_base = config
            .api_base
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        Self {
            api_key: config.api_key.clone(),
            api_base: api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        }
    }
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    async fn chat(
        &self,
        turns: &[Turn],
        extra_params: &Map<String, Value>,
    ) -> Result<String, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::NoApiKey);
        }

        let body = build_request_body(&self.model, turns, extra_params);
        let resp = http::client()
            .post(format!("{}/chat/completions", self.api_base))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Api { status, message });
        }

        let data: Value = resp.json().await?;
        parse_chat_response(&data)
    }
}

/// Build the completion request body: the configured model, then the
/// per-conversation extra parameters (which may override the model), then
/// the messages.
pub fn build_request_body(
    model: &str,
    turns: &[Turn],
    extra_params: &Map<String, Value>,
) -> Value {
    let mut body = Map::new();
    body.insert("model".to_string(), json!(model));
    for (key, value) in extra_params {
        body.insert(key.clone(), value.clone());
    }
    let messages: Vec<Value> = turns
        .iter()
        .map(|t| json!({"role": t.role, "content": t.content}))
        .collect();
    body.insert("messages".to_string(), Value::Array(messages));
    Value::Object(body)
}

/// Extract the assistant text from a chat completion response.
pub fn parse_chat_response(data: &Value) -> Result<String, ProviderError> {
    let choice = data
        .get("choices")
        .and_then(|c| c.get(0))
        .ok_or_else(|| ProviderError::Parse("No choices in response".to_string()))?;
    let content = choice
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .ok_or_else(|| ProviderError::Parse("No message content in choice".to_string()))?;
    Ok(content.to_string())
}

/// Ask for a completion, degrading to an apologetic fallback on failure so
/// the caller always has text to reply with.
pub async fn complete_or_fallback(
    provider: &dyn ChatProvider,
    turns: &[Turn],
    extra_params: &Map<String, Value>,
) -> String {
    match provider.chat(turns, extra_params).await {
        Ok(text) => text,
        Err(e) => {
            error!("Completion request failed: {}", e);
            format!("I don't know how to answer that.\n> {}", e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RefusingProvider;

    #[async_trait]
    impl ChatProvider for RefusingProvider {
        async fn chat(
            &self,
            _turns: &[Turn],
            _extra_params: &Map<String, Value>,
        ) -> Result<String, ProviderError> {
            Err(ProviderError::Api {
                status: 500,
                message: "upstream exploded".to_string(),
            })
        }
    }

    #[test]
    fn test_build_request_body() {
        let turns = vec![Turn::system("sys"), Turn::user("hello")];
        let body = build_request_body("gpt-3.5-turbo", &turns, &Map::new());

        assert_eq!(body["model"], "gpt-3.5-turbo");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "hello");
    }

    #[test]
    fn test_extra_params_merge_and_override() {
        let mut extra = Map::new();
        extra.insert("temperature".to_string(), json!(0.2));
        extra.insert("model".to_string(), json!("gpt-4"));
        // a stored "messages" value must not clobber the real transcript
        extra.insert("messages".to_string(), json!("bogus"));

        let turns = vec![Turn::user("hi")];
        let body = build_request_body("gpt-3.5-turbo", &turns, &extra);

        assert_eq!(body["temperature"], json!(0.2));
        assert_eq!(body["model"], "gpt-4");
        assert!(body["messages"].is_array());
        assert_eq!(body["messages"][0]["content"], "hi");
    }

    #[test]
    fn test_parse_chat_response() {
        let data = json!({
            "choices": [{"message": {"role": "assistant", "content": "hi there"}}]
        });
        assert_eq!(parse_chat_response(&data).unwrap(), "hi there");
    }

    #[test]
    fn test_parse_chat_response_errors() {
        let no_choices = json!({"choices": []});
        assert!(matches!(
            parse_chat_response(&no_choices),
            Err(ProviderError::Parse(_))
        ));

        let no_content = json!({"choices": [{"message": {"role": "assistant"}}]});
        assert!(matches!(
            parse_chat_response(&no_content),
            Err(ProviderError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_complete_or_fallback_embeds_error() {
        let reply = complete_or_fallback(&RefusingProvider, &[Turn::user("hi")], &Map::new()).await;
        assert!(reply.starts_with("I don't know how to answer that.\n> "));
        assert!(reply.contains("500"));
        assert!(reply.contains("upstream exploded"));
    }
}
