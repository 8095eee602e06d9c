use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::error::ChannelError;
use crate::types::InboundMessage;
use crate::util::http;

// ====== Webhook Types ======

/// Incoming update envelope from a Telegram webhook.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUpdate {
    pub update_id: i64,
    /// Absent for update kinds the relay does not handle (edits, joins, ...).
    pub message: Option<TelegramMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramMessage {
    pub message_id: i64,
    pub chat: TelegramChat,
    /// Absent for media and other non-text payloads.
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
    #[serde(rename = "type")]
    pub chat_type: String,
}

/// Parse a webhook body into an update.
pub fn parse_webhook_update(body: &str) -> Result<TelegramUpdate, serde_json::Error> {
    serde_json::from_str(body)
}

impl From<&TelegramMessage> for InboundMessage {
    fn from(message: &TelegramMessage) -> Self {
        InboundMessage::new(message.chat.id.to_string(), message.text.clone())
    }
}

// ====== Outbound ======

/// Outbound side of a chat platform. Sending is best-effort: the relay logs
/// failures but never retries beyond the formatting fallback.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(&self, conversation_id: &str, text: &str) -> Result<(), ChannelError>;
}

/// Telegram Bot API client.
pub struct TelegramClient {
    token: String,
}

impl TelegramClient {
    pub fn new(token: String) -> Self {
        Self { token }
    }

    fn api_url(&self, method: &str) -> String {
        format!("https://api.telegram.org/bot{}/{}", self.token, method)
    }

    /// Register `webhook_url` as the bot's webhook.
    pub async fn set_webhook(&self, webhook_url: &str) -> anyhow::Result<()> {
        let resp = http::client()
            .post(self.api_url("setWebhook"))
            .json(&json!({"url": webhook_url}))
            .send()
            .await?;
        let body: serde_json::Value = resp.json().await?;
        if body.get("ok").and_then(|v| v.as_bool()) != Some(true) {
            let desc = body
                .get("description")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown error");
            anyhow::bail!("Failed to set webhook: {}", desc);
        }
        Ok(())
    }

    /// Remove the bot's webhook registration.
    pub async fn delete_webhook(&self) -> anyhow::Result<()> {
        let resp = http::client()
            .post(self.api_url("deleteWebhook"))
            .send()
            .await?;
        let body: serde_json::Value = resp.json().await?;
        if body.get("ok").and_then(|v| v.as_bool()) != Some(true) {
            let desc = body
                .get("description")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown error");
            anyhow::bail!("Failed to delete webhook: {}", desc);
        }
        Ok(())
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send_text(&self, conversation_id: &str, text: &str) -> Result<(), ChannelError> {
        let url = self.api_url("sendMessage");
        let resp = http::client()
            .post(&url)
            .json(&json!({
                "chat_id": conversation_id,
                "text": text,
                "parse_mode": "Markdown",
            }))
            .send()
            .await?;

        if !resp.status().is_success() {
            // Telegram rejects messages with broken markup; retry once plain.
            warn!(
                "sendMessage with Markdown failed ({}), retrying as plain text",
                resp.status()
            );
            let resp = http::client()
                .post(&url)
                .json(&json!({"chat_id": conversation_id, "text": text}))
                .send()
                .await?;
            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                return Err(ChannelError::Api(format!(
                    "sendMessage failed ({}): {}",
                    status, body
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_webhook_update_with_text() {
        let body = r#"{
            "update_id": 10001,
            "message": {
                "message_id": 1365,
                "chat": {"id": 100, "type": "private"},
                "text": "hello"
            }
        }"#;

        let update = parse_webhook_update(body).unwrap();
        assert_eq!(update.update_id, 10001);
        let message = update.message.unwrap();
        assert_eq!(message.chat.id, 100);
        assert_eq!(message.text.as_deref(), Some("hello"));
    }

    #[test]
    fn test_parse_webhook_update_without_message() {
        let body = r#"{"update_id": 10002, "edited_message": {"message_id": 2}}"#;
        let update = parse_webhook_update(body).unwrap();
        assert!(update.message.is_none());
    }

    #[test]
    fn test_parse_webhook_update_without_text() {
        let body = r#"{
            "update_id": 10003,
            "message": {
                "message_id": 7,
                "chat": {"id": -100987, "type": "group"},
                "photo": [{"file_id": "abc"}]
            }
        }"#;

        let update = parse_webhook_update(body).unwrap();
        let message = update.message.unwrap();
        assert!(message.text.is_none());
        assert_eq!(message.chat.id, -100987);
    }

    #[test]
    fn test_parse_webhook_update_malformed() {
        assert!(parse_webhook_update("not json").is_err());
    }

    #[test]
    fn test_inbound_message_conversion() {
        let body = r#"{
            "update_id": 1,
            "message": {
                "message_id": 2,
                "chat": {"id": -100987, "type": "group"},
                "text": "hi"
            }
        }"#;
        let update = parse_webhook_update(body).unwrap();
        let inbound = InboundMessage::from(&update.message.unwrap());
        assert_eq!(inbound.conversation_id, "-100987");
        assert_eq!(inbound.text.as_deref(), Some("hi"));
    }

    #[test]
    fn test_api_url() {
        let client = TelegramClient::new("123:abc".to_string());
        assert_eq!(
            client.api_url("sendMessage"),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }
}
