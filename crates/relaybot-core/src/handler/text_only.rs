use async_trait::async_trait;

use super::{HandlerContext, HandlerOutcome, MessageHandler};
use crate::types::InboundMessage;

/// Rejects media and other payloads that carry no text.
pub struct TextOnly;

#[async_trait]
impl MessageHandler for TextOnly {
    fn name(&self) -> &'static str {
        "text_only"
    }

    async fn handle(&self, message: &InboundMessage, _ctx: &mut HandlerContext) -> HandlerOutcome {
        // An empty string carries no text either; it must not reach the
        // completion handler as a user turn.
        match message.text.as_deref() {
            Some(text) if !text.is_empty() => HandlerOutcome::Pass,
            _ => HandlerOutcome::Reply("Only plain text messages are supported.".to_string()),
        }
    }
}
