use async_trait::async_trait;
use tracing::info;

use super::{HandlerContext, HandlerOutcome, MessageHandler};
use crate::types::InboundMessage;

/// Rejects messages from conversations outside the allowlist.
pub struct AccessControl;

#[async_trait]
impl MessageHandler for AccessControl {
    fn name(&self) -> &'static str {
        "access_control"
    }

    async fn handle(&self, message: &InboundMessage, ctx: &mut HandlerContext) -> HandlerOutcome {
        if ctx.config.access.permits(&message.conversation_id) {
            return HandlerOutcome::Pass;
        }
        info!("Rejected message from {}", message.conversation_id);
        HandlerOutcome::Reply(format!(
            "You are not allowed to use this bot. Your chat id is {}.",
            message.conversation_id
        ))
    }
}
