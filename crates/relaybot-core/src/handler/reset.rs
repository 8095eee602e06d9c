use async_trait::async_trait;
use tracing::info;

use super::{HandlerContext, HandlerOutcome, MessageHandler};
use crate::transcript;
use crate::types::InboundMessage;

const RESET_COMMAND: &str = "/new";

/// Clears the stored transcript when the reset command arrives.
pub struct NewConversation;

#[async_trait]
impl MessageHandler for NewConversation {
    fn name(&self) -> &'static str {
        "new_conversation"
    }

    async fn handle(&self, message: &InboundMessage, ctx: &mut HandlerContext) -> HandlerOutcome {
        if message.text.as_deref() != Some(RESET_COMMAND) {
            return HandlerOutcome::Pass;
        }

        let key = transcript::history_key(&message.conversation_id);
        match ctx.store.delete(&key).await {
            Ok(()) => {
                info!("Cleared history for conversation {}", message.conversation_id);
                HandlerOutcome::Reply("New conversation started.".to_string())
            }
            Err(e) => HandlerOutcome::Reply(format!("ERROR: {}", e)),
        }
    }
}
