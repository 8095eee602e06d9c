use async_trait::async_trait;
use tracing::error;

use super::{HandlerContext, HandlerOutcome, MessageHandler};
use crate::error::StoreError;
use crate::provider;
use crate::transcript::{self, Transcript};
use crate::types::{InboundMessage, Turn};

/// The terminal handler: runs the completion round-trip and grows the
/// stored transcript by one user/assistant exchange.
pub struct ChatCompletion;

impl ChatCompletion {
    /// One full turn against the provider.
    ///
    /// The transcript read and write are separate store calls with no
    /// locking, so two overlapping messages in the same conversation can
    /// interleave here and the last write wins.
    async fn run(
        &self,
        message: &InboundMessage,
        ctx: &HandlerContext,
        text: &str,
    ) -> Result<String, StoreError> {
        let mut transcript = transcript::load(ctx.store.as_ref(), &message.conversation_id)
            .await
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| Transcript::seeded(&ctx.user_config.system_init_message));

        let mut outgoing: Vec<Turn> = transcript.turns().to_vec();
        outgoing.push(Turn::user(text));

        // A provider failure still produces an answer, and that answer is
        // recorded like any other so the transcript stays pairwise.
        let answer = provider::complete_or_fallback(
            ctx.provider.as_ref(),
            &outgoing,
            &ctx.user_config.openai_api_extra_params,
        )
        .await;

        transcript.push_exchange(text, &answer);
        transcript::save(ctx.store.as_ref(), &message.conversation_id, &transcript).await?;
        Ok(answer)
    }
}

#[async_trait]
impl MessageHandler for ChatCompletion {
    fn name(&self) -> &'static str {
        "chat_completion"
    }

    async fn handle(&self, message: &InboundMessage, ctx: &mut HandlerContext) -> HandlerOutcome {
        let Some(text) = message.text.as_deref() else {
            return HandlerOutcome::Pass;
        };
        match self.run(message, ctx, text).await {
            Ok(answer) => HandlerOutcome::Reply(answer),
            Err(e) => {
                error!(
                    "Completion turn failed for {}: {}",
                    message.conversation_id, e
                );
                HandlerOutcome::Reply(format!("ERROR: {}", e))
            }
        }
    }
}
