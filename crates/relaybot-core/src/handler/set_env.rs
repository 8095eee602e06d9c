use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, warn};

use super::{HandlerContext, HandlerOutcome, MessageHandler};
use crate::types::InboundMessage;
use crate::user_config;

static SET_ENV_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^SETENV\s+(\w+)\s*=\s*(.*)$").expect("valid regex"));

/// Applies `SETENV KEY=VALUE` updates to the conversation's configuration.
pub struct SetEnv;

#[async_trait]
impl MessageHandler for SetEnv {
    fn name(&self) -> &'static str {
        "set_env"
    }

    async fn handle(&self, message: &InboundMessage, ctx: &mut HandlerContext) -> HandlerOutcome {
        let Some(text) = message.text.as_deref() else {
            return HandlerOutcome::Pass;
        };
        if !text.starts_with("SETENV") {
            return HandlerOutcome::Pass;
        }

        // Anything that names the command but does not parse is claimed
        // here, so typos surface instead of turning into chat prompts.
        let Some(captures) = SET_ENV_RE.captures(text) else {
            return HandlerOutcome::Reply("Invalid format, expected: SETENV KEY=VALUE".to_string());
        };
        let key = &captures[1];
        let value = captures[2].trim();

        if let Err(e) = ctx.user_config.set(key, value) {
            return HandlerOutcome::Reply(e.to_string());
        }

        match user_config::persist(ctx.store.as_ref(), &message.conversation_id, &ctx.user_config)
            .await
        {
            Ok(()) => {
                info!("Updated {} for conversation {}", key, message.conversation_id);
                HandlerOutcome::Reply("Configuration updated.".to_string())
            }
            Err(e) => {
                warn!(
                    "Failed to persist configuration for {}: {}",
                    message.conversation_id, e
                );
                HandlerOutcome::Reply(format!("Failed to save configuration: {}", e))
            }
        }
    }
}
