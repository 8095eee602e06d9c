use tracing::{debug, error};

use crate::handler::{HandlerContext, HandlerOutcome};
use crate::http::AppState;
use crate::telegram::TelegramUpdate;
use crate::types::InboundMessage;
use crate::user_config;

/// Drive one webhook update through the handler pipeline.
///
/// Every path returns normally: updates without a message are skipped,
/// handlers convert their own faults into replies, and a reply that cannot
/// be delivered is only logged. The webhook response never depends on what
/// happened in here.
pub async fn dispatch_update(state: &AppState, update: TelegramUpdate) {
    let Some(message) = update.message.as_ref() else {
        debug!("Update {} carries no message, skipping", update.update_id);
        return;
    };
    let inbound = InboundMessage::from(message);

    let user_config = user_config::load(state.store.as_ref(), &inbound.conversation_id).await;
    let mut ctx = HandlerContext {
        config: state.config.clone(),
        store: state.store.clone(),
        provider: state.provider.clone(),
        user_config,
    };

    for handler in &state.pipeline {
        match handler.handle(&inbound, &mut ctx).await {
            HandlerOutcome::Reply(text) => {
                debug!(
                    "Handler {} replied in conversation {}",
                    handler.name(),
                    inbound.conversation_id
                );
                if let Err(e) = state
                    .messenger
                    .send_text(&inbound.conversation_id, &text)
                    .await
                {
                    error!(
                        "Failed to deliver reply to {}: {}",
                        inbound.conversation_id, e
                    );
                }
                return;
            }
            HandlerOutcome::Pass => {}
        }
    }

    debug!(
        "No handler claimed the message from {}",
        inbound.conversation_id
    );
}
