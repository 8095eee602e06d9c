pub mod access;
pub mod chat;
pub mod reset;
pub mod set_env;
pub mod text_only;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::AppConfig;
use crate::provider::ChatProvider;
use crate::store::KvStore;
use crate::types::InboundMessage;
use crate::user_config::UserConfig;

pub use access::AccessControl;
pub use chat::ChatCompletion;
pub use reset::NewConversation;
pub use set_env::SetEnv;
pub use text_only::TextOnly;

/// What a pipeline handler decided about a message.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerOutcome {
    /// Terminal: send this reply and stop the pipeline.
    Reply(String),
    /// Not this handler's message; let the next one look.
    Pass,
}

/// Request-scoped state shared down the pipeline.
pub struct HandlerContext {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn KvStore>,
    pub provider: Arc<dyn ChatProvider>,
    /// Working copy of the conversation's configuration, loaded by the
    /// dispatcher before the pipeline runs.
    pub user_config: UserConfig,
}

/// One policy step in the message pipeline.
///
/// Handlers are self-contained: each guards its own preconditions rather
/// than assuming an earlier handler ran, and each converts its own faults
/// into a terminal reply instead of returning errors.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    fn name(&self) -> &'static str;

    async fn handle(&self, message: &InboundMessage, ctx: &mut HandlerContext) -> HandlerOutcome;
}

/// The relay's handlers, in evaluation order.
pub fn default_pipeline() -> Vec<Box<dyn MessageHandler>> {
    vec![
        Box::new(AccessControl),
        Box::new(TextOnly),
        Box::new(SetEnv),
        Box::new(NewConversation),
        Box::new(ChatCompletion),
    ]
}
