use tracing::warn;

use crate::error::StoreError;
use crate::store::KvStore;
use crate::types::Turn;

/// Store key for a conversation's transcript.
pub fn history_key(conversation_id: &str) -> String {
    format!("history:{}", conversation_id)
}

/// Ordered conversation history, persisted as a bare JSON array of turns,
/// oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    /// A fresh transcript: exactly one system turn carrying the prompt.
    pub fn seeded(system_prompt: &str) -> Self {
        Self {
            turns: vec![Turn::system(system_prompt)],
        }
    }

    /// Parse a stored transcript. Returns None unless the value is a JSON
    /// array of turns.
    pub fn from_json(raw: &str) -> Option<Self> {
        serde_json::from_str::<Vec<Turn>>(raw)
            .ok()
            .map(|turns| Self { turns })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.turns)
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Record one completed round-trip: the user's text, then the reply.
    pub fn push_exchange(&mut self, user_text: &str, assistant_text: &str) {
        self.turns.push(Turn::user(user_text));
        self.turns.push(Turn::assistant(assistant_text));
    }
}

/// Load the stored transcript. Absent, unreadable, or malformed history
/// yields None so the caller reseeds a fresh one.
pub async fn load(store: &dyn KvStore, conversation_id: &str) -> Option<Transcript> {
    match store.get(&history_key(conversation_id)).await {
        Ok(Some(raw)) => {
            let parsed = Transcript::from_json(&raw);
            if parsed.is_none() {
                warn!("Ignoring malformed history for {}", conversation_id);
            }
            parsed
        }
        Ok(None) => None,
        Err(e) => {
            warn!("Failed to load history for {}: {}", conversation_id, e);
            None
        }
    }
}

/// Persist the transcript, replacing the stored history.
pub async fn save(
    store: &dyn KvStore,
    conversation_id: &str,
    transcript: &Transcript,
) -> Result<(), StoreError> {
    let raw = transcript
        .to_json()
        .map_err(|e| StoreError::Write(e.to_string()))?;
    store.put(&history_key(conversation_id), &raw).await
}
