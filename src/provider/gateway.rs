use async_trait::async_trait;

use super::kind::ProviderKind;
use crate::context::ContextArena;
use crate::error::{ProviderError, SolverError};

/// Two-value completion result. `display_text` is everything the model
/// produced, including any auxiliary reasoning, and is meant for logs and
/// artifacts. `persisted_text` is what goes back into the conversation
/// history; reasoning content is excluded because replaying it to the
/// endpoint gets the request rejected.
#[derive(Debug, Clone)]
pub struct ProviderReply {
    pub display_text: String,
    pub persisted_text: String,
}

impl ProviderReply {
    pub fn plain(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            display_text: text.clone(),
            persisted_text: text,
        }
    }

    pub fn with_reasoning(reasoning: &str, answer: impl Into<String>) -> Self {
        let answer = answer.into();
        Self {
            display_text: format!(
                "**Reasoning Process:**\n{}\n\n**Analysis:**\n{}",
                reasoning, answer
            ),
            persisted_text: answer,
        }
    }
}

/// A single conversational model plus its session store.
///
/// `call` appends the outbound user message and the inbound assistant
/// message (persisted form) to the session, in that order, before
/// returning. That append is what gives retries memory.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn model(&self) -> &str;

    fn contexts(&self) -> &ContextArena;

    async fn call(
        &self,
        session_id: &str,
        user_message: &str,
    ) -> std::result::Result<ProviderReply, ProviderError>;

    fn open_session(
        &self,
        session_id: &str,
        system_prompt: &str,
    ) -> std::result::Result<(), ProviderError> {
        self.contexts()
            .create(session_id, Some(system_prompt))
            .map_err(arena_err)
    }

    fn has_session(&self, session_id: &str) -> bool {
        self.contexts().contains(session_id)
    }
}

pub(super) fn arena_err(err: SolverError) -> ProviderError {
    ProviderError::Session(err.to_string())
}
