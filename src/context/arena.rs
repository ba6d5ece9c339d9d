use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::debug;

use super::message::{ChatMessage, ChatRole, WireMessage};
use crate::error::{Result, SolverError};

/// One session's ordered, append-only message log.
///
/// At most one system message may exist and it is always the first entry.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationContext {
    pub session_id: String,
    pub provider_kind: String,
    pub model_name: String,
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
}

impl ConversationContext {
    fn new(
        session_id: impl Into<String>,
        provider_kind: impl Into<String>,
        model_name: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            provider_kind: provider_kind.into(),
            model_name: model_name.into(),
            messages: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Project the log into the wire shape, dropping timestamps.
    pub fn render(&self) -> Vec<WireMessage> {
        self.messages.iter().map(WireMessage::from).collect()
    }
}

/// Session store for one provider. Sessions are created before use, never
/// share ids, and only grow.
pub struct ContextArena {
    provider_kind: String,
    model_name: String,
    sessions: RwLock<HashMap<String, ConversationContext>>,
}

impl ContextArena {
    pub fn new(provider_kind: impl Into<String>, model_name: impl Into<String>) -> Self {
        Self {
            provider_kind: provider_kind.into(),
            model_name: model_name.into(),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn create(&self, session_id: &str, system_message: Option<&str>) -> Result<()> {
        let mut sessions = self.sessions.write();
        if sessions.contains_key(session_id) {
            return Err(SolverError::DuplicateSession(session_id.to_string()));
        }

        let mut context =
            ConversationContext::new(session_id, &self.provider_kind, &self.model_name);
        if let Some(system) = system_message {
            context
                .messages
                .push(ChatMessage::new(ChatRole::System, system));
        }

        debug!(session_id, model = %self.model_name, "Created conversation session");
        sessions.insert(session_id.to_string(), context);
        Ok(())
    }

    pub fn append(&self, session_id: &str, role: ChatRole, content: &str) -> Result<()> {
        let mut sessions = self.sessions.write();
        let context = sessions
            .get_mut(session_id)
            .ok_or_else(|| SolverError::UnknownSession(session_id.to_string()))?;

        if role == ChatRole::System && !context.messages.is_empty() {
            return Err(SolverError::MisplacedSystemMessage(session_id.to_string()));
        }

        context.messages.push(ChatMessage::new(role, content));
        Ok(())
    }

    pub fn render_for_call(&self, session_id: &str) -> Result<Vec<WireMessage>> {
        let sessions = self.sessions.read();
        let context = sessions
            .get(session_id)
            .ok_or_else(|| SolverError::UnknownSession(session_id.to_string()))?;
        Ok(context.render())
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.read().contains_key(session_id)
    }

    pub fn message_count(&self, session_id: &str) -> Result<usize> {
        let sessions = self.sessions.read();
        let context = sessions
            .get(session_id)
            .ok_or_else(|| SolverError::UnknownSession(session_id.to_string()))?;
        Ok(context.messages.len())
    }

    /// Snapshot a session for diagnostics. Sessions are in-memory only;
    /// nothing is persisted unless a caller exports it.
    pub fn export(&self, session_id: &str) -> Result<ConversationContext> {
        let sessions = self.sessions.read();
        sessions
            .get(session_id)
            .cloned()
            .ok_or_else(|| SolverError::UnknownSession(session_id.to_string()))
    }

    pub fn session_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Drops a session and its history. Unknown ids are ignored.
    pub fn remove(&self, session_id: &str) {
        if self.sessions.write().remove(session_id).is_some() {
            debug!(session_id, "Dropped conversation session");
        }
    }
}
