use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::binding::WorkflowBinding;
use super::prompts;
use crate::error::{Result, SolverError};
use crate::provider::{LLMProvider, ProviderRegistry};
use crate::run::AttemptRecord;
use crate::utils::short_id;

/// One solve run's conversational state across both models of a workflow.
///
/// The solution and hint models get separate provider sessions so hint
/// commentary never leaks into the solution model's history.
pub struct WorkflowSession {
    session_id: String,
    binding: WorkflowBinding,
    solution_provider: Arc<dyn LLMProvider>,
    hint_provider: Arc<dyn LLMProvider>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkflowSessionSummary {
    pub session_id: String,
    pub workflow_id: String,
    pub solution_messages: usize,
    pub hint_messages: usize,
}

impl WorkflowSession {
    /// Resolves both providers through the registry and reserves a
    /// run-unique session id. Provider contexts are created lazily on
    /// first generation call.
    pub fn open(
        registry: &ProviderRegistry,
        binding: WorkflowBinding,
        problem_id: &str,
    ) -> Result<Self> {
        let session_id = format!("{}_{}_{}", problem_id, binding.workflow_id, short_id());

        let solution_provider =
            registry.get_or_create(binding.solution_kind, &binding.solution_model)?;
        let hint_provider = registry.get_or_create(binding.hint_kind, &binding.hint_model)?;

        debug!(
            session = %session_id,
            workflow = %binding.workflow_id,
            "Opened workflow session"
        );

        Ok(Self {
            session_id,
            binding,
            solution_provider,
            hint_provider,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn binding(&self) -> &WorkflowBinding {
        &self.binding
    }

    fn solution_session(&self) -> String {
        format!("{}_solution", self.session_id)
    }

    fn hint_session(&self) -> String {
        format!("{}_hint", self.session_id)
    }

    /// Generate a candidate solution. `previous` carries at most the
    /// single most recent failed attempt; older failures ride along only
    /// through the session history.
    pub async fn generate_solution(
        &self,
        statement: &str,
        previous: Option<&AttemptRecord>,
    ) -> Result<String> {
        let session = self.solution_session();
        if !self.solution_provider.has_session(&session) {
            self.solution_provider
                .open_session(&session, prompts::SOLUTION_SYSTEM_PROMPT)?;
        }

        let message = match previous {
            Some(attempt) => prompts::retry_request(statement, attempt),
            None => prompts::initial_request(statement),
        };

        let reply = self
            .solution_provider
            .call(&session, &message)
            .await
            .map_err(|e| SolverError::Generation(e.to_string()))?;

        Ok(prompts::extract_code(&reply.persisted_text))
    }

    /// Ask the hint model why an attempt failed. Reasoning-capable models
    /// include their chain of thought in the returned text; the session
    /// history keeps only the final answer.
    pub async fn generate_hint(&self, statement: &str, failed: &AttemptRecord) -> Result<String> {
        let session = self.hint_session();
        if !self.hint_provider.has_session(&session) {
            self.hint_provider
                .open_session(&session, prompts::HINT_SYSTEM_PROMPT)?;
        }

        let message = prompts::hint_request(
            statement,
            failed.solution_code.as_deref().unwrap_or(""),
            failed.verdict_raw.as_deref().unwrap_or("Unknown"),
            &prompts::error_details(failed),
        );

        let reply = self
            .hint_provider
            .call(&session, &message)
            .await
            .map_err(|e| SolverError::Generation(e.to_string()))?;

        Ok(reply.display_text)
    }

    /// Message counts per side, for the sessions listing. A side that has
    /// not been used yet counts as zero.
    pub fn summary(&self) -> WorkflowSessionSummary {
        WorkflowSessionSummary {
            session_id: self.session_id.clone(),
            workflow_id: self.binding.workflow_id.clone(),
            solution_messages: self
                .solution_provider
                .contexts()
                .message_count(&self.solution_session())
                .unwrap_or(0),
            hint_messages: self
                .hint_provider
                .contexts()
                .message_count(&self.hint_session())
                .unwrap_or(0),
        }
    }

    /// Drops both provider contexts. The session id stays valid in logs.
    pub fn close(&self) {
        self.solution_provider
            .contexts()
            .remove(&self.solution_session());
        self.hint_provider.contexts().remove(&self.hint_session());
        debug!(session = %self.session_id, "Closed workflow session");
    }
}
