use serde::{Deserialize, Serialize};

use crate::error::{Result, SolverError};
use crate::provider::ProviderKind;

/// Fixed pairing of a solution model and a hint model under one id.
///
/// Immutable once constructed. Solve runs that share a binding share
/// provider registry entries but always use distinct session ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowBinding {
    pub workflow_id: String,
    pub name: String,
    pub description: String,
    pub solution_kind: ProviderKind,
    pub solution_model: String,
    pub hint_kind: ProviderKind,
    pub hint_model: String,
}

impl WorkflowBinding {
    fn entry(
        workflow_id: &str,
        name: &str,
        description: &str,
        solution_kind: ProviderKind,
        solution_model: &str,
        hint_kind: ProviderKind,
        hint_model: &str,
    ) -> Self {
        Self {
            workflow_id: workflow_id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            solution_kind,
            solution_model: solution_model.to_string(),
            hint_kind,
            hint_model: hint_model.to_string(),
        }
    }

    /// Built-in bindings, in display order.
    pub fn catalog() -> Vec<WorkflowBinding> {
        vec![
            Self::entry(
                "gpt-mistral",
                "GPT + Mistral",
                "GPT-4 for solution generation, Codestral for debugging hints",
                ProviderKind::OpenAi,
                "gpt-4",
                ProviderKind::Mistral,
                "codestral-2508",
            ),
            Self::entry(
                "gpt-groq",
                "GPT + Groq",
                "GPT-4 for solution generation, Llama 3.3 70B for debugging hints",
                ProviderKind::OpenAi,
                "gpt-4",
                ProviderKind::Groq,
                "llama-3.3-70b-versatile",
            ),
            Self::entry(
                "gpt-deepseek",
                "GPT + DeepSeek",
                "GPT-4 for solution generation, DeepSeek-Reasoner for debugging hints",
                ProviderKind::OpenAi,
                "gpt-4",
                ProviderKind::DeepSeek,
                "deepseek-reasoner",
            ),
        ]
    }

    pub fn lookup(workflow_id: &str) -> Result<WorkflowBinding> {
        Self::catalog()
            .into_iter()
            .find(|binding| binding.workflow_id == workflow_id)
            .ok_or_else(|| SolverError::UnknownWorkflow(workflow_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_workflows() {
        let binding = WorkflowBinding::lookup("gpt-mistral").unwrap();
        assert_eq!(binding.solution_kind, ProviderKind::OpenAi);
        assert_eq!(binding.solution_model, "gpt-4");
        assert_eq!(binding.hint_kind, ProviderKind::Mistral);
        assert_eq!(binding.hint_model, "codestral-2508");

        assert!(WorkflowBinding::lookup("gpt-groq").is_ok());
        assert!(WorkflowBinding::lookup("gpt-deepseek").is_ok());
    }

    #[test]
    fn test_lookup_unknown_workflow_rejected() {
        let err = WorkflowBinding::lookup("claude-solo").unwrap_err();
        assert!(matches!(err, SolverError::UnknownWorkflow(_)));
        assert!(err.to_string().contains("claude-solo"));
    }

    #[test]
    fn test_catalog_ids_are_unique() {
        let catalog = WorkflowBinding::catalog();
        let mut ids: Vec<&str> = catalog.iter().map(|b| b.workflow_id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), catalog.len());
    }
}
