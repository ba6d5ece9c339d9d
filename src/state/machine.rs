use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SolverError;

/// Phases of one solve run.
///
/// The loop is Generating -> Submitting -> Polling -> Diagnosing, which
/// either re-enters Generating or ends in a terminal phase. Generation and
/// submission failures skip ahead within the loop without passing through
/// Polling, and cancellation is honored only at the top of Generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolvePhase {
    #[default]
    Idle,
    Generating,
    Submitting,
    Polling,
    Diagnosing,
    Accepted,
    Exhausted,
    NoMapping,
    Cancelled,
}

impl SolvePhase {
    pub fn allowed_transitions(&self) -> &'static [SolvePhase] {
        use SolvePhase::*;
        match self {
            Idle => &[Generating],
            // Generating -> Generating covers a failed generation with
            // budget left; the attempt slot is consumed without a submit.
            Generating => &[Submitting, Generating, Exhausted, Cancelled],
            Submitting => &[Polling, NoMapping, Generating, Exhausted],
            Polling => &[Diagnosing],
            Diagnosing => &[Accepted, Generating, Exhausted],
            Accepted => &[],
            Exhausted => &[],
            NoMapping => &[],
            Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, target: SolvePhase) -> bool {
        self.allowed_transitions().contains(&target)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SolvePhase::Accepted
                | SolvePhase::Exhausted
                | SolvePhase::NoMapping
                | SolvePhase::Cancelled
        )
    }

    pub fn is_active(&self) -> bool {
        matches!(
            self,
            SolvePhase::Generating
                | SolvePhase::Submitting
                | SolvePhase::Polling
                | SolvePhase::Diagnosing
        )
    }
}

impl fmt::Display for SolvePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "Idle",
            Self::Generating => "Generating",
            Self::Submitting => "Submitting",
            Self::Polling => "Polling",
            Self::Diagnosing => "Diagnosing",
            Self::Accepted => "Accepted",
            Self::Exhausted => "Exhausted",
            Self::NoMapping => "NoMapping",
            Self::Cancelled => "Cancelled",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub from: SolvePhase,
    pub to: SolvePhase,
    pub reason: String,
    pub at: DateTime<Utc>,
}

impl PhaseTransition {
    pub fn new(from: SolvePhase, to: SolvePhase, reason: impl Into<String>) -> Self {
        Self {
            from,
            to,
            reason: reason.into(),
            at: Utc::now(),
        }
    }
}

/// Tracks one run's phase and rejects edges the machine does not allow.
#[derive(Debug, Default)]
pub struct PhaseTracker {
    phase: SolvePhase,
    history: Vec<PhaseTransition>,
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> SolvePhase {
        self.phase
    }

    pub fn history(&self) -> &[PhaseTransition] {
        &self.history
    }

    pub fn advance(&mut self, to: SolvePhase, reason: impl Into<String>) -> Result<(), SolverError> {
        if !self.phase.can_transition_to(to) {
            return Err(SolverError::InvalidPhaseTransition {
                from: self.phase.to_string(),
                to: to.to_string(),
                allowed: self
                    .phase
                    .allowed_transitions()
                    .iter()
                    .map(|p| p.to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }

        let transition = PhaseTransition::new(self.phase, to, reason);
        debug!(
            from = %transition.from,
            to = %transition.to,
            reason = %transition.reason,
            "Phase transition"
        );
        self.history.push(transition);
        self.phase = to;
        Ok(())
    }
}
