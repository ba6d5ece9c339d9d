use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::judge::JudgeResponse;
use crate::verdict::Verdict;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalStatus {
    /// Only ever seen in a solving log while the run is live.
    #[default]
    InProgress,
    Accepted,
    Failed,
    NoMapping,
    Cancelled,
}

impl FinalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FinalStatus::InProgress => "in_progress",
            FinalStatus::Accepted => "accepted",
            FinalStatus::Failed => "failed",
            FinalStatus::NoMapping => "no_mapping",
            FinalStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, FinalStatus::InProgress)
    }
}

impl std::fmt::Display for FinalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One generate -> submit -> judge cycle. Fields are optional because an
/// attempt can die at any stage; `error` marks a failed generation (no
/// verdict at all), `submission_error` a failed handoff to the judge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub attempt: u32,
    pub timestamp: DateTime<Utc>,
    pub duration_seconds: f64,
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<Verdict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict_raw: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub judge_response: Option<JudgeResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint_error: Option<String>,
}

impl AttemptRecord {
    pub fn new(attempt: u32) -> Self {
        Self {
            attempt,
            timestamp: Utc::now(),
            duration_seconds: 0.0,
            accepted: false,
            solution_file: None,
            solution_code: None,
            submission_id: None,
            verdict: None,
            verdict_raw: None,
            judge_response: None,
            error: None,
            submission_error: None,
            hint: None,
            hint_error: None,
        }
    }

    /// True when the attempt ran to a verdict and was not accepted, or
    /// died before getting one. Drives hint generation.
    pub fn failed(&self) -> bool {
        !self.accepted
    }
}

/// Full run journal, rewritten to disk after every attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveLog {
    pub problem_id: String,
    pub workflow: String,
    pub workflow_session: String,
    pub max_attempts: u32,
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    pub final_status: FinalStatus,
    #[serde(default)]
    pub attempts: Vec<AttemptRecord>,
}

impl SolveLog {
    pub fn new(
        problem_id: impl Into<String>,
        workflow: impl Into<String>,
        workflow_session: impl Into<String>,
        max_attempts: u32,
    ) -> Self {
        Self {
            problem_id: problem_id.into(),
            workflow: workflow.into(),
            workflow_session: workflow_session.into(),
            max_attempts,
            start_time: Utc::now(),
            end_time: None,
            final_status: FinalStatus::InProgress,
            attempts: Vec::new(),
        }
    }

    pub fn close(&mut self, status: FinalStatus) {
        self.final_status = status;
        self.end_time = Some(Utc::now());
    }
}

/// Verdict counters for reporting. Exactly one counter moves per counted
/// attempt; verdicts outside the five categories are not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatistics {
    pub compilation_errors: u32,
    pub runtime_errors: u32,
    pub wrong_answers: u32,
    pub time_limit_exceeded: u32,
    pub memory_limit_exceeded: u32,
}

impl RunStatistics {
    pub fn record(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::CompilationError => self.compilation_errors += 1,
            Verdict::RuntimeError => self.runtime_errors += 1,
            Verdict::WrongAnswer => self.wrong_answers += 1,
            Verdict::TimeLimitExceeded => self.time_limit_exceeded += 1,
            Verdict::MemoryLimitExceeded => self.memory_limit_exceeded += 1,
            _ => {}
        }
    }

    /// Re-derivable from the attempt list at any time; persisting and
    /// re-deriving must agree.
    pub fn from_attempts(attempts: &[AttemptRecord]) -> Self {
        let mut stats = Self::default();
        for attempt in attempts {
            if attempt.accepted {
                continue;
            }
            if let Some(verdict) = attempt.verdict {
                stats.record(verdict);
            }
        }
        stats
    }
}

/// The per-run JSON artifact consumed by downstream tooling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalResult {
    pub problem_id: String,
    pub status: FinalStatus,
    pub accepted: bool,
    pub total_attempts: u32,
    pub successful_attempt: Option<u32>,
    pub statistics: RunStatistics,
    pub workflow: String,
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    pub total_duration_minutes: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_verdict: Option<Verdict>,
}

impl FinalResult {
    pub fn from_log(log: &SolveLog) -> Self {
        let successful_attempt = log
            .attempts
            .iter()
            .find(|a| a.accepted)
            .map(|a| a.attempt);

        // Most recent attempt that actually reached a verdict.
        let best_verdict = log.attempts.iter().rev().find_map(|a| a.verdict);

        let end = log.end_time.unwrap_or_else(Utc::now);
        let total_duration_minutes =
            (end - log.start_time).num_milliseconds() as f64 / 60_000.0;

        Self {
            problem_id: log.problem_id.clone(),
            status: log.final_status,
            accepted: log.final_status == FinalStatus::Accepted,
            total_attempts: log.attempts.len() as u32,
            successful_attempt,
            statistics: RunStatistics::from_attempts(&log.attempts),
            workflow: log.workflow.clone(),
            start_time: log.start_time,
            end_time: log.end_time,
            total_duration_minutes,
            best_verdict,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt_with_verdict(n: u32, verdict: Verdict) -> AttemptRecord {
        let mut attempt = AttemptRecord::new(n);
        attempt.verdict = Some(verdict);
        attempt.verdict_raw = Some(verdict.as_str().to_string());
        attempt.accepted = verdict.is_accepted();
        attempt
    }

    #[test]
    fn test_statistics_count_each_category_once() {
        let attempts = vec![
            attempt_with_verdict(1, Verdict::WrongAnswer),
            attempt_with_verdict(2, Verdict::CompilationError),
            attempt_with_verdict(3, Verdict::TimeLimitExceeded),
            attempt_with_verdict(4, Verdict::RuntimeError),
            attempt_with_verdict(5, Verdict::MemoryLimitExceeded),
        ];
        let stats = RunStatistics::from_attempts(&attempts);
        assert_eq!(stats.wrong_answers, 1);
        assert_eq!(stats.compilation_errors, 1);
        assert_eq!(stats.time_limit_exceeded, 1);
        assert_eq!(stats.runtime_errors, 1);
        assert_eq!(stats.memory_limit_exceeded, 1);
    }

    #[test]
    fn test_statistics_same_verdict_twice_counts_twice() {
        let mut stats = RunStatistics::default();
        stats.record(Verdict::WrongAnswer);
        stats.record(Verdict::WrongAnswer);
        assert_eq!(stats.wrong_answers, 2);
        assert_eq!(stats.compilation_errors, 0);
        assert_eq!(stats.runtime_errors, 0);
        assert_eq!(stats.time_limit_exceeded, 0);
        assert_eq!(stats.memory_limit_exceeded, 0);
    }

    #[test]
    fn test_statistics_skip_accepted_and_verdictless_attempts() {
        let mut errored = AttemptRecord::new(2);
        errored.error = Some("model call failed".to_string());

        let attempts = vec![
            attempt_with_verdict(1, Verdict::WrongAnswer),
            errored,
            attempt_with_verdict(3, Verdict::Accepted),
        ];
        let stats = RunStatistics::from_attempts(&attempts);
        assert_eq!(stats.wrong_answers, 1);
        assert_eq!(
            stats,
            RunStatistics {
                wrong_answers: 1,
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_uncounted_verdicts_leave_statistics_unchanged() {
        let attempts = vec![
            attempt_with_verdict(1, Verdict::PresentationError),
            attempt_with_verdict(2, Verdict::JudgeTimeout),
            attempt_with_verdict(3, Verdict::Error),
        ];
        assert_eq!(RunStatistics::from_attempts(&attempts), RunStatistics::default());
    }

    #[test]
    fn test_final_result_derivation_after_acceptance() {
        let mut log = SolveLog::new("1900_A", "gpt-mistral", "1900_A_gpt-mistral_abc12345", 3);
        log.attempts.push(attempt_with_verdict(1, Verdict::WrongAnswer));
        log.attempts.push(attempt_with_verdict(2, Verdict::WrongAnswer));
        log.attempts.push(attempt_with_verdict(3, Verdict::Accepted));
        log.close(FinalStatus::Accepted);

        let result = FinalResult::from_log(&log);
        assert_eq!(result.status, FinalStatus::Accepted);
        assert!(result.accepted);
        assert_eq!(result.total_attempts, 3);
        assert_eq!(result.successful_attempt, Some(3));
        assert_eq!(result.statistics.wrong_answers, 2);
        assert_eq!(result.best_verdict, Some(Verdict::Accepted));
    }

    #[test]
    fn test_final_result_without_acceptance() {
        let mut log = SolveLog::new("1900_B", "gpt-groq", "1900_B_gpt-groq_def67890", 2);
        log.attempts
            .push(attempt_with_verdict(1, Verdict::CompilationError));
        log.attempts
            .push(attempt_with_verdict(2, Verdict::CompilationError));
        log.close(FinalStatus::Failed);

        let result = FinalResult::from_log(&log);
        assert!(!result.accepted);
        assert_eq!(result.successful_attempt, None);
        assert_eq!(result.statistics.compilation_errors, 2);
        assert_eq!(result.best_verdict, Some(Verdict::CompilationError));
    }

    #[test]
    fn test_final_result_statistics_round_trip() {
        let mut log = SolveLog::new("1_A", "gpt-mistral", "1_A_gpt-mistral_00000000", 3);
        log.attempts.push(attempt_with_verdict(1, Verdict::TimeLimitExceeded));
        log.attempts.push(attempt_with_verdict(2, Verdict::WrongAnswer));
        log.close(FinalStatus::Failed);

        let result = FinalResult::from_log(&log);
        let json = serde_json::to_string(&result).unwrap();
        let parsed: FinalResult = serde_json::from_str(&json).unwrap();

        // Re-deriving from the attempt list reproduces the persisted counters.
        assert_eq!(parsed.statistics, RunStatistics::from_attempts(&log.attempts));
    }

    #[test]
    fn test_final_result_json_field_names() {
        let log = SolveLog::new("1_A", "gpt-mistral", "s", 3);
        let result = FinalResult::from_log(&log);
        let json = serde_json::to_value(&result).unwrap();

        assert!(json.get("problem_id").is_some());
        assert!(json.get("status").is_some());
        assert!(json.get("accepted").is_some());
        assert!(json.get("total_attempts").is_some());
        // Nullable by contract, so present even when None.
        assert!(json.get("successful_attempt").is_some());
        let stats = json.get("statistics").unwrap();
        for key in [
            "compilation_errors",
            "runtime_errors",
            "wrong_answers",
            "time_limit_exceeded",
            "memory_limit_exceeded",
        ] {
            assert!(stats.get(key).is_some(), "missing statistics.{}", key);
        }
    }

    #[test]
    fn test_solve_log_close_sets_terminal_state() {
        let mut log = SolveLog::new("1_A", "gpt-mistral", "s", 3);
        assert_eq!(log.final_status, FinalStatus::InProgress);
        assert!(log.end_time.is_none());

        log.close(FinalStatus::NoMapping);
        assert_eq!(log.final_status, FinalStatus::NoMapping);
        assert!(log.end_time.is_some());
        assert!(log.final_status.is_terminal());
    }
}
