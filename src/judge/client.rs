use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::problem::JudgeTarget;

/// Opaque reference to one in-flight submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionHandle {
    pub submission_id: String,
}

impl SubmissionHandle {
    pub fn new(submission_id: impl Into<String>) -> Self {
        Self {
            submission_id: submission_id.into(),
        }
    }
}

/// Outcome of a single test as reported by the judge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestOutcome {
    pub test_number: u32,
    pub verdict: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub got: Option<String>,
}

/// Terminal judge response for one submission. `verdict_raw` is free-form
/// judge text; callers normalize it through the verdict taxonomy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeResponse {
    pub verdict_raw: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_kb: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub per_test_details: Vec<TestOutcome>,
}

impl JudgeResponse {
    pub fn from_verdict(verdict_raw: impl Into<String>) -> Self {
        Self {
            verdict_raw: verdict_raw.into(),
            test_number: None,
            time_ms: None,
            memory_kb: None,
            per_test_details: Vec::new(),
        }
    }

    /// In-band result for a judge-side wait that ran out of wall clock.
    pub fn timed_out() -> Self {
        Self::from_verdict("judge_timeout")
    }
}

/// External judge capability. The orchestrator treats both calls as
/// opaque blocking operations with caller-supplied bounds.
#[async_trait]
pub trait JudgeClient: Send + Sync {
    async fn submit(&self, target: &JudgeTarget, source_code: &str) -> Result<SubmissionHandle>;

    /// Wait for a terminal verdict. A judge-side timeout is reported
    /// in-band as a `judge_timeout` verdict, never as `Err`.
    async fn await_verdict(
        &self,
        handle: &SubmissionHandle,
        timeout: Duration,
    ) -> Result<JudgeResponse>;
}
