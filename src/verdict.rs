use serde::{Deserialize, Serialize};

/// Closed set of judge outcomes driving the solve loop.
///
/// Serialized form and `Display` both use the canonical label, so a verdict
/// written to an artifact normalizes back to itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "accepted")]
    Accepted,
    #[serde(rename = "wrong answer")]
    WrongAnswer,
    #[serde(rename = "time limit exceeded")]
    TimeLimitExceeded,
    #[serde(rename = "memory limit exceeded")]
    MemoryLimitExceeded,
    #[serde(rename = "runtime error")]
    RuntimeError,
    #[serde(rename = "compilation error")]
    CompilationError,
    #[serde(rename = "idleness limit exceeded")]
    IdlenessLimitExceeded,
    #[serde(rename = "presentation error")]
    PresentationError,
    #[serde(rename = "security violated")]
    SecurityViolated,
    #[serde(rename = "judge_timeout")]
    JudgeTimeout,
    #[serde(rename = "no_mapping")]
    NoJudgeMapping,
    #[serde(rename = "error")]
    Error,
}

/// Ordered matching table. Earlier rows win when a raw string contains
/// several keywords, so "accepted" outranks any error text a checker may
/// embed in its metadata. Do not reorder without adjusting the tests.
const KEYWORDS: &[(&str, Verdict)] = &[
    ("accepted", Verdict::Accepted),
    ("wrong answer", Verdict::WrongAnswer),
    ("time limit", Verdict::TimeLimitExceeded),
    ("memory limit", Verdict::MemoryLimitExceeded),
    ("runtime error", Verdict::RuntimeError),
    ("compilation error", Verdict::CompilationError),
    ("idleness", Verdict::IdlenessLimitExceeded),
    ("presentation", Verdict::PresentationError),
    ("security", Verdict::SecurityViolated),
    ("judge_timeout", Verdict::JudgeTimeout),
    ("no_mapping", Verdict::NoJudgeMapping),
];

impl Verdict {
    /// Map free-form judge text to a verdict. Total: unmatched input yields
    /// `Error`, never a panic.
    pub fn normalize(raw: &str) -> Self {
        let lowered = raw.to_lowercase();
        for (keyword, verdict) in KEYWORDS {
            if lowered.contains(keyword) {
                return *verdict;
            }
        }
        Verdict::Error
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Accepted => "accepted",
            Verdict::WrongAnswer => "wrong answer",
            Verdict::TimeLimitExceeded => "time limit exceeded",
            Verdict::MemoryLimitExceeded => "memory limit exceeded",
            Verdict::RuntimeError => "runtime error",
            Verdict::CompilationError => "compilation error",
            Verdict::IdlenessLimitExceeded => "idleness limit exceeded",
            Verdict::PresentationError => "presentation error",
            Verdict::SecurityViolated => "security violated",
            Verdict::JudgeTimeout => "judge_timeout",
            Verdict::NoJudgeMapping => "no_mapping",
            Verdict::Error => "error",
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
