use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestKind {
    Sample,
    Hidden,
}

impl TestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestKind::Sample => "sample",
            TestKind::Hidden => "hidden",
        }
    }
}

impl std::str::FromStr for TestKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sample" => Ok(TestKind::Sample),
            "hidden" => Ok(TestKind::Hidden),
            other => Err(format!("unknown test kind: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub kind: TestKind,
    pub idx: u32,
    pub input_text: String,
    pub expected_output_text: String,
}

/// One problem as the rest of the system sees it, regardless of the
/// backing store. Ids follow `{contest_id}_{letter}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Problem {
    pub id: String,
    pub contest_id: String,
    pub letter: String,
    pub title: String,
    pub statement_md: String,
    pub rating: Option<u32>,
    pub tags: Vec<String>,
    pub tests: Vec<TestCase>,
}

impl Problem {
    /// Split a `{contest_id}_{letter}` id at the last underscore.
    pub fn parse_id(problem_id: &str) -> Option<(&str, &str)> {
        let (contest, letter) = problem_id.rsplit_once('_')?;
        if contest.is_empty() || letter.is_empty() {
            return None;
        }
        Some((contest, letter))
    }

    pub fn samples(&self) -> impl Iterator<Item = &TestCase> {
        self.tests.iter().filter(|t| t.kind == TestKind::Sample)
    }
}

/// Judge-side coordinates for a problem. Absence means the problem cannot
/// be submitted anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeTarget {
    pub judge_contest_id: String,
    pub judge_problem_index: String,
}

/// Row shape for listings; statement and tests stay in the store.
#[derive(Debug, Clone, Serialize)]
pub struct ProblemSummary {
    pub id: String,
    pub title: String,
    pub rating: Option<u32>,
}
