//! Shared test doubles: scripted providers and a scripted judge wired
//! into a full orchestrator over temporary storage.

// Each test binary compiles this module separately and uses a subset.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tempfile::TempDir;

use solve_pilot::config::SolverConfig;
use solve_pilot::context::{ChatRole, ContextArena};
use solve_pilot::error::{ProviderError, Result, SolverError};
use solve_pilot::judge::{
    JudgeClient, JudgeResponse, SubmissionHandle, SubmitPacer, TestOutcome,
};
use solve_pilot::orchestrator::{CancelFlag, SolveOrchestrator};
use solve_pilot::problem::{JudgeTarget, Problem, ProblemStore, TestCase, TestKind};
use solve_pilot::provider::{LLMProvider, ProviderKind, ProviderRegistry, ProviderReply};
use solve_pilot::run::RunStore;

pub const DEFAULT_SOLUTION: &str = "int main() { return 0; }";

enum Scripted {
    Reply(ProviderReply),
    Fail(ProviderError),
}

/// Provider double with a real context arena behind it. Replies are
/// served from a queue; an empty queue yields a plain default solution.
pub struct ScriptedProvider {
    kind: ProviderKind,
    model: String,
    contexts: ContextArena,
    script: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedProvider {
    pub fn new(kind: ProviderKind, model: &str) -> Arc<Self> {
        Arc::new(Self {
            kind,
            model: model.to_string(),
            contexts: ContextArena::new(kind.as_str(), model),
            script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn push_reply(&self, text: &str) {
        self.script
            .lock()
            .push_back(Scripted::Reply(ProviderReply::plain(text)));
    }

    pub fn push_reasoned_reply(&self, reasoning: &str, answer: &str) {
        self.script
            .lock()
            .push_back(Scripted::Reply(ProviderReply::with_reasoning(
                reasoning, answer,
            )));
    }

    pub fn push_failure(&self, message: &str) {
        self.script
            .lock()
            .push_back(Scripted::Fail(ProviderError::Network(message.to_string())));
    }

    /// Every `(session_id, user_message)` pair this double has served.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn contexts(&self) -> &ContextArena {
        &self.contexts
    }

    async fn call(
        &self,
        session_id: &str,
        user_message: &str,
    ) -> std::result::Result<ProviderReply, ProviderError> {
        // Mirror the HTTP provider: the outbound message lands in the
        // history before the backend can still fail.
        self.contexts
            .append(session_id, ChatRole::User, user_message)
            .map_err(|e| ProviderError::Session(e.to_string()))?;
        self.calls
            .lock()
            .push((session_id.to_string(), user_message.to_string()));

        let reply = match self.script.lock().pop_front() {
            Some(Scripted::Fail(err)) => return Err(err),
            Some(Scripted::Reply(reply)) => reply,
            None => ProviderReply::plain(DEFAULT_SOLUTION),
        };

        self.contexts
            .append(session_id, ChatRole::Assistant, &reply.persisted_text)
            .map_err(|e| ProviderError::Session(e.to_string()))?;
        Ok(reply)
    }
}

pub enum JudgeStep {
    Verdict(JudgeResponse),
    SubmitFail(String),
    WaitFail(String),
}

/// Judge double. `SubmitFail` steps are consumed by `submit`, everything
/// else by `await_verdict`; an empty queue accepts the submission.
pub struct ScriptedJudge {
    script: Mutex<VecDeque<JudgeStep>>,
    submissions: Mutex<Vec<String>>,
    counter: AtomicUsize,
    cancel_on_verdict: Mutex<Option<CancelFlag>>,
}

impl ScriptedJudge {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            submissions: Mutex::new(Vec::new()),
            counter: AtomicUsize::new(0),
            cancel_on_verdict: Mutex::new(None),
        })
    }

    pub fn push_verdict(&self, response: JudgeResponse) {
        self.script.lock().push_back(JudgeStep::Verdict(response));
    }

    pub fn push_submit_failure(&self, message: &str) {
        self.script
            .lock()
            .push_back(JudgeStep::SubmitFail(message.to_string()));
    }

    pub fn push_wait_failure(&self, message: &str) {
        self.script
            .lock()
            .push_back(JudgeStep::WaitFail(message.to_string()));
    }

    /// Trip the given flag as soon as the next verdict is delivered, so
    /// the cancellation lands between attempts.
    pub fn cancel_on_next_verdict(&self, flag: CancelFlag) {
        *self.cancel_on_verdict.lock() = Some(flag);
    }

    /// Source code of every accepted submission, in order.
    pub fn submissions(&self) -> Vec<String> {
        self.submissions.lock().clone()
    }
}

#[async_trait]
impl JudgeClient for ScriptedJudge {
    async fn submit(&self, _target: &JudgeTarget, source_code: &str) -> Result<SubmissionHandle> {
        {
            let mut script = self.script.lock();
            if matches!(script.front(), Some(JudgeStep::SubmitFail(_))) {
                if let Some(JudgeStep::SubmitFail(message)) = script.pop_front() {
                    return Err(SolverError::Submission(message));
                }
            }
        }

        self.submissions.lock().push(source_code.to_string());
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(SubmissionHandle::new(format!("sub_{}", n)))
    }

    async fn await_verdict(
        &self,
        _handle: &SubmissionHandle,
        _timeout: Duration,
    ) -> Result<JudgeResponse> {
        let step = self.script.lock().pop_front();
        if let Some(flag) = self.cancel_on_verdict.lock().take() {
            flag.cancel();
        }
        match step {
            Some(JudgeStep::Verdict(response)) => Ok(response),
            Some(JudgeStep::WaitFail(message)) => Err(SolverError::Judge(message)),
            Some(JudgeStep::SubmitFail(_)) | None => Ok(JudgeResponse::from_verdict("Accepted")),
        }
    }
}

pub fn accepted_response() -> JudgeResponse {
    JudgeResponse::from_verdict("Accepted")
}

pub fn wrong_answer_response(test: u32, expected: &str, got: &str) -> JudgeResponse {
    let mut response = JudgeResponse::from_verdict(format!("Wrong answer on test {}", test));
    response.test_number = Some(test);
    response.per_test_details = vec![TestOutcome {
        test_number: test,
        verdict: "Wrong answer".to_string(),
        expected: Some(expected.to_string()),
        got: Some(got.to_string()),
    }];
    response
}

pub fn sample_problem(id: &str) -> Problem {
    let (contest_id, letter) = Problem::parse_id(id).expect("well-formed test id");
    Problem {
        id: id.to_string(),
        contest_id: contest_id.to_string(),
        letter: letter.to_string(),
        title: "Cobblestone Road".to_string(),
        statement_md: "Repair the road with the fewest cobblestones.".to_string(),
        rating: Some(800),
        tags: vec!["greedy".to_string()],
        tests: vec![
            TestCase {
                kind: TestKind::Sample,
                idx: 1,
                input_text: "3\n.#.\n".to_string(),
                expected_output_text: "1\n".to_string(),
            },
            TestCase {
                kind: TestKind::Sample,
                idx: 2,
                input_text: "2\n##\n".to_string(),
                expected_output_text: "2\n".to_string(),
            },
        ],
    }
}

/// A full solve stack over temp storage. The default problem `1900_A` is
/// inserted with an identity judge mapping; the registry is pre-seeded
/// with doubles for the `gpt-mistral` workflow.
pub struct Harness {
    pub orchestrator: SolveOrchestrator,
    pub solution: Arc<ScriptedProvider>,
    pub hints: Arc<ScriptedProvider>,
    pub judge: Arc<ScriptedJudge>,
    pub runs: RunStore,
    pub problems: Arc<ProblemStore>,
    _dir: TempDir,
}

pub fn harness() -> Harness {
    harness_with(|_| {})
}

pub fn harness_with(tweak: impl FnOnce(&mut SolverConfig)) -> Harness {
    let dir = tempfile::tempdir().expect("temp dir");

    let mut config = SolverConfig::default();
    config.judge.submit_spacing_secs = 0;
    config.storage.db_path = dir.path().join("problems.db").display().to_string();
    config.storage.results_dir = dir.path().join("results").display().to_string();
    tweak(&mut config);

    let problems = Arc::new(ProblemStore::open(&config.storage.db_path).expect("open store"));
    problems.insert(&sample_problem("1900_A")).expect("insert");
    problems
        .put_judge_mapping(
            "1900_A",
            &JudgeTarget {
                judge_contest_id: "1900".to_string(),
                judge_problem_index: "A".to_string(),
            },
        )
        .expect("mapping");

    let registry = Arc::new(ProviderRegistry::new(config.providers.clone()));
    let solution = ScriptedProvider::new(ProviderKind::OpenAi, "gpt-4");
    let hints = ScriptedProvider::new(ProviderKind::Mistral, "codestral-2508");
    registry.register(Arc::clone(&solution) as Arc<dyn LLMProvider>);
    registry.register(Arc::clone(&hints) as Arc<dyn LLMProvider>);

    let judge = ScriptedJudge::new();
    let pacer = Arc::new(SubmitPacer::new(Duration::from_secs(
        config.judge.submit_spacing_secs,
    )));
    let runs = RunStore::new(&config.storage.results_dir);

    let orchestrator = SolveOrchestrator::new(
        config,
        registry,
        Arc::clone(&problems),
        Arc::clone(&judge) as Arc<dyn JudgeClient>,
        pacer,
        runs.clone(),
    );

    Harness {
        orchestrator,
        solution,
        hints,
        judge,
        runs,
        problems,
        _dir: dir,
    }
}
