use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use super::client::{JudgeClient, JudgeResponse, SubmissionHandle, TestOutcome};
use crate::config::RunnerConfig;
use crate::error::{Result, SolverError};
use crate::problem::{JudgeTarget, ProblemStore};
use crate::utils::{short_id, truncate_with_marker};

const COMPILE_LOG_LIMIT: usize = 400;

struct PendingSubmission {
    problem_id: String,
    /// None when compilation failed.
    binary: Option<PathBuf>,
    compile_log: String,
    build_dir: PathBuf,
}

/// Judge that compiles a candidate and runs it against the problem's
/// stored test cases. Gives the loop a working destination without remote
/// credentials; a remote judge sits behind the same trait.
pub struct LocalJudge {
    config: RunnerConfig,
    store: Arc<ProblemStore>,
    work_dir: PathBuf,
    pending: Mutex<HashMap<String, PendingSubmission>>,
}

impl LocalJudge {
    pub fn new(store: Arc<ProblemStore>, config: RunnerConfig, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            store,
            work_dir: work_dir.into(),
            pending: Mutex::new(HashMap::new()),
        }
    }

    async fn compile(&self, source: &PathBuf, binary: &PathBuf) -> Result<(bool, String)> {
        let output = Command::new(&self.config.compiler)
            .args(&self.config.compile_flags)
            .arg("-o")
            .arg(binary)
            .arg(source)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    SolverError::CompilerNotFound(self.config.compiler.clone())
                } else {
                    SolverError::Submission(format!("failed to run compiler: {}", e))
                }
            })?;

        let log = String::from_utf8_lossy(&output.stderr).trim().to_string();
        Ok((output.status.success(), log))
    }

    async fn run_tests(&self, pending: &PendingSubmission) -> Result<JudgeResponse> {
        let binary = match &pending.binary {
            Some(path) => path,
            None => {
                let verdict = if pending.compile_log.is_empty() {
                    "Compilation error".to_string()
                } else {
                    format!(
                        "Compilation error: {}",
                        truncate_with_marker(&pending.compile_log, COMPILE_LOG_LIMIT)
                    )
                };
                return Ok(JudgeResponse::from_verdict(verdict));
            }
        };

        let problem = self.store.load(&pending.problem_id)?;
        let limit = Duration::from_millis(self.config.time_limit_ms);

        let mut outcomes = Vec::new();
        let mut max_runtime_ms: u64 = 0;

        for test in &problem.tests {
            let started = Instant::now();
            let execution = self.run_one(binary, &test.input_text, limit).await?;
            let runtime_ms = started.elapsed().as_millis() as u64;
            max_runtime_ms = max_runtime_ms.max(runtime_ms);

            match execution {
                Execution::TimedOut => {
                    outcomes.push(TestOutcome {
                        test_number: test.idx,
                        verdict: "Time limit exceeded".to_string(),
                        expected: Some(test.expected_output_text.clone()),
                        got: None,
                    });
                    return Ok(JudgeResponse {
                        verdict_raw: format!("Time limit exceeded on test {}", test.idx),
                        test_number: Some(test.idx),
                        time_ms: Some(max_runtime_ms),
                        memory_kb: None,
                        per_test_details: outcomes,
                    });
                }
                Execution::Crashed { code, stderr } => {
                    outcomes.push(TestOutcome {
                        test_number: test.idx,
                        verdict: format!("Runtime error (exit code {})", code),
                        expected: Some(test.expected_output_text.clone()),
                        got: Some(truncate_with_marker(&stderr, COMPILE_LOG_LIMIT)),
                    });
                    return Ok(JudgeResponse {
                        verdict_raw: format!("Runtime error on test {}", test.idx),
                        test_number: Some(test.idx),
                        time_ms: Some(max_runtime_ms),
                        memory_kb: None,
                        per_test_details: outcomes,
                    });
                }
                Execution::Finished { stdout } => {
                    if outputs_match(&test.expected_output_text, &stdout) {
                        outcomes.push(TestOutcome {
                            test_number: test.idx,
                            verdict: "OK".to_string(),
                            expected: None,
                            got: None,
                        });
                    } else {
                        outcomes.push(TestOutcome {
                            test_number: test.idx,
                            verdict: "Wrong answer".to_string(),
                            expected: Some(test.expected_output_text.clone()),
                            got: Some(stdout),
                        });
                        return Ok(JudgeResponse {
                            verdict_raw: format!("Wrong answer on test {}", test.idx),
                            test_number: Some(test.idx),
                            time_ms: Some(max_runtime_ms),
                            memory_kb: None,
                            per_test_details: outcomes,
                        });
                    }
                }
            }
        }

        Ok(JudgeResponse {
            verdict_raw: "Accepted".to_string(),
            test_number: None,
            time_ms: Some(max_runtime_ms),
            memory_kb: None,
            per_test_details: outcomes,
        })
    }

    async fn run_one(&self, binary: &PathBuf, input: &str, limit: Duration) -> Result<Execution> {
        let mut child = Command::new(binary)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SolverError::Judge(format!("failed to start candidate: {}", e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            // A crashed candidate may close stdin early; that is its own
            // runtime error, not ours.
            let _ = stdin.write_all(input.as_bytes()).await;
        }

        match tokio::time::timeout(limit, child.wait_with_output()).await {
            Err(_) => Ok(Execution::TimedOut),
            Ok(Err(e)) => Err(SolverError::Judge(format!(
                "failed to collect candidate output: {}",
                e
            ))),
            Ok(Ok(output)) => {
                if output.status.success() {
                    Ok(Execution::Finished {
                        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    })
                } else {
                    Ok(Execution::Crashed {
                        code: output.status.code().unwrap_or(-1),
                        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                    })
                }
            }
        }
    }
}

enum Execution {
    Finished { stdout: String },
    Crashed { code: i32, stderr: String },
    TimedOut,
}

#[async_trait]
impl JudgeClient for LocalJudge {
    async fn submit(&self, target: &JudgeTarget, source_code: &str) -> Result<SubmissionHandle> {
        let problem_id = format!("{}_{}", target.judge_contest_id, target.judge_problem_index);
        let submission_id = short_id();

        let build_dir = self.work_dir.join(&submission_id);
        tokio::fs::create_dir_all(&build_dir).await?;

        let source = build_dir.join("solution.cpp");
        let binary = build_dir.join("solution");
        tokio::fs::write(&source, source_code).await?;

        debug!(submission_id, problem_id, "Compiling candidate");
        let (compiled, compile_log) = self.compile(&source, &binary).await?;

        self.pending.lock().insert(
            submission_id.clone(),
            PendingSubmission {
                problem_id,
                binary: compiled.then_some(binary),
                compile_log,
                build_dir,
            },
        );

        Ok(SubmissionHandle::new(submission_id))
    }

    async fn await_verdict(
        &self,
        handle: &SubmissionHandle,
        timeout: Duration,
    ) -> Result<JudgeResponse> {
        let pending = self
            .pending
            .lock()
            .remove(&handle.submission_id)
            .ok_or_else(|| {
                SolverError::Judge(format!("unknown submission: {}", handle.submission_id))
            })?;

        let response = match tokio::time::timeout(timeout, self.run_tests(&pending)).await {
            Err(_) => Ok(JudgeResponse::timed_out()),
            Ok(result) => result,
        };

        if let Err(e) = tokio::fs::remove_dir_all(&pending.build_dir).await {
            warn!(error = %e, dir = %pending.build_dir.display(), "Failed to clean build dir");
        }

        response
    }
}

/// Per-line comparison ignoring trailing whitespace and trailing blank
/// lines, the usual competitive-judge equivalence.
fn outputs_match(expected: &str, actual: &str) -> bool {
    normalized_lines(expected) == normalized_lines(actual)
}

fn normalized_lines(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = text.lines().map(|line| line.trim_end()).collect();
    while lines.last() == Some(&"") {
        lines.pop();
    }
    lines
}
