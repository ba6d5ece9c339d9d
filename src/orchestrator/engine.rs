use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::SolverConfig;
use crate::error::{Result, SolverError};
use crate::judge::{JudgeClient, JudgeResponse, SubmissionHandle, SubmitPacer};
use crate::problem::{JudgeTarget, ProblemStore};
use crate::provider::ProviderRegistry;
use crate::run::{AttemptRecord, FinalResult, FinalStatus, RunStore, SolveLog};
use crate::state::{PhaseTracker, SolvePhase};
use crate::verdict::Verdict;
use crate::workflow::{prompts, WorkflowBinding, WorkflowSession};

/// Cooperative cancellation signal. Honored between attempts, at the top
/// of the Generating phase; a set flag never interrupts work in flight.
#[derive(Clone, Default)]
pub struct CancelFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Drives the generate -> submit -> poll -> diagnose loop for one problem
/// at a time. Collaborators are injected so runs can share the provider
/// registry and the global submission pacer.
pub struct SolveOrchestrator {
    config: SolverConfig,
    registry: Arc<ProviderRegistry>,
    problems: Arc<ProblemStore>,
    judge: Arc<dyn JudgeClient>,
    pacer: Arc<SubmitPacer>,
    runs: RunStore,
    cancel: CancelFlag,
}

impl SolveOrchestrator {
    pub fn new(
        config: SolverConfig,
        registry: Arc<ProviderRegistry>,
        problems: Arc<ProblemStore>,
        judge: Arc<dyn JudgeClient>,
        pacer: Arc<SubmitPacer>,
        runs: RunStore,
    ) -> Self {
        Self {
            config,
            registry,
            problems,
            judge,
            pacer,
            runs,
            cancel: CancelFlag::new(),
        }
    }

    /// Handle for signalling cancellation from outside the run.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Runs the full solve loop. Expected failures (bad verdicts, provider
    /// or judge hiccups, missing mapping) all end in a well-formed
    /// [`FinalResult`]; `Err` is reserved for unusable input and broken
    /// configuration.
    pub async fn solve(&self, problem_id: &str, max_attempts: u32) -> Result<FinalResult> {
        if max_attempts == 0 {
            return Err(SolverError::InvalidAttemptBudget(0));
        }

        let binding = WorkflowBinding::lookup(&self.config.solver.workflow)?;
        let problem = self.problems.load(problem_id)?;
        let mapping = self.problems.judge_mapping(problem_id)?;

        self.runs.init_run(problem_id).await?;
        let session = WorkflowSession::open(&self.registry, binding, problem_id)?;

        let mut log = SolveLog::new(
            problem_id,
            &self.config.solver.workflow,
            session.session_id(),
            max_attempts,
        );
        let mut phase = PhaseTracker::new();

        info!(
            problem_id,
            workflow = %self.config.solver.workflow,
            max_attempts,
            "Starting solve run"
        );

        // The mapping gate runs before any model call so a mapping-less
        // problem costs nothing. The phase history still walks the loop
        // edge into NoMapping.
        let target = match mapping {
            Some(target) => target,
            None => {
                phase.advance(SolvePhase::Generating, "attempt loop entered")?;
                phase.advance(SolvePhase::Submitting, "mapping lookup")?;
                phase.advance(SolvePhase::NoMapping, "no judge destination recorded")?;
                warn!(problem_id, "No judge mapping, stopping before any attempt");
                return self.finish(log, FinalStatus::NoMapping, &session).await;
            }
        };

        let statement = prompts::format_statement(&problem);
        let mut final_status = FinalStatus::Failed;

        for attempt_number in 1..=max_attempts {
            phase.advance(
                SolvePhase::Generating,
                format!("attempt {} of {}", attempt_number, max_attempts),
            )?;

            if self.cancel.is_cancelled() {
                phase.advance(SolvePhase::Cancelled, "cancel signal observed")?;
                info!(problem_id, attempt = attempt_number, "Solve run cancelled");
                final_status = FinalStatus::Cancelled;
                break;
            }

            let mut attempt = AttemptRecord::new(attempt_number);
            let attempt_start = Instant::now();

            // Retry context is the single most recent failed attempt.
            let previous = log.attempts.last();

            let code = match session.generate_solution(&statement, previous).await {
                Ok(code) => code,
                Err(e) => {
                    warn!(
                        problem_id,
                        attempt = attempt_number,
                        error = %e,
                        "Solution generation failed"
                    );
                    attempt.error = Some(e.to_string());
                    attempt.duration_seconds = attempt_start.elapsed().as_secs_f64();
                    log.attempts.push(attempt);
                    self.runs.save_log(&log).await?;
                    if attempt_number == max_attempts {
                        phase.advance(SolvePhase::Exhausted, "attempt budget consumed")?;
                    }
                    continue;
                }
            };

            let file_name = self.runs.save_solution(problem_id, attempt_number, &code).await?;
            attempt.solution_file = Some(file_name);
            attempt.solution_code = Some(code.clone());

            phase.advance(SolvePhase::Submitting, "solution ready")?;

            let handle = match self.submit_paced(&target, &code).await {
                Ok(handle) => {
                    attempt.submission_id = Some(handle.submission_id.clone());
                    handle
                }
                Err(message) => {
                    warn!(
                        problem_id,
                        attempt = attempt_number,
                        error = %message,
                        "Submission failed"
                    );
                    attempt.submission_error = Some(message);
                    attempt.duration_seconds = attempt_start.elapsed().as_secs_f64();
                    log.attempts.push(attempt);
                    self.runs.save_log(&log).await?;
                    if attempt_number == max_attempts {
                        phase.advance(SolvePhase::Exhausted, "attempt budget consumed")?;
                    }
                    continue;
                }
            };

            phase.advance(SolvePhase::Polling, "submission accepted by judge")?;

            let poll_timeout = Duration::from_secs(self.config.judge.poll_timeout_secs);
            let response = match self.judge.await_verdict(&handle, poll_timeout).await {
                Ok(response) => response,
                // A broken wait is folded into the verdict stream so the
                // run still closes with a structured result.
                Err(e) => {
                    warn!(
                        problem_id,
                        attempt = attempt_number,
                        error = %e,
                        "Verdict wait failed"
                    );
                    JudgeResponse::from_verdict(format!("judge error: {}", e))
                }
            };

            phase.advance(SolvePhase::Diagnosing, "verdict received")?;

            let verdict = Verdict::normalize(&response.verdict_raw);
            attempt.verdict = Some(verdict);
            attempt.verdict_raw = Some(response.verdict_raw.clone());
            attempt.accepted = verdict.is_accepted();
            attempt.judge_response = Some(response);
            attempt.duration_seconds = attempt_start.elapsed().as_secs_f64();

            info!(
                problem_id,
                attempt = attempt_number,
                verdict = %verdict,
                "Attempt judged"
            );

            if attempt.accepted {
                log.attempts.push(attempt);
                self.runs.save_log(&log).await?;
                phase.advance(SolvePhase::Accepted, "verdict accepted")?;
                final_status = FinalStatus::Accepted;
                break;
            }

            // Hint feeds the next retry; there is no next retry after the
            // final attempt, and a hint failure never stops the loop.
            if attempt_number < max_attempts {
                match session.generate_hint(&statement, &attempt).await {
                    Ok(hint) => attempt.hint = Some(hint),
                    Err(e) => {
                        warn!(
                            problem_id,
                            attempt = attempt_number,
                            error = %e,
                            "Hint generation failed"
                        );
                        attempt.hint_error = Some(e.to_string());
                    }
                }
            }

            log.attempts.push(attempt);
            self.runs.save_log(&log).await?;

            if attempt_number == max_attempts {
                phase.advance(SolvePhase::Exhausted, "attempt budget consumed")?;
            }
        }

        self.finish(log, final_status, &session).await
    }

    /// Submit under the global pacer with a hard wall-clock bound. Errors
    /// collapse to a message because callers record them, not handle them.
    async fn submit_paced(
        &self,
        target: &JudgeTarget,
        code: &str,
    ) -> std::result::Result<SubmissionHandle, String> {
        self.pacer.wait_for_slot().await;

        let bound = Duration::from_secs(self.config.judge.submission_timeout_secs);
        match timeout(bound, self.judge.submit(target, code)).await {
            Ok(Ok(handle)) => Ok(handle),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!(
                "submission timed out after {}s",
                bound.as_secs()
            )),
        }
    }

    async fn finish(
        &self,
        mut log: SolveLog,
        status: FinalStatus,
        session: &WorkflowSession,
    ) -> Result<FinalResult> {
        log.close(status);
        self.runs.save_log(&log).await?;

        let final_result = FinalResult::from_log(&log);
        self.runs.save_final(&final_result).await?;

        let summary = session.summary();
        debug!(
            session = %summary.session_id,
            solution_messages = summary.solution_messages,
            hint_messages = summary.hint_messages,
            "Closing workflow session"
        );
        session.close();

        info!(
            problem_id = %final_result.problem_id,
            status = %final_result.status,
            attempts = final_result.total_attempts,
            "Solve run finished"
        );
        Ok(final_result)
    }
}
