use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};

use crate::error::{Result, SolverError};
use crate::run::types::{FinalResult, SolveLog};

const SOLVING_LOG_FILE: &str = "solving_log.json";
const FINAL_RESULT_FILE: &str = "final_result.json";

/// Filesystem layout for run artifacts:
///
/// ```text
/// {results_dir}/
///   {problem_id}/
///     solutions/
///       {problem_id}_solution_{n}.cpp
///     solving_log.json
///     final_result.json
/// ```
#[derive(Debug, Clone)]
pub struct RunStore {
    results_dir: PathBuf,
}

impl RunStore {
    pub fn new(results_dir: impl Into<PathBuf>) -> Self {
        Self {
            results_dir: results_dir.into(),
        }
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    pub fn problem_dir(&self, problem_id: &str) -> PathBuf {
        self.results_dir.join(problem_id)
    }

    pub fn solutions_dir(&self, problem_id: &str) -> PathBuf {
        self.problem_dir(problem_id).join("solutions")
    }

    /// Creates the per-problem directory tree and clears out any partial
    /// writes left by a crashed run.
    pub async fn init_run(&self, problem_id: &str) -> Result<()> {
        let solutions = self.solutions_dir(problem_id);
        fs::create_dir_all(&solutions).await?;
        self.recover_interrupted_writes(problem_id).await?;
        Ok(())
    }

    /// Saves one generated solution and returns its file name.
    pub async fn save_solution(
        &self,
        problem_id: &str,
        attempt: u32,
        code: &str,
    ) -> Result<String> {
        let file_name = format!("{}_solution_{}.cpp", problem_id, attempt);
        let path = self.solutions_dir(problem_id).join(&file_name);
        write_atomic(&path, code.as_bytes()).await?;
        Ok(file_name)
    }

    /// Rewrites the full solving log. Called after every attempt so a
    /// crash never loses more than the attempt in flight.
    pub async fn save_log(&self, log: &SolveLog) -> Result<()> {
        let path = self.problem_dir(&log.problem_id).join(SOLVING_LOG_FILE);
        let json = serde_json::to_vec_pretty(log)?;
        write_atomic(&path, &json).await
    }

    pub async fn load_log(&self, problem_id: &str) -> Result<SolveLog> {
        let path = self.problem_dir(problem_id).join(SOLVING_LOG_FILE);
        if !path.exists() {
            return Err(SolverError::Storage(format!(
                "No solving log for problem '{}'",
                problem_id
            )));
        }
        let json = fs::read_to_string(&path).await?;
        Ok(serde_json::from_str(&json)?)
    }

    pub async fn save_final(&self, result: &FinalResult) -> Result<()> {
        let path = self.problem_dir(&result.problem_id).join(FINAL_RESULT_FILE);
        let json = serde_json::to_vec_pretty(result)?;
        write_atomic(&path, &json).await
    }

    pub async fn load_final(&self, problem_id: &str) -> Result<FinalResult> {
        let path = self.problem_dir(problem_id).join(FINAL_RESULT_FILE);
        if !path.exists() {
            return Err(SolverError::Storage(format!(
                "No final result for problem '{}'",
                problem_id
            )));
        }
        let json = fs::read_to_string(&path).await?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Loads every solving log under the results directory, most recent
    /// run first.
    pub async fn list_logs(&self) -> Result<Vec<SolveLog>> {
        let mut logs = Vec::new();
        if !self.results_dir.exists() {
            return Ok(logs);
        }

        let mut entries = fs::read_dir(&self.results_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let path = entry.path().join(SOLVING_LOG_FILE);
            if !path.exists() {
                continue;
            }
            let json = fs::read_to_string(&path).await?;
            match serde_json::from_str::<SolveLog>(&json) {
                Ok(log) => logs.push(log),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable solving log");
                }
            }
        }

        logs.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(logs)
    }

    async fn recover_interrupted_writes(&self, problem_id: &str) -> Result<()> {
        let dir = self.problem_dir(problem_id);
        for sub in [dir.clone(), self.solutions_dir(problem_id)] {
            if !sub.exists() {
                continue;
            }
            let mut entries = fs::read_dir(&sub).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) == Some("tmp") {
                    warn!(path = %path.display(), "Removing interrupted write");
                    fs::remove_file(&path).await?;
                }
            }
        }
        Ok(())
    }
}

/// Write-to-temp, fsync, rename. Readers never observe a partial file.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes).await?;

    let tmp_sync = tmp.clone();
    let synced = tokio::task::spawn_blocking(move || {
        std::fs::File::open(&tmp_sync).and_then(|f| f.sync_all())
    })
    .await;
    match synced {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "Failed to sync temp file before rename"),
        Err(e) => warn!(error = %e, "Sync task panicked"),
    }

    fs::rename(&tmp, path).await?;
    debug!(path = %path.display(), "Atomic write completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::types::{AttemptRecord, FinalStatus};
    use crate::verdict::Verdict;

    #[tokio::test]
    async fn test_init_run_creates_layout() {
        let dir = tempfile::tempdir().unwrap();
        let store = RunStore::new(dir.path());

        store.init_run("1900_A").await.unwrap();
        assert!(store.solutions_dir("1900_A").is_dir());
    }

    #[tokio::test]
    async fn test_save_solution_names_file_by_attempt() {
        let dir = tempfile::tempdir().unwrap();
        let store = RunStore::new(dir.path());
        store.init_run("1900_A").await.unwrap();

        let name = store
            .save_solution("1900_A", 2, "int main() { return 0; }")
            .await
            .unwrap();
        assert_eq!(name, "1900_A_solution_2.cpp");

        let saved = fs::read_to_string(store.solutions_dir("1900_A").join(&name))
            .await
            .unwrap();
        assert_eq!(saved, "int main() { return 0; }");
    }

    #[tokio::test]
    async fn test_log_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = RunStore::new(dir.path());
        store.init_run("1900_A").await.unwrap();

        let mut log = SolveLog::new("1900_A", "gpt-mistral", "1900_A_gpt-mistral_ab12cd34", 3);
        let mut attempt = AttemptRecord::new(1);
        attempt.verdict = Some(Verdict::WrongAnswer);
        log.attempts.push(attempt);
        store.save_log(&log).await.unwrap();

        let loaded = store.load_log("1900_A").await.unwrap();
        assert_eq!(loaded.problem_id, "1900_A");
        assert_eq!(loaded.attempts.len(), 1);
        assert_eq!(loaded.attempts[0].verdict, Some(Verdict::WrongAnswer));
        assert_eq!(loaded.final_status, FinalStatus::InProgress);
    }

    #[tokio::test]
    async fn test_load_log_missing_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = RunStore::new(dir.path());

        let err = store.load_log("9999_Z").await.unwrap_err();
        assert!(matches!(err, SolverError::Storage(_)));
    }

    #[tokio::test]
    async fn test_final_result_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = RunStore::new(dir.path());
        store.init_run("1900_A").await.unwrap();

        let mut log = SolveLog::new("1900_A", "gpt-mistral", "s", 3);
        log.close(FinalStatus::Failed);
        let result = FinalResult::from_log(&log);
        store.save_final(&result).await.unwrap();

        let loaded = store.load_final("1900_A").await.unwrap();
        assert_eq!(loaded.problem_id, "1900_A");
        assert_eq!(loaded.status, FinalStatus::Failed);
        assert!(!loaded.accepted);
    }

    #[tokio::test]
    async fn test_init_run_removes_interrupted_writes() {
        let dir = tempfile::tempdir().unwrap();
        let store = RunStore::new(dir.path());
        store.init_run("1900_A").await.unwrap();

        let stale = store.problem_dir("1900_A").join("solving_log.tmp");
        fs::write(&stale, b"partial").await.unwrap();
        assert!(stale.exists());

        store.init_run("1900_A").await.unwrap();
        assert!(!stale.exists());
    }

    #[tokio::test]
    async fn test_list_logs_sorted_most_recent_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = RunStore::new(dir.path());

        store.init_run("1_A").await.unwrap();
        let mut older = SolveLog::new("1_A", "gpt-mistral", "s1", 3);
        older.start_time = chrono::Utc::now() - chrono::Duration::hours(2);
        store.save_log(&older).await.unwrap();

        store.init_run("2_B").await.unwrap();
        let newer = SolveLog::new("2_B", "gpt-groq", "s2", 3);
        store.save_log(&newer).await.unwrap();

        let logs = store.list_logs().await.unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].problem_id, "2_B");
        assert_eq!(logs[1].problem_id, "1_A");
    }
}
