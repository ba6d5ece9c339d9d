use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use super::types::{JudgeTarget, Problem, ProblemSummary, TestCase, TestKind};
use crate::error::{Result, SolverError};

/// SQLite-backed problem catalog: statements, test cases, and judge
/// mappings. Read-mostly; a single connection behind a mutex is enough.
pub struct ProblemStore {
    conn: Arc<Mutex<Connection>>,
    db_path: PathBuf,
}

impl ProblemStore {
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(&db_path)?;
        Self::init_schema(&conn)?;
        debug!(db_path = %db_path.display(), "Opened problem store");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            db_path,
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS problems (
                id TEXT PRIMARY KEY,
                contest_id TEXT NOT NULL,
                letter TEXT NOT NULL,
                title TEXT NOT NULL,
                statement_md TEXT NOT NULL,
                rating INTEGER,
                tags TEXT NOT NULL DEFAULT '[]'
            );
            CREATE TABLE IF NOT EXISTS test_cases (
                problem_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                idx INTEGER NOT NULL,
                input_text TEXT NOT NULL,
                expected_output_text TEXT NOT NULL,
                PRIMARY KEY (problem_id, kind, idx)
            );
            CREATE TABLE IF NOT EXISTS judge_mappings (
                contest_id TEXT NOT NULL,
                letter TEXT NOT NULL,
                judge_contest_id TEXT NOT NULL,
                judge_problem_index TEXT NOT NULL,
                PRIMARY KEY (contest_id, letter)
            );
            ",
        )?;
        Ok(())
    }

    /// Load a problem with its ordered test cases. Fails with
    /// `ProblemNotFound` when no row exists.
    pub fn load(&self, problem_id: &str) -> Result<Problem> {
        let conn = self.conn.lock();

        let row = conn
            .query_row(
                "SELECT id, contest_id, letter, title, statement_md, rating, tags
                   FROM problems WHERE id = ?1",
                params![problem_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, Option<u32>>(5)?,
                        row.get::<_, String>(6)?,
                    ))
                },
            )
            .optional()?;

        let (id, contest_id, letter, title, statement_md, rating, tags_json) =
            row.ok_or_else(|| SolverError::ProblemNotFound(problem_id.to_string()))?;

        let tags: Vec<String> = serde_json::from_str(&tags_json).unwrap_or_default();

        // kind DESC sorts 'sample' rows before 'hidden'.
        let mut stmt = conn.prepare(
            "SELECT kind, idx, input_text, expected_output_text
               FROM test_cases WHERE problem_id = ?1
               ORDER BY kind DESC, idx ASC",
        )?;
        let rows = stmt.query_map(params![problem_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u32>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut tests = Vec::new();
        for row in rows {
            let (kind_str, idx, input_text, expected_output_text) = row?;
            let kind: TestKind = kind_str
                .parse()
                .map_err(|e: String| SolverError::Storage(e))?;
            tests.push(TestCase {
                kind,
                idx,
                input_text,
                expected_output_text,
            });
        }

        Ok(Problem {
            id,
            contest_id,
            letter,
            title,
            statement_md,
            rating,
            tags,
            tests,
        })
    }

    pub fn exists(&self, problem_id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM problems WHERE id = ?1",
            params![problem_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn insert(&self, problem: &Problem) -> Result<()> {
        let tags_json = serde_json::to_string(&problem.tags)?;
        let conn = self.conn.lock();

        conn.execute(
            "INSERT OR REPLACE INTO problems
                 (id, contest_id, letter, title, statement_md, rating, tags)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                problem.id,
                problem.contest_id,
                problem.letter,
                problem.title,
                problem.statement_md,
                problem.rating,
                tags_json,
            ],
        )?;

        conn.execute(
            "DELETE FROM test_cases WHERE problem_id = ?1",
            params![problem.id],
        )?;
        for test in &problem.tests {
            conn.execute(
                "INSERT INTO test_cases
                     (problem_id, kind, idx, input_text, expected_output_text)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    problem.id,
                    test.kind.as_str(),
                    test.idx,
                    test.input_text,
                    test.expected_output_text,
                ],
            )?;
        }

        Ok(())
    }

    /// Judge coordinates for a problem, or `None` when it has no
    /// destination judge.
    pub fn judge_mapping(&self, problem_id: &str) -> Result<Option<JudgeTarget>> {
        let (contest_id, letter) = match Problem::parse_id(problem_id) {
            Some(parts) => parts,
            None => return Ok(None),
        };

        let conn = self.conn.lock();
        let target = conn
            .query_row(
                "SELECT judge_contest_id, judge_problem_index
                   FROM judge_mappings WHERE contest_id = ?1 AND letter = ?2",
                params![contest_id, letter],
                |row| {
                    Ok(JudgeTarget {
                        judge_contest_id: row.get(0)?,
                        judge_problem_index: row.get(1)?,
                    })
                },
            )
            .optional()?;

        Ok(target)
    }

    pub fn put_judge_mapping(&self, problem_id: &str, target: &JudgeTarget) -> Result<()> {
        let (contest_id, letter) = Problem::parse_id(problem_id).ok_or_else(|| {
            SolverError::Storage(format!("malformed problem id: {}", problem_id))
        })?;

        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO judge_mappings
                 (contest_id, letter, judge_contest_id, judge_problem_index)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                contest_id,
                letter,
                target.judge_contest_id,
                target.judge_problem_index,
            ],
        )?;
        Ok(())
    }

    pub fn list(&self) -> Result<Vec<ProblemSummary>> {
        let conn = self.conn.lock();
        let mut stmt =
            conn.prepare("SELECT id, title, rating FROM problems ORDER BY contest_id, letter")?;

        let rows = stmt.query_map([], |row| {
            Ok(ProblemSummary {
                id: row.get(0)?,
                title: row.get(1)?,
                rating: row.get(2)?,
            })
        })?;

        let mut problems = Vec::new();
        for row in rows {
            problems.push(row?);
        }
        Ok(problems)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_problem() -> Problem {
        Problem {
            id: "1900_A".to_string(),
            contest_id: "1900".to_string(),
            letter: "A".to_string(),
            title: "Cherry Picking".to_string(),
            statement_md: "Pick cherries.".to_string(),
            rating: Some(800),
            tags: vec!["greedy".to_string()],
            tests: vec![TestCase {
                kind: TestKind::Sample,
                idx: 1,
                input_text: "3\n".to_string(),
                expected_output_text: "YES\n".to_string(),
            }],
        }
    }

    fn open_store() -> (tempfile::TempDir, ProblemStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ProblemStore::open(dir.path().join("test.db")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_insert_then_load_round_trips() {
        let (_dir, store) = open_store();
        store.insert(&sample_problem()).unwrap();

        let loaded = store.load("1900_A").unwrap();
        assert_eq!(loaded.title, "Cherry Picking");
        assert_eq!(loaded.rating, Some(800));
        assert_eq!(loaded.tags, vec!["greedy"]);
        assert_eq!(loaded.tests.len(), 1);
        assert_eq!(loaded.tests[0].input_text, "3\n");
    }

    #[test]
    fn test_load_missing_problem_fails() {
        let (_dir, store) = open_store();
        let err = store.load("9999_Z").unwrap_err();
        assert!(matches!(err, SolverError::ProblemNotFound(_)));
    }

    #[test]
    fn test_judge_mapping_absent_is_none() {
        let (_dir, store) = open_store();
        store.insert(&sample_problem()).unwrap();
        assert!(store.judge_mapping("1900_A").unwrap().is_none());
    }

    #[test]
    fn test_judge_mapping_round_trips() {
        let (_dir, store) = open_store();
        store.insert(&sample_problem()).unwrap();

        let target = JudgeTarget {
            judge_contest_id: "1900".to_string(),
            judge_problem_index: "A".to_string(),
        };
        store.put_judge_mapping("1900_A", &target).unwrap();
        assert_eq!(store.judge_mapping("1900_A").unwrap(), Some(target));
    }

    #[test]
    fn test_list_orders_by_contest_then_letter() {
        let (_dir, store) = open_store();
        let mut b = sample_problem();
        b.id = "1900_B".to_string();
        b.letter = "B".to_string();
        store.insert(&b).unwrap();
        store.insert(&sample_problem()).unwrap();

        let listed = store.list().unwrap();
        let ids: Vec<&str> = listed.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["1900_A", "1900_B"]);
    }
}
