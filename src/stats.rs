use crate::app_dirs::AppDirs;
use crate::error::GymBroError;
use crate::exercise::TargetKind;
use crate::session::ExerciseResult;
use chrono::{DateTime, Local};
use rusqlite::{params, Connection, Result};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS exercise_results (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        exercise TEXT NOT NULL,
        kind TEXT NOT NULL,
        target INTEGER NOT NULL,
        reps INTEGER NOT NULL,
        hold_secs REAL NOT NULL,
        skipped BOOLEAN NOT NULL,
        finished_at TEXT NOT NULL,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    );
    CREATE INDEX IF NOT EXISTS idx_exercise_results_exercise ON exercise_results(exercise);
    CREATE INDEX IF NOT EXISTS idx_exercise_results_finished ON exercise_results(finished_at);
"#;

const INSERT: &str = r#"
    INSERT INTO exercise_results
    (exercise, kind, target, reps, hold_secs, skipped, finished_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
"#;

/// Per-exercise aggregate for the dashboard
#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseSummary {
    pub exercise: String,
    pub attempts: i64,
    /// Attempts that reached their target
    pub completed: i64,
    pub total_reps: i64,
    pub total_hold_secs: f64,
    pub last_done: Option<DateTime<Local>>,
}

impl ExerciseSummary {
    pub fn completion_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.completed as f64 * 100.0 / self.attempts as f64
        }
    }
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    finished_at: String,
    exercise: &'a str,
    kind: String,
    target: u32,
    reps: u32,
    hold_secs: f64,
    skipped: bool,
}

/// SQLite workout history
#[derive(Debug)]
pub struct StatsDb {
    conn: Connection,
}

impl StatsDb {
    /// Open the database at the default state location, creating it if needed
    pub fn new() -> std::result::Result<Self, GymBroError> {
        let db_path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("gymbro_history.db"));
        Self::open(db_path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> std::result::Result<Self, GymBroError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        debug!(path = %path.as_ref().display(), "opening history database");
        Ok(Self::init(Connection::open(path)?)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(StatsDb { conn })
    }

    pub fn record_result(&self, result: &ExerciseResult) -> Result<()> {
        insert_result(&self.conn, result)
    }

    /// Record several results in one transaction
    pub fn record_results_batch(&mut self, results: &[ExerciseResult]) -> Result<()> {
        let tx = self.conn.transaction()?;
        for result in results {
            insert_result(&tx, result)?;
        }
        tx.commit()
    }

    /// Most recent results first
    pub fn recent_results(&self, limit: usize) -> Result<Vec<ExerciseResult>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT exercise, kind, target, reps, hold_secs, skipped, finished_at
            FROM exercise_results
            ORDER BY finished_at DESC, id DESC
            LIMIT ?1
            "#,
        )?;
        let rows = stmt.query_map([i64::try_from(limit).unwrap_or(i64::MAX)], result_from_row)?;
        rows.collect()
    }

    /// Full history, oldest first
    pub fn all_results(&self) -> Result<Vec<ExerciseResult>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT exercise, kind, target, reps, hold_secs, skipped, finished_at
            FROM exercise_results
            ORDER BY finished_at ASC, id ASC
            "#,
        )?;
        let rows = stmt.query_map([], result_from_row)?;
        rows.collect()
    }

    /// One row per exercise name, alphabetical
    pub fn exercise_summary(&self) -> Result<Vec<ExerciseSummary>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT
                exercise,
                COUNT(*) as attempts,
                SUM(CASE WHEN skipped = 0 THEN 1 ELSE 0 END) as completed,
                SUM(reps) as total_reps,
                SUM(hold_secs) as total_hold,
                MAX(finished_at) as last_done
            FROM exercise_results
            GROUP BY exercise
            ORDER BY exercise
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            let last_done: Option<String> = row.get(5)?;
            Ok(ExerciseSummary {
                exercise: row.get(0)?,
                attempts: row.get(1)?,
                completed: row.get(2)?,
                total_reps: row.get(3)?,
                total_hold_secs: row.get(4)?,
                last_done: last_done
                    .map(|s| parse_timestamp(&s, 5))
                    .transpose()?,
            })
        })?;

        rows.collect()
    }

    pub fn clear_all(&self) -> Result<()> {
        self.conn.execute("DELETE FROM exercise_results", [])?;
        Ok(())
    }

    /// Write the whole history as CSV, oldest first. Returns the row count.
    pub fn export_csv<W: Write>(&self, writer: W) -> std::result::Result<usize, GymBroError> {
        let results = self.all_results()?;

        let mut wtr = csv::Writer::from_writer(writer);
        for result in &results {
            wtr.serialize(CsvRow {
                finished_at: result.finished_at.to_rfc3339(),
                exercise: &result.name,
                kind: result.kind.to_string(),
                target: result.target,
                reps: result.reps,
                hold_secs: result.hold_secs,
                skipped: result.skipped,
            })?;
        }
        wtr.flush()?;
        Ok(results.len())
    }
}

fn insert_result(conn: &Connection, result: &ExerciseResult) -> Result<()> {
    conn.execute(
        INSERT,
        params![
            result.name,
            result.kind.to_string(),
            result.target,
            result.reps,
            result.hold_secs,
            result.skipped,
            result.finished_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

fn result_from_row(row: &rusqlite::Row<'_>) -> Result<ExerciseResult> {
    let kind: String = row.get(1)?;
    let finished_at: String = row.get(6)?;
    Ok(ExerciseResult {
        name: row.get(0)?,
        kind: parse_kind(&kind, 1)?,
        target: row.get(2)?,
        reps: row.get(3)?,
        hold_secs: row.get(4)?,
        skipped: row.get(5)?,
        finished_at: parse_timestamp(&finished_at, 6)?,
    })
}

fn parse_kind(raw: &str, column: usize) -> Result<TargetKind> {
    match raw {
        "reps" => Ok(TargetKind::Reps),
        "time" => Ok(TargetKind::Time),
        _ => Err(rusqlite::Error::InvalidColumnType(
            column,
            "kind".to_string(),
            rusqlite::types::Type::Text,
        )),
    }
}

fn parse_timestamp(raw: &str, column: usize) -> Result<DateTime<Local>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Local))
        .map_err(|_| {
            rusqlite::Error::InvalidColumnType(
                column,
                "finished_at".to_string(),
                rusqlite::types::Type::Text,
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn result(name: &str, reps: u32, skipped: bool, minutes_ago: i64) -> ExerciseResult {
        ExerciseResult {
            name: name.to_string(),
            kind: TargetKind::Reps,
            target: 10,
            reps,
            hold_secs: 0.0,
            skipped,
            finished_at: Local::now() - Duration::minutes(minutes_ago),
        }
    }

    fn plank(secs: f64, minutes_ago: i64) -> ExerciseResult {
        ExerciseResult {
            name: "Plank".to_string(),
            kind: TargetKind::Time,
            target: 30,
            reps: 0,
            hold_secs: secs,
            skipped: false,
            finished_at: Local::now() - Duration::minutes(minutes_ago),
        }
    }

    #[test]
    fn record_and_read_back() {
        let db = StatsDb::open_in_memory().unwrap();
        let squats = result("Bodyweight Squats", 10, false, 5);
        db.record_result(&squats).unwrap();
        db.record_result(&plank(31.5, 1)).unwrap();

        let recent = db.recent_results(10).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].name, "Plank");
        assert_eq!(recent[0].kind, TargetKind::Time);
        assert_eq!(recent[0].hold_secs, 31.5);
        assert_eq!(recent[1].name, squats.name);
        assert_eq!(recent[1].reps, 10);
        assert_eq!(
            recent[1].finished_at.timestamp(),
            squats.finished_at.timestamp()
        );

        assert_eq!(db.recent_results(1).unwrap().len(), 1);
    }

    #[test]
    fn batch_record_and_summary() {
        let mut db = StatsDb::open_in_memory().unwrap();
        db.record_results_batch(&[
            result("Lunges", 10, false, 30),
            result("Lunges", 4, true, 20),
            result("Jumping Jacks", 20, false, 10),
            plank(30.0, 5),
            plank(12.5, 1),
        ])
        .unwrap();

        let summary = db.exercise_summary().unwrap();
        let names: Vec<_> = summary.iter().map(|s| s.exercise.as_str()).collect();
        assert_eq!(names, vec!["Jumping Jacks", "Lunges", "Plank"]);

        let lunges = &summary[1];
        assert_eq!(lunges.attempts, 2);
        assert_eq!(lunges.completed, 1);
        assert_eq!(lunges.total_reps, 14);
        assert_eq!(lunges.completion_rate(), 50.0);

        let planks = &summary[2];
        assert_eq!(planks.total_hold_secs, 42.5);
        assert!(planks.last_done.is_some());
    }

    #[test]
    fn clear_all_empties_history() {
        let db = StatsDb::open_in_memory().unwrap();
        db.record_result(&result("Push-ups", 3, true, 0)).unwrap();
        db.clear_all().unwrap();
        assert!(db.recent_results(10).unwrap().is_empty());
        assert!(db.exercise_summary().unwrap().is_empty());
    }

    #[test]
    fn export_csv_oldest_first() {
        let db = StatsDb::open_in_memory().unwrap();
        db.record_result(&result("Push-ups", 8, false, 10)).unwrap();
        db.record_result(&plank(30.0, 2)).unwrap();

        let mut out = Vec::new();
        let rows = db.export_csv(&mut out).unwrap();
        assert_eq!(rows, 2);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines[0],
            "finished_at,exercise,kind,target,reps,hold_secs,skipped"
        );
        assert!(lines[1].contains(",Push-ups,reps,10,8,"));
        assert!(lines[2].contains(",Plank,time,30,0,30"));
    }

    #[test]
    fn open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("history.db");
        let db = StatsDb::open(&path).unwrap();
        db.record_result(&result("Lunges", 1, false, 0)).unwrap();
        assert!(path.exists());

        let reopened = StatsDb::open(&path).unwrap();
        assert_eq!(reopened.recent_results(5).unwrap().len(), 1);
    }

    #[test]
    fn summary_completion_rate_handles_zero() {
        let summary = ExerciseSummary {
            exercise: "x".into(),
            attempts: 0,
            completed: 0,
            total_reps: 0,
            total_hold_secs: 0.0,
            last_done: None,
        };
        assert_eq!(summary.completion_rate(), 0.0);
    }
}
