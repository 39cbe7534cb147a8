//! Database operations

use rusqlite::{params, Connection};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use super::models::LessonProgress;
use crate::error::Result;

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS lesson_progress (
                lesson_id TEXT PRIMARY KEY,
                attempts INTEGER NOT NULL DEFAULT 0,
                correct INTEGER NOT NULL DEFAULT 0,
                guided_completed INTEGER NOT NULL DEFAULT 0,
                practice_completed INTEGER NOT NULL DEFAULT 0,
                last_played_at INTEGER NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    fn now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }

    /// Records one graded attempt, right or wrong.
    pub fn record_attempt(&self, lesson_id: &str, correct: bool) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO lesson_progress (lesson_id, attempts, correct, last_played_at)
            VALUES (?1, 1, ?2, ?3)
            ON CONFLICT(lesson_id) DO UPDATE SET
                attempts = attempts + 1,
                correct = correct + ?2,
                last_played_at = ?3
            "#,
            params![lesson_id, correct, Self::now()],
        )?;
        Ok(())
    }

    pub fn mark_guided_completed(&self, lesson_id: &str) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO lesson_progress (lesson_id, guided_completed, last_played_at)
            VALUES (?1, 1, ?2)
            ON CONFLICT(lesson_id) DO UPDATE SET
                guided_completed = 1,
                last_played_at = ?2
            "#,
            params![lesson_id, Self::now()],
        )?;
        Ok(())
    }

    pub fn mark_practice_completed(&self, lesson_id: &str) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO lesson_progress (lesson_id, practice_completed, last_played_at)
            VALUES (?1, 1, ?2)
            ON CONFLICT(lesson_id) DO UPDATE SET
                practice_completed = 1,
                last_played_at = ?2
            "#,
            params![lesson_id, Self::now()],
        )?;
        Ok(())
    }

    pub fn get_progress(&self, lesson_id: &str) -> Result<Option<LessonProgress>> {
        let mut stmt = self.conn.prepare(
            "SELECT lesson_id, attempts, correct, guided_completed, practice_completed, last_played_at
             FROM lesson_progress WHERE lesson_id = ?1",
        )?;

        let progress = stmt
            .query_row(params![lesson_id], |row| {
                Ok(LessonProgress {
                    lesson_id: row.get(0)?,
                    attempts: row.get(1)?,
                    correct: row.get(2)?,
                    guided_completed: row.get(3)?,
                    practice_completed: row.get(4)?,
                    last_played_at: row.get(5)?,
                })
            })
            .ok();

        Ok(progress)
    }

    pub fn all_progress(&self) -> Result<Vec<LessonProgress>> {
        let mut stmt = self.conn.prepare(
            "SELECT lesson_id, attempts, correct, guided_completed, practice_completed, last_played_at
             FROM lesson_progress ORDER BY lesson_id",
        )?;

        let progress = stmt
            .query_map([], |row| {
                Ok(LessonProgress {
                    lesson_id: row.get(0)?,
                    attempts: row.get(1)?,
                    correct: row.get(2)?,
                    guided_completed: row.get(3)?,
                    practice_completed: row.get(4)?,
                    last_played_at: row.get(5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attempts_accumulate() {
        let db = Database::open_in_memory().unwrap();
        db.record_attempt("italian", true).unwrap();
        db.record_attempt("italian", false).unwrap();
        db.record_attempt("italian", true).unwrap();

        let progress = db.get_progress("italian").unwrap().unwrap();
        assert_eq!(progress.attempts, 3);
        assert_eq!(progress.correct, 2);
        assert_eq!(progress.accuracy(), 66);
        assert!(!progress.guided_completed);
    }

    #[test]
    fn completion_flags_stick() {
        let db = Database::open_in_memory().unwrap();
        db.mark_guided_completed("italian").unwrap();
        db.record_attempt("italian", true).unwrap();
        db.mark_practice_completed("italian").unwrap();

        let progress = db.get_progress("italian").unwrap().unwrap();
        assert!(progress.guided_completed);
        assert!(progress.practice_completed);
        assert_eq!(progress.attempts, 1);
    }

    #[test]
    fn unknown_lesson_has_no_progress() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_progress("missing").unwrap().is_none());
    }

    #[test]
    fn all_progress_is_sorted_by_lesson() {
        let db = Database::open_in_memory().unwrap();
        db.record_attempt("scholars-mate", true).unwrap();
        db.record_attempt("italian", false).unwrap();

        let all = db.all_progress().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].lesson_id, "italian");
        assert_eq!(all[1].lesson_id, "scholars-mate");
    }
}
