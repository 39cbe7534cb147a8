//! Database models

use serde::{Deserialize, Serialize};

/// Per-lesson training record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonProgress {
    pub lesson_id: String,
    /// Graded attempts, guided and practice combined
    pub attempts: u32,
    pub correct: u32,
    pub guided_completed: bool,
    pub practice_completed: bool,
    pub last_played_at: u64,
}

impl LessonProgress {
    pub fn accuracy(&self) -> u32 {
        if self.attempts == 0 {
            0
        } else {
            ((self.correct as f64 / self.attempts as f64) * 100.0) as u32
        }
    }
}
