//! Lesson data structures
//!
//! Lessons are JSON files: a title, an optional starting FEN, the scripted
//! sequence of steps, and a practice target line. Field names follow the
//! on-disk format, so `move` and `startingFEN` are renamed here.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    pub title: String,
    #[serde(rename = "startingFEN", default, skip_serializing_if = "Option::is_none")]
    pub starting_fen: Option<String>,
    pub sequence: Vec<Step>,
    #[serde(default)]
    pub practice: Practice,
}

/// One scripted step: the move expected from the student, its explanation
/// and hint, and the forced reply played after the student gets it right.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Step {
    #[serde(rename = "move", default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opponent: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Practice {
    #[serde(default)]
    pub target: Vec<String>,
}

impl Lesson {
    /// FEN override, if the lesson does not start from the standard
    /// position. The literal `"start"` means the standard position, like
    /// the board widget's shorthand.
    pub fn fen_override(&self) -> Option<&str> {
        match self.starting_fen.as_deref() {
            Some(fen) if fen != "start" => Some(fen),
            _ => None,
        }
    }
}
