//! Lesson file loading and validation
//!
//! Lesson JSON is checked at load time by replaying the scripted sequence
//! and the practice target from the starting position. A malformed file
//! fails here with a message naming the file, never mid-session.

use std::fs;
use std::path::Path;

use super::types::Lesson;
use crate::error::{Error, Result};
use crate::game::Game;

/// Reads and validates a single lesson file.
pub fn load_lesson<P: AsRef<Path>>(path: P) -> Result<Lesson> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .map_err(|e| Error::Lesson(format!("cannot read lesson file {}: {}", path.display(), e)))?;
    let lesson: Lesson = serde_json::from_str(&contents)
        .map_err(|e| Error::Lesson(format!("malformed lesson file {}: {}", path.display(), e)))?;
    validate(&lesson).map_err(|e| Error::Lesson(format!("{}: {}", path.display(), e)))?;
    Ok(lesson)
}

/// Replays the scripted material to reject unplayable lessons early.
pub fn validate(lesson: &Lesson) -> Result<()> {
    let mut game = lesson_game(lesson)?;
    for (idx, step) in lesson.sequence.iter().enumerate() {
        let Some(expected) = step.expected.as_deref() else {
            // A step without an expected move terminates the line; anything
            // after it is never reached.
            break;
        };
        game.play_san(expected)
            .map_err(|e| Error::Lesson(format!("sequence step {}: {}", idx + 1, e)))?;
        if let Some(reply) = step.opponent.as_deref() {
            game.play_san(reply)
                .map_err(|e| Error::Lesson(format!("sequence step {} reply: {}", idx + 1, e)))?;
        }
    }

    let mut game = lesson_game(lesson)?;
    for (idx, notation) in lesson.practice.target.iter().enumerate() {
        game.play_san(notation)
            .map_err(|e| Error::Lesson(format!("practice move {}: {}", idx + 1, e)))?;
    }
    Ok(())
}

/// Game positioned at the lesson start.
pub(crate) fn lesson_game(lesson: &Lesson) -> Result<Game> {
    match lesson.fen_override() {
        Some(fen) => Game::from_fen(fen),
        None => Ok(Game::new()),
    }
}

/// A lesson available on disk, identified by its file stem.
#[derive(Debug, Clone)]
pub struct LessonEntry {
    pub id: String,
    pub title: String,
}

/// Scans a directory for loadable lessons. Files that fail validation are
/// skipped with a warning instead of hiding the whole list.
pub fn list_lessons<P: AsRef<Path>>(dir: P) -> Result<Vec<LessonEntry>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir.as_ref())? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let Some(id) = path.file_stem().and_then(|s| s.to_str()).map(String::from) else {
            continue;
        };
        match load_lesson(&path) {
            Ok(lesson) => entries.push(LessonEntry {
                id,
                title: lesson.title,
            }),
            Err(e) => eprintln!("Warning: skipping lesson {}: {}", path.display(), e),
        }
    }
    entries.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lesson_json(sequence: &str, target: &str) -> Lesson {
        serde_json::from_str(&format!(
            r#"{{"title": "T", "sequence": {}, "practice": {{"target": {}}}}}"#,
            sequence, target
        ))
        .unwrap()
    }

    #[test]
    fn valid_lesson_passes() {
        let lesson = lesson_json(
            r#"[{"move": "e4", "opponent": "e5"}, {"move": "Nf3"}]"#,
            r#"["e4", "e5", "Nf3"]"#,
        );
        assert!(validate(&lesson).is_ok());
    }

    #[test]
    fn unplayable_sequence_is_rejected() {
        let lesson = lesson_json(r#"[{"move": "e4"}, {"move": "e4"}]"#, "[]");
        let err = validate(&lesson).unwrap_err().to_string();
        assert!(err.contains("step 2"), "unexpected error: {}", err);
    }

    #[test]
    fn unplayable_reply_is_rejected() {
        let lesson = lesson_json(r#"[{"move": "e4", "opponent": "Ke7"}]"#, "[]");
        let err = validate(&lesson).unwrap_err().to_string();
        assert!(err.contains("reply"), "unexpected error: {}", err);
    }

    #[test]
    fn unplayable_practice_is_rejected() {
        let lesson = lesson_json(r#"[{"move": "e4"}]"#, r#"["d4", "d4"]"#);
        let err = validate(&lesson).unwrap_err().to_string();
        assert!(err.contains("practice move 2"), "unexpected error: {}", err);
    }

    #[test]
    fn bad_starting_fen_is_rejected() {
        let lesson: Lesson = serde_json::from_str(
            r#"{"title": "T", "startingFEN": "not a fen", "sequence": []}"#,
        )
        .unwrap();
        assert!(validate(&lesson).is_err());
    }

    #[test]
    fn steps_after_a_terminator_are_ignored() {
        let lesson = lesson_json(
            r#"[{"move": "e4"}, {"explain": "The end."}, {"move": "Zz9"}]"#,
            "[]",
        );
        assert!(validate(&lesson).is_ok());
    }

    #[test]
    fn missing_file_error_names_the_path() {
        let err = load_lesson("lessons/no-such-lesson.json")
            .unwrap_err()
            .to_string();
        assert!(err.contains("no-such-lesson.json"), "unexpected error: {}", err);
    }
}
