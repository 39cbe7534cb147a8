//! Lesson playback state machine
//!
//! A session owns the lesson data and the game, grades proposed moves, and
//! plays the scripted replies. Guided mode walks the annotated sequence;
//! practice mode requires the target line with no hints. Wrong or
//! unscripted moves are taken back, so a rejected attempt never changes
//! the position.

use shakmaty::Color;

use super::loader;
use super::types::{Lesson, Step};
use crate::error::Result;
use crate::game::{parse_promotion, parse_square, Game, PlayedMove};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Guided,
    Practice,
}

/// What happened to a proposed move.
#[derive(Debug, Clone)]
pub enum DropOutcome {
    /// No legal move connects the squares; nothing changed.
    Snapback,
    /// The scripted material is exhausted; the move was taken back.
    LineDone,
    /// Legal, but not the scripted move; the move was taken back.
    Mistake {
        expected: String,
        hint: Option<String>,
    },
    /// The scripted move; the session advanced.
    Advance(Advance),
}

#[derive(Debug, Clone)]
pub struct Advance {
    /// Notation of the accepted move, as the script writes it.
    pub played: String,
    /// Explanation for the step the student is now on.
    pub explain: Option<String>,
    /// Scripted reply that was applied, if any.
    pub reply: Option<String>,
    /// The guided sequence is finished; practice is now available.
    pub line_complete: bool,
    /// The practice target is finished.
    pub practice_complete: bool,
}

pub struct LessonSession {
    lesson: Lesson,
    game: Game,
    /// Next unconsumed step of the scripted sequence.
    cursor: usize,
    /// Next slot of the practice target.
    practice_cursor: usize,
    mode: Mode,
    practice_unlocked: bool,
}

impl LessonSession {
    /// Builds a session from validated lesson data. Validation runs again
    /// here so sessions constructed from hand-built lessons get the same
    /// guarantees as ones loaded from disk.
    pub fn new(lesson: Lesson) -> Result<Self> {
        loader::validate(&lesson)?;
        let game = loader::lesson_game(&lesson)?;
        Ok(Self {
            lesson,
            game,
            cursor: 0,
            practice_cursor: 0,
            mode: Mode::Guided,
            practice_unlocked: false,
        })
    }

    pub fn title(&self) -> &str {
        &self.lesson.title
    }

    pub fn fen(&self) -> String {
        self.game.fen()
    }

    pub fn turn(&self) -> Color {
        self.game.turn()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Half-moves applied since the lesson start: one per accepted student
    /// move, one more per scripted reply.
    pub fn moves_played(&self) -> usize {
        self.game.ply()
    }

    pub fn practice_cursor(&self) -> usize {
        self.practice_cursor
    }

    pub fn practice_unlocked(&self) -> bool {
        self.practice_unlocked
    }

    fn current_step(&self) -> Option<&Step> {
        self.lesson.sequence.get(self.cursor)
    }

    /// Text shown while the student looks for the current move.
    pub fn prompt(&self) -> Option<&str> {
        match self.mode {
            Mode::Guided => self.current_step().and_then(|s| s.explain.as_deref()),
            Mode::Practice => None,
        }
    }

    /// Grades a move proposed as source/destination squares. Unparseable
    /// squares behave like an illegal drop.
    pub fn handle_drop(&mut self, from: &str, to: &str, promotion: Option<char>) -> DropOutcome {
        let (Some(from), Some(to)) = (parse_square(from), parse_square(to)) else {
            return DropOutcome::Snapback;
        };
        let promotion = promotion.and_then(parse_promotion);
        match self.mode {
            Mode::Guided => self.guided_drop(from, to, promotion),
            Mode::Practice => self.practice_drop(from, to, promotion),
        }
    }

    fn guided_drop(
        &mut self,
        from: shakmaty::Square,
        to: shakmaty::Square,
        promotion: Option<shakmaty::Role>,
    ) -> DropOutcome {
        let expected = self.current_step().and_then(|s| s.expected.clone());
        // Parse before the attempt so the script is read against the
        // position it refers to.
        let wanted = expected.as_deref().map(|san| self.game.parse_san(san));

        let Some(played) = self.game.try_move(from, to, promotion) else {
            return DropOutcome::Snapback;
        };
        let Some(expected) = expected else {
            self.game.undo();
            return DropOutcome::LineDone;
        };
        if !move_matches(&wanted, &played) {
            self.game.undo();
            let hint = self.current_step().and_then(|s| s.hint.clone());
            return DropOutcome::Mistake { expected, hint };
        }

        let step = self.lesson.sequence[self.cursor].clone();
        self.cursor += 1;
        let reply = step.opponent.filter(|san| self.game.play_san(san).is_ok());

        let line_complete = !self.has_more_guided_steps();
        if line_complete {
            self.practice_unlocked = true;
        }
        DropOutcome::Advance(Advance {
            played: expected,
            explain: self.current_step().and_then(|s| s.explain.clone()),
            reply,
            line_complete,
            practice_complete: false,
        })
    }

    fn practice_drop(
        &mut self,
        from: shakmaty::Square,
        to: shakmaty::Square,
        promotion: Option<shakmaty::Role>,
    ) -> DropOutcome {
        let expected = self.lesson.practice.target.get(self.practice_cursor).cloned();
        let wanted = expected.as_deref().map(|san| self.game.parse_san(san));

        let Some(played) = self.game.try_move(from, to, promotion) else {
            return DropOutcome::Snapback;
        };
        let Some(expected) = expected else {
            self.game.undo();
            return DropOutcome::LineDone;
        };
        // Even slots are the student's, odd slots are scripted replies; a
        // reply slot at drop time means the line got out of step, so the
        // move does not count.
        if self.practice_cursor % 2 != 0 || !move_matches(&wanted, &played) {
            self.game.undo();
            return DropOutcome::Mistake {
                expected,
                hint: None,
            };
        }

        self.practice_cursor += 1;
        let reply = self
            .lesson
            .practice
            .target
            .get(self.practice_cursor)
            .cloned()
            .filter(|san| self.game.play_san(san).is_ok());
        if reply.is_some() {
            self.practice_cursor += 1;
        }

        DropOutcome::Advance(Advance {
            played: expected,
            explain: None,
            reply,
            line_complete: false,
            practice_complete: self.practice_cursor >= self.lesson.practice.target.len(),
        })
    }

    fn has_more_guided_steps(&self) -> bool {
        self.current_step().map_or(false, |s| s.expected.is_some())
    }

    /// Guided-mode hint for the current step, falling back to naming the
    /// expected move.
    pub fn hint(&self) -> Option<String> {
        if self.mode != Mode::Guided {
            return None;
        }
        let step = self.current_step()?;
        let expected = step.expected.as_deref()?;
        Some(
            step.hint
                .clone()
                .unwrap_or_else(|| format!("Look for {}.", expected)),
        )
    }

    /// Back to the lesson start: guided mode, zeroed cursors, practice
    /// locked again.
    pub fn reset(&mut self) {
        self.game.reset();
        self.cursor = 0;
        self.practice_cursor = 0;
        self.mode = Mode::Guided;
        self.practice_unlocked = false;
    }

    /// Switches to practice mode from the lesson start. Only available once
    /// the guided line has been completed.
    pub fn start_practice(&mut self) -> bool {
        if !self.practice_unlocked {
            return false;
        }
        self.game.reset();
        self.cursor = 0;
        self.practice_cursor = 0;
        self.mode = Mode::Practice;
        true
    }
}

fn move_matches(wanted: &Option<Result<shakmaty::Move>>, played: &PlayedMove) -> bool {
    matches!(wanted, Some(Ok(mv)) if *mv == played.mv)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(json: &str) -> LessonSession {
        let lesson: Lesson = serde_json::from_str(json).unwrap();
        LessonSession::new(lesson).unwrap()
    }

    fn one_step_lesson() -> LessonSession {
        session(
            r#"{
                "title": "First move",
                "sequence": [{"move": "e4", "explain": "Take the center."}],
                "practice": {"target": ["e4"]}
            }"#,
        )
    }

    fn italian_lesson() -> LessonSession {
        session(
            r#"{
                "title": "Italian Game",
                "sequence": [
                    {"move": "e4", "explain": "Take the center.", "hint": "King's pawn, two squares.", "opponent": "e5"},
                    {"move": "Nf3", "explain": "Attack the e5 pawn.", "opponent": "Nc6"},
                    {"move": "Bc4", "explain": "Aim at f7."}
                ],
                "practice": {"target": ["e4", "e5", "Nf3", "Nc6", "Bc4"]}
            }"#,
        )
    }

    #[test]
    fn correct_move_advances_and_unlocks_practice() {
        let mut s = one_step_lesson();
        let outcome = s.handle_drop("e2", "e4", None);
        let DropOutcome::Advance(adv) = outcome else {
            panic!("expected advance, got {:?}", outcome);
        };
        assert_eq!(adv.played, "e4");
        assert!(adv.reply.is_none());
        assert!(adv.line_complete);
        assert_eq!(s.moves_played(), 1);
        assert!(s.practice_unlocked());
    }

    #[test]
    fn wrong_move_is_taken_back() {
        let mut s = one_step_lesson();
        let before = s.fen();
        let outcome = s.handle_drop("d2", "d4", None);
        let DropOutcome::Mistake { expected, .. } = outcome else {
            panic!("expected mistake, got {:?}", outcome);
        };
        assert_eq!(expected, "e4");
        assert_eq!(s.fen(), before);
        assert_eq!(s.moves_played(), 0);
        assert!(!s.practice_unlocked());
    }

    #[test]
    fn illegal_move_snaps_back() {
        let mut s = one_step_lesson();
        let before = s.fen();
        assert!(matches!(s.handle_drop("e2", "e5", None), DropOutcome::Snapback));
        assert!(matches!(s.handle_drop("", "e4", None), DropOutcome::Snapback));
        assert_eq!(s.fen(), before);
    }

    #[test]
    fn scripted_reply_advances_the_count_twice() {
        let mut s = italian_lesson();
        let DropOutcome::Advance(adv) = s.handle_drop("e2", "e4", None) else {
            panic!("expected advance");
        };
        assert_eq!(adv.reply.as_deref(), Some("e5"));
        assert_eq!(adv.explain.as_deref(), Some("Attack the e5 pawn."));
        assert!(!adv.line_complete);
        assert_eq!(s.moves_played(), 2);
    }

    #[test]
    fn full_guided_line_completes() {
        let mut s = italian_lesson();
        for (from, to) in [("e2", "e4"), ("g1", "f3")] {
            assert!(matches!(s.handle_drop(from, to, None), DropOutcome::Advance(_)));
        }
        let DropOutcome::Advance(adv) = s.handle_drop("f1", "c4", None) else {
            panic!("expected advance");
        };
        assert!(adv.line_complete);
        assert_eq!(s.moves_played(), 5);
        assert!(s.practice_unlocked());
    }

    #[test]
    fn unscripted_input_after_the_line_is_rejected() {
        let mut s = one_step_lesson();
        s.handle_drop("e2", "e4", None);
        let before = s.fen();
        assert!(matches!(s.handle_drop("b8", "c6", None), DropOutcome::LineDone));
        assert_eq!(s.fen(), before);
    }

    #[test]
    fn hint_prefers_the_authored_text() {
        let s = italian_lesson();
        assert_eq!(s.hint().as_deref(), Some("King's pawn, two squares."));

        let mut s = one_step_lesson();
        assert_eq!(s.hint().as_deref(), Some("Look for e4."));
        s.handle_drop("e2", "e4", None);
        assert!(s.hint().is_none());
    }

    #[test]
    fn practice_requires_the_guided_line_first() {
        let mut s = italian_lesson();
        assert!(!s.start_practice());
        for (from, to) in [("e2", "e4"), ("g1", "f3"), ("f1", "c4")] {
            s.handle_drop(from, to, None);
        }
        assert!(s.start_practice());
        assert_eq!(s.mode(), Mode::Practice);
        assert_eq!(s.moves_played(), 0);
    }

    #[test]
    fn practice_cursor_only_advances_on_matching_moves() {
        let mut s = italian_lesson();
        for (from, to) in [("e2", "e4"), ("g1", "f3"), ("f1", "c4")] {
            s.handle_drop(from, to, None);
        }
        s.start_practice();

        let DropOutcome::Advance(adv) = s.handle_drop("e2", "e4", None) else {
            panic!("expected advance");
        };
        assert_eq!(adv.reply.as_deref(), Some("e5"));
        assert_eq!(s.practice_cursor(), 2);

        let before = s.fen();
        let DropOutcome::Mistake { expected, hint } = s.handle_drop("b1", "c3", None) else {
            panic!("expected mistake");
        };
        assert_eq!(expected, "Nf3");
        assert!(hint.is_none());
        assert_eq!(s.practice_cursor(), 2);
        assert_eq!(s.fen(), before);

        s.handle_drop("g1", "f3", None);
        let DropOutcome::Advance(adv) = s.handle_drop("f1", "c4", None) else {
            panic!("expected advance");
        };
        assert!(adv.practice_complete);
        assert_eq!(s.practice_cursor(), 5);
    }

    #[test]
    fn reset_restores_start_and_relocks_practice() {
        let mut s = italian_lesson();
        let start = s.fen();
        for (from, to) in [("e2", "e4"), ("g1", "f3"), ("f1", "c4")] {
            s.handle_drop(from, to, None);
        }
        s.start_practice();
        s.handle_drop("e2", "e4", None);

        s.reset();
        assert_eq!(s.fen(), start);
        assert_eq!(s.moves_played(), 0);
        assert_eq!(s.practice_cursor(), 0);
        assert_eq!(s.mode(), Mode::Guided);
        assert!(!s.practice_unlocked());
    }

    #[test]
    fn lesson_with_custom_start_plays_for_black() {
        let mut s = session(
            r#"{
                "title": "Open Game for Black",
                "startingFEN": "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1",
                "sequence": [{"move": "e5", "explain": "Meet the center head on.", "opponent": "Nf3"}],
                "practice": {"target": ["e5", "Nf3"]}
            }"#,
        );
        assert_eq!(s.turn(), Color::Black);
        let DropOutcome::Advance(adv) = s.handle_drop("e7", "e5", None) else {
            panic!("expected advance");
        };
        assert_eq!(adv.reply.as_deref(), Some("Nf3"));
        assert!(adv.line_complete);
    }
}
