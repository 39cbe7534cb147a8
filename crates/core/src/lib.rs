//! Chess Tutor Core Library

use shakmaty::{Chess, Color, Position};

pub mod bot;
pub mod engine;
pub mod error;
pub mod game;
pub mod lesson;
pub mod parser;
pub mod storage;

pub use bot::BotSession;
pub use engine::{EngineError, Evaluation, SearchOutcome, UciEngine};
pub use error::{Error, Result};
pub use game::Game;
pub use lesson::{DropOutcome, Lesson, LessonSession};
pub use storage::Database;

/// Basic position information
#[derive(Debug, Clone)]
pub struct PositionInfo {
    pub legal_move_count: u32,
    pub side_to_move: Color,
    pub is_check: bool,
    pub is_checkmate: bool,
    pub is_stalemate: bool,
}

/// Summarizes a position for move feedback
pub fn position_summary(position: &Chess) -> PositionInfo {
    let legal_moves = position.legal_moves();

    PositionInfo {
        legal_move_count: legal_moves.len() as u32,
        side_to_move: position.turn(),
        is_check: position.is_check(),
        is_checkmate: position.is_checkmate(),
        is_stalemate: position.is_stalemate(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_position_summary() {
        let info = position_summary(&Chess::default());
        assert_eq!(info.legal_move_count, 20);
        assert_eq!(info.side_to_move, Color::White);
        assert!(!info.is_check);
        assert!(!info.is_checkmate);
        assert!(!info.is_stalemate);
    }
}
