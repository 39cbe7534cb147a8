//! Free play against an engine opponent
//!
//! The standalone auto-play page: the student drags any legal move, the
//! current position goes to the engine at a fixed depth, and the engine's
//! reply is applied to the game.

use crate::engine::{Evaluation, UciEngine};
use crate::error::Result;
use crate::game::{parse_promotion, parse_square, Game, PlayedMove};
use crate::PositionInfo;

/// Search depth of the auto-play opponent.
pub const DEFAULT_DEPTH: u8 = 15;

pub struct BotSession {
    game: Game,
    depth: u8,
}

/// An engine reply that was applied to the game.
#[derive(Debug, Clone)]
pub struct BotReply {
    /// The move the engine chose, as a UCI token.
    pub uci: String,
    pub evaluation: Evaluation,
    /// The reply ended the game (mate or stalemate).
    pub game_over: bool,
}

impl BotSession {
    pub fn new(depth: u8) -> Self {
        Self {
            game: Game::new(),
            depth,
        }
    }

    pub fn fen(&self) -> String {
        self.game.fen()
    }

    pub fn info(&self) -> PositionInfo {
        self.game.info()
    }

    /// Applies the student's drag. `None` means snapback; unparseable
    /// squares count as illegal.
    pub fn player_move(&mut self, from: &str, to: &str, promotion: Option<char>) -> Option<PlayedMove> {
        let from = parse_square(from)?;
        let to = parse_square(to)?;
        let promotion = promotion.and_then(parse_promotion);
        self.game.try_move(from, to, promotion)
    }

    /// Takes back the last applied move; used when the engine cannot answer
    /// so the student is not left waiting on a position nobody will play.
    pub fn take_back(&mut self) {
        self.game.undo();
    }

    /// Asks the engine for a reply to the current position and applies it.
    /// Returns `None` when the engine reports no move (the game is over).
    pub fn engine_reply(&mut self, engine: &mut UciEngine) -> Result<Option<BotReply>> {
        let outcome = engine.best_move(&self.game.fen(), self.depth)?;
        if outcome.best_move == "(none)" {
            return Ok(None);
        }
        let played = self.game.play_uci(&outcome.best_move)?;
        let info = self.game.info();
        Ok(Some(BotReply {
            uci: played.uci,
            evaluation: outcome.evaluation,
            game_over: info.is_checkmate || info.is_stalemate,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legal_player_move_is_applied() {
        let mut bot = BotSession::new(DEFAULT_DEPTH);
        let played = bot.player_move("e2", "e4", None).unwrap();
        assert_eq!(played.uci, "e2e4");
    }

    #[test]
    fn illegal_player_move_snaps_back() {
        let mut bot = BotSession::new(DEFAULT_DEPTH);
        let before = bot.fen();
        assert!(bot.player_move("e2", "e6", None).is_none());
        assert!(bot.player_move("xx", "e4", None).is_none());
        assert_eq!(bot.fen(), before);
    }

    #[test]
    fn take_back_reverts_the_player_move() {
        let mut bot = BotSession::new(DEFAULT_DEPTH);
        let before = bot.fen();
        bot.player_move("e2", "e4", None).unwrap();
        bot.take_back();
        assert_eq!(bot.fen(), before);
    }

    #[test]
    #[ignore] // Requires stockfish installed
    fn engine_answers_the_opening_move() {
        let mut engine = UciEngine::new("stockfish").unwrap();
        let mut bot = BotSession::new(8);
        bot.player_move("e2", "e4", None).unwrap();
        let reply = bot.engine_reply(&mut engine).unwrap().unwrap();
        assert_eq!(reply.uci.len(), 4);
        assert!(!reply.game_over);
    }
}
