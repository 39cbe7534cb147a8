//! Mutable game wrapper around a shakmaty position
//!
//! The board widget proposes moves as source/destination squares and the
//! lesson scripts name moves in SAN, so this wrapper speaks both, keeps an
//! undo history, and renders FEN strings for the UI to sync against.

use shakmaty::{
    fen::Fen, san::SanPlus, CastlingMode, Chess, Color, EnPassantMode, File, Move, Position, Role,
    Square,
};

use crate::error::{Error, Result};
use crate::PositionInfo;

/// A move that was applied to the game.
#[derive(Debug, Clone)]
pub struct PlayedMove {
    pub mv: Move,
    /// UCI token, e.g. "e2e4" or "e7e8q".
    pub uci: String,
}

pub struct Game {
    position: Chess,
    start: Chess,
    history: Vec<Chess>,
}

impl Game {
    /// Standard starting position.
    pub fn new() -> Self {
        Self {
            position: Chess::default(),
            start: Chess::default(),
            history: Vec::new(),
        }
    }

    pub fn from_fen(fen: &str) -> Result<Self> {
        let parsed: Fen = fen
            .parse()
            .map_err(|e| Error::Position(format!("invalid FEN '{}': {}", fen, e)))?;
        let position: Chess = parsed
            .into_position(CastlingMode::Standard)
            .map_err(|e| Error::Position(format!("illegal position '{}': {}", fen, e)))?;
        Ok(Self {
            position: position.clone(),
            start: position,
            history: Vec::new(),
        })
    }

    /// Attempts a move given as source/destination squares.
    ///
    /// Returns `None` when no legal move connects the squares; the position
    /// is left untouched and the board widget snaps the piece back.
    /// Promotions default to a queen, matching the board widget's drag
    /// interface, which has no piece picker.
    pub fn try_move(&mut self, from: Square, to: Square, promotion: Option<Role>) -> Option<PlayedMove> {
        let wanted = promotion.unwrap_or(Role::Queen);
        let mv = self
            .position
            .legal_moves()
            .into_iter()
            .find(|m| match m.promotion() {
                Some(role) => matches_squares(m, from, to) && role == wanted,
                None => matches_squares(m, from, to),
            })?;
        self.apply(mv)
    }

    /// Applies scripted notation. Check and mate suffixes are accepted.
    pub fn play_san(&mut self, notation: &str) -> Result<PlayedMove> {
        let mv = self.parse_san(notation)?;
        self.apply(mv)
            .ok_or_else(|| Error::Lesson(format!("move '{}' is not playable here", notation)))
    }

    /// Parses scripted notation against the current position without
    /// applying it.
    pub fn parse_san(&self, notation: &str) -> Result<Move> {
        let san: SanPlus = notation
            .trim()
            .parse()
            .map_err(|e| Error::Lesson(format!("bad notation '{}': {}", notation, e)))?;
        san.san
            .to_move(&self.position)
            .map_err(|e| Error::Lesson(format!("move '{}' is not playable here: {}", notation, e)))
    }

    /// Applies an engine move token ("e2e4", "e7e8q").
    pub fn play_uci(&mut self, token: &str) -> Result<PlayedMove> {
        let token = token.trim();
        let bad = || Error::Position(format!("bad move token '{}'", token));
        let from: Square = token.get(0..2).ok_or_else(bad)?.parse().map_err(|_| bad())?;
        let to: Square = token.get(2..4).ok_or_else(bad)?.parse().map_err(|_| bad())?;
        let promotion = match token.get(4..).and_then(|s| s.chars().next()) {
            Some('q') => Some(Role::Queen),
            Some('r') => Some(Role::Rook),
            Some('b') => Some(Role::Bishop),
            Some('n') => Some(Role::Knight),
            Some(_) => return Err(bad()),
            None => None,
        };
        self.try_move(from, to, promotion)
            .ok_or_else(|| Error::Position(format!("move '{}' is not legal here", token)))
    }

    fn apply(&mut self, mv: Move) -> Option<PlayedMove> {
        let next = self.position.clone().play(mv.clone()).ok()?;
        self.history.push(std::mem::replace(&mut self.position, next));
        Some(PlayedMove {
            uci: move_to_uci(&mv),
            mv,
        })
    }

    /// Takes back the last applied move. Returns false when there is
    /// nothing to undo. The restored position is exact, not recomputed.
    pub fn undo(&mut self) -> bool {
        match self.history.pop() {
            Some(prev) => {
                self.position = prev;
                true
            }
            None => false,
        }
    }

    /// Back to the position the game was created from.
    pub fn reset(&mut self) {
        self.position = self.start.clone();
        self.history.clear();
    }

    pub fn load_fen(&mut self, fen: &str) -> Result<()> {
        *self = Game::from_fen(fen)?;
        Ok(())
    }

    pub fn fen(&self) -> String {
        Fen::from_position(&self.position, EnPassantMode::Legal).to_string()
    }

    pub fn turn(&self) -> Color {
        self.position.turn()
    }

    /// Half-moves applied since the starting position.
    pub fn ply(&self) -> usize {
        self.history.len()
    }

    pub fn position(&self) -> &Chess {
        &self.position
    }

    pub fn info(&self) -> PositionInfo {
        crate::position_summary(&self.position)
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

/// Square the king lands on; shakmaty represents castling as king-takes-rook.
fn castle_king_target(king: Square, rook: Square) -> Square {
    if rook.file() > king.file() {
        Square::from_coords(File::G, king.rank())
    } else {
        Square::from_coords(File::C, king.rank())
    }
}

/// Matches a drag against a candidate legal move. Castling is accepted both
/// as the king's two-square hop and as a drop onto the rook.
fn matches_squares(mv: &Move, from: Square, to: Square) -> bool {
    match *mv {
        Move::Castle { king, rook } => {
            king == from && (to == castle_king_target(king, rook) || to == rook)
        }
        _ => mv.from() == Some(from) && mv.to() == to,
    }
}

/// Renders a move as a UCI token.
pub fn move_to_uci(mv: &Move) -> String {
    match mv {
        Move::Normal {
            from, to, promotion, ..
        } => {
            let promo = promotion
                .map(|r| match r {
                    Role::Queen => "q",
                    Role::Rook => "r",
                    Role::Bishop => "b",
                    Role::Knight => "n",
                    _ => "",
                })
                .unwrap_or("");
            format!("{}{}{}", from, to, promo)
        }
        Move::EnPassant { from, to, .. } => format!("{}{}", from, to),
        Move::Castle { king, rook } => format!("{}{}", king, castle_king_target(*king, *rook)),
        Move::Put { .. } => String::new(),
    }
}

pub(crate) fn parse_square(s: &str) -> Option<Square> {
    s.trim().parse().ok()
}

pub(crate) fn parse_promotion(c: char) -> Option<Role> {
    match c.to_ascii_lowercase() {
        'q' => Some(Role::Queen),
        'r' => Some(Role::Rook),
        'b' => Some(Role::Bishop),
        'n' => Some(Role::Knight),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn legal_drag_is_applied() {
        let mut game = Game::new();
        let played = game.try_move(Square::E2, Square::E4, None).unwrap();
        assert_eq!(played.uci, "e2e4");
        assert_eq!(game.turn(), Color::Black);
        assert_eq!(game.ply(), 1);
    }

    #[test]
    fn illegal_drag_is_rejected() {
        let mut game = Game::new();
        let before = game.fen();
        assert!(game.try_move(Square::E2, Square::E5, None).is_none());
        assert_eq!(game.fen(), before);
        assert_eq!(game.ply(), 0);
    }

    #[test]
    fn undo_restores_exact_position() {
        let mut game = Game::new();
        game.try_move(Square::G1, Square::F3, None).unwrap();
        assert!(game.undo());
        assert_eq!(game.fen(), START_FEN);
        assert!(!game.undo());
    }

    #[test]
    fn scripted_san_with_suffix() {
        let mut game = Game::new();
        for san in ["e4", "e5", "Qh5", "Nc6", "Bc4", "Nf6"] {
            game.play_san(san).unwrap();
        }
        game.play_san("Qxf7#").unwrap();
        assert!(game.info().is_checkmate);
    }

    #[test]
    fn castling_accepts_king_hop() {
        let mut game = Game::new();
        for san in ["e4", "e5", "Nf3", "Nc6", "Bc4", "Bc5"] {
            game.play_san(san).unwrap();
        }
        let played = game.try_move(Square::E1, Square::G1, None).unwrap();
        assert_eq!(played.uci, "e1g1");
    }

    #[test]
    fn promotion_defaults_to_queen() {
        let mut game = Game::from_fen("4k3/P7/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let played = game.try_move(Square::A7, Square::A8, None).unwrap();
        assert_eq!(played.uci, "a7a8q");
        assert!(game.fen().starts_with("Q3k3"));
    }

    #[test]
    fn engine_token_round_trip() {
        let mut game = Game::new();
        game.play_uci("e2e4").unwrap();
        game.play_uci("e7e5").unwrap();
        assert_eq!(game.ply(), 2);
        assert!(game.play_uci("e1e8").is_err());
        assert!(game.play_uci("zz").is_err());
    }

    #[test]
    fn load_fen_replaces_the_game() {
        let mut game = Game::new();
        game.play_san("e4").unwrap();
        game.load_fen("4k3/8/8/8/8/8/8/4K2R w K - 0 1").unwrap();
        assert_eq!(game.ply(), 0);
        let played = game.try_move(Square::E1, Square::G1, None).unwrap();
        assert_eq!(played.uci, "e1g1");
        assert!(game.load_fen("not a fen").is_err());
    }

    #[test]
    fn reset_returns_to_lesson_start() {
        let fen = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2";
        let mut game = Game::from_fen(fen).unwrap();
        game.play_san("Nf3").unwrap();
        game.reset();
        assert_eq!(game.fen(), fen);
        assert_eq!(game.ply(), 0);
    }
}
