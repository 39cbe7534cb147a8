//! PGN import for lesson authoring
//!
//! Parses a PGN game into a plain move list and turns it into a lesson
//! skeleton: each step pairs a student move with the scripted reply, and
//! the full line becomes the practice target. Explanations are left for
//! the author to fill in.

use pgn_reader::{RawTag, SanPlus, Skip, Visitor};
use shakmaty::{Chess, Color, Position};
use std::io::Cursor;
use std::ops::ControlFlow;

use crate::error::{Error, Result};
use crate::game::Game;
use crate::lesson::types::{Lesson, Practice, Step};

/// A game lifted out of a PGN file
#[derive(Debug, Clone)]
pub struct ImportedGame {
    pub event: Option<String>,
    pub white: Option<String>,
    pub black: Option<String>,
    pub moves: Vec<String>,
}

impl ImportedGame {
    /// Fallback lesson title when the author does not provide one
    pub fn default_title(&self) -> String {
        format!(
            "{} vs {}",
            self.white.as_deref().unwrap_or("White"),
            self.black.as_deref().unwrap_or("Black")
        )
    }
}

#[derive(Default)]
struct GameTags {
    event: Option<String>,
    white: Option<String>,
    black: Option<String>,
}

struct GameMoves {
    tags: GameTags,
    moves: Vec<String>,
    current_position: Chess,
    success: bool,
}

struct GameParser;

impl Visitor for GameParser {
    type Tags = GameTags;
    type Movetext = GameMoves;
    type Output = Option<ImportedGame>;

    fn begin_tags(&mut self) -> ControlFlow<Self::Output, Self::Tags> {
        ControlFlow::Continue(GameTags::default())
    }

    fn tag(
        &mut self,
        tags: &mut Self::Tags,
        name: &[u8],
        value: RawTag<'_>,
    ) -> ControlFlow<Self::Output> {
        let name_str = String::from_utf8_lossy(name);
        let value_str = value.decode_utf8_lossy().to_string();

        match name_str.as_ref() {
            "Event" => tags.event = Some(value_str),
            "White" => tags.white = Some(value_str),
            "Black" => tags.black = Some(value_str),
            _ => {}
        }

        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, tags: Self::Tags) -> ControlFlow<Self::Output, Self::Movetext> {
        ControlFlow::Continue(GameMoves {
            tags,
            moves: Vec::new(),
            current_position: Chess::default(),
            success: true,
        })
    }

    fn san(&mut self, movetext: &mut Self::Movetext, san: SanPlus) -> ControlFlow<Self::Output> {
        if !movetext.success {
            return ControlFlow::Continue(());
        }

        // Suffix-free SAN, so lesson files stay clean
        movetext.moves.push(san.san.to_string());

        match san.san.to_move(&movetext.current_position) {
            Ok(m) => match movetext.current_position.clone().play(m) {
                Ok(new_pos) => {
                    movetext.current_position = new_pos;
                }
                Err(_) => {
                    movetext.success = false;
                }
            },
            Err(_) => {
                movetext.success = false;
            }
        }

        ControlFlow::Continue(())
    }

    fn begin_variation(
        &mut self,
        _movetext: &mut Self::Movetext,
    ) -> ControlFlow<Self::Output, Skip> {
        ControlFlow::Continue(Skip(true))
    }

    fn end_game(&mut self, movetext: Self::Movetext) -> Self::Output {
        if movetext.success {
            Some(ImportedGame {
                event: movetext.tags.event,
                white: movetext.tags.white,
                black: movetext.tags.black,
                moves: movetext.moves,
            })
        } else {
            None
        }
    }
}

/// Parses every valid game out of a PGN string
pub fn parse_pgn_string(pgn: &str) -> Result<Vec<ImportedGame>> {
    let mut parser = GameParser;
    let mut games: Vec<ImportedGame> = Vec::new();

    let cursor = Cursor::new(pgn.as_bytes());
    let mut reader = pgn_reader::Reader::new(cursor);

    loop {
        match reader.read_game(&mut parser) {
            Ok(Some(maybe_game)) => {
                if let Some(game) = maybe_game {
                    games.push(game);
                }
            }
            Ok(None) => break,
            Err(e) => return Err(Error::Pgn(e.to_string())),
        }
    }

    if games.is_empty() {
        Err(Error::Pgn("no valid games found".into()))
    } else {
        Ok(games)
    }
}

/// Builds an unannotated lesson from a plain move list.
///
/// For a Black lesson the first White move becomes the starting position,
/// since the scripted opponent only ever answers the student.
pub fn lesson_from_moves(
    title: &str,
    moves: &[String],
    student: Color,
    max_plies: usize,
) -> Result<Lesson> {
    let moves = &moves[..moves.len().min(max_plies)];
    if moves.is_empty() {
        return Err(Error::Pgn("no moves to import".into()));
    }

    let mut game = Game::new();
    let mut idx = 0;
    let mut starting_fen = None;

    if student == Color::Black {
        game.play_san(&moves[0])
            .map_err(|e| Error::Pgn(format!("move 1: {}", e)))?;
        starting_fen = Some(game.fen());
        idx = 1;
    }

    let mut sequence = Vec::new();
    let mut target = Vec::new();
    while idx < moves.len() {
        let own = moves[idx].clone();
        game.play_san(&own)
            .map_err(|e| Error::Pgn(format!("ply {}: {}", idx + 1, e)))?;
        target.push(own.clone());

        let reply = match moves.get(idx + 1) {
            Some(reply) => {
                game.play_san(reply)
                    .map_err(|e| Error::Pgn(format!("ply {}: {}", idx + 2, e)))?;
                target.push(reply.clone());
                Some(reply.clone())
            }
            None => None,
        };

        sequence.push(Step {
            expected: Some(own),
            explain: None,
            hint: None,
            opponent: reply,
        });
        idx += 2;
    }

    Ok(Lesson {
        title: title.to_string(),
        starting_fen,
        sequence,
        practice: Practice { target },
    })
}
