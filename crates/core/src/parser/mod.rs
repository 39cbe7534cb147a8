//! Parsers for importing lesson material
//!
//! Currently supports:
//! - PGN (Portable Game Notation), turned into lesson skeletons

pub mod pgn;

pub use pgn::{lesson_from_moves, parse_pgn_string, ImportedGame};
