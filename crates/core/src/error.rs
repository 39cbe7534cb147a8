//! Error types for chess-tutor-core

use thiserror::Error;

use crate::engine::EngineError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Lesson error: {0}")]
    Lesson(String),

    #[error("Invalid position: {0}")]
    Position(String),

    #[error("PGN parsing error: {0}")]
    Pgn(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
