//! UCI engine interface
//!
//! Spawns a UCI engine (Stockfish by default) as a subprocess. A dedicated
//! thread reads engine output and forwards it over a channel, so every wait
//! carries a deadline. One search is in flight per handle at a time;
//! callers that must refuse concurrent searches guard the handle with
//! `try_lock`.

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use super::search::{Evaluation, SearchOutcome};

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
const SEARCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Error type for engine operations
#[derive(Debug)]
pub enum EngineError {
    /// Failed to start the engine process
    SpawnError(String),
    /// Failed to communicate with engine
    IoError(std::io::Error),
    /// Engine returned unexpected response
    ProtocolError(String),
    /// Engine did not reply before the deadline
    Timeout,
    /// Engine process closed its output
    Disconnected,
    /// Engine not initialized
    NotInitialized,
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::SpawnError(s) => write!(f, "Failed to start engine: {}", s),
            EngineError::IoError(e) => write!(f, "I/O error: {}", e),
            EngineError::ProtocolError(s) => write!(f, "Protocol error: {}", s),
            EngineError::Timeout => write!(f, "Engine did not reply in time"),
            EngineError::Disconnected => write!(f, "Engine process closed its output"),
            EngineError::NotInitialized => write!(f, "Engine not initialized"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<std::io::Error> for EngineError {
    fn from(error: std::io::Error) -> Self {
        EngineError::IoError(error)
    }
}

/// Handle to a running UCI engine process
pub struct UciEngine {
    /// The child process
    process: Child,
    /// Stdin for sending commands
    stdin: ChildStdin,
    /// Output lines forwarded by the reader thread
    lines: Receiver<String>,
    /// Whether UCI handshake completed
    initialized: bool,
}

impl UciEngine {
    /// Starts an engine process and completes the UCI handshake.
    ///
    /// # Arguments
    /// * `path` - Path to the engine binary (or "stockfish" if in PATH)
    pub fn new(path: &str) -> Result<Self, EngineError> {
        let mut process = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| EngineError::SpawnError(e.to_string()))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| EngineError::SpawnError("Failed to open stdin".into()))?;

        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| EngineError::SpawnError("Failed to open stdout".into()))?;

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let reader = BufReader::new(stdout);
            for line in reader.lines() {
                let Ok(line) = line else { break };
                if tx.send(line.trim().to_string()).is_err() {
                    break;
                }
            }
        });

        let mut engine = UciEngine {
            process,
            stdin,
            lines: rx,
            initialized: false,
        };

        engine.init_uci()?;
        Ok(engine)
    }

    /// Sends a command to the engine
    fn send(&mut self, cmd: &str) -> Result<(), EngineError> {
        writeln!(self.stdin, "{}", cmd)?;
        self.stdin.flush()?;
        Ok(())
    }

    /// Waits for the next output line, up to the deadline
    fn read_line(&mut self, deadline: Instant) -> Result<String, EngineError> {
        let remaining = deadline
            .checked_duration_since(Instant::now())
            .ok_or(EngineError::Timeout)?;
        match self.lines.recv_timeout(remaining) {
            Ok(line) => Ok(line),
            Err(RecvTimeoutError::Timeout) => Err(EngineError::Timeout),
            Err(RecvTimeoutError::Disconnected) => Err(EngineError::Disconnected),
        }
    }

    /// Reads lines until one starts with the expected token
    fn read_until(&mut self, expected: &str, deadline: Instant) -> Result<(), EngineError> {
        loop {
            let line = self.read_line(deadline)?;
            if line.starts_with(expected) {
                return Ok(());
            }
        }
    }

    /// Discards output left over from an earlier, timed-out search
    fn drain(&mut self) {
        while self.lines.try_recv().is_ok() {}
    }

    /// Initialize UCI protocol
    fn init_uci(&mut self) -> Result<(), EngineError> {
        let deadline = Instant::now() + HANDSHAKE_TIMEOUT;
        self.send("uci")?;
        self.read_until("uciok", deadline)?;

        self.send("isready")?;
        self.read_until("readyok", deadline)?;

        self.initialized = true;
        Ok(())
    }

    /// Runs a fixed-depth search from a FEN position.
    ///
    /// On timeout the engine is told to stop; its late reply is drained at
    /// the start of the next search.
    pub fn best_move(&mut self, fen: &str, depth: u8) -> Result<SearchOutcome, EngineError> {
        if !self.initialized {
            return Err(EngineError::NotInitialized);
        }

        self.drain();
        self.send(&format!("position fen {}", fen))?;
        self.send(&format!("go depth {}", depth))?;

        let deadline = Instant::now() + SEARCH_TIMEOUT;
        let mut evaluation = Evaluation::Centipawns(0);
        let mut reached_depth = 0u8;

        loop {
            let line = match self.read_line(deadline) {
                Ok(line) => line,
                Err(EngineError::Timeout) => {
                    let _ = self.send("stop");
                    return Err(EngineError::Timeout);
                }
                Err(e) => return Err(e),
            };

            if line.starts_with("bestmove") {
                let best_move = parse_bestmove(&line)
                    .ok_or_else(|| EngineError::ProtocolError(line.clone()))?;
                return Ok(SearchOutcome {
                    best_move,
                    evaluation,
                    depth: reached_depth,
                });
            } else if line.starts_with("info") {
                parse_info_line(&line, &mut evaluation, &mut reached_depth);
            }
        }
    }

    /// Quit the engine cleanly
    pub fn quit(&mut self) -> Result<(), EngineError> {
        self.send("quit")?;
        // Give it a moment to exit
        thread::sleep(Duration::from_millis(100));
        let _ = self.process.kill(); // Kill if still running
        Ok(())
    }
}

impl Drop for UciEngine {
    fn drop(&mut self) {
        let _ = self.quit();
    }
}

/// Extracts the move token from a line like "bestmove e2e4 ponder e7e5"
fn parse_bestmove(line: &str) -> Option<String> {
    let mut parts = line.split_whitespace();
    match parts.next() {
        Some("bestmove") => parts.next().map(String::from),
        _ => None,
    }
}

/// Pulls depth and score out of an engine info line
fn parse_info_line(line: &str, evaluation: &mut Evaluation, depth: &mut u8) {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let mut i = 0;

    while i < parts.len() {
        match parts[i] {
            "depth" => {
                if i + 1 < parts.len() {
                    *depth = parts[i + 1].parse().unwrap_or(0);
                }
                i += 2;
            }
            "score" => {
                if i + 2 < parts.len() {
                    match parts[i + 1] {
                        "cp" => {
                            if let Ok(cp) = parts[i + 2].parse::<i32>() {
                                *evaluation = Evaluation::Centipawns(cp);
                            }
                        }
                        "mate" => {
                            if let Ok(m) = parts[i + 2].parse::<i32>() {
                                *evaluation = Evaluation::Mate(m);
                            }
                        }
                        _ => {}
                    }
                }
                i += 3;
            }
            _ => {
                i += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bestmove_line_parsing() {
        assert_eq!(parse_bestmove("bestmove e2e4").as_deref(), Some("e2e4"));
        assert_eq!(
            parse_bestmove("bestmove g1f3 ponder b8c6").as_deref(),
            Some("g1f3")
        );
        assert_eq!(parse_bestmove("bestmove (none)").as_deref(), Some("(none)"));
        assert_eq!(parse_bestmove("readyok"), None);
        assert_eq!(parse_bestmove("bestmove"), None);
    }

    #[test]
    fn info_line_parsing() {
        let mut evaluation = Evaluation::Centipawns(0);
        let mut depth = 0u8;
        parse_info_line(
            "info depth 12 seldepth 16 score cp 35 nodes 90310 pv e2e4 e7e5",
            &mut evaluation,
            &mut depth,
        );
        assert_eq!(evaluation, Evaluation::Centipawns(35));
        assert_eq!(depth, 12);

        parse_info_line("info depth 18 score mate -3", &mut evaluation, &mut depth);
        assert_eq!(evaluation, Evaluation::Mate(-3));
        assert_eq!(depth, 18);
    }

    #[test]
    fn garbage_info_lines_are_ignored() {
        let mut evaluation = Evaluation::Centipawns(7);
        let mut depth = 5u8;
        parse_info_line("info string NNUE evaluation enabled", &mut evaluation, &mut depth);
        assert_eq!(evaluation, Evaluation::Centipawns(7));
        assert_eq!(depth, 5);
    }

    #[test]
    #[ignore] // Ignore by default - requires stockfish installed
    fn engine_handshake() {
        let engine = UciEngine::new("stockfish");
        assert!(engine.is_ok());
    }

    #[test]
    #[ignore]
    fn search_from_starting_position() {
        let mut engine = UciEngine::new("stockfish").unwrap();
        let outcome = engine
            .best_move(
                "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
                10,
            )
            .unwrap();
        assert!(!outcome.best_move.is_empty());
        assert_ne!(outcome.best_move, "(none)");
    }
}
