//! Converts a PGN game into a lesson skeleton
//!
//! Prints lesson JSON to stdout; explanations and hints are left for the
//! author to fill in.

use shakmaty::Color;
use std::fs;

use chess_tutor_core::parser::{lesson_from_moves, parse_pgn_string};

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: lesson_import <pgn_file> [--black] [--max-plies N] [--title T]");
        std::process::exit(1);
    }

    let path = &args[1];
    let mut student = Color::White;
    let mut max_plies = usize::MAX;
    let mut title: Option<String> = None;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--black" => {
                student = Color::Black;
                i += 1;
            }
            "--max-plies" => {
                let Some(value) = args.get(i + 1).and_then(|v| v.parse().ok()) else {
                    eprintln!("--max-plies needs a number");
                    std::process::exit(1);
                };
                max_plies = value;
                i += 2;
            }
            "--title" => {
                let Some(value) = args.get(i + 1) else {
                    eprintln!("--title needs a value");
                    std::process::exit(1);
                };
                title = Some(value.clone());
                i += 2;
            }
            other => {
                eprintln!("Unknown option: {}", other);
                std::process::exit(1);
            }
        }
    }

    let pgn = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            eprintln!("Cannot read {}: {}", path, e);
            std::process::exit(1);
        }
    };

    let games = match parse_pgn_string(&pgn) {
        Ok(games) => games,
        Err(e) => {
            eprintln!("Failed to parse {}: {}", path, e);
            std::process::exit(1);
        }
    };

    let game = &games[0];
    if games.len() > 1 {
        eprintln!("Note: {} games in file, importing the first", games.len());
    }

    let title = title.unwrap_or_else(|| game.default_title());
    let lesson = match lesson_from_moves(&title, &game.moves, student, max_plies) {
        Ok(lesson) => lesson,
        Err(e) => {
            eprintln!("Failed to build lesson: {}", e);
            std::process::exit(1);
        }
    };

    match serde_json::to_string_pretty(&lesson) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Failed to serialize lesson: {}", e);
            std::process::exit(1);
        }
    }
}
