//! SQLite storage for lesson progress

mod db;
mod models;

pub use db::Database;
pub use models::*;
