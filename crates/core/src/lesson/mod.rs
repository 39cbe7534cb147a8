//! Scripted lesson playback

pub mod loader;
pub mod session;
pub mod types;

pub use loader::{list_lessons, load_lesson, LessonEntry};
pub use session::{Advance, DropOutcome, LessonSession, Mode};
pub use types::{Lesson, Practice, Step};
