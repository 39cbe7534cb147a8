use askama::Template;
use axum::{
    extract::State,
    response::{Html, IntoResponse},
};
use serde::Serialize;
use std::sync::Arc;

use chess_tutor_core::lesson::list_lessons;

use crate::AppState;

pub mod bot;
pub mod lesson;

/// Error body shared by the JSON endpoints
#[derive(Serialize)]
pub struct ApiError {
    pub error: String,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub title: String,
    pub lessons: Vec<LessonRow>,
}

pub struct LessonRow {
    pub id: String,
    pub title: String,
    pub attempts: u32,
    pub accuracy: u32,
    pub guided_completed: bool,
    pub practice_completed: bool,
    pub last_played: String,
}

pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let entries = match list_lessons(&state.config.lessons_dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::error!(
                "cannot list lessons in {}: {}",
                state.config.lessons_dir.display(),
                e
            );
            Vec::new()
        }
    };

    let db = state.db.lock().unwrap();
    let lessons: Vec<LessonRow> = entries
        .into_iter()
        .map(|entry| {
            let progress = db.get_progress(&entry.id).ok().flatten();
            match progress {
                Some(p) => LessonRow {
                    id: entry.id,
                    title: entry.title,
                    attempts: p.attempts,
                    accuracy: p.accuracy(),
                    guided_completed: p.guided_completed,
                    practice_completed: p.practice_completed,
                    last_played: chrono::DateTime::from_timestamp(p.last_played_at as i64, 0)
                        .map(|d| d.format("%Y-%m-%d").to_string())
                        .unwrap_or_default(),
                },
                None => LessonRow {
                    id: entry.id,
                    title: entry.title,
                    attempts: 0,
                    accuracy: 0,
                    guided_completed: false,
                    practice_completed: false,
                    last_played: "-".to_string(),
                },
            }
        })
        .collect();

    let template = IndexTemplate {
        title: "Chess Tutor".to_string(),
        lessons,
    };
    Html(template.render().unwrap())
}

pub async fn health() -> &'static str {
    "OK"
}
