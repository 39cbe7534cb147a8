use askama::Template;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use chess_tutor_core::lesson::{load_lesson, DropOutcome, LessonSession, Mode};

use super::ApiError;
use crate::{ActiveLesson, AppState};

// ============================================================================
// TEMPLATES
// ============================================================================

#[derive(Template)]
#[template(path = "lesson.html")]
pub struct LessonTemplate {
    pub title: String,
    pub lesson_id: String,
    pub fen: String,
    pub explain: String,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub title: String,
    pub message: String,
}

// ============================================================================
// API TYPES
// ============================================================================

#[derive(Deserialize)]
pub struct MoveRequest {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub promotion: Option<String>,
}

impl MoveRequest {
    pub fn promotion_char(&self) -> Option<char> {
        self.promotion.as_deref().and_then(|s| s.chars().next())
    }
}

#[derive(Serialize)]
pub struct MoveResponse {
    pub ok: bool,
    /// The attempt was rejected; the board should re-sync to `fen`.
    pub snapback: bool,
    /// Authoritative position after the whole transition.
    pub fen: String,
    /// One line for the status log.
    pub status: String,
    /// Text for the explanation panel, when it changes.
    pub explain: Option<String>,
    /// Scripted reply that was applied; the board animates it after a
    /// short delay.
    pub reply: Option<String>,
    pub moves_played: usize,
    pub practice_enabled: bool,
    pub line_complete: bool,
    pub practice_complete: bool,
}

#[derive(Serialize)]
pub struct HintResponse {
    pub hint: Option<String>,
}

#[derive(Serialize)]
pub struct StateResponse {
    pub fen: String,
    pub mode: String,
    pub explain: String,
    pub status: String,
    pub practice_enabled: bool,
}

fn no_lesson() -> Response {
    (
        StatusCode::CONFLICT,
        Json(ApiError {
            error: "No lesson loaded".to_string(),
        }),
    )
        .into_response()
}

// ============================================================================
// HANDLERS
// ============================================================================

pub async fn lesson_page(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let path = state.config.lessons_dir.join(format!("{}.json", id));
    let session = load_lesson(&path).and_then(LessonSession::new);
    let session = match session {
        Ok(session) => session,
        Err(e) => {
            tracing::error!("cannot open lesson {}: {}", id, e);
            let template = ErrorTemplate {
                title: "Lesson not available".to_string(),
                message: e.to_string(),
            };
            return Html(template.render().unwrap());
        }
    };

    tracing::info!("lesson {} loaded", id);

    let template = LessonTemplate {
        title: session.title().to_string(),
        lesson_id: id.clone(),
        fen: session.fen(),
        explain: session
            .prompt()
            .unwrap_or("Make the first move.")
            .to_string(),
    };
    *state.lesson.lock().unwrap() = Some(ActiveLesson { id, session });

    Html(template.render().unwrap())
}

pub async fn drop_move(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MoveRequest>,
) -> Response {
    let mut guard = state.lesson.lock().unwrap();
    let Some(active) = guard.as_mut() else {
        return no_lesson();
    };

    let outcome = active
        .session
        .handle_drop(&req.from, &req.to, req.promotion_char());
    let fen = active.session.fen();
    let moves_played = active.session.moves_played();
    let practice_enabled = active.session.practice_unlocked();
    let practicing = active.session.mode() == Mode::Practice;

    let response = match outcome {
        DropOutcome::Snapback => MoveResponse {
            ok: false,
            snapback: true,
            fen,
            status: "Illegal move".to_string(),
            explain: None,
            reply: None,
            moves_played,
            practice_enabled,
            line_complete: false,
            practice_complete: false,
        },
        DropOutcome::LineDone => MoveResponse {
            ok: false,
            snapback: true,
            fen,
            status: "The scripted line is finished here.".to_string(),
            explain: None,
            reply: None,
            moves_played,
            practice_enabled,
            line_complete: false,
            practice_complete: false,
        },
        DropOutcome::Mistake { expected, hint } => {
            record_attempt(&state, &active.id, false);
            MoveResponse {
                ok: false,
                snapback: true,
                fen,
                status: format!("Expected {}", expected),
                explain: if practicing {
                    None
                } else {
                    hint.or_else(|| Some(format!("Not this one. The right move here is {}.", expected)))
                },
                reply: None,
                moves_played,
                practice_enabled,
                line_complete: false,
                practice_complete: false,
            }
        }
        DropOutcome::Advance(adv) => {
            record_attempt(&state, &active.id, true);
            if adv.line_complete {
                mark_completed(&state, &active.id, false);
            }
            if adv.practice_complete {
                mark_completed(&state, &active.id, true);
            }
            let explain = if adv.practice_complete {
                Some("Practice complete! Play it again or head back to the lesson list.".to_string())
            } else if adv.line_complete {
                Some("Main line complete. Try it without help.".to_string())
            } else {
                adv.explain
            };
            MoveResponse {
                ok: true,
                snapback: false,
                fen,
                status: format!("Correct: {}", adv.played),
                explain,
                reply: adv.reply,
                moves_played,
                practice_enabled: active.session.practice_unlocked(),
                line_complete: adv.line_complete,
                practice_complete: adv.practice_complete,
            }
        }
    };

    Json(response).into_response()
}

pub async fn hint(State(state): State<Arc<AppState>>) -> Response {
    let guard = state.lesson.lock().unwrap();
    let Some(active) = guard.as_ref() else {
        return no_lesson();
    };
    Json(HintResponse {
        hint: active.session.hint(),
    })
    .into_response()
}

pub async fn start_practice(State(state): State<Arc<AppState>>) -> Response {
    let mut guard = state.lesson.lock().unwrap();
    let Some(active) = guard.as_mut() else {
        return no_lesson();
    };
    if !active.session.start_practice() {
        return (
            StatusCode::CONFLICT,
            Json(ApiError {
                error: "Finish the guided line first".to_string(),
            }),
        )
            .into_response();
    }
    tracing::info!("lesson {} entered practice", active.id);
    Json(StateResponse {
        fen: active.session.fen(),
        mode: "practice".to_string(),
        explain: "Practice: replay the line without help.".to_string(),
        status: "Practice started.".to_string(),
        practice_enabled: true,
    })
    .into_response()
}

pub async fn reset(State(state): State<Arc<AppState>>) -> Response {
    let mut guard = state.lesson.lock().unwrap();
    let Some(active) = guard.as_mut() else {
        return no_lesson();
    };
    active.session.reset();
    Json(StateResponse {
        fen: active.session.fen(),
        mode: "guided".to_string(),
        explain: active
            .session
            .prompt()
            .unwrap_or("Make the first move.")
            .to_string(),
        status: "Position reset.".to_string(),
        practice_enabled: false,
    })
    .into_response()
}

fn record_attempt(state: &AppState, lesson_id: &str, correct: bool) {
    let db = state.db.lock().unwrap();
    if let Err(e) = db.record_attempt(lesson_id, correct) {
        tracing::error!("failed to record attempt for {}: {}", lesson_id, e);
    }
}

fn mark_completed(state: &AppState, lesson_id: &str, practice: bool) {
    let db = state.db.lock().unwrap();
    let result = if practice {
        db.mark_practice_completed(lesson_id)
    } else {
        db.mark_guided_completed(lesson_id)
    };
    if let Err(e) = result {
        tracing::error!("failed to record completion for {}: {}", lesson_id, e);
    }
}
