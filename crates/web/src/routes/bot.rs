use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use chess_tutor_core::{BotSession, UciEngine};

use super::lesson::MoveRequest;
use super::ApiError;
use crate::AppState;

#[derive(Template)]
#[template(path = "bot.html")]
pub struct BotTemplate {
    pub title: String,
    pub fen: String,
}

#[derive(Serialize)]
pub struct BotMoveResponse {
    pub ok: bool,
    pub snapback: bool,
    pub fen: String,
    /// Engine reply as a UCI token; the board animates it after a delay.
    pub reply: Option<String>,
    pub evaluation: Option<String>,
    pub status: String,
    pub game_over: bool,
}

#[derive(Serialize)]
pub struct BotStateResponse {
    pub fen: String,
}

pub async fn bot_page(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let fen = state.bot.lock().unwrap().fen();
    let template = BotTemplate {
        title: "Play the Engine".to_string(),
        fen,
    };
    Html(template.render().unwrap())
}

pub async fn new_game(State(state): State<Arc<AppState>>) -> Response {
    let mut bot = state.bot.lock().unwrap();
    *bot = BotSession::new(state.config.search_depth);
    tracing::info!("bot game restarted");
    Json(BotStateResponse { fen: bot.fen() }).into_response()
}

pub async fn drop_move(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MoveRequest>,
) -> Response {
    let mut bot = state.bot.lock().unwrap();

    if bot.player_move(&req.from, &req.to, req.promotion_char()).is_none() {
        return Json(BotMoveResponse {
            ok: false,
            snapback: true,
            fen: bot.fen(),
            reply: None,
            evaluation: None,
            status: "Illegal move".to_string(),
            game_over: false,
        })
        .into_response();
    }

    let info = bot.info();
    if info.is_checkmate || info.is_stalemate {
        let status = if info.is_checkmate {
            "Checkmate - you win!"
        } else {
            "Stalemate."
        };
        return Json(BotMoveResponse {
            ok: true,
            snapback: false,
            fen: bot.fen(),
            reply: None,
            evaluation: None,
            status: status.to_string(),
            game_over: true,
        })
        .into_response();
    }

    // One search in flight; a second request is refused rather than queued.
    let Ok(mut engine_guard) = state.engine.try_lock() else {
        bot.take_back();
        return (
            StatusCode::CONFLICT,
            Json(ApiError {
                error: "Engine is busy, try again".to_string(),
            }),
        )
            .into_response();
    };

    if engine_guard.is_none() {
        match UciEngine::new(&state.config.engine_path) {
            Ok(engine) => *engine_guard = Some(engine),
            Err(e) => {
                tracing::error!("failed to start engine: {}", e);
                bot.take_back();
                return (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(ApiError {
                        error: format!("Engine unavailable: {}", e),
                    }),
                )
                    .into_response();
            }
        }
    }
    let engine = engine_guard.as_mut().unwrap();

    match bot.engine_reply(engine) {
        Ok(Some(reply)) => {
            let status = if reply.game_over {
                format!("Engine plays {} - game over.", reply.uci)
            } else {
                format!("Engine plays {}", reply.uci)
            };
            Json(BotMoveResponse {
                ok: true,
                snapback: false,
                fen: bot.fen(),
                reply: Some(reply.uci),
                evaluation: Some(reply.evaluation.to_string()),
                status,
                game_over: reply.game_over,
            })
            .into_response()
        }
        Ok(None) => Json(BotMoveResponse {
            ok: true,
            snapback: false,
            fen: bot.fen(),
            reply: None,
            evaluation: None,
            status: "Engine has no move - game over.".to_string(),
            game_over: true,
        })
        .into_response(),
        Err(e) => {
            tracing::error!("engine search failed: {}", e);
            bot.take_back();
            Json(BotMoveResponse {
                ok: false,
                snapback: true,
                fen: bot.fen(),
                reply: None,
                evaluation: None,
                status: format!("Engine error, move taken back: {}", e),
                game_over: false,
            })
            .into_response()
        }
    }
}
