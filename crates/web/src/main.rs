use axum::{
    routing::{get, post},
    Router,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tower_http::services::ServeDir;

use chess_tutor_core::bot::DEFAULT_DEPTH;
use chess_tutor_core::{BotSession, Database, LessonSession, UciEngine};

mod routes;

pub struct AppState {
    pub db: Mutex<Database>,
    pub lesson: Mutex<Option<ActiveLesson>>,
    pub bot: Mutex<BotSession>,
    /// Spawned lazily on the first bot move; `try_lock` keeps a single
    /// search in flight.
    pub engine: Mutex<Option<UciEngine>>,
    pub config: Config,
}

pub struct ActiveLesson {
    pub id: String,
    pub session: LessonSession,
}

pub struct Config {
    pub lessons_dir: PathBuf,
    pub engine_path: String,
    pub search_depth: u8,
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = Config {
        lessons_dir: PathBuf::from(env_or("LESSONS_DIR", "lessons")),
        engine_path: env_or("ENGINE_PATH", "stockfish"),
        search_depth: env_or("SEARCH_DEPTH", &DEFAULT_DEPTH.to_string())
            .parse()
            .unwrap_or(DEFAULT_DEPTH),
    };
    let db_path = env_or("DATABASE_PATH", "chess_tutor.db");
    let bind = env_or("BIND_ADDR", "127.0.0.1:3000");

    let db = Database::open(&db_path).expect("Failed to open database");
    let search_depth = config.search_depth;

    let state = Arc::new(AppState {
        db: Mutex::new(db),
        lesson: Mutex::new(None),
        bot: Mutex::new(BotSession::new(search_depth)),
        engine: Mutex::new(None),
        config,
    });

    let app = Router::new()
        .route("/", get(routes::index))
        .route("/health", get(routes::health))
        .route("/lesson/:id", get(routes::lesson::lesson_page))
        .route("/api/lesson/move", post(routes::lesson::drop_move))
        .route("/api/lesson/hint", get(routes::lesson::hint))
        .route("/api/lesson/practice", post(routes::lesson::start_practice))
        .route("/api/lesson/reset", post(routes::lesson::reset))
        .route("/bot", get(routes::bot::bot_page))
        .route("/api/bot/new", post(routes::bot::new_game))
        .route("/api/bot/move", post(routes::bot::drop_move))
        .nest_service("/static", ServeDir::new("crates/web/static"))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .unwrap();

    tracing::info!("Server running at http://{}", bind);

    axum::serve(listener, app).await.unwrap();
}
