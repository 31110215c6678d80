//! HTTP routes: lobby page, health, websocket upgrade, static assets.

use std::sync::Arc;

use askama::Template;
use axum::http::{header, Method};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{extract::State, Router};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::{self, GameSettings, DURATION_OPTIONS};
use crate::game::Category;
use crate::room::RoomManager;
use crate::ws::connection::ws_handler;

#[derive(Clone)]
pub struct AppState {
    pub rooms: Arc<RoomManager>,
}

impl AppState {
    pub fn new(settings: GameSettings) -> Self {
        Self { rooms: Arc::new(RoomManager::new(settings)) }
    }
}

struct DurationChoice {
    seconds: u32,
    selected: bool,
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    categories: Vec<Category>,
    durations: Vec<DurationChoice>,
}

pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    let default = state.rooms.settings().default_duration;
    let mut durations: Vec<DurationChoice> = DURATION_OPTIONS
        .iter()
        .map(|&seconds| DurationChoice { seconds, selected: seconds == default })
        .collect();
    if !DURATION_OPTIONS.contains(&default) {
        durations.push(DurationChoice { seconds: default, selected: true });
    }
    IndexTemplate { categories: Category::ALL.to_vec(), durations }
}

pub async fn healthz() -> &'static str { "ok" }

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/healthz", get(healthz))
        .route("/ws", get(ws_handler))
        .nest_service("/static", ServeDir::new(config::static_dir()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_methods([Method::GET])
                        .allow_headers([header::CONTENT_TYPE])
                        .allow_origin(Any),
                ),
        )
        .with_state(state)
}
