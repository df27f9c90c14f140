pub mod health;
pub mod sessions;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Interview session API
        .route("/api/v1/sessions", post(sessions::handle_create_session))
        .route("/api/v1/sessions/:id", get(sessions::handle_get_session))
        .route(
            "/api/v1/sessions/:id/answer",
            post(sessions::handle_submit_answer),
        )
        .route(
            "/api/v1/sessions/:id/skip",
            post(sessions::handle_skip_question),
        )
        .route(
            "/api/v1/sessions/:id/reset",
            post(sessions::handle_reset_session),
        )
        .route(
            "/api/v1/sessions/:id/report",
            post(sessions::handle_final_report),
        )
        .with_state(state)
}
