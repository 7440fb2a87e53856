// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method},
    routing::{get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{dashboard, quiz},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Merges the quiz and dashboard sub-routers.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (store, question bank, sessions, config).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    let quiz_routes = Router::new()
        .route("/questions", get(quiz::list_questions))
        .route("/submit", post(quiz::submit_quiz))
        .route("/sessions", post(quiz::start_session))
        .route("/sessions/{id}", get(quiz::get_session))
        .route(
            "/sessions/{id}/answers/{question_index}",
            put(quiz::select_answer),
        )
        .route("/sessions/{id}/submit", post(quiz::submit_session))
        .route("/sessions/{id}/review", get(quiz::review_session));

    let dashboard_routes = Router::new()
        .route("/submissions", get(dashboard::list_submissions))
        .route("/submissions/{id}", get(dashboard::get_submission))
        .route("/export.csv", get(dashboard::export_submissions));

    Router::new()
        .nest("/api/quiz", quiz_routes)
        .nest("/api/dashboard", dashboard_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
