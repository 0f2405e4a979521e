//! carehub-api
//!
//! JSON-over-HTTP surface for the form engine: template authoring and
//! publishing, and form sessions with draft save and submission.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::middleware as axum_mw;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

pub use state::AppState;

/// Build the service router over `state`.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route(
            "/templates",
            get(routes::templates::list_templates).post(routes::templates::create_template),
        )
        .route("/templates/{id}", get(routes::templates::get_template))
        .route("/templates/{id}/edits", post(routes::templates::apply_edits))
        .route(
            "/templates/{id}/publish",
            post(routes::templates::publish_template),
        )
        .route("/templates/{id}/enabled", put(routes::templates::set_enabled))
        .route("/forms", post(routes::forms::open_form))
        .route(
            "/forms/{id}",
            get(routes::forms::get_form).delete(routes::forms::close_form),
        )
        .route("/forms/{id}/submission", get(routes::forms::get_submission))
        .route(
            "/forms/{id}/responses/{item_id}",
            put(routes::forms::put_response),
        )
        .route("/forms/{id}/draft", post(routes::forms::save_draft))
        .route("/forms/{id}/submit", post(routes::forms::submit_form))
        .layer(axum_mw::from_fn(middleware::request_log::request_log))
        .layer(cors)
        .with_state(state)
}
