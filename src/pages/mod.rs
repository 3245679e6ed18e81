/*
 * Responsibility
 * - gate の背後に置くページの URL 構造
 * - /home (public), /login, /dashboard (private), fallback 404
 */
use axum::{Router, routing::get};

use crate::state::AppState;

pub mod extractors;
mod handlers;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/home", get(handlers::home))
        .route("/login", get(handlers::login))
        .route("/dashboard", get(handlers::dashboard))
        .fallback(handlers::not_found)
}
