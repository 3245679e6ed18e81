/*
 * Responsibility
 * - `/api` 配下の URL 構造 (app 側で nest する)
 */
use axum::{Router, routing::get};

use crate::state::AppState;

mod handlers;

pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
