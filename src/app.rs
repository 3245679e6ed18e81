/*
 * Responsibility
 * - tracing / panic hook の初期化
 * - Config読み込み → 依存生成 (TokenVerifier → RequestGate) → Router 組み立て
 * - Middleware の適用 (gate, request id / trace / timeout)
 * - axum::serve() で起動、Ctrl-C / SIGTERM で graceful shutdown
 */
use std::{panic, process, sync::Arc, time::Duration};

use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::error::AppError;
use crate::gate::RequestGate;
use crate::services::auth::build_token_verifier;
use crate::state::AppState;
use crate::{api, middleware, pages};

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,auth_gate=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    // Keep the default hook as a fallback (prints to stderr with location/payload).
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // Development: crash the whole process so we notice immediately.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<(), AppError> {
    init_tracing();
    let config = Config::from_env()?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting gate in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config)?;
    let app = build_router(state, config.request_timeout);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

/// Build process-level services once; everything below is read-only.
pub fn build_state(config: &Config) -> Result<AppState, AppError> {
    let verifier = build_token_verifier(config)?;
    let has_key = verifier.has_key();
    let gate = RequestGate::new(verifier, config.paths.clone(), &config.workspace_id);

    tracing::info!(
        cookie = gate.cookie_name(),
        has_key,
        login = gate.rules().login_path(),
        dashboard = gate.rules().dashboard_path(),
        "request gate ready"
    );

    Ok(AppState::new(Arc::new(gate), config.public_base_url.clone()))
}

pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    let router = pages::routes().nest("/api", api::routes());
    let router = middleware::auth::access::apply(router, state.clone()).with_state(state);

    middleware::http::apply(router, request_timeout)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
