//! access cookie（JWT）検証 → Continue / Redirect
//!
//! - `Cookie: access.<workspace>=<jwt>` を読み、`RequestGate` に判定を委ねる
//! - Continue: 認証済みなら `AuthCtx` を extensions に入れて次へ
//! - RedirectTo: `307 Temporary Redirect`、Location は base URL で解決した絶対 URL
//!
//! 検証失敗はここでは error にしない（未認証として扱うだけ）。

use axum::{
    Router,
    body::Body,
    extract::{OriginalUri, State},
    http::{HeaderMap, Request, header},
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use url::Url;

use crate::gate::{AuthState, GateDecision};
use crate::pages::extractors::AuthCtx;
use crate::state::AppState;

/// Router 全体に gate を掛ける。
///
/// 例：
/// ```ignore
/// let router = pages::routes().nest("/api", api::routes());
/// let router = middleware::auth::access::apply(router, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    OriginalUri(original_uri): OriginalUri,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    // root 判定のため query も含めた target を渡す
    let target = original_uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| original_uri.path());

    let jar = CookieJar::from_headers(req.headers());
    let evaluation = state.gate.evaluate(target, &jar);

    tracing::debug!(
        path = %original_uri.path(),
        class = evaluation.class.as_str(),
        authenticated = evaluation.auth.as_ref().map(AuthState::is_authenticated),
        decision = ?evaluation.decision,
        "gate evaluated"
    );

    match evaluation.decision {
        GateDecision::Continue => {
            if let Some(user_id) = evaluation.auth.as_ref().and_then(AuthState::user_id) {
                // middleware → extractor への受け渡し
                req.extensions_mut().insert(AuthCtx::new(user_id.to_string()));
            }
            next.run(req).await
        }
        GateDecision::RedirectTo(path) => {
            let location =
                redirect_location(state.public_base_url.as_deref(), req.headers(), &path);
            Redirect::temporary(&location).into_response()
        }
    }
}

/// Resolve `path` against the configured base URL, or the request's own
/// origin (`Host` + `x-forwarded-proto`). Falls back to the bare path.
pub(crate) fn redirect_location(base: Option<&Url>, headers: &HeaderMap, path: &str) -> String {
    base.cloned()
        .or_else(|| request_base_url(headers))
        .and_then(|base| base.join(path).ok())
        .map(String::from)
        .unwrap_or_else(|| path.to_string())
}

fn request_base_url(headers: &HeaderMap) -> Option<Url> {
    let host = headers.get(header::HOST)?.to_str().ok()?.trim();
    if host.is_empty() {
        return None;
    }

    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|proto| matches!(*proto, "http" | "https"))
        .unwrap_or("http");

    let base = Url::parse(&format!("{scheme}://{host}/")).ok()?;
    // Reject Host values that smuggle a path, userinfo or query.
    (base.path() == "/" && base.username().is_empty() && base.query().is_none()).then_some(base)
}
