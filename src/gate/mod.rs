/*!
 * Request gate
 *
 * Responsibility:
 * - Classify the request target (excluded / public / root / private / login)
 * - Authenticate from the `access.<workspace>` cookie via `TokenVerifier`
 * - Decide Continue or RedirectTo(path)
 *
 * HTTP concerns (cookie header parsing, redirect responses) live in
 * `middleware::auth::access`.
 */

mod request_gate;
pub mod paths;
mod types;

pub use request_gate::{ACCESS_COOKIE_PREFIX, RequestGate};
pub use paths::{PathRules, PathRulesError};
pub use types::{AuthState, Evaluation, GateDecision, PathClass};
