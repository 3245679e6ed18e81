use axum_extra::extract::cookie::CookieJar;

use crate::services::auth::TokenVerifier;

use super::paths::PathRules;
use super::types::{AuthState, Evaluation, GateDecision, PathClass};

/// Access-token cookie names are `access.<workspace id>`.
pub const ACCESS_COOKIE_PREFIX: &str = "access.";

/// Per-request auth gate.
///
/// Immutable after construction; share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct RequestGate {
    verifier: TokenVerifier,
    rules: PathRules,
    cookie_name: String,
}

impl RequestGate {
    pub fn new(verifier: TokenVerifier, rules: PathRules, workspace_id: &str) -> Self {
        Self {
            verifier,
            rules,
            cookie_name: format!("{ACCESS_COOKIE_PREFIX}{workspace_id}"),
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn rules(&self) -> &PathRules {
        &self.rules
    }

    pub fn decide(&self, target: &str, cookies: &CookieJar) -> GateDecision {
        self.evaluate(target, cookies).decision
    }

    /// Classify, authenticate (unless exempt) and decide.
    pub fn evaluate(&self, target: &str, cookies: &CookieJar) -> Evaluation {
        let class = self.rules.classify(target);
        if class.is_exempt() {
            return Evaluation {
                class,
                auth: None,
                decision: GateDecision::Continue,
            };
        }

        let auth = self.authenticate(cookies);
        let decision = self.decision_for(class, &auth);

        Evaluation {
            class,
            auth: Some(auth),
            decision,
        }
    }

    /// Read the access cookie and verify it. An absent or empty cookie never
    /// reaches the verifier.
    pub fn authenticate(&self, cookies: &CookieJar) -> AuthState {
        let Some(token) = cookies
            .get(&self.cookie_name)
            .map(|cookie| cookie.value())
            .filter(|value| !value.is_empty())
        else {
            return AuthState::Unauthenticated;
        };

        match self.verifier.verify(token) {
            Ok(claims) => AuthState::from_claims(&claims),
            Err(_) => AuthState::Unauthenticated,
        }
    }

    fn decision_for(&self, class: PathClass, auth: &AuthState) -> GateDecision {
        match (class, auth.is_authenticated()) {
            (PathClass::Excluded | PathClass::Public, _) => GateDecision::Continue,
            (PathClass::Root, true) => self.to_dashboard(),
            (PathClass::Root, false) => self.to_login(),
            (PathClass::Private, false) => self.to_login(),
            (PathClass::Login, true) => self.to_dashboard(),
            _ => GateDecision::Continue,
        }
    }

    fn to_login(&self) -> GateDecision {
        GateDecision::RedirectTo(self.rules.login_path().to_string())
    }

    fn to_dashboard(&self) -> GateDecision {
        GateDecision::RedirectTo(self.rules.dashboard_path().to_string())
    }
}
