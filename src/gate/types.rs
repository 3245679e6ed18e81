/*
 * Responsibility
 * - Per-request values produced by the gate (PathClass / AuthState / GateDecision)
 * - No state lives here; everything is computed fresh for each request
 */
use crate::services::auth::Claims;

/// Classification of a request target, first match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathClass {
    /// Reserved prefix (api, static assets, framework internals, icons)
    Excluded,
    /// Page that never requires authentication
    Public,
    /// `/`, optionally followed by a query or fragment
    Root,
    /// Page that requires authentication
    Private,
    /// The login page or anything below it
    Login,
    Other,
}

impl PathClass {
    /// Exempt classes short-circuit before any token lookup.
    pub fn is_exempt(self) -> bool {
        matches!(self, Self::Excluded | Self::Public)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Excluded => "excluded",
            Self::Public => "public",
            Self::Root => "root",
            Self::Private => "private",
            Self::Login => "login",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Authenticated { user_id: String },
    Unauthenticated,
}

impl AuthState {
    /// Authenticated only when the verified claims carry a non-empty `userId`.
    pub fn from_claims(claims: &Claims) -> Self {
        match claims.user_id() {
            Some(user_id) => Self::Authenticated { user_id },
            None => Self::Unauthenticated,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::Authenticated { user_id } => Some(user_id),
            Self::Unauthenticated => None,
        }
    }
}

/// What the HTTP layer should do with the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Continue,
    /// Absolute path; the HTTP layer resolves it against the request's base URL.
    RedirectTo(String),
}

/// Full result of one gate evaluation.
///
/// `auth` is `None` when the target was exempt and no token was looked at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub class: PathClass,
    pub auth: Option<AuthState>,
    pub decision: GateDecision,
}
