//! Static path classification rules.
//!
//! Rules are checked in [`CLASSIFICATION_ORDER`]; the first class whose rule
//! matches wins, otherwise the target is [`PathClass::Other`].
//!
//! The root rule looks at the whole target (`/`, `/?…`, `/#…`). Every other
//! rule only sees the path component, with query and fragment stripped.

use std::collections::HashSet;

use thiserror::Error;

use super::types::PathClass;

/// Reserved prefixes (without the leading `/`) that bypass gating entirely.
///
/// Matching is a raw string prefix: `icon` also covers `/icons/…`.
pub const DEFAULT_EXCLUDED_PREFIXES: &[&str] = &[
    "api",
    "_next/static",
    "favicon.ico",
    "manifest",
    "icon",
    "static",
    "mergn",
];
pub const DEFAULT_PUBLIC_PAGES: &[&str] = &["/home"];
pub const DEFAULT_PRIVATE_PAGES: &[&str] = &["/dashboard"];
pub const DEFAULT_LOGIN_PATH: &str = "/login";
pub const DEFAULT_DASHBOARD_PATH: &str = "/dashboard";

pub const CLASSIFICATION_ORDER: [PathClass; 5] = [
    PathClass::Excluded,
    PathClass::Public,
    PathClass::Root,
    PathClass::Private,
    PathClass::Login,
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathRulesError {
    #[error("path must start with '/': {0}")]
    NotAbsolute(String),
    #[error("excluded path prefix must not be empty")]
    EmptyPrefix,
    #[error("private page {0} is also matched by the login rule (redirect loop)")]
    PrivateLoginPage(String),
    #[error("dashboard path {0} is matched by the login rule (redirect loop)")]
    DashboardIsLogin(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRules {
    excluded_prefixes: Vec<String>,
    public_pages: HashSet<String>,
    private_pages: HashSet<String>,
    login_path: String,
    dashboard_path: String,
}

impl Default for PathRules {
    fn default() -> Self {
        Self {
            excluded_prefixes: owned_list(DEFAULT_EXCLUDED_PREFIXES),
            public_pages: owned_list(DEFAULT_PUBLIC_PAGES).into_iter().collect(),
            private_pages: owned_list(DEFAULT_PRIVATE_PAGES).into_iter().collect(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            dashboard_path: DEFAULT_DASHBOARD_PATH.to_string(),
        }
    }
}

impl PathRules {
    /// Build and validate a rule set.
    ///
    /// Excluded prefixes may be given with or without their leading `/`.
    pub fn new(
        excluded_prefixes: Vec<String>,
        public_pages: HashSet<String>,
        private_pages: HashSet<String>,
        login_path: String,
        dashboard_path: String,
    ) -> Result<Self, PathRulesError> {
        let excluded_prefixes = excluded_prefixes
            .into_iter()
            .map(|p| p.trim_start_matches('/').to_string())
            .collect();

        let rules = Self {
            excluded_prefixes,
            public_pages,
            private_pages,
            login_path,
            dashboard_path,
        };
        rules.validate()?;
        Ok(rules)
    }

    fn validate(&self) -> Result<(), PathRulesError> {
        if self.excluded_prefixes.iter().any(|p| p.is_empty()) {
            return Err(PathRulesError::EmptyPrefix);
        }

        let absolute = self
            .public_pages
            .iter()
            .chain(&self.private_pages)
            .chain([&self.login_path, &self.dashboard_path]);
        for path in absolute {
            if !path.starts_with('/') {
                return Err(PathRulesError::NotAbsolute(path.clone()));
            }
        }

        if let Some(page) = self.private_pages.iter().find(|p| self.is_login(p)) {
            return Err(PathRulesError::PrivateLoginPage(page.clone()));
        }
        if self.is_login(&self.dashboard_path) {
            return Err(PathRulesError::DashboardIsLogin(self.dashboard_path.clone()));
        }

        Ok(())
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    pub fn dashboard_path(&self) -> &str {
        &self.dashboard_path
    }

    /// Classify a request target (path, optionally with query/fragment).
    pub fn classify(&self, target: &str) -> PathClass {
        let path = path_component(target);
        CLASSIFICATION_ORDER
            .into_iter()
            .find(|class| self.matches(*class, target, path))
            .unwrap_or(PathClass::Other)
    }

    fn matches(&self, class: PathClass, target: &str, path: &str) -> bool {
        match class {
            PathClass::Excluded => self.is_excluded(path),
            PathClass::Public => self.public_pages.contains(path),
            PathClass::Root => is_root(target),
            PathClass::Private => self.private_pages.contains(path),
            PathClass::Login => self.is_login(path),
            PathClass::Other => true,
        }
    }

    fn is_excluded(&self, path: &str) -> bool {
        path.strip_prefix('/').is_some_and(|rest| {
            self.excluded_prefixes
                .iter()
                .any(|prefix| rest.starts_with(prefix.as_str()))
        })
    }

    /// Segment-aware: `/login`, `/login/`, `/login/reset`, never `/loginx`.
    fn is_login(&self, path: &str) -> bool {
        path.strip_prefix(self.login_path.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }
}

/// `/` alone or followed only by a query or fragment.
fn is_root(target: &str) -> bool {
    target == "/" || target.starts_with("/?") || target.starts_with("/#")
}

fn path_component(target: &str) -> &str {
    target
        .find(['?', '#'])
        .map_or(target, |end| &target[..end])
}

fn owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
