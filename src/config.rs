/*
 * Responsibility
 * - 環境変数の読み込み (公開鍵、workspace id、パス規則、HTTP 設定など)
 * - 設定値のバリデーション (不足・不正なら起動失敗)
 * - 起動時に一度だけ組み立て、以降は read-only
 */
use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::gate::paths::{
    DEFAULT_DASHBOARD_PATH, DEFAULT_EXCLUDED_PREFIXES, DEFAULT_LOGIN_PATH, DEFAULT_PRIVATE_PAGES,
    DEFAULT_PUBLIC_PAGES,
};
use crate::gate::{PathRules, PathRulesError};
use crate::services::auth::VerifierOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(value: Option<String>) -> Self {
        match value
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
    Paths(PathRulesError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
            ConfigError::Paths(e) => write!(f, "invalid path rules: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Paths(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PathRulesError> for ConfigError {
    fn from(e: PathRulesError) -> Self {
        ConfigError::Paths(e)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    // Base for redirect `Location`s; falls back to the request Host when unset
    pub public_base_url: Option<Url>,
    pub request_timeout: Duration,

    // Base64 of the SPKI PEM. Validated when the verifier is built, so a
    // malformed key can fail closed outside production.
    pub access_jwt_public_key: Option<String>,
    pub workspace_id: String,
    pub verifier: VerifierOptions,

    pub paths: PathRules,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup (tests pass a map here).
    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = match var("PORT") {
            Some(s) => s.trim().parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 3000,
        };
        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(var("APP_ENV"));

        let public_base_url = non_empty(var("PUBLIC_BASE_URL"))
            .map(|s| Url::parse(&s).map_err(|_| ConfigError::Invalid("PUBLIC_BASE_URL")))
            .transpose()?;
        if public_base_url
            .as_ref()
            .is_some_and(|u| u.cannot_be_a_base())
        {
            return Err(ConfigError::Invalid("PUBLIC_BASE_URL"));
        }

        let request_timeout = Duration::from_secs(
            var("REQUEST_TIMEOUT_SECONDS")
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(30),
        );

        let access_jwt_public_key = non_empty(var("ACCESS_JWT_PUBLIC_KEY_BASE64"));

        let workspace_id =
            non_empty(var("WORKSPACE_ID")).ok_or(ConfigError::Missing("WORKSPACE_ID"))?;

        let verifier = VerifierOptions {
            issuer: non_empty(var("AUTH_ISSUER")),
            audience: non_empty(var("AUTH_AUDIENCE")),
            leeway_seconds: var("ACCESS_TOKEN_LEEWAY_SECONDS")
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(0),
        };

        let excluded_prefixes =
            list_or_default(var("EXCLUDED_PATH_PREFIXES"), DEFAULT_EXCLUDED_PREFIXES);
        let public_pages: HashSet<String> = list_or_default(var("PUBLIC_PAGES"), DEFAULT_PUBLIC_PAGES)
            .into_iter()
            .collect();
        let private_pages: HashSet<String> =
            list_or_default(var("PRIVATE_PAGES"), DEFAULT_PRIVATE_PAGES)
                .into_iter()
                .collect();
        let login_path =
            non_empty(var("LOGIN_PATH")).unwrap_or_else(|| DEFAULT_LOGIN_PATH.to_string());
        let dashboard_path =
            non_empty(var("DASHBOARD_PATH")).unwrap_or_else(|| DEFAULT_DASHBOARD_PATH.to_string());

        let paths = PathRules::new(
            excluded_prefixes,
            public_pages,
            private_pages,
            login_path,
            dashboard_path,
        )?;

        Ok(Self {
            addr,
            app_env,
            public_base_url,
            request_timeout,
            access_jwt_public_key,
            workspace_id,
            verifier,
            paths,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

// Comma-separated list; unset or blank falls back to the defaults.
fn list_or_default(value: Option<String>, defaults: &[&str]) -> Vec<String> {
    let items = value
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>();

    if items.is_empty() {
        defaults.iter().map(|s| s.to_string()).collect()
    } else {
        items
    }
}
