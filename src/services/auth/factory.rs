//! Factory: build `TokenVerifier` from application `Config`.
//!
//! Production refuses to start without usable key material. Elsewhere a bad
//! key is logged and every verification fails closed.
use crate::config::Config;
use crate::services::auth::{KeyError, TokenVerifier};

pub fn build_token_verifier(config: &Config) -> Result<TokenVerifier, KeyError> {
    let loaded = config
        .access_jwt_public_key
        .as_deref()
        .ok_or(KeyError::Missing)
        .and_then(|encoded| TokenVerifier::from_encoded_key(encoded, &config.verifier));

    match loaded {
        Ok(verifier) => Ok(verifier),
        Err(err) if config.app_env.is_production() => Err(err),
        Err(err) => {
            tracing::error!(
                error = %err,
                "access token public key unusable; all requests will be treated as unauthenticated"
            );
            Ok(TokenVerifier::unavailable(&config.verifier))
        }
    }
}
