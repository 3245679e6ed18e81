//! Fixtures shared by unit tests: RSA keys, token minting, a default gate.

use axum_extra::extract::cookie::{Cookie, CookieJar};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::Serialize;

use crate::gate::{PathRules, RequestGate};
use crate::services::auth::{TokenVerifier, VerifierOptions};

pub const ACCESS_PRIVATE_PEM: &str = include_str!("../tests/fixtures/access_private.pem");
pub const ACCESS_PUBLIC_PEM: &str = include_str!("../tests/fixtures/access_public.pem");
pub const ACCESS_PUBLIC_B64: &str = include_str!("../tests/fixtures/access_public.b64");
pub const FOREIGN_PRIVATE_PEM: &str = include_str!("../tests/fixtures/foreign_private.pem");

pub const WORKSPACE_ID: &str = "ws-test";

pub fn now() -> u64 {
    jsonwebtoken::get_current_timestamp()
}

pub fn sign_with<T: Serialize>(header: Header, key: &EncodingKey, claims: &T) -> String {
    jsonwebtoken::encode(&header, claims, key).unwrap()
}

/// RS256 token signed with the key matching [`verifier`].
pub fn sign_rs256<T: Serialize>(claims: &T) -> String {
    let key = EncodingKey::from_rsa_pem(ACCESS_PRIVATE_PEM.as_bytes()).unwrap();
    sign_with(Header::new(Algorithm::RS256), &key, claims)
}

pub fn verifier() -> TokenVerifier {
    TokenVerifier::from_encoded_key(ACCESS_PUBLIC_B64, &VerifierOptions::default()).unwrap()
}

pub fn gate() -> RequestGate {
    RequestGate::new(verifier(), PathRules::default(), WORKSPACE_ID)
}

pub fn jar_with_token(token: &str) -> CookieJar {
    CookieJar::new().add(Cookie::new(
        format!("access.{WORKSPACE_ID}"),
        token.to_string(),
    ))
}
