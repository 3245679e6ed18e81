use base64::{Engine as _, engine::general_purpose::STANDARD};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// The only signing algorithm access tokens may declare.
pub const ACCESS_TOKEN_ALGORITHM: Algorithm = Algorithm::RS256;

/// Errors raised while turning configured key material into a `DecodingKey`.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("public key is not configured")]
    Missing,
    #[error("public key is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
    #[error("decoded public key is not UTF-8 PEM text")]
    NotUtf8,
    #[error("invalid RSA public key pem: {0}")]
    InvalidPem(jsonwebtoken::errors::Error),
}

/// Why an access token was not accepted.
///
/// Callers must treat every variant exactly like a missing token.
#[derive(Debug, Error)]
pub enum VerificationFailure {
    #[error("empty token")]
    EmptyToken,
    #[error("no usable public key configured")]
    KeyUnavailable,
    #[error("jwt verification failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

/// Access token (JWT) claims.
///
/// NOTE:
/// - `userId` is the authentication signal. Some issuers emit it as a number,
///   so it is kept as a raw JSON value and normalized by [`Claims::user_id`].
/// - `exp` is the only registered claim typed here; `sub`, `iss`, `iat` and the
///   rest stay in `extra` as raw JSON.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Claims {
    #[serde(default, rename = "userId")]
    pub raw_user_id: Option<Value>,

    #[serde(default)]
    pub exp: Option<u64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    /// Non-empty user id, if the token carries one.
    ///
    /// Empty strings and a numeric `0` count as absent.
    pub fn user_id(&self) -> Option<String> {
        match self.raw_user_id.as_ref()? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Optional claim checks layered on top of signature/algorithm/`exp`.
#[derive(Debug, Clone, Default)]
pub struct VerifierOptions {
    pub issuer: Option<String>,
    pub audience: Option<String>,
    pub leeway_seconds: u64,
}

/// RS256 access-token verifier.
///
/// - Key material is intentionally not printable via Debug.
/// - A verifier built with [`TokenVerifier::unavailable`] rejects everything.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: Option<DecodingKey>,
    validation: Validation,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("TokenVerifier")
            .field("has_key", &self.decoding_key.is_some())
            .field("validation", &self.validation)
            .finish()
    }
}

impl TokenVerifier {
    pub fn new(decoding_key: DecodingKey, options: &VerifierOptions) -> Self {
        Self {
            decoding_key: Some(decoding_key),
            validation: build_validation(options),
        }
    }

    /// Parse configured key material (base64 of an SPKI PEM, or the PEM itself).
    pub fn from_encoded_key(encoded: &str, options: &VerifierOptions) -> Result<Self, KeyError> {
        let key = decode_public_key(encoded)?;
        Ok(Self::new(key, options))
    }

    /// Fail-closed verifier used when key material is missing or malformed.
    pub fn unavailable(options: &VerifierOptions) -> Self {
        Self {
            decoding_key: None,
            validation: build_validation(options),
        }
    }

    pub fn has_key(&self) -> bool {
        self.decoding_key.is_some()
    }

    /// Verify and decode an access token.
    ///
    /// `jsonwebtoken::Validation` checks:
    /// - signature against the configured RSA key
    /// - header `alg` is exactly RS256 (`none`, HS*, other RS/ES variants fail)
    /// - `exp`/`nbf` when present, `iss`/`aud` when configured
    ///
    /// Failures are logged here and returned as a value, never raised.
    pub fn verify(&self, token: &str) -> Result<Claims, VerificationFailure> {
        self.verify_inner(token).inspect_err(|err| {
            tracing::warn!(error = %err, "access token verification failed");
        })
    }

    fn verify_inner(&self, token: &str) -> Result<Claims, VerificationFailure> {
        if token.trim().is_empty() {
            return Err(VerificationFailure::EmptyToken);
        }
        let key = self
            .decoding_key
            .as_ref()
            .ok_or(VerificationFailure::KeyUnavailable)?;

        let data = jsonwebtoken::decode::<Claims>(token, key, &self.validation)?;
        Ok(data.claims)
    }
}

fn build_validation(options: &VerifierOptions) -> Validation {
    let mut validation = Validation::new(ACCESS_TOKEN_ALGORITHM);
    validation.leeway = options.leeway_seconds;
    validation.validate_nbf = true;

    // `exp` is honored when present but not mandatory.
    let mut required = Vec::new();
    if let Some(issuer) = options.issuer.as_deref() {
        validation.set_issuer(&[issuer]);
        required.push("iss");
    }
    match options.audience.as_deref() {
        Some(audience) => {
            validation.set_audience(&[audience]);
            required.push("aud");
        }
        None => validation.validate_aud = false,
    }
    validation.set_required_spec_claims(&required);

    validation
}

/// Decode the configured public key.
///
/// Accepts base64 of the PEM text (whitespace tolerated) or a raw PEM whose
/// newlines may be escaped as `\n`.
pub fn decode_public_key(encoded: &str) -> Result<DecodingKey, KeyError> {
    let trimmed = encoded.trim();
    if trimmed.is_empty() {
        return Err(KeyError::Missing);
    }

    let pem = if trimmed.starts_with("-----BEGIN") {
        trimmed.replace("\\n", "\n")
    } else {
        let compact: String = trimmed.split_whitespace().collect();
        let bytes = STANDARD.decode(compact.as_bytes())?;
        String::from_utf8(bytes).map_err(|_| KeyError::NotUtf8)?
    };

    DecodingKey::from_rsa_pem(pem.as_bytes()).map_err(KeyError::InvalidPem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use crate::test_support::{
        ACCESS_PRIVATE_PEM, ACCESS_PUBLIC_B64, ACCESS_PUBLIC_PEM, FOREIGN_PRIVATE_PEM, now,
        sign_rs256, sign_with, verifier,
    };
    use jsonwebtoken::{EncodingKey, Header};
    use serde_json::json;

    #[test]
    fn test_valid_token_yields_original_claims() {
        let token = sign_rs256(&json!({
            "userId": "u1",
            "exp": now() + 600,
            "mode": "live",
            "authorization": { "roles": ["admin"] },
        }));

        let claims = verifier().verify(&token).unwrap();
        assert_eq!(claims.user_id().as_deref(), Some("u1"));
        assert_eq!(claims.extra["mode"], json!("live"));
        assert_eq!(claims.extra["authorization"], json!({ "roles": ["admin"] }));
    }

    #[test]
    fn test_token_without_exp_is_accepted() {
        let token = sign_rs256(&json!({ "userId": "u1" }));
        let claims = verifier().verify(&token).unwrap();
        assert_eq!(claims.exp, None);
    }

    #[test]
    fn test_flipped_signature_byte_fails() {
        let token = sign_rs256(&json!({ "userId": "u1", "exp": now() + 600 }));
        let (head, signature) = token.rsplit_once('.').unwrap();
        let mut sig = signature.as_bytes().to_vec();
        // Flip a character in the middle so the base64url stays well-formed.
        let mid = sig.len() / 2;
        sig[mid] = if sig[mid] == b'A' { b'B' } else { b'A' };
        let tampered = format!("{head}.{}", String::from_utf8(sig).unwrap());

        let err = verifier().verify(&tampered).unwrap_err();
        assert!(matches!(err, VerificationFailure::Jwt(_)));
    }

    #[test]
    fn test_expired_token_fails() {
        let token = sign_rs256(&json!({ "userId": "u1", "exp": now() - 3600 }));
        let err = verifier().verify(&token).unwrap_err();
        match err {
            VerificationFailure::Jwt(e) => assert!(matches!(
                e.kind(),
                jsonwebtoken::errors::ErrorKind::ExpiredSignature
            )),
            other => panic!("unexpected failure: {other:?}"),
        }
    }

    #[test]
    fn test_not_yet_valid_token_fails() {
        let token = sign_rs256(&json!({
            "userId": "u1",
            "nbf": now() + 3600,
            "exp": now() + 7200,
        }));
        let err = verifier().verify(&token).unwrap_err();
        match err {
            VerificationFailure::Jwt(e) => assert!(matches!(
                e.kind(),
                jsonwebtoken::errors::ErrorKind::ImmatureSignature
            )),
            other => panic!("unexpected failure: {other:?}"),
        }

        let started = sign_rs256(&json!({ "userId": "u1", "nbf": now() - 60 }));
        assert!(verifier().verify(&started).is_ok());
    }

    #[test]
    fn test_leeway_applies_to_expiry() {
        let token = sign_rs256(&json!({ "userId": "u1", "exp": now() - 5 }));
        let lenient = VerifierOptions {
            leeway_seconds: 30,
            ..VerifierOptions::default()
        };
        let verifier_with = |options: &VerifierOptions| {
            TokenVerifier::from_encoded_key(ACCESS_PUBLIC_B64, options).unwrap()
        };

        assert!(verifier_with(&lenient).verify(&token).is_ok());
        assert!(verifier_with(&VerifierOptions::default()).verify(&token).is_err());
    }

    #[test]
    fn test_untyped_registered_claims_are_kept_raw() {
        let token = sign_rs256(&json!({ "userId": "u1", "sub": 123, "iat": now() }));
        let claims = verifier().verify(&token).unwrap();
        assert_eq!(claims.user_id().as_deref(), Some("u1"));
        assert_eq!(claims.extra["sub"], json!(123));
        assert!(claims.extra.contains_key("iat"));
    }

    #[test]
    fn test_other_rsa_algorithm_fails() {
        let key = EncodingKey::from_rsa_pem(ACCESS_PRIVATE_PEM.as_bytes()).unwrap();
        let token = sign_with(Header::new(Algorithm::RS384), &key, &json!({ "userId": "u1" }));
        assert!(verifier().verify(&token).is_err());
    }

    #[test]
    fn test_hmac_keyed_with_public_key_fails() {
        // Classic algorithm confusion: HS256 using the RSA public key as secret.
        let key = EncodingKey::from_secret(ACCESS_PUBLIC_PEM.as_bytes());
        let token = sign_with(Header::new(Algorithm::HS256), &key, &json!({ "userId": "u1" }));
        assert!(verifier().verify(&token).is_err());
    }

    #[test]
    fn test_alg_none_fails() {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(br#"{"userId":"u1"}"#);
        let token = format!("{header}.{payload}.");
        assert!(verifier().verify(&token).is_err());
    }

    #[test]
    fn test_token_signed_by_foreign_key_fails() {
        let key = EncodingKey::from_rsa_pem(FOREIGN_PRIVATE_PEM.as_bytes()).unwrap();
        let token = sign_with(Header::new(Algorithm::RS256), &key, &json!({ "userId": "u1" }));
        assert!(verifier().verify(&token).is_err());
    }

    #[test]
    fn test_malformed_and_empty_tokens_fail() {
        assert!(matches!(
            verifier().verify(""),
            Err(VerificationFailure::EmptyToken)
        ));
        assert!(verifier().verify("not-a-jwt").is_err());
        assert!(verifier().verify("a.b.c").is_err());
    }

    #[test]
    fn test_unavailable_verifier_fails_closed() {
        let verifier = TokenVerifier::unavailable(&VerifierOptions::default());
        let token = sign_rs256(&json!({ "userId": "u1" }));
        assert!(!verifier.has_key());
        assert!(matches!(
            verifier.verify(&token),
            Err(VerificationFailure::KeyUnavailable)
        ));
    }

    #[test]
    fn test_issuer_and_audience_checked_when_configured() {
        let options = VerifierOptions {
            issuer: Some("https://issuer.example".to_string()),
            audience: Some("web".to_string()),
            leeway_seconds: 0,
        };
        let verifier = TokenVerifier::from_encoded_key(ACCESS_PUBLIC_B64, &options).unwrap();

        let good = sign_rs256(&json!({
            "userId": "u1", "iss": "https://issuer.example", "aud": "web",
        }));
        let wrong_aud = sign_rs256(&json!({
            "userId": "u1", "iss": "https://issuer.example", "aud": "mobile",
        }));
        let no_iss = sign_rs256(&json!({ "userId": "u1", "aud": "web" }));

        assert!(verifier.verify(&good).is_ok());
        assert!(verifier.verify(&wrong_aud).is_err());
        assert!(verifier.verify(&no_iss).is_err());
    }

    #[test]
    fn test_aud_ignored_without_configured_audience() {
        let token = sign_rs256(&json!({ "userId": "u1", "aud": "anything" }));
        assert!(verifier().verify(&token).is_ok());
    }

    #[test]
    fn test_user_id_normalization() {
        let claims = |v: Value| Claims {
            raw_user_id: Some(v),
            ..Claims::default()
        };
        assert_eq!(claims(json!("abc")).user_id().as_deref(), Some("abc"));
        assert_eq!(claims(json!(42)).user_id().as_deref(), Some("42"));
        assert_eq!(claims(json!("")).user_id(), None);
        assert_eq!(claims(json!(0)).user_id(), None);
        assert_eq!(claims(json!(null)).user_id(), None);
        assert_eq!(Claims::default().user_id(), None);
    }

    #[test]
    fn test_decode_public_key_variants() {
        assert!(decode_public_key(ACCESS_PUBLIC_B64).is_ok());
        assert!(decode_public_key(ACCESS_PUBLIC_PEM).is_ok());
        assert!(decode_public_key(&ACCESS_PUBLIC_PEM.replace('\n', "\\n")).is_ok());

        assert!(matches!(decode_public_key("   "), Err(KeyError::Missing)));
        assert!(matches!(
            decode_public_key("%%%not base64%%%"),
            Err(KeyError::InvalidBase64(_))
        ));
        let garbage = STANDARD.encode("-----BEGIN PUBLIC KEY-----\nAAAA\n-----END PUBLIC KEY-----\n");
        assert!(matches!(
            decode_public_key(&garbage),
            Err(KeyError::InvalidPem(_))
        ));
    }
}
