//! HS256 bearer token verification and signing.
//!
//! Tokens use the JWT compact form: `base64url(header).base64url(claims).base64url(mac)`,
//! where `mac` is HMAC-SHA256 over the first two segments with the shared secret.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::auth::claims::{Claims, SubjectId};
use crate::auth::error::AuthError;

type HmacSha256 = Hmac<Sha256>;

const BEARER: &str = "Bearer";
const ALGORITHM: &str = "HS256";

#[derive(Debug, Serialize, Deserialize)]
struct JoseHeader {
    alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
}

/// Validates `Authorization: Bearer <token>` headers against a shared secret.
#[derive(Clone)]
pub struct TokenVerifier {
    secret: Vec<u8>,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier").finish_non_exhaustive()
    }
}

impl TokenVerifier {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    /// Validate an Authorization header value against the system clock.
    pub fn validate(&self, authorization: Option<&str>) -> Result<SubjectId, AuthError> {
        self.validate_at(authorization, unix_now())
    }

    /// Validate an Authorization header value as of `now` (seconds since epoch).
    pub fn validate_at(
        &self,
        authorization: Option<&str>,
        now: u64,
    ) -> Result<SubjectId, AuthError> {
        let header = authorization
            .filter(|h| !h.is_empty())
            .ok_or(AuthError::MissingCredential)?;
        let token = bearer_token(header)?;
        let segments = Segments::split(token)?;

        let jose: JoseHeader = decode_json(segments.header)?;
        if jose.alg != ALGORITHM {
            return Err(AuthError::MalformedCredential);
        }

        self.verify_signature(segments.signing_input, segments.signature)?;

        let claims: Claims = decode_json(segments.payload)?;
        claims.subject_at(i64::try_from(now).unwrap_or(i64::MAX))
    }

    fn verify_signature(&self, signing_input: &str, signature: &str) -> Result<(), AuthError> {
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| AuthError::MalformedCredential)?;

        let mut mac = self.mac();
        mac.update(signing_input.as_bytes());
        // verify_slice compares in constant time
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::InvalidSignature)
    }

    fn mac(&self) -> HmacSha256 {
        <HmacSha256 as Mac>::new_from_slice(&self.secret).expect("HMAC accepts any key length")
    }

    /// Sign `claims` into a compact token.
    pub fn sign(&self, claims: &Claims) -> Result<String, serde_json::Error> {
        let header = JoseHeader {
            alg: ALGORITHM.to_string(),
            typ: Some("JWT".to_string()),
        };
        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?),
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?),
        );

        let mut mac = self.mac();
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{signing_input}.{signature}"))
    }
}

/// Mint a token for `subject` valid for `ttl` from now.
///
/// Issuance normally happens upstream; this exists for tooling and tests.
pub fn issue_token(secret: &str, subject: &str, ttl: Duration) -> Result<String, serde_json::Error> {
    let iat = i64::try_from(unix_now()).unwrap_or(i64::MAX);
    let exp = iat.saturating_add(i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX));
    TokenVerifier::new(secret).sign(&Claims::new(subject, iat, exp))
}

/// Current time in seconds since the epoch.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn bearer_token(header: &str) -> Result<&str, AuthError> {
    match header.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case(BEARER) && !token.is_empty() => {
            Ok(token)
        }
        _ => Err(AuthError::MalformedCredential),
    }
}

struct Segments<'a> {
    header: &'a str,
    payload: &'a str,
    signature: &'a str,
    signing_input: &'a str,
}

impl<'a> Segments<'a> {
    fn split(token: &'a str) -> Result<Self, AuthError> {
        let mut parts = token.split('.');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(header), Some(payload), Some(signature), None)
                if !header.is_empty() && !payload.is_empty() && !signature.is_empty() =>
            {
                Ok(Self {
                    header,
                    payload,
                    signature,
                    signing_input: &token[..header.len() + 1 + payload.len()],
                })
            }
            _ => Err(AuthError::MalformedCredential),
        }
    }
}

fn decode_json<T: DeserializeOwned>(segment: &str) -> Result<T, AuthError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| AuthError::MalformedCredential)?;
    serde_json::from_slice(&bytes).map_err(|_| AuthError::MalformedCredential)
}
