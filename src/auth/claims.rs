//! Bearer token claims.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::auth::error::AuthError;

/// Opaque identifier of an authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Token payload as issued upstream.
///
/// `user_id` is the subject the issuer writes; the registered `sub` claim
/// is honoured when `user_id` is absent. Times are seconds since the epoch;
/// fractional values are accepted and rounded down.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "numeric_date"
    )]
    pub exp: Option<i64>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "numeric_date"
    )]
    pub iat: Option<i64>,
}

impl Claims {
    /// Claims for `subject` issued at `iat`, expiring at `exp`.
    pub fn new(subject: impl Into<String>, iat: i64, exp: i64) -> Self {
        Self {
            user_id: Some(subject.into()),
            sub: None,
            exp: Some(exp),
            iat: Some(iat),
        }
    }

    /// Check freshness against `now` and return the subject.
    pub fn subject_at(&self, now: i64) -> Result<SubjectId, AuthError> {
        match self.exp {
            Some(exp) if exp > now => {}
            _ => return Err(AuthError::ExpiredCredential),
        }

        self.user_id
            .as_deref()
            .or(self.sub.as_deref())
            .filter(|id| !id.is_empty())
            .map(SubjectId::new)
            .ok_or(AuthError::MissingSubject)
    }
}

/// JSON NumericDate: integer or fractional seconds.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumericDate {
    Whole(i64),
    Fractional(f64),
}

fn numeric_date<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        Option::<NumericDate>::deserialize(deserializer)?.map(|date| match date {
            NumericDate::Whole(secs) => secs,
            // `as` saturates out-of-range floats.
            NumericDate::Fractional(secs) => secs.floor() as i64,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_must_be_strictly_after_now() {
        let claims = Claims::new("u-1", 0, 100);
        assert_eq!(claims.subject_at(99), Ok(SubjectId::new("u-1")));
        assert_eq!(claims.subject_at(100), Err(AuthError::ExpiredCredential));
        assert_eq!(claims.subject_at(101), Err(AuthError::ExpiredCredential));
    }

    #[test]
    fn missing_expiry_is_expired() {
        let claims = Claims {
            user_id: Some("u-1".into()),
            ..Claims::default()
        };
        assert_eq!(claims.subject_at(0), Err(AuthError::ExpiredCredential));
    }

    #[test]
    fn falls_back_to_registered_subject() {
        let claims = Claims {
            sub: Some("u-2".into()),
            exp: Some(10),
            ..Claims::default()
        };
        assert_eq!(claims.subject_at(0), Ok(SubjectId::new("u-2")));
    }

    #[test]
    fn fractional_times_round_down() {
        let claims: Claims =
            serde_json::from_str(r#"{"user_id":"u-1","exp":1700000000.5,"iat":1699990000.25}"#)
                .unwrap();
        assert_eq!(claims.exp, Some(1_700_000_000));
        assert_eq!(claims.iat, Some(1_699_990_000));
        assert_eq!(claims.subject_at(1_699_999_999), Ok(SubjectId::new("u-1")));
        assert_eq!(claims.subject_at(1_700_000_000), Err(AuthError::ExpiredCredential));
    }

    #[test]
    fn non_numeric_time_is_rejected() {
        let parsed = serde_json::from_str::<Claims>(r#"{"user_id":"u-1","exp":"tomorrow"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn empty_subject_is_missing() {
        let mut claims = Claims::new("", 0, 10);
        assert_eq!(claims.subject_at(0), Err(AuthError::MissingSubject));

        claims.user_id = None;
        assert_eq!(claims.subject_at(0), Err(AuthError::MissingSubject));
    }
}
