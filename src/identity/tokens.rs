//! Signed bearer tokens for sessions and password resets.
//!
//! Format: `v1.<base64url(json claims)>.<base64url(hmac-sha256)>`.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;
const TOKEN_VERSION_V1: &str = "v1";
const MAX_TOKEN_LEN: usize = 2048;

/// What a token may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    Session,
    PasswordReset,
}

/// Token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account id
    pub sub: Uuid,
    pub email: String,
    pub purpose: TokenPurpose,
    /// Expiry, unix seconds
    pub exp: i64,
}

impl Claims {
    pub fn new(
        sub: Uuid,
        email: impl Into<String>,
        purpose: TokenPurpose,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            sub,
            email: email.into(),
            purpose,
            exp: (issued_at + ttl).timestamp(),
        }
    }
}

/// Issues and verifies bearer tokens.
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, claims: &Claims) -> Result<String, TokenError>;

    /// Verify signature, expiry and purpose.
    fn verify(
        &self,
        token: &str,
        purpose: TokenPurpose,
        now: DateTime<Utc>,
    ) -> Result<Claims, TokenError>;
}

/// HMAC-SHA256 token issuer keyed by a server secret.
pub struct HmacTokenIssuer {
    secret: Vec<u8>,
}

impl HmacTokenIssuer {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        HmacSha256::new_from_slice(&self.secret).map_err(|e| TokenError::Key(e.to_string()))
    }
}

impl TokenIssuer for HmacTokenIssuer {
    fn issue(&self, claims: &Claims) -> Result<String, TokenError> {
        let payload = serde_json::to_vec(claims).map_err(|e| TokenError::Payload(e.to_string()))?;
        let payload_part = URL_SAFE_NO_PAD.encode(payload);

        let mut mac = self.mac()?;
        mac.update(payload_part.as_bytes());
        let sig_part = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{TOKEN_VERSION_V1}.{payload_part}.{sig_part}"))
    }

    fn verify(
        &self,
        token: &str,
        purpose: TokenPurpose,
        now: DateTime<Utc>,
    ) -> Result<Claims, TokenError> {
        if token.len() > MAX_TOKEN_LEN {
            return Err(TokenError::Malformed);
        }

        let parts: Vec<&str> = token.split('.').collect();
        let (payload_part, sig_part) = match parts.as_slice() {
            [version, payload, sig] if *version == TOKEN_VERSION_V1 => (*payload, *sig),
            _ => return Err(TokenError::Malformed),
        };

        let signature = URL_SAFE_NO_PAD
            .decode(sig_part)
            .map_err(|_| TokenError::Malformed)?;
        let mut mac = self.mac()?;
        mac.update(payload_part.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::BadSignature)?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload_part)
            .map_err(|_| TokenError::Malformed)?;
        let claims: Claims =
            serde_json::from_slice(&payload).map_err(|e| TokenError::Payload(e.to_string()))?;

        if claims.purpose != purpose {
            return Err(TokenError::WrongPurpose);
        }
        if claims.exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

/// Token errors.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Malformed token")]
    Malformed,

    #[error("Token signature mismatch")]
    BadSignature,

    #[error("Token expired")]
    Expired,

    #[error("Token issued for a different purpose")]
    WrongPurpose,

    #[error("Invalid token payload: {0}")]
    Payload(String),

    #[error("Invalid signing key: {0}")]
    Key(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(purpose: TokenPurpose, now: DateTime<Utc>) -> Claims {
        Claims::new(Uuid::new_v4(), "a@b.co", purpose, now, Duration::hours(1))
    }

    #[test]
    fn test_issue_and_verify() {
        let issuer = HmacTokenIssuer::new("secret");
        let now = Utc::now();
        let claims = claims(TokenPurpose::Session, now);

        let token = issuer.issue(&claims).unwrap();
        assert!(token.starts_with("v1."));

        let verified = issuer.verify(&token, TokenPurpose::Session, now).unwrap();
        assert_eq!(verified, claims);
    }

    #[test]
    fn test_expired() {
        let issuer = HmacTokenIssuer::new("secret");
        let now = Utc::now();
        let token = issuer.issue(&claims(TokenPurpose::Session, now)).unwrap();

        let later = now + Duration::hours(1);
        assert!(matches!(
            issuer.verify(&token, TokenPurpose::Session, later),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn test_wrong_secret() {
        let now = Utc::now();
        let token = HmacTokenIssuer::new("one")
            .issue(&claims(TokenPurpose::Session, now))
            .unwrap();

        assert!(matches!(
            HmacTokenIssuer::new("two").verify(&token, TokenPurpose::Session, now),
            Err(TokenError::BadSignature)
        ));
    }

    #[test]
    fn test_purpose_is_enforced() {
        let issuer = HmacTokenIssuer::new("secret");
        let now = Utc::now();
        let token = issuer
            .issue(&claims(TokenPurpose::PasswordReset, now))
            .unwrap();

        assert!(matches!(
            issuer.verify(&token, TokenPurpose::Session, now),
            Err(TokenError::WrongPurpose)
        ));
    }

    #[test]
    fn test_tampered_payload() {
        let issuer = HmacTokenIssuer::new("secret");
        let now = Utc::now();
        let token = issuer.issue(&claims(TokenPurpose::Session, now)).unwrap();

        let forged = Claims::new(Uuid::new_v4(), "evil@b.co", TokenPurpose::Session, now, Duration::hours(1));
        let forged_part = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).unwrap());
        let sig = token.rsplit('.').next().unwrap();
        let tampered = format!("v1.{forged_part}.{sig}");

        assert!(matches!(
            issuer.verify(&tampered, TokenPurpose::Session, now),
            Err(TokenError::BadSignature)
        ));
    }

    #[test]
    fn test_malformed() {
        let issuer = HmacTokenIssuer::new("secret");
        for token in ["", "v1", "v2.a.b", "v1.a.b.c", "v1.!!.??"] {
            assert!(issuer.verify(token, TokenPurpose::Session, Utc::now()).is_err());
        }
    }
}
