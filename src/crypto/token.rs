use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::session::SessionPayload;

/// The only algorithm tokens are signed and accepted with.
const ALGORITHM: Algorithm = Algorithm::HS256;

/// Default lifetime of a signed token.
pub const DEFAULT_TTL_HOURS: i64 = 24;

/// Why a token was not accepted.
///
/// Callers treat every variant as "no valid session".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("token is malformed")]
    MalformedToken,
}

/// Claims carried by a session token: the payload plus the JWT time claims.
#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    #[serde(flatten)]
    payload: SessionPayload,
    iat: i64,
    exp: i64,
}

/// Signs and verifies session tokens with a single symmetric key.
///
/// Built once at startup and shared read-only between requests.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenCodec {
    /// Creates a codec keyed by `secret`, issuing tokens valid for `ttl`.
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    /// The lifetime of issued tokens.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Signs `payload`, issued now.
    pub fn sign(&self, payload: &SessionPayload) -> Result<String, TokenError> {
        self.sign_at(payload, Utc::now())
    }

    /// Signs `payload` with `iat = issued_at` and `exp = issued_at + ttl`.
    pub fn sign_at(
        &self,
        payload: &SessionPayload,
        issued_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = SessionClaims {
            payload: payload.clone(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.ttl).timestamp(),
        };

        jsonwebtoken::encode(&Header::new(ALGORITHM), &claims, &self.encoding_key).map_err(
            |e| {
                tracing::error!("Failed to sign session token: {}", e);
                TokenError::MalformedToken
            },
        )
    }

    /// Verifies signature, algorithm and both expirations of `token`.
    pub fn verify(&self, token: &str) -> Result<SessionPayload, TokenError> {
        let claims = jsonwebtoken::decode::<SessionClaims>(
            token,
            &self.decoding_key,
            &self.validation,
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                TokenError::InvalidSignature
            }
            _ => TokenError::MalformedToken,
        })?
        .claims;

        if claims.payload.is_expired_at(Utc::now()) {
            return Err(TokenError::Expired);
        }

        Ok(claims.payload)
    }
}
