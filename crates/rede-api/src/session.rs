//! Bearer credentials.
//!
//! A credential has the shape
//!
//! ```text
//! Bearer APPTCSS$<signed token>$<YYYY-MM-DDThh:mm:ss±hhmm>
//! ```
//!
//! The session name rejects foreign credentials before any crypto runs, and
//! the trailing timestamp is a readable copy of the signed `exp` claim that
//! is checked first. Both expirations are checked against the same clock.
//! The signing key and TTL are read from the config store on every call.

use std::sync::Arc;

use axum::http::{HeaderMap, header};
use chrono::{DateTime, FixedOffset, SubsecRound, TimeDelta, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use rede_db::Database;
use rede_db::models::UserRow;
use rede_types::errors::ErrorCode;

use crate::duration;

pub const SESSION_NAME: &str = "APPTCSS";
pub const EXPIRATION_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";
pub const DEFAULT_SESSION_TTL: &str = "40m";

pub const SIGNING_KEY_CONFIG: &str = "login.chaveautenticacao";
pub const SESSION_TTL_CONFIG: &str = "login.tempoexpiracao";
pub const API_TOKEN_CONFIG: &str = "apitoken";

const BEARER: &str = "Bearer";

/// Payload of the signed token. Anything with extra or missing fields is
/// rejected.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct TokenClaims {
    user_id: i64,
    exp: i64,
}

/// A verified session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    pub user_id: i64,
    pub expires_at: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("authorization header missing")]
    MissingHeader,
    #[error("credential does not have three segments")]
    Malformed,
    #[error("credential belongs to another session")]
    ForeignSession,
    #[error("expiration timestamp is unreadable")]
    BadExpiration,
    #[error("credential expired")]
    Expired,
    #[error("signing key unavailable")]
    SigningKeyUnavailable,
    #[error("signed token rejected")]
    InvalidToken,
    #[error("failed to sign session token")]
    SignFailure,
}

impl SessionError {
    /// Legacy error code reported when minting fails.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::SigningKeyUnavailable => ErrorCode::SigningKeyUnavailable,
            Self::SignFailure => ErrorCode::SignFailure,
            _ => ErrorCode::Generic,
        }
    }
}

pub struct SessionManager {
    db: Arc<Database>,
    clock: Arc<dyn Clock + Send + Sync>,
    offset: FixedOffset,
}

impl SessionManager {
    /// `offset` is the zone the readable expiration is rendered in.
    pub fn new(db: Arc<Database>, clock: Arc<dyn Clock + Send + Sync>, offset: FixedOffset) -> Self {
        Self { db, clock, offset }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }

    pub fn ttl(&self) -> TimeDelta {
        duration::session_ttl(&self.db.get_config_or(SESSION_TTL_CONFIG, DEFAULT_SESSION_TTL))
    }

    fn signing_key(&self) -> Result<String, SessionError> {
        match self.db.get_config(SIGNING_KEY_CONFIG) {
            Ok(Some(key)) if !key.is_empty() => Ok(key),
            Ok(_) => {
                warn!("No session signing key configured");
                Err(SessionError::SigningKeyUnavailable)
            }
            Err(e) => {
                warn!("Failed to read session signing key: {}", e);
                Err(SessionError::SigningKeyUnavailable)
            }
        }
    }

    /// Mint a credential for `user_id`, valid until now + TTL.
    pub fn create_session(&self, user_id: i64) -> Result<String, SessionError> {
        let expires_at = (self.now() + self.ttl()).trunc_subsecs(0);
        let claims = TokenClaims {
            user_id,
            exp: expires_at.timestamp(),
        };

        let key = self.signing_key()?;
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(key.as_bytes()),
        )
        .map_err(|e| {
            warn!(user_id, "Failed to sign session token: {}", e);
            SessionError::SignFailure
        })?;

        let stamp = expires_at.with_timezone(&self.offset).format(EXPIRATION_FORMAT);
        Ok(format!("{} {}${}${}", BEARER, SESSION_NAME, token, stamp))
    }

    /// Check a raw `Authorization` header value.
    pub fn verify(&self, header_value: &str) -> Result<SessionClaims, SessionError> {
        let credential = header_value
            .strip_prefix(BEARER)
            .unwrap_or(header_value)
            .trim_start();

        let parts: Vec<&str> = credential.split('$').collect();
        let [name, token, stamp] = parts.as_slice() else {
            return Err(SessionError::Malformed);
        };

        if *name != SESSION_NAME {
            return Err(SessionError::ForeignSession);
        }

        let expires_at = DateTime::parse_from_str(stamp, EXPIRATION_FORMAT)
            .map_err(|_| SessionError::BadExpiration)?;
        let now = self.now();
        if now > expires_at.with_timezone(&Utc) {
            return Err(SessionError::Expired);
        }

        let key = self.signing_key()?;
        let mut validation = Validation::new(Algorithm::HS256);
        // exp is compared below against the injected clock
        validation.validate_exp = false;
        validation.leeway = 0;

        let data = decode::<TokenClaims>(token, &DecodingKey::from_secret(key.as_bytes()), &validation)
            .map_err(|e| {
                debug!("Token decode failed: {}", e);
                SessionError::InvalidToken
            })?;

        if data.claims.exp < now.timestamp() {
            return Err(SessionError::Expired);
        }

        Ok(SessionClaims {
            user_id: data.claims.user_id,
            expires_at,
        })
    }

    /// Resolve the session carried by a request. Every failure collapses to `None`.
    pub fn resolve(&self, headers: &HeaderMap) -> Option<SessionClaims> {
        let result = headers
            .get(header::AUTHORIZATION)
            .ok_or(SessionError::MissingHeader)
            .and_then(|v| v.to_str().map_err(|_| SessionError::Malformed))
            .and_then(|v| self.verify(v));

        match result {
            Ok(claims) => Some(claims),
            Err(e) => {
                warn!("Session rejected: {}", e);
                None
            }
        }
    }

    /// Active identity for `user_id`, or `None` if it is 0, missing or inactive.
    pub fn load_identity(&self, user_id: i64) -> Option<UserRow> {
        if user_id == 0 {
            return None;
        }
        match self.db.get_user(user_id) {
            Ok(Some(user)) if !user.inactive => Some(user),
            Ok(Some(_)) => {
                warn!(user_id, "Session belongs to an inactive user");
                None
            }
            Ok(None) => {
                warn!(user_id, "Session belongs to an unknown user");
                None
            }
            Err(e) => {
                warn!(user_id, "Failed to load session user: {}", e);
                None
            }
        }
    }

    /// The caller's identity, or `None` when the session does not resolve.
    pub fn current_user(&self, headers: &HeaderMap) -> Option<UserRow> {
        self.resolve(headers)
            .and_then(|claims| self.load_identity(claims.user_id))
    }
}
