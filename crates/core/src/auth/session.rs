use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::{Identity, SessionRecord};
use crate::services::bounded;
use crate::store::RecordStore;
use crate::{Error, Result};

pub const SESSION_AUDIENCE: &str = "folio-session";

const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    sub: Uuid,
    sid: Uuid,
    email: String,
    name: Option<String>,
    aud: String,
    iat: i64,
    exp: i64,
}

/// Bearer credential handed to a client after sign-in.
#[derive(Debug, Clone, Serialize)]
pub struct SessionToken {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
}

/// A token that verified and whose session row still exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSession {
    pub session_id: Uuid,
    pub identity: Identity,
}

/// Issues and validates caller identity.
///
/// Tokens are HS256 JWTs; each names a row in the `sessions` table, so
/// deleting the row revokes the token before it expires.
#[derive(Clone)]
pub struct SessionProvider {
    records: Arc<dyn RecordStore>,
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
    store_timeout: Duration,
}

impl SessionProvider {
    pub fn new(records: Arc<dyn RecordStore>, secret: &[u8], ttl: Duration) -> Self {
        Self {
            records,
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    /// Bound on each session store call; expiry surfaces as `StoreUnavailable`.
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Record a new session for `identity` and mint its token.
    pub async fn issue(&self, identity: &Identity) -> Result<(SessionRecord, SessionToken)> {
        let now = Utc::now();
        let ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|e| Error::Internal(format!("session ttl out of range: {e}")))?;
        let record = SessionRecord {
            id: Uuid::new_v4(),
            user_id: identity.id,
            created_at: now,
            expires_at: now
                .checked_add_signed(ttl)
                .ok_or_else(|| Error::Internal("session expiry out of range".into()))?,
        };

        let claims = SessionClaims {
            sub: identity.id,
            sid: record.id,
            email: identity.email.clone(),
            name: identity.name.clone(),
            aud: SESSION_AUDIENCE.to_string(),
            iat: now.timestamp(),
            exp: record.expires_at.timestamp(),
        };
        let access_token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| Error::Internal(format!("failed to sign session token: {e}")))?;

        bounded(
            self.store_timeout,
            "insert_session",
            self.records.insert_session(&record),
        )
        .await?;

        let token = SessionToken {
            access_token,
            token_type: "bearer",
            expires_at: record.expires_at,
        };
        Ok((record, token))
    }

    /// Validate a bearer token.
    ///
    /// Bad signatures, wrong audience, expiry and revoked sessions all yield
    /// `Unauthenticated`. Store failures pass through unchanged.
    pub async fn resolve(&self, token: &str) -> Result<ResolvedSession> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[SESSION_AUDIENCE]);

        let claims = decode::<SessionClaims>(token, &self.decoding, &validation)
            .map_err(|e| {
                if matches!(e.kind(), ErrorKind::ExpiredSignature) {
                    tracing::debug!("session token expired");
                }
                Error::Unauthenticated
            })?
            .claims;

        let session = bounded(
            self.store_timeout,
            "get_session",
            self.records.get_session(claims.sid),
        )
        .await?
        .filter(|s| s.user_id == claims.sub && s.expires_at > Utc::now())
        .ok_or(Error::Unauthenticated)?;

        Ok(ResolvedSession {
            session_id: session.id,
            identity: Identity::new(claims.sub, claims.email, claims.name),
        })
    }

    pub async fn revoke(&self, session_id: Uuid) -> Result<()> {
        bounded(
            self.store_timeout,
            "delete_session",
            self.records.delete_session(session_id),
        )
        .await
    }
}
