use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::CookieJar;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use folio_core::auth::ResolvedSession;
use folio_core::identity::Identity;
use folio_core::Error;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "session";

/// Token from `Authorization: Bearer`, else from the session cookie.
async fn session_token(parts: &mut Parts, state: &AppState) -> Option<String> {
    if let Ok(TypedHeader(Authorization(bearer))) =
        TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state).await
    {
        return Some(bearer.token().to_string());
    }
    CookieJar::from_headers(&parts.headers)
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
}

/// A caller with a live session. Rejects with 401 otherwise.
pub struct Session {
    pub id: Uuid,
    pub identity: Identity,
}

impl FromRequestParts<AppState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = session_token(parts, state).await.ok_or(Error::Unauthenticated)?;
        let ResolvedSession {
            session_id,
            identity,
        } = state.sessions().resolve(&token).await?;
        Ok(Session {
            id: session_id,
            identity,
        })
    }
}

/// Optional caller. Missing, invalid or expired tokens all mean anonymous.
pub struct MaybeCaller(pub Option<Identity>);

impl MaybeCaller {
    pub fn identity(&self) -> Option<&Identity> {
        self.0.as_ref()
    }
}

impl FromRequestParts<AppState> for MaybeCaller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(token) = session_token(parts, state).await else {
            return Ok(MaybeCaller(None));
        };
        match state.sessions().resolve(&token).await {
            Ok(resolved) => Ok(MaybeCaller(Some(resolved.identity))),
            Err(Error::Unauthenticated) => {
                tracing::debug!("ignoring unusable session token on optional-auth route");
                Ok(MaybeCaller(None))
            }
            Err(err) => Err(err.into()),
        }
    }
}
