use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::ServiceContext;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::{SessionProvider, SessionToken};
use crate::document::validate::ValidationError;
use crate::identity::{Identity, NewUser, Profile};
use crate::{Error, Result};

const MIN_PASSWORD_LEN: usize = 6;
const MIN_NAME_LEN: usize = 2;
const MAX_NAME_LEN: usize = 50;

/// Result of a successful sign-in.
#[derive(Debug, Clone, Serialize)]
pub struct SignIn {
    pub user: Profile,
    pub session: SessionToken,
}

/// Account creation and session lifecycle.
#[derive(Clone)]
pub struct AuthService {
    ctx: ServiceContext,
    sessions: SessionProvider,
}

fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(ValidationError::InvalidEmail.into()),
    }
}

impl AuthService {
    pub fn new(ctx: ServiceContext, sessions: SessionProvider) -> Self {
        Self { ctx, sessions }
    }

    pub async fn sign_up(&self, email: &str, password: &str, name: &str) -> Result<Profile> {
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::PasswordTooShort(MIN_PASSWORD_LEN).into());
        }
        let name = name.trim();
        let name_len = name.chars().count();
        if !(MIN_NAME_LEN..=MAX_NAME_LEN).contains(&name_len) {
            return Err(ValidationError::NameLength {
                min: MIN_NAME_LEN,
                max: MAX_NAME_LEN,
            }
            .into());
        }

        let password_hash = hash_password(password)?;
        let user = self
            .ctx
            .call(
                "insert_user",
                self.ctx.stores.records.insert_user(NewUser {
                    email,
                    name: name.to_string(),
                    password_hash,
                }),
            )
            .await?;

        info!(user_id = %user.id, "user signed up");
        Ok(user.profile())
    }

    /// Check credentials, open a session and wait until it resolves.
    ///
    /// Unknown email and wrong password produce the same error.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SignIn> {
        let email = normalize_email(email).map_err(|_| Error::Unauthenticated)?;
        let user = self
            .ctx
            .call(
                "find_user_by_email",
                self.ctx.stores.records.find_user_by_email(&email),
            )
            .await?
            .filter(|user| verify_password(password, &user.password_hash))
            .ok_or_else(|| {
                warn!("sign-in rejected: invalid credentials");
                Error::Unauthenticated
            })?;

        let profile = user.profile();
        let identity = Identity::from(profile.clone());
        let (record, token) = self.sessions.issue(&identity).await?;

        let sessions = &self.sessions;
        let access_token = token.access_token.as_str();
        let established = self
            .ctx
            .config
            .session_verify
            .run_until(|_| async move {
                match sessions.resolve(access_token).await {
                    Ok(resolved) => Ok(Some(resolved)),
                    Err(Error::Unauthenticated) => Ok(None),
                    Err(err) => Err(err),
                }
            })
            .await;
        if established.is_none() {
            warn!(session_id = %record.id, "session could not be established");
            return Err(Error::StoreUnavailable(
                "session could not be established".into(),
            ));
        }

        info!(user_id = %user.id, session_id = %record.id, "user signed in");
        Ok(SignIn {
            user: profile,
            session: token,
        })
    }

    pub async fn sign_out(&self, session_id: Uuid) -> Result<()> {
        self.sessions.revoke(session_id).await?;
        info!(%session_id, "user signed out");
        Ok(())
    }
}
