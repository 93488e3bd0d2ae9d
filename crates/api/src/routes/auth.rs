use axum::extract::rejection::JsonRejection;
use axum::{extract::State, routing::post, Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use folio_core::identity::Profile;
use folio_core::services::SignIn;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::extract::{Session, SESSION_COOKIE};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(sign_up))
        .route("/auth/signin", post(sign_in))
        .route("/auth/signout", post(sign_out))
}

#[derive(Debug, Deserialize)]
struct SignUpBody {
    email: String,
    password: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct SignInBody {
    email: String,
    password: String,
}

fn session_cookie(value: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

async fn sign_up(
    State(state): State<AppState>,
    body: Result<Json<SignUpBody>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(body) = body?;
    let user: Profile = state
        .services()
        .auth
        .sign_up(&body.email, &body.password, &body.name)
        .await?;
    Ok(Json(json!({ "user": user })))
}

async fn sign_in(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Result<Json<SignInBody>, JsonRejection>,
) -> ApiResult<(CookieJar, Json<SignIn>)> {
    let Json(body) = body?;
    let signed_in = state
        .services()
        .auth
        .sign_in(&body.email, &body.password)
        .await?;
    let jar = jar.add(session_cookie(signed_in.session.access_token.clone()));
    Ok((jar, Json(signed_in)))
}

async fn sign_out(
    State(state): State<AppState>,
    session: Session,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Json<Value>)> {
    state.services().auth.sign_out(session.id).await?;
    let jar = jar.remove(session_cookie(String::new()));
    Ok((jar, Json(json!({ "status": "signed out" }))))
}
