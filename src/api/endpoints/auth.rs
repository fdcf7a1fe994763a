//! Account and session endpoints.
//!
//! `POST /api/auth/signup` — create an account and open a session
//! `POST /api/auth/login` — verify credentials and open a session
//! `POST /api/auth/logout` — invalidate the presented session
//! `POST /api/auth/reset-request` — issue a password reset token
//! `POST /api/auth/reset` — consume a reset token, set a new password
//! `GET  /api/me` — the authenticated user's own profile

use axum::extract::State;
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, SessionContext};
use crate::auth;
use crate::db::repository::user as user_repo;
use crate::models::enums::UserRole;
use crate::models::UserProfile;
use crate::session;

#[derive(Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
    pub role: UserRole,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub user: UserProfile,
    pub token: String,
}

fn session_cookie(token: &str) -> HeaderValue {
    let max_age = session::SESSION_TTL_DAYS * 24 * 3600;
    HeaderValue::from_str(&format!(
        "{}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}",
        session::SESSION_COOKIE
    ))
    .expect("cookie value is ASCII")
}

fn expired_cookie() -> HeaderValue {
    HeaderValue::from_str(&format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        session::SESSION_COOKIE
    ))
    .expect("cookie value is ASCII")
}

fn session_response(user: UserProfile, token: String) -> Response {
    let cookie = session_cookie(&token);
    let mut response = Json(SessionResponse { user, token }).into_response();
    response.headers_mut().insert(header::SET_COOKIE, cookie);
    response
}

/// `POST /api/auth/signup`
pub async fn signup(
    State(ctx): State<ApiContext>,
    Json(request): Json<SignupRequest>,
) -> Result<Response, ApiError> {
    let conn = ctx.state.open_db()?;
    let now = chrono::Local::now().naive_local();

    let user = auth::create_account(
        &conn,
        &request.email,
        &request.password,
        &request.display_name,
        request.role,
        now,
    )?;
    let token = session::create_session(&conn, &user, now)?;

    Ok(session_response(user, token))
}

/// `POST /api/auth/login`
pub async fn login(
    State(ctx): State<ApiContext>,
    Json(request): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let conn = ctx.state.open_db()?;
    let now = chrono::Local::now().naive_local();

    let user = auth::authenticate(&conn, &request.email, &request.password)?;
    let token = session::create_session(&conn, &user, now)?;

    Ok(session_response(user, token))
}

/// `POST /api/auth/logout`
pub async fn logout(
    State(ctx): State<ApiContext>,
    Extension(session_ctx): Extension<SessionContext>,
) -> Result<Response, ApiError> {
    let conn = ctx.state.open_db()?;
    session::destroy_session(&conn, &session_ctx.token)?;

    let mut response = Json(serde_json::json!({ "status": "ok" })).into_response();
    response
        .headers_mut()
        .insert(header::SET_COOKIE, expired_cookie());
    Ok(response)
}

#[derive(Deserialize)]
pub struct ResetRequest {
    pub email: String,
}

/// `POST /api/auth/reset-request` — always answers 200 so the endpoint
/// cannot be used to probe which emails have accounts. Token delivery
/// (mail) is out of scope; the token is only persisted hashed.
pub async fn reset_request(
    State(ctx): State<ApiContext>,
    Json(request): Json<ResetRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let conn = ctx.state.open_db()?;
    let now = chrono::Local::now().naive_local();

    auth::request_password_reset(&conn, &request.email, now)?;
    Ok(Json(serde_json::json!({ "status": "ok" })))
}

#[derive(Deserialize)]
pub struct ResetConfirm {
    pub token: String,
    pub new_password: String,
}

/// `POST /api/auth/reset`
pub async fn reset(
    State(ctx): State<ApiContext>,
    Json(request): Json<ResetConfirm>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let conn = ctx.state.open_db()?;
    let now = chrono::Local::now().naive_local();

    auth::reset_password(&conn, &request.token, &request.new_password, now)?;
    Ok(Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /api/me`
pub async fn me(
    State(ctx): State<ApiContext>,
    Extension(session_ctx): Extension<SessionContext>,
) -> Result<Json<UserProfile>, ApiError> {
    let conn = ctx.state.open_db()?;
    let user = user_repo::get_user(&conn, &session_ctx.user_id)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(Json(user))
}
