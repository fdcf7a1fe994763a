//! Route-guard middleware — session verification and role checks.
//!
//! `require_auth` extracts the bearer token from `Authorization: Bearer`
//! or the `session` cookie, verifies it against the sessions table, and
//! injects `SessionContext` into request extensions. Tampered, unknown or
//! expired tokens all read as unauthenticated. The role guards layer on
//! top and assume `require_auth` already ran.

use axum::http::{header, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, SessionContext};
use crate::session;

/// Require a valid session token.
///
/// Accesses `ApiContext` from request extensions (injected by the
/// Extension layer). On success: injects `SessionContext` and adds
/// `Cache-Control: no-store` to the response.
pub async fn require_auth(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_auth_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_auth_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let token = extract_token(&req).ok_or(ApiError::Unauthorized)?;

    let conn = ctx.state.open_db()?;
    let now = chrono::Local::now().naive_local();
    let session = session::verify_session(&conn, &token, now)?
        .ok_or(ApiError::Unauthorized)?;

    req.extensions_mut().insert(SessionContext {
        user_id: session.user_id,
        role: session.role,
        token,
    });

    let mut response = next.run(req).await;
    response
        .headers_mut()
        .insert("Cache-Control", HeaderValue::from_static("no-store"));

    Ok(response)
}

/// Require the session to belong to a lawyer. Layered inside
/// `require_auth`, which provides the `SessionContext`.
pub async fn require_lawyer(req: Request<axum::body::Body>, next: Next) -> Response {
    let allowed = match req.extensions().get::<SessionContext>() {
        Some(session) => session.is_lawyer(),
        None => return ApiError::Unauthorized.into_response(),
    };
    if !allowed {
        return ApiError::Forbidden.into_response();
    }
    next.run(req).await
}

/// Token from the Authorization header, falling back to the `session`
/// cookie for browser clients.
fn extract_token(req: &Request<axum::body::Body>) -> Option<String> {
    if let Some(token) = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        return Some(token.to_string());
    }

    let cookies = req.headers().get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == session::SESSION_COOKIE).then(|| value.to_string())
    })
}
