//! Session layer — opaque, time-limited bearer tokens binding `{uid, role}`.
//!
//! Tokens are 32 bytes of entropy, handed to the client once and stored
//! server-side only as SHA-256 hashes. A tampered token hashes to an
//! unknown value and an expired one fails the expiry check; both are
//! treated as unauthenticated.

use base64::Engine;
use chrono::{Duration, NaiveDateTime};
use rusqlite::Connection;
use sha2::{Digest, Sha256};

use crate::db::repository::session as session_repo;
use crate::db::repository::session::SessionRow;
use crate::db::DatabaseError;
use crate::models::UserProfile;

/// Session validity: 7 days.
pub const SESSION_TTL_DAYS: i64 = 7;

/// Cookie name under which browsers carry the token.
pub const SESSION_COOKIE: &str = "session";

/// Generate a random bearer token (URL-safe base64, 32 bytes of entropy).
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Hash a bearer token for storage using SHA-256.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Issue a new session for an authenticated user. Returns the raw token;
/// only its hash is persisted. Expired rows are swept opportunistically.
pub fn create_session(
    conn: &Connection,
    user: &UserProfile,
    now: NaiveDateTime,
) -> Result<String, DatabaseError> {
    let purged = session_repo::purge_expired_sessions(conn, now)?;
    if purged > 0 {
        tracing::debug!(purged, "Swept expired sessions");
    }

    let token = generate_token();
    session_repo::insert_session(
        conn,
        &hash_token(&token),
        &user.id,
        user.role,
        now,
        now + Duration::days(SESSION_TTL_DAYS),
    )?;
    Ok(token)
}

/// Verify a presented token. Returns the bound identity, or `None` for
/// unknown, tampered or expired tokens.
pub fn verify_session(
    conn: &Connection,
    token: &str,
    now: NaiveDateTime,
) -> Result<Option<SessionRow>, DatabaseError> {
    let hash = hash_token(token);
    let Some(session) = session_repo::get_session(conn, &hash)? else {
        return Ok(None);
    };

    if session.expires_at < now {
        session_repo::delete_session(conn, &hash)?;
        return Ok(None);
    }

    Ok(Some(session))
}

/// Invalidate a session (logout). Unknown tokens are ignored.
pub fn destroy_session(conn: &Connection, token: &str) -> Result<(), DatabaseError> {
    session_repo::delete_session(conn, &hash_token(token))
}
