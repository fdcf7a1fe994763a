//! Identity provider — account creation, credential verification and
//! password reset, backed by PBKDF2-SHA256 password hashing.
//!
//! Stored hash format: `base64(salt)$base64(derived_key)`. Verification
//! re-derives with the stored salt and compares in constant time.

use base64::Engine;
use chrono::{Duration, NaiveDateTime};
use pbkdf2::pbkdf2_hmac;
use rusqlite::Connection;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;
use uuid::Uuid;

use crate::db::repository::{session as session_repo, user as user_repo};
use crate::db::DatabaseError;
use crate::models::enums::UserRole;
use crate::models::UserProfile;
use crate::sanitize::sanitize_text;
use crate::session::{generate_token, hash_token};

pub const PBKDF2_ITERATIONS: u32 = 600_000;
pub const KEY_LENGTH: usize = 32;
pub const SALT_LENGTH: usize = 16;

const MIN_PASSWORD_LENGTH: usize = 8;
const RESET_TOKEN_TTL_HOURS: i64 = 1;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("An account with this email already exists")]
    EmailTaken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid account data: {0}")]
    Validation(String),

    #[error("Reset token invalid or expired")]
    InvalidResetToken,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Derive a storable password hash with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    use rand::RngCore;
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    encode_hash(&salt, password)
}

fn encode_hash(salt: &[u8; SALT_LENGTH], password: &str) -> String {
    let mut key = [0u8; KEY_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ITERATIONS, &mut key);
    let b64 = base64::engine::general_purpose::URL_SAFE_NO_PAD;
    format!("{}${}", b64.encode(salt), b64.encode(key))
}

/// Constant-time password verification against a stored hash.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let b64 = base64::engine::general_purpose::URL_SAFE_NO_PAD;
    let Some((salt_b64, key_b64)) = stored.split_once('$') else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (b64.decode(salt_b64), b64.decode(key_b64)) else {
        return false;
    };
    let Ok(salt) = <[u8; SALT_LENGTH]>::try_from(salt) else {
        return false;
    };

    let mut key = [0u8; KEY_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, PBKDF2_ITERATIONS, &mut key);
    key.ct_eq(expected.as_slice()).into()
}

fn validate_email(email: &str) -> Result<(), AuthError> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err(AuthError::Validation("Invalid email address".into()));
    };
    if local.is_empty() || domain.is_empty() || !domain.contains('.') || email.contains(' ') {
        return Err(AuthError::Validation("Invalid email address".into()));
    }
    Ok(())
}

/// Create a new account. The display name is sanitized; the password is
/// never stored, only its derived hash.
pub fn create_account(
    conn: &Connection,
    email: &str,
    password: &str,
    display_name: &str,
    role: UserRole,
    now: NaiveDateTime,
) -> Result<UserProfile, AuthError> {
    let email = email.trim().to_lowercase();
    validate_email(&email)?;

    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    let display_name = sanitize_text(display_name, 100);
    if display_name.is_empty() {
        return Err(AuthError::Validation("Display name is required".into()));
    }

    let user = UserProfile {
        id: Uuid::new_v4().to_string(),
        email,
        display_name,
        role,
        photo_url: None,
        phone: None,
        created_at: now,
        updated_at: now,
    };

    let hash = hash_password(password);
    match user_repo::insert_user(conn, &user, &hash) {
        Ok(()) => {
            tracing::info!(user_id = %user.id, role = role.as_str(), "Account created");
            Ok(user)
        }
        Err(e) if e.is_constraint_violation() => Err(AuthError::EmailTaken),
        Err(e) => Err(e.into()),
    }
}

/// Verify credentials. Unknown email and wrong password are
/// indistinguishable to the caller.
pub fn authenticate(
    conn: &Connection,
    email: &str,
    password: &str,
) -> Result<UserProfile, AuthError> {
    let email = email.trim().to_lowercase();
    let Some((user, stored_hash)) = user_repo::get_user_by_email(conn, &email)? else {
        return Err(AuthError::InvalidCredentials);
    };

    if !verify_password(password, &stored_hash) {
        return Err(AuthError::InvalidCredentials);
    }

    Ok(user)
}

/// Issue a one-time password reset token (1-hour expiry). For an unknown
/// email this is a silent no-op so the endpoint cannot be used to probe
/// which addresses have accounts. Token delivery is out of scope.
pub fn request_password_reset(
    conn: &Connection,
    email: &str,
    now: NaiveDateTime,
) -> Result<Option<String>, AuthError> {
    let email = email.trim().to_lowercase();
    let Some((user, _)) = user_repo::get_user_by_email(conn, &email)? else {
        return Ok(None);
    };

    let token = generate_token();
    session_repo::insert_password_reset(
        conn,
        &hash_token(&token),
        &user.id,
        now,
        now + Duration::hours(RESET_TOKEN_TTL_HOURS),
    )?;

    tracing::info!(user_id = %user.id, "Password reset token issued");
    Ok(Some(token))
}

/// Consume a reset token and set the new password.
pub fn reset_password(
    conn: &Connection,
    token: &str,
    new_password: &str,
    now: NaiveDateTime,
) -> Result<(), AuthError> {
    if new_password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    let user_id = session_repo::consume_password_reset(conn, &hash_token(token), now)?
        .ok_or(AuthError::InvalidResetToken)?;

    user_repo::set_password_hash(conn, &user_id, &hash_password(new_password), now)?;
    tracing::info!(user_id = %user_id, "Password reset completed");
    Ok(())
}
