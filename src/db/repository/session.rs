use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};

use super::{format_datetime, parse_datetime};
use crate::db::DatabaseError;
use crate::models::enums::UserRole;

/// A verified session row: who the token belongs to and until when.
#[derive(Debug, Clone)]
pub struct SessionRow {
    pub user_id: String,
    pub role: UserRole,
    pub expires_at: NaiveDateTime,
}

pub fn insert_session(
    conn: &Connection,
    token_hash: &str,
    user_id: &str,
    role: UserRole,
    created_at: NaiveDateTime,
    expires_at: NaiveDateTime,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO sessions (token_hash, user_id, role, created_at, expires_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            token_hash,
            user_id,
            role.as_str(),
            format_datetime(created_at),
            format_datetime(expires_at),
        ],
    )?;
    Ok(())
}

pub fn get_session(
    conn: &Connection,
    token_hash: &str,
) -> Result<Option<SessionRow>, DatabaseError> {
    let result = conn
        .query_row(
            "SELECT user_id, role, expires_at FROM sessions WHERE token_hash = ?1",
            params![token_hash],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            },
        )
        .optional()?;

    match result {
        Some((user_id, role, expires_at)) => Ok(Some(SessionRow {
            user_id,
            role: UserRole::from_str(&role)?,
            expires_at: parse_datetime(&expires_at),
        })),
        None => Ok(None),
    }
}

/// Idempotent delete — logging out twice is not an error.
pub fn delete_session(conn: &Connection, token_hash: &str) -> Result<(), DatabaseError> {
    conn.execute("DELETE FROM sessions WHERE token_hash = ?1", params![token_hash])?;
    Ok(())
}

/// Drop expired rows. Called opportunistically on login.
pub fn purge_expired_sessions(
    conn: &Connection,
    now: NaiveDateTime,
) -> Result<usize, DatabaseError> {
    let purged = conn.execute(
        "DELETE FROM sessions WHERE expires_at < ?1",
        params![format_datetime(now)],
    )?;
    Ok(purged)
}

// ═══════════════════════════════════════════
// Password reset tokens
// ═══════════════════════════════════════════

pub fn insert_password_reset(
    conn: &Connection,
    token_hash: &str,
    user_id: &str,
    created_at: NaiveDateTime,
    expires_at: NaiveDateTime,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO password_resets (token_hash, user_id, created_at, expires_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            token_hash,
            user_id,
            format_datetime(created_at),
            format_datetime(expires_at),
        ],
    )?;
    Ok(())
}

/// Consume a reset token (one-time use). Returns the user id when the
/// token exists and has not expired.
pub fn consume_password_reset(
    conn: &Connection,
    token_hash: &str,
    now: NaiveDateTime,
) -> Result<Option<String>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT user_id, expires_at FROM password_resets WHERE token_hash = ?1",
            params![token_hash],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
        )
        .optional()?;

    let Some((user_id, expires_at)) = row else {
        return Ok(None);
    };

    conn.execute(
        "DELETE FROM password_resets WHERE token_hash = ?1",
        params![token_hash],
    )?;

    if parse_datetime(&expires_at) < now {
        return Ok(None);
    }
    Ok(Some(user_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::test_support::{make_client, now};
    use chrono::Duration;

    #[test]
    fn session_roundtrip() {
        let conn = open_memory_database().unwrap();
        let uid = make_client(&conn, "a@test.mx", "Ana");

        insert_session(&conn, "hash-1", &uid, UserRole::Cliente, now(), now() + Duration::days(7))
            .unwrap();

        let session = get_session(&conn, "hash-1").unwrap().unwrap();
        assert_eq!(session.user_id, uid);
        assert_eq!(session.role, UserRole::Cliente);
        assert!(get_session(&conn, "hash-2").unwrap().is_none());
    }

    #[test]
    fn delete_session_idempotent() {
        let conn = open_memory_database().unwrap();
        let uid = make_client(&conn, "a@test.mx", "Ana");
        insert_session(&conn, "hash-1", &uid, UserRole::Cliente, now(), now() + Duration::days(7))
            .unwrap();

        delete_session(&conn, "hash-1").unwrap();
        assert!(get_session(&conn, "hash-1").unwrap().is_none());
        delete_session(&conn, "hash-1").unwrap();
    }

    #[test]
    fn purge_removes_only_expired() {
        let conn = open_memory_database().unwrap();
        let uid = make_client(&conn, "a@test.mx", "Ana");
        insert_session(&conn, "old", &uid, UserRole::Cliente, now() - Duration::days(8), now() - Duration::days(1))
            .unwrap();
        insert_session(&conn, "live", &uid, UserRole::Cliente, now(), now() + Duration::days(7))
            .unwrap();

        let purged = purge_expired_sessions(&conn, now()).unwrap();
        assert_eq!(purged, 1);
        assert!(get_session(&conn, "old").unwrap().is_none());
        assert!(get_session(&conn, "live").unwrap().is_some());
    }

    #[test]
    fn reset_token_single_use() {
        let conn = open_memory_database().unwrap();
        let uid = make_client(&conn, "a@test.mx", "Ana");
        insert_password_reset(&conn, "reset-1", &uid, now(), now() + Duration::hours(1)).unwrap();

        let first = consume_password_reset(&conn, "reset-1", now()).unwrap();
        assert_eq!(first.as_deref(), Some(uid.as_str()));
        // Consumed — gone on second use
        assert!(consume_password_reset(&conn, "reset-1", now()).unwrap().is_none());
    }

    #[test]
    fn expired_reset_token_rejected_and_burned() {
        let conn = open_memory_database().unwrap();
        let uid = make_client(&conn, "a@test.mx", "Ana");
        insert_password_reset(&conn, "reset-1", &uid, now() - Duration::hours(2), now() - Duration::hours(1))
            .unwrap();

        assert!(consume_password_reset(&conn, "reset-1", now()).unwrap().is_none());
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM password_resets", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
