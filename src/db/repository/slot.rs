//! Slot reservation ledger — the uniqueness index over booked slots.
//!
//! A reservation's identity IS its composite key `(lawyer_id, date, time)`;
//! the table's primary key enforces at-most-one reservation per key. Only
//! the booking orchestrator writes this table, always inside a transaction.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};

use super::format_datetime;
use crate::db::DatabaseError;

/// Atomically claim `(lawyer_id, date, time)`. Returns `true` when the
/// claim succeeded, `false` when the key is already reserved. The insert
/// against the composite primary key is the check-and-set: two claims for
/// the same key can never both succeed.
pub fn try_claim(
    conn: &Connection,
    lawyer_id: &str,
    date: NaiveDate,
    time: &str,
    now: NaiveDateTime,
) -> Result<bool, DatabaseError> {
    let result = conn.execute(
        "INSERT INTO booked_slots (lawyer_id, date, time, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![lawyer_id, date.to_string(), time, format_datetime(now)],
    );

    match result {
        Ok(_) => Ok(true),
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

/// Release a reservation. Idempotent: deleting an absent key is not an
/// error.
pub fn release(
    conn: &Connection,
    lawyer_id: &str,
    date: NaiveDate,
    time: &str,
) -> Result<(), DatabaseError> {
    conn.execute(
        "DELETE FROM booked_slots WHERE lawyer_id = ?1 AND date = ?2 AND time = ?3",
        params![lawyer_id, date.to_string(), time],
    )?;
    Ok(())
}

/// Read-only occupancy probe. Exposes whether a slot is taken without
/// exposing whose appointment holds it.
pub fn is_occupied(
    conn: &Connection,
    lawyer_id: &str,
    date: NaiveDate,
    time: &str,
) -> Result<bool, DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM booked_slots WHERE lawyer_id = ?1 AND date = ?2 AND time = ?3",
        params![lawyer_id, date.to_string(), time],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// All occupied times for a lawyer on a given date, used to thin the
/// availability listing.
pub fn occupied_times(
    conn: &Connection,
    lawyer_id: &str,
    date: NaiveDate,
) -> Result<Vec<String>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT time FROM booked_slots WHERE lawyer_id = ?1 AND date = ?2 ORDER BY time ASC",
    )?;
    let rows = stmt.query_map(params![lawyer_id, date.to_string()], |row| row.get(0))?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}
