use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension};

use super::{format_datetime, parse_datetime};
use crate::db::DatabaseError;
use crate::models::enums::AppointmentStatus;
use crate::models::Appointment;

pub fn insert_appointment(
    conn: &Connection,
    appointment: &Appointment,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO appointments (id, client_id, lawyer_id, date, time, status, notes,
         created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            appointment.id,
            appointment.client_id,
            appointment.lawyer_id,
            appointment.date.to_string(),
            appointment.time,
            appointment.status.as_str(),
            appointment.notes,
            format_datetime(appointment.created_at),
            format_datetime(appointment.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_appointment(
    conn: &Connection,
    id: &str,
) -> Result<Option<Appointment>, DatabaseError> {
    let result = conn
        .query_row(
            "SELECT id, client_id, lawyer_id, date, time, status, notes, created_at, updated_at
             FROM appointments WHERE id = ?1",
            params![id],
            appointment_from_row,
        )
        .optional()?;

    result.map(finish_appointment).transpose()
}

pub fn update_status(
    conn: &Connection,
    id: &str,
    status: AppointmentStatus,
    now: NaiveDateTime,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE appointments SET status = ?2, updated_at = ?3 WHERE id = ?1",
        params![id, status.as_str(), format_datetime(now)],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Appointment".into(),
            id: id.into(),
        });
    }
    Ok(())
}

fn own_column(as_client: bool) -> &'static str {
    if as_client {
        "client_id"
    } else {
        "lawyer_id"
    }
}

/// Upcoming appointments for one side of the relationship: not cancelled
/// or completed, today or later, soonest first. `as_client` selects which
/// foreign key identifies the caller.
pub fn upcoming_for_user(
    conn: &Connection,
    uid: &str,
    as_client: bool,
    today: NaiveDate,
    limit: usize,
) -> Result<Vec<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, client_id, lawyer_id, date, time, status, notes, created_at, updated_at
         FROM appointments
         WHERE {} = ?1
           AND status NOT IN ('cancelada', 'completada')
           AND date >= ?2
         ORDER BY date ASC, time ASC
         LIMIT ?3",
        own_column(as_client)
    ))?;

    let rows = stmt.query_map(
        params![uid, today.to_string(), limit as i64],
        appointment_from_row,
    )?;
    collect_appointments(rows)
}

/// Full appointment history for one side, most recent first (the inverse
/// ordering of the upcoming view), capped at 50 rows.
pub fn all_for_user(
    conn: &Connection,
    uid: &str,
    as_client: bool,
) -> Result<Vec<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, client_id, lawyer_id, date, time, status, notes, created_at, updated_at
         FROM appointments
         WHERE {} = ?1
         ORDER BY date DESC, time DESC
         LIMIT 50",
        own_column(as_client)
    ))?;

    let rows = stmt.query_map(params![uid], appointment_from_row)?;
    collect_appointments(rows)
}

fn collect_appointments(
    rows: impl Iterator<Item = rusqlite::Result<AppointmentRow>>,
) -> Result<Vec<Appointment>, DatabaseError> {
    let mut out = Vec::new();
    for row in rows {
        out.push(finish_appointment(row?)?);
    }
    Ok(out)
}

// Internal row type for Appointment mapping
struct AppointmentRow {
    id: String,
    client_id: String,
    lawyer_id: String,
    date: String,
    time: String,
    status: String,
    notes: Option<String>,
    created_at: String,
    updated_at: String,
}

fn appointment_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AppointmentRow> {
    Ok(AppointmentRow {
        id: row.get(0)?,
        client_id: row.get(1)?,
        lawyer_id: row.get(2)?,
        date: row.get(3)?,
        time: row.get(4)?,
        status: row.get(5)?,
        notes: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

fn finish_appointment(row: AppointmentRow) -> Result<Appointment, DatabaseError> {
    Ok(Appointment {
        id: row.id,
        client_id: row.client_id,
        lawyer_id: row.lawyer_id,
        date: NaiveDate::parse_from_str(&row.date, "%Y-%m-%d").unwrap_or_default(),
        time: row.time,
        status: AppointmentStatus::from_str(&row.status)?,
        notes: row.notes,
        created_at: parse_datetime(&row.created_at),
        updated_at: parse_datetime(&row.updated_at),
    })
}
