//! Shared fixtures for unit and integration tests.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::repository::{appointment, user};
use crate::models::enums::{AppointmentStatus, UserRole};
use crate::models::{Appointment, UserProfile};

/// Fixed reference instant so assertions on stored timestamps are stable.
pub fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 15)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
}

fn make_user(conn: &Connection, email: &str, name: &str, role: UserRole) -> String {
    let profile = UserProfile {
        id: Uuid::new_v4().to_string(),
        email: email.into(),
        display_name: name.into(),
        role,
        photo_url: None,
        phone: None,
        created_at: now(),
        updated_at: now(),
    };
    user::insert_user(conn, &profile, "test-password-hash").unwrap();
    profile.id
}

pub fn make_client(conn: &Connection, email: &str, name: &str) -> String {
    make_user(conn, email, name, UserRole::Cliente)
}

pub fn make_lawyer(conn: &Connection, email: &str, name: &str) -> String {
    make_user(conn, email, name, UserRole::Abogado)
}

/// Insert an appointment row directly, bypassing the orchestrator. Used
/// by read-model tests that need rows in arbitrary states.
pub fn make_appointment(
    conn: &Connection,
    client_id: &str,
    lawyer_id: &str,
    date: &str,
    time: &str,
    status: &str,
) -> String {
    let appt = Appointment {
        id: Uuid::new_v4().to_string(),
        client_id: client_id.into(),
        lawyer_id: lawyer_id.into(),
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        time: time.into(),
        status: status.parse::<AppointmentStatus>().unwrap(),
        notes: None,
        created_at: now(),
        updated_at: now(),
    };
    appointment::insert_appointment(conn, &appt).unwrap();
    appt.id
}
