//! Booking orchestrator — the atomic "book" use case and the appointment
//! read models.
//!
//! Booking validates the requested slot against the lawyer's availability
//! template, then claims the slot ledger key and writes the appointment
//! record inside one immediate transaction. A lost race surfaces as
//! `BookingError::SlotUnavailable` for the caller to offer re-selection;
//! it is never retried automatically. Status transitions go through the
//! same module so that cancellation and ledger release cannot be torn
//! apart.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{Connection, TransactionBehavior};
use thiserror::Error;
use uuid::Uuid;

use crate::availability::time_options;
use crate::db::repository::{appointment as appointment_repo, slot, user as user_repo};
use crate::db::DatabaseError;
use crate::models::enums::{AppointmentStatus, UserRole};
use crate::models::{Appointment, AppointmentWithCounterparty};
use crate::sanitize::sanitize_text;

const MAX_NOTES_CHARS: usize = 500;

/// Default row count for the upcoming-appointments dashboard widget.
pub const DEFAULT_UPCOMING_LIMIT: usize = 5;

#[derive(Error, Debug)]
pub enum BookingError {
    /// The claim step lost a race for the slot. Recoverable: the user
    /// picks a different slot.
    #[error("This time slot is no longer available. Pick another date or time.")]
    SlotUnavailable,

    #[error("Invalid booking request: {0}")]
    Validation(String),

    #[error("Cannot change appointment from {from:?} to {to:?}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Only the appointment's client or lawyer may modify it")]
    NotAParty,

    #[error("Appointment not found: {0}")]
    AppointmentNotFound(String),

    #[error("Lawyer not found: {0}")]
    LawyerNotFound(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Book a slot: validate, claim the ledger key and create the appointment
/// as one atomic unit.
///
/// The date/time check re-derives the lawyer's bookable times server-side
/// — the UI already restricts choices, but the orchestrator does not
/// trust the client. A failure before the transaction leaves no state
/// behind; inside it, claim and insert commit or roll back together.
pub fn book(
    conn: &mut Connection,
    client_id: &str,
    lawyer_id: &str,
    date: NaiveDate,
    time: &str,
    notes: Option<&str>,
    today: NaiveDate,
    now: NaiveDateTime,
) -> Result<Appointment, BookingError> {
    let client = user_repo::get_user(conn, client_id)?
        .ok_or_else(|| BookingError::Validation("Unknown client".into()))?;
    if client.role != UserRole::Cliente {
        return Err(BookingError::Validation("Only clients can book appointments".into()));
    }

    let lawyer = user_repo::get_lawyer_profile(conn, lawyer_id)?
        .ok_or_else(|| BookingError::LawyerNotFound(lawyer_id.into()))?;

    if date < today {
        return Err(BookingError::Validation("Date must be today or later".into()));
    }

    if !time_options(&lawyer.availability, date)
        .iter()
        .any(|t| t == time)
    {
        return Err(BookingError::Validation(
            "Time is not within the lawyer's availability for that date".into(),
        ));
    }

    let notes = notes
        .map(|n| sanitize_text(n, MAX_NOTES_CHARS))
        .filter(|n| !n.is_empty());

    let appointment = Appointment {
        id: Uuid::new_v4().to_string(),
        client_id: client_id.into(),
        lawyer_id: lawyer_id.into(),
        date,
        time: time.into(),
        status: AppointmentStatus::Pendiente,
        notes,
        created_at: now,
        updated_at: now,
    };

    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(DatabaseError::from)?;

    if !slot::try_claim(&tx, lawyer_id, date, time, now)? {
        // Dropping the transaction rolls it back; nothing was written.
        return Err(BookingError::SlotUnavailable);
    }
    appointment_repo::insert_appointment(&tx, &appointment)?;

    tx.commit().map_err(DatabaseError::from)?;

    tracing::info!(
        appointment_id = %appointment.id,
        lawyer_id,
        date = %date,
        time,
        "Appointment booked"
    );
    Ok(appointment)
}

fn role_allows(role: UserRole, to: AppointmentStatus) -> bool {
    match role {
        // Lawyers confirm, complete, or cancel their own appointments.
        UserRole::Abogado => matches!(
            to,
            AppointmentStatus::Confirmada
                | AppointmentStatus::Completada
                | AppointmentStatus::Cancelada
        ),
        // Clients can only cancel.
        UserRole::Cliente => to == AppointmentStatus::Cancelada,
    }
}

/// Transition an appointment's status on behalf of one of its parties.
///
/// The transition graph is enforced here, server-side: terminal states
/// stay terminal and skipping states is rejected. A transition to
/// `cancelada` releases the ledger key derived from the appointment's own
/// fields in the same transaction as the status write, so the slot
/// becomes bookable again exactly when the cancellation commits.
pub fn transition(
    conn: &mut Connection,
    appointment_id: &str,
    new_status: AppointmentStatus,
    actor_id: &str,
    actor_role: UserRole,
    now: NaiveDateTime,
) -> Result<Appointment, BookingError> {
    let appointment = appointment_repo::get_appointment(conn, appointment_id)?
        .ok_or_else(|| BookingError::AppointmentNotFound(appointment_id.into()))?;

    let is_party = match actor_role {
        UserRole::Cliente => appointment.client_id == actor_id,
        UserRole::Abogado => appointment.lawyer_id == actor_id,
    };
    if !is_party {
        return Err(BookingError::NotAParty);
    }

    if !appointment.status.can_transition_to(new_status) || !role_allows(actor_role, new_status) {
        return Err(BookingError::InvalidTransition {
            from: appointment.status,
            to: new_status,
        });
    }

    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(DatabaseError::from)?;

    appointment_repo::update_status(&tx, appointment_id, new_status, now)?;
    if !new_status.holds_slot() {
        slot::release(&tx, &appointment.lawyer_id, appointment.date, &appointment.time)?;
    }

    tx.commit().map_err(DatabaseError::from)?;

    tracing::info!(
        appointment_id,
        from = appointment.status.as_str(),
        to = new_status.as_str(),
        "Appointment status changed"
    );

    Ok(Appointment {
        status: new_status,
        updated_at: now,
        ..appointment
    })
}

/// Upcoming appointments for the identity: not cancelled or completed,
/// dated today or later, soonest first, counterparty names resolved.
pub fn list_upcoming(
    conn: &Connection,
    uid: &str,
    as_client: bool,
    today: NaiveDate,
    limit: usize,
) -> Result<Vec<AppointmentWithCounterparty>, BookingError> {
    let rows = appointment_repo::upcoming_for_user(conn, uid, as_client, today, limit)?;
    resolve_counterparties(conn, rows, as_client)
}

/// Full history for the identity, most recent first — deliberately the
/// inverse ordering of `list_upcoming`.
pub fn list_all(
    conn: &Connection,
    uid: &str,
    as_client: bool,
) -> Result<Vec<AppointmentWithCounterparty>, BookingError> {
    let rows = appointment_repo::all_for_user(conn, uid, as_client)?;
    resolve_counterparties(conn, rows, as_client)
}

/// Attach the counterparty's display name to each row via one batch
/// lookup, deduplicated by id. A missing profile falls back to a generic
/// role label rather than dropping the row.
fn resolve_counterparties(
    conn: &Connection,
    rows: Vec<Appointment>,
    as_client: bool,
) -> Result<Vec<AppointmentWithCounterparty>, BookingError> {
    let other_id = |a: &Appointment| {
        if as_client {
            a.lawyer_id.clone()
        } else {
            a.client_id.clone()
        }
    };

    let ids: Vec<String> = rows.iter().map(&other_id).collect();
    let names = user_repo::get_display_names(conn, &ids)?;
    let fallback = if as_client { "Abogado" } else { "Cliente" };

    Ok(rows
        .into_iter()
        .map(|appointment| {
            let name = names
                .get(&other_id(&appointment))
                .cloned()
                .unwrap_or_else(|| fallback.to_string());
            AppointmentWithCounterparty {
                appointment,
                other_name: name,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::user::update_lawyer_profile;
    use crate::db::sqlite::{open_database, open_memory_database};
    use crate::models::enums::Specialty;
    use crate::models::{AvailabilitySlot, LawyerProfileUpdate};
    use crate::test_support::{make_client, make_lawyer, now};

    /// Monday 2025-06-02; "today" for the tests is the preceding Friday.
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 30).unwrap()
    }

    fn setup_lawyer(conn: &Connection) -> String {
        let id = make_lawyer(conn, "laura@test.mx", "Laura Méndez");
        update_lawyer_profile(
            conn,
            &id,
            &LawyerProfileUpdate {
                specialty: Some(Specialty::Laboral),
                bio: Some("Laboralista".into()),
                price_per_hour: Some(800.0),
                location: Some("CDMX".into()),
                address: None,
                city: None,
                country: None,
                // Only Monday 09:00–10:00 is open
                availability: Some(vec![AvailabilitySlot {
                    day_of_week: 1,
                    start_time: "09:00".into(),
                    end_time: "10:00".into(),
                }]),
            },
            now(),
        )
        .unwrap();
        id
    }

    #[test]
    fn book_creates_pending_appointment_and_claims_slot() {
        let mut conn = open_memory_database().unwrap();
        let lawyer = setup_lawyer(&conn);
        let client = make_client(&conn, "ana@test.mx", "Ana");

        let appt = book(
            &mut conn,
            &client,
            &lawyer,
            monday(),
            "09:00",
            Some("Consulta sobre despido"),
            today(),
            now(),
        )
        .unwrap();

        assert_eq!(appt.status, AppointmentStatus::Pendiente);
        assert_eq!(appt.notes.as_deref(), Some("Consulta sobre despido"));
        assert!(slot::is_occupied(&conn, &lawyer, monday(), "09:00").unwrap());
    }

    #[test]
    fn second_booking_for_same_key_loses() {
        let mut conn = open_memory_database().unwrap();
        let lawyer = setup_lawyer(&conn);
        let ana = make_client(&conn, "ana@test.mx", "Ana");
        let bruno = make_client(&conn, "bruno@test.mx", "Bruno");

        book(&mut conn, &ana, &lawyer, monday(), "09:00", None, today(), now()).unwrap();

        let err = book(&mut conn, &bruno, &lawyer, monday(), "09:00", None, today(), now())
            .unwrap_err();
        assert!(matches!(err, BookingError::SlotUnavailable));

        // The loser left no appointment behind
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM appointments", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn cancel_releases_slot_for_rebooking() {
        // The full scenario: book → contend → cancel → rebook succeeds.
        let mut conn = open_memory_database().unwrap();
        let lawyer = setup_lawyer(&conn);
        let ana = make_client(&conn, "ana@test.mx", "Ana");
        let bruno = make_client(&conn, "bruno@test.mx", "Bruno");

        let first =
            book(&mut conn, &ana, &lawyer, monday(), "09:00", None, today(), now()).unwrap();

        let contended =
            book(&mut conn, &bruno, &lawyer, monday(), "09:00", None, today(), now()).unwrap_err();
        assert!(matches!(contended, BookingError::SlotUnavailable));

        transition(
            &mut conn,
            &first.id,
            AppointmentStatus::Cancelada,
            &ana,
            UserRole::Cliente,
            now(),
        )
        .unwrap();
        assert!(!slot::is_occupied(&conn, &lawyer, monday(), "09:00").unwrap());

        let retry =
            book(&mut conn, &bruno, &lawyer, monday(), "09:00", None, today(), now()).unwrap();
        assert_eq!(retry.status, AppointmentStatus::Pendiente);
    }

    #[test]
    fn past_date_rejected_without_side_effects() {
        let mut conn = open_memory_database().unwrap();
        let lawyer = setup_lawyer(&conn);
        let client = make_client(&conn, "ana@test.mx", "Ana");

        let yesterday_monday = NaiveDate::from_ymd_opt(2025, 5, 26).unwrap();
        let err = book(
            &mut conn,
            &client,
            &lawyer,
            yesterday_monday,
            "09:00",
            None,
            today(),
            now(),
        )
        .unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));
        assert!(!slot::is_occupied(&conn, &lawyer, yesterday_monday, "09:00").unwrap());
    }

    #[test]
    fn time_outside_availability_rejected() {
        let mut conn = open_memory_database().unwrap();
        let lawyer = setup_lawyer(&conn);
        let client = make_client(&conn, "ana@test.mx", "Ana");

        // 10:00 is the exclusive end of the template
        for bad_time in ["10:00", "08:30", "09:15", "garbage"] {
            let err = book(
                &mut conn,
                &client,
                &lawyer,
                monday(),
                bad_time,
                None,
                today(),
                now(),
            )
            .unwrap_err();
            assert!(matches!(err, BookingError::Validation(_)), "accepted {bad_time}");
        }

        // Tuesday has no template at all
        let tuesday = NaiveDate::from_ymd_opt(2025, 6, 3).unwrap();
        let err = book(&mut conn, &client, &lawyer, tuesday, "09:00", None, today(), now())
            .unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));
    }

    #[test]
    fn booking_requires_client_role_and_known_lawyer() {
        let mut conn = open_memory_database().unwrap();
        let lawyer = setup_lawyer(&conn);
        let other_lawyer = make_lawyer(&conn, "pedro@test.mx", "Pedro");
        let client = make_client(&conn, "ana@test.mx", "Ana");

        let err = book(
            &mut conn,
            &other_lawyer,
            &lawyer,
            monday(),
            "09:00",
            None,
            today(),
            now(),
        )
        .unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));

        let err = book(&mut conn, &client, "missing", monday(), "09:00", None, today(), now())
            .unwrap_err();
        assert!(matches!(err, BookingError::LawyerNotFound(_)));
    }

    #[test]
    fn notes_are_sanitized_and_optional() {
        let mut conn = open_memory_database().unwrap();
        let lawyer = setup_lawyer(&conn);
        let client = make_client(&conn, "ana@test.mx", "Ana");

        let appt = book(
            &mut conn,
            &client,
            &lawyer,
            monday(),
            "09:00",
            Some("<b>Urgente</b> onclick=hack"),
            today(),
            now(),
        )
        .unwrap();
        assert_eq!(appt.notes.as_deref(), Some("Urgente hack"));

        let next_monday = NaiveDate::from_ymd_opt(2025, 6, 9).unwrap();
        let blank = book(
            &mut conn,
            &client,
            &lawyer,
            next_monday,
            "09:00",
            Some("   "),
            today(),
            now(),
        )
        .unwrap();
        assert_eq!(blank.notes, None);
    }

    #[test]
    fn lawyer_confirms_then_completes() {
        let mut conn = open_memory_database().unwrap();
        let lawyer = setup_lawyer(&conn);
        let client = make_client(&conn, "ana@test.mx", "Ana");
        let appt =
            book(&mut conn, &client, &lawyer, monday(), "09:00", None, today(), now()).unwrap();

        let confirmed = transition(
            &mut conn,
            &appt.id,
            AppointmentStatus::Confirmada,
            &lawyer,
            UserRole::Abogado,
            now(),
        )
        .unwrap();
        assert_eq!(confirmed.status, AppointmentStatus::Confirmada);
        // Confirmation keeps the slot held
        assert!(slot::is_occupied(&conn, &lawyer, monday(), "09:00").unwrap());

        let completed = transition(
            &mut conn,
            &appt.id,
            AppointmentStatus::Completada,
            &lawyer,
            UserRole::Abogado,
            now(),
        )
        .unwrap();
        assert_eq!(completed.status, AppointmentStatus::Completada);
    }

    #[test]
    fn invalid_transitions_rejected() {
        let mut conn = open_memory_database().unwrap();
        let lawyer = setup_lawyer(&conn);
        let client = make_client(&conn, "ana@test.mx", "Ana");
        let appt =
            book(&mut conn, &client, &lawyer, monday(), "09:00", None, today(), now()).unwrap();

        // pendiente → completada skips confirmation
        let err = transition(
            &mut conn,
            &appt.id,
            AppointmentStatus::Completada,
            &lawyer,
            UserRole::Abogado,
            now(),
        )
        .unwrap_err();
        assert!(matches!(err, BookingError::InvalidTransition { .. }));

        // Cancel, then try to un-cancel
        transition(
            &mut conn,
            &appt.id,
            AppointmentStatus::Cancelada,
            &client,
            UserRole::Cliente,
            now(),
        )
        .unwrap();
        let err = transition(
            &mut conn,
            &appt.id,
            AppointmentStatus::Pendiente,
            &lawyer,
            UserRole::Abogado,
            now(),
        )
        .unwrap_err();
        assert!(matches!(err, BookingError::InvalidTransition { .. }));
    }

    #[test]
    fn clients_cannot_confirm_and_outsiders_cannot_touch() {
        let mut conn = open_memory_database().unwrap();
        let lawyer = setup_lawyer(&conn);
        let client = make_client(&conn, "ana@test.mx", "Ana");
        let stranger = make_client(&conn, "bruno@test.mx", "Bruno");
        let appt =
            book(&mut conn, &client, &lawyer, monday(), "09:00", None, today(), now()).unwrap();

        let err = transition(
            &mut conn,
            &appt.id,
            AppointmentStatus::Confirmada,
            &client,
            UserRole::Cliente,
            now(),
        )
        .unwrap_err();
        assert!(matches!(err, BookingError::InvalidTransition { .. }));

        let err = transition(
            &mut conn,
            &appt.id,
            AppointmentStatus::Cancelada,
            &stranger,
            UserRole::Cliente,
            now(),
        )
        .unwrap_err();
        assert!(matches!(err, BookingError::NotAParty));
    }

    #[test]
    fn ledger_and_appointments_stay_consistent() {
        // Every non-cancelled appointment has a live reservation; every
        // cancelled one has none.
        let mut conn = open_memory_database().unwrap();
        let lawyer = setup_lawyer(&conn);
        let ana = make_client(&conn, "ana@test.mx", "Ana");
        let bruno = make_client(&conn, "bruno@test.mx", "Bruno");

        let kept =
            book(&mut conn, &ana, &lawyer, monday(), "09:00", None, today(), now()).unwrap();
        let dropped =
            book(&mut conn, &bruno, &lawyer, monday(), "09:30", None, today(), now()).unwrap();
        transition(
            &mut conn,
            &dropped.id,
            AppointmentStatus::Cancelada,
            &bruno,
            UserRole::Cliente,
            now(),
        )
        .unwrap();

        let live: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM appointments a
                 WHERE a.status != 'cancelada'
                   AND NOT EXISTS (
                     SELECT 1 FROM booked_slots s
                     WHERE s.lawyer_id = a.lawyer_id AND s.date = a.date AND s.time = a.time)",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(live, 0, "non-cancelled appointment without reservation");

        let orphaned: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM appointments a
                 JOIN booked_slots s
                   ON s.lawyer_id = a.lawyer_id AND s.date = a.date AND s.time = a.time
                 WHERE a.status = 'cancelada'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(orphaned, 0, "cancelled appointment still holds reservation");
        assert_eq!(kept.status, AppointmentStatus::Pendiente);
    }

    #[test]
    fn upcoming_and_history_views() {
        let mut conn = open_memory_database().unwrap();
        let lawyer = setup_lawyer(&conn);
        let client = make_client(&conn, "ana@test.mx", "Ana");

        let m1 = monday();
        let m2 = NaiveDate::from_ymd_opt(2025, 6, 9).unwrap();
        book(&mut conn, &client, &lawyer, m2, "09:30", None, today(), now()).unwrap();
        let cancelled =
            book(&mut conn, &client, &lawyer, m1, "09:00", None, today(), now()).unwrap();
        transition(
            &mut conn,
            &cancelled.id,
            AppointmentStatus::Cancelada,
            &client,
            UserRole::Cliente,
            now(),
        )
        .unwrap();
        book(&mut conn, &client, &lawyer, m1, "09:30", None, today(), now()).unwrap();

        let upcoming = list_upcoming(&conn, &client, true, today(), DEFAULT_UPCOMING_LIMIT).unwrap();
        let keys: Vec<(String, String)> = upcoming
            .iter()
            .map(|a| (a.appointment.date.to_string(), a.appointment.time.clone()))
            .collect();
        // Cancelled entry excluded, ascending by (date, time)
        assert_eq!(
            keys,
            vec![
                ("2025-06-02".to_string(), "09:30".to_string()),
                ("2025-06-09".to_string(), "09:30".to_string()),
            ]
        );
        assert_eq!(upcoming[0].other_name, "Laura Méndez");

        // History keeps everything, most recent first
        let history = list_all(&conn, &client, true).unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].appointment.date.to_string(), "2025-06-09");
    }

    #[test]
    fn concurrent_bookings_one_winner() {
        // Two threads race for the same key against one database file.
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("race.db");

        let (lawyer, clients) = {
            let conn = open_database(&db_path).unwrap();
            let lawyer = setup_lawyer(&conn);
            let a = make_client(&conn, "ana@test.mx", "Ana");
            let b = make_client(&conn, "bruno@test.mx", "Bruno");
            (lawyer, [a, b])
        };

        let mut handles = Vec::new();
        for client in clients {
            let db_path = db_path.clone();
            let lawyer = lawyer.clone();
            handles.push(std::thread::spawn(move || {
                let mut conn = open_database(&db_path).unwrap();
                book(&mut conn, &client, &lawyer, monday(), "09:00", None, today(), now())
            }));
        }

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let wins = results.iter().filter(|r| r.is_ok()).count();
        let losses = results
            .iter()
            .filter(|r| matches!(r, Err(BookingError::SlotUnavailable)))
            .count();
        assert_eq!(wins, 1, "exactly one booking must win the race");
        assert_eq!(losses, 1, "the other must observe SlotUnavailable");

        let conn = open_database(&db_path).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM appointments", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
