use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::enums::AppointmentStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub client_id: String,
    pub lawyer_id: String,
    pub date: NaiveDate,
    /// Naive local `"HH:MM"` start time.
    pub time: String,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Appointment row as shown in a dashboard list — the counterparty's
/// display name is resolved so the caller never needs a second lookup.
#[derive(Debug, Clone, Serialize)]
pub struct AppointmentWithCounterparty {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub other_name: String,
}
