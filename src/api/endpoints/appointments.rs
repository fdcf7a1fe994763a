//! Appointment endpoints.
//!
//! `POST  /api/appointments` — book a slot (client role)
//! `GET   /api/appointments/upcoming` — upcoming view, soonest first
//! `GET   /api/appointments` — full history, most recent first
//! `PATCH /api/appointments/:id/status` — confirm/complete/cancel

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, SessionContext};
use crate::booking::{self, DEFAULT_UPCOMING_LIMIT};
use crate::models::enums::AppointmentStatus;
use crate::models::{Appointment, AppointmentWithCounterparty};

#[derive(Deserialize)]
pub struct BookRequest {
    pub lawyer_id: String,
    /// `YYYY-MM-DD`.
    pub date: String,
    /// `HH:MM`.
    pub time: String,
    pub notes: Option<String>,
}

/// `POST /api/appointments` — the atomic book use case. A lost race
/// answers 409 `SLOT_UNAVAILABLE` so the client re-prompts slot choice.
pub async fn book(
    State(ctx): State<ApiContext>,
    Extension(session_ctx): Extension<SessionContext>,
    Json(request): Json<BookRequest>,
) -> Result<Json<Appointment>, ApiError> {
    if !session_ctx.is_client() {
        return Err(ApiError::Forbidden);
    }

    let date = NaiveDate::parse_from_str(&request.date, "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest("Date must be YYYY-MM-DD".into()))?;

    let mut conn = ctx.state.open_db()?;
    let now = chrono::Local::now().naive_local();

    let appointment = booking::book(
        &mut conn,
        &session_ctx.user_id,
        &request.lawyer_id,
        date,
        &request.time,
        request.notes.as_deref(),
        now.date(),
        now,
    )?;

    Ok(Json(appointment))
}

#[derive(Deserialize)]
pub struct UpcomingParams {
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct AppointmentsResponse {
    pub appointments: Vec<AppointmentWithCounterparty>,
}

/// `GET /api/appointments/upcoming?limit=` — pending/confirmed
/// appointments from today on, soonest first.
pub async fn upcoming(
    State(ctx): State<ApiContext>,
    Extension(session_ctx): Extension<SessionContext>,
    Query(params): Query<UpcomingParams>,
) -> Result<Json<AppointmentsResponse>, ApiError> {
    let conn = ctx.state.open_db()?;
    let today = chrono::Local::now().date_naive();
    let limit = params.limit.unwrap_or(DEFAULT_UPCOMING_LIMIT);

    let appointments = booking::list_upcoming(
        &conn,
        &session_ctx.user_id,
        session_ctx.is_client(),
        today,
        limit,
    )?;

    Ok(Json(AppointmentsResponse { appointments }))
}

/// `GET /api/appointments` — the history view, most recent first.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(session_ctx): Extension<SessionContext>,
) -> Result<Json<AppointmentsResponse>, ApiError> {
    let conn = ctx.state.open_db()?;
    let appointments =
        booking::list_all(&conn, &session_ctx.user_id, session_ctx.is_client())?;
    Ok(Json(AppointmentsResponse { appointments }))
}

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: AppointmentStatus,
}

/// `PATCH /api/appointments/:id/status` — status transition on behalf of
/// a party. Cancelling releases the slot in the same transaction.
pub async fn set_status(
    State(ctx): State<ApiContext>,
    Extension(session_ctx): Extension<SessionContext>,
    Path(appointment_id): Path<String>,
    Json(request): Json<StatusRequest>,
) -> Result<Json<Appointment>, ApiError> {
    let mut conn = ctx.state.open_db()?;
    let now = chrono::Local::now().naive_local();

    let appointment = booking::transition(
        &mut conn,
        &appointment_id,
        request.status,
        &session_ctx.user_id,
        session_ctx.role,
        now,
    )?;

    Ok(Json(appointment))
}
