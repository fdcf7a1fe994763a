//! Lawyer search, public profiles, availability and owner profile edits.
//!
//! `GET  /api/lawyers` — search with specialty/rating/term filters
//! `GET  /api/lawyers/:id` — public profile
//! `GET  /api/lawyers/:id/availability?date=` — bookable times for a date
//! `PUT  /api/profile` — owner profile update (lawyer role)
//! `POST /api/profile/photo` — profile photo upload (lawyer role)

use axum::extract::{Multipart, Path, Query, State};
use axum::{Extension, Json};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, SessionContext};
use crate::availability::{time_options, validate_slots};
use crate::db::repository::user as user_repo;
use crate::db::repository::{slot, user::LawyerSearchFilters};
use crate::models::enums::Specialty;
use crate::models::{LawyerProfile, LawyerProfileUpdate};
use crate::sanitize::sanitize_text;
use crate::storage;

const MAX_BIO_CHARS: usize = 2000;

#[derive(Deserialize)]
pub struct SearchParams {
    pub specialty: Option<Specialty>,
    pub min_rating: Option<f64>,
    pub q: Option<String>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub lawyers: Vec<LawyerProfile>,
}

/// `GET /api/lawyers` — search. A failing store degrades to an empty
/// result set rather than a 500; browsing must not crash the page.
pub async fn search(
    State(ctx): State<ApiContext>,
    Query(params): Query<SearchParams>,
) -> Json<SearchResponse> {
    let filters = LawyerSearchFilters {
        specialty: params.specialty,
        min_rating: params.min_rating,
        term: params.q,
    };

    let lawyers = ctx
        .state
        .open_db()
        .and_then(|conn| user_repo::search_lawyers(&conn, &filters))
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Lawyer search degraded to empty results");
            Vec::new()
        });

    Json(SearchResponse { lawyers })
}

/// `GET /api/lawyers/:id` — public profile.
pub async fn profile(
    State(ctx): State<ApiContext>,
    Path(lawyer_id): Path<String>,
) -> Result<Json<LawyerProfile>, ApiError> {
    let conn = ctx.state.open_db()?;
    let profile = user_repo::get_lawyer_profile(&conn, &lawyer_id)?
        .ok_or_else(|| ApiError::NotFound("Lawyer not found".into()))?;
    Ok(Json(profile))
}

#[derive(Deserialize)]
pub struct AvailabilityParams {
    pub date: String,
}

#[derive(Serialize)]
pub struct AvailabilityResponse {
    pub date: String,
    /// Template times still open on that date.
    pub times: Vec<String>,
}

/// `GET /api/lawyers/:id/availability?date=YYYY-MM-DD` — the lawyer's
/// bookable times for a date with already-reserved slots removed. Slot
/// occupancy is exposed without exposing whose appointments hold them.
pub async fn availability(
    State(ctx): State<ApiContext>,
    Path(lawyer_id): Path<String>,
    Query(params): Query<AvailabilityParams>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    let date = NaiveDate::parse_from_str(&params.date, "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest("Date must be YYYY-MM-DD".into()))?;

    let conn = ctx.state.open_db()?;
    let profile = user_repo::get_lawyer_profile(&conn, &lawyer_id)?
        .ok_or_else(|| ApiError::NotFound("Lawyer not found".into()))?;

    let occupied = slot::occupied_times(&conn, &lawyer_id, date)?;
    let times: Vec<String> = time_options(&profile.availability, date)
        .into_iter()
        .filter(|t| !occupied.contains(t))
        .collect();

    Ok(Json(AvailabilityResponse {
        date: params.date,
        times,
    }))
}

/// `PUT /api/profile` — owner profile update. Bio is sanitized, the
/// availability template and price are validated before anything is
/// written. Rating fields are structurally absent from the update type.
pub async fn update_own_profile(
    State(ctx): State<ApiContext>,
    Extension(session_ctx): Extension<SessionContext>,
    Json(mut update): Json<LawyerProfileUpdate>,
) -> Result<Json<LawyerProfile>, ApiError> {
    if let Some(bio) = update.bio.as_deref() {
        update.bio = Some(sanitize_text(bio, MAX_BIO_CHARS));
    }
    if let Some(price) = update.price_per_hour {
        if !price.is_finite() || price < 0.0 {
            return Err(ApiError::BadRequest("Price must be a non-negative number".into()));
        }
    }
    if let Some(slots) = update.availability.as_deref() {
        validate_slots(slots).map_err(ApiError::BadRequest)?;
    }

    let conn = ctx.state.open_db()?;
    let now = chrono::Local::now().naive_local();
    let profile = user_repo::update_lawyer_profile(&conn, &session_ctx.user_id, &update, now)
        .map_err(|e| match e {
            crate::db::DatabaseError::NotFound { .. } => {
                ApiError::NotFound("Lawyer profile not found".into())
            }
            other => other.into(),
        })?;

    Ok(Json(profile))
}

#[derive(Serialize)]
pub struct PhotoResponse {
    pub photo_url: String,
}

/// `POST /api/profile/photo` — multipart upload of a profile photo.
/// JPEG/PNG/WebP up to 2 MB; the stored URL lands on the user row.
pub async fn upload_photo(
    State(ctx): State<ApiContext>,
    Extension(session_ctx): Extension<SessionContext>,
    mut multipart: Multipart,
) -> Result<Json<PhotoResponse>, ApiError> {
    let mut photo: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("photo") {
            continue;
        }
        let content_type = field
            .content_type()
            .ok_or_else(|| ApiError::BadRequest("Photo field needs a content type".into()))?
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Cannot read photo: {e}")))?;
        photo = Some((content_type, bytes.to_vec()));
        break;
    }

    let (content_type, bytes) =
        photo.ok_or_else(|| ApiError::BadRequest("Missing 'photo' field".into()))?;

    let url = storage::store_profile_photo(
        &ctx.state.media_dir,
        &session_ctx.user_id,
        &content_type,
        &bytes,
    )?;

    let conn = ctx.state.open_db()?;
    let now = chrono::Local::now().naive_local();
    user_repo::set_photo_url(&conn, &session_ctx.user_id, &url, now)?;

    Ok(Json(PhotoResponse { photo_url: url }))
}
