//! Review endpoints.
//!
//! `GET  /api/lawyers/:id/reviews` — a lawyer's reviews, newest first (public)
//! `GET  /api/reviews/mine/:lawyer_id` — the caller's own review
//! `POST /api/reviews` — leave a review (client role)

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, SessionContext};
use crate::db::repository::user as user_repo;
use crate::models::Review;
use crate::review;

#[derive(Serialize)]
pub struct ReviewsResponse {
    pub reviews: Vec<Review>,
}

/// `GET /api/lawyers/:id/reviews`
pub async fn list(
    State(ctx): State<ApiContext>,
    Path(lawyer_id): Path<String>,
) -> Result<Json<ReviewsResponse>, ApiError> {
    let conn = ctx.state.open_db()?;
    let reviews = review::reviews_for_lawyer(&conn, &lawyer_id)?;
    Ok(Json(ReviewsResponse { reviews }))
}

#[derive(Serialize)]
pub struct OwnReviewResponse {
    pub review: Option<Review>,
}

/// `GET /api/reviews/mine/:lawyer_id` — lets the UI offer an edit flow
/// instead of a create that would fail with `ALREADY_REVIEWED`.
pub async fn own(
    State(ctx): State<ApiContext>,
    Extension(session_ctx): Extension<SessionContext>,
    Path(lawyer_id): Path<String>,
) -> Result<Json<OwnReviewResponse>, ApiError> {
    let conn = ctx.state.open_db()?;
    let review = review::own_review(&conn, &lawyer_id, &session_ctx.user_id)?;
    Ok(Json(OwnReviewResponse { review }))
}

#[derive(Deserialize)]
pub struct CreateReviewRequest {
    pub lawyer_id: String,
    pub rating: i64,
    pub comment: String,
}

/// `POST /api/reviews` — creates the review and synchronously refreshes
/// the lawyer's denormalized rating. Client role only.
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(session_ctx): Extension<SessionContext>,
    Json(request): Json<CreateReviewRequest>,
) -> Result<Json<Review>, ApiError> {
    if !session_ctx.is_client() {
        return Err(ApiError::Forbidden);
    }

    let conn = ctx.state.open_db()?;
    let now = chrono::Local::now().naive_local();

    let author = user_repo::get_user(&conn, &session_ctx.user_id)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let review = review::create_review(
        &conn,
        &request.lawyer_id,
        &author,
        request.rating,
        &request.comment,
        now,
    )?;

    Ok(Json(review))
}
