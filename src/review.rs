//! Reviews and rating aggregation.
//!
//! Every successful review creation synchronously recomputes the lawyer's
//! denormalized `rating`/`review_count` over the full review set. The
//! aggregate is mean rating rounded to one decimal, 0.0 with no reviews.

use chrono::NaiveDateTime;
use rusqlite::Connection;
use thiserror::Error;
use uuid::Uuid;

use crate::db::repository::review as review_repo;
use crate::db::repository::user as user_repo;
use crate::db::DatabaseError;
use crate::models::enums::UserRole;
use crate::models::{Review, UserProfile};
use crate::sanitize::sanitize_text;

const MAX_COMMENT_CHARS: usize = 1000;
const MAX_AUTHOR_NAME_CHARS: usize = 100;

#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("Invalid review: {0}")]
    Validation(String),

    #[error("You have already reviewed this lawyer")]
    AlreadyReviewed,

    #[error("Lawyer not found: {0}")]
    LawyerNotFound(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Create a review and refresh the lawyer's aggregate. One review per
/// (lawyer, author) pair; a second attempt surfaces `AlreadyReviewed`.
pub fn create_review(
    conn: &Connection,
    lawyer_id: &str,
    author: &UserProfile,
    rating: i64,
    comment: &str,
    now: NaiveDateTime,
) -> Result<Review, ReviewError> {
    if author.role != UserRole::Cliente {
        return Err(ReviewError::Validation("Only clients can leave reviews".into()));
    }
    if !(1..=5).contains(&rating) {
        return Err(ReviewError::Validation("Rating must be between 1 and 5".into()));
    }

    let comment = sanitize_text(comment, MAX_COMMENT_CHARS);
    if comment.is_empty() {
        return Err(ReviewError::Validation("Comment is required".into()));
    }

    if user_repo::get_lawyer_profile(conn, lawyer_id)?.is_none() {
        return Err(ReviewError::LawyerNotFound(lawyer_id.into()));
    }

    let review = Review {
        id: Uuid::new_v4().to_string(),
        lawyer_id: lawyer_id.into(),
        author_id: author.id.clone(),
        author_name: sanitize_text(&author.display_name, MAX_AUTHOR_NAME_CHARS),
        rating,
        comment,
        created_at: now,
        updated_at: now,
    };

    match review_repo::insert_review(conn, &review) {
        Ok(()) => {}
        Err(e) if e.is_constraint_violation() => return Err(ReviewError::AlreadyReviewed),
        Err(e) => return Err(e.into()),
    }

    recompute_rating(conn, lawyer_id, now)?;
    tracing::info!(lawyer_id, rating, "Review created");
    Ok(review)
}

/// Recompute the denormalized rating for a lawyer from all their reviews.
/// Full recompute on every call — O(reviews) per write, acceptable at
/// marketplace scale.
pub fn recompute_rating(
    conn: &Connection,
    lawyer_id: &str,
    now: NaiveDateTime,
) -> Result<(), ReviewError> {
    let ratings = review_repo::ratings_for_lawyer(conn, lawyer_id)?;
    let count = ratings.len() as i64;
    let mean = if count > 0 {
        ratings.iter().sum::<i64>() as f64 / count as f64
    } else {
        0.0
    };
    let rounded = (mean * 10.0).round() / 10.0;

    review_repo::write_lawyer_rating(conn, lawyer_id, rounded, count, now)?;
    Ok(())
}

/// Reviews for a lawyer's public profile, newest first.
pub fn reviews_for_lawyer(
    conn: &Connection,
    lawyer_id: &str,
) -> Result<Vec<Review>, ReviewError> {
    Ok(review_repo::reviews_by_lawyer(conn, lawyer_id)?)
}

/// The calling user's existing review of a lawyer, if any — lets the UI
/// steer repeat visitors to an edit flow instead of a failing create.
pub fn own_review(
    conn: &Connection,
    lawyer_id: &str,
    author_id: &str,
) -> Result<Option<Review>, ReviewError> {
    Ok(review_repo::review_by_author(conn, lawyer_id, author_id)?)
}
