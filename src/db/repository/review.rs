use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};

use super::{format_datetime, parse_datetime};
use crate::db::DatabaseError;
use crate::models::Review;

pub fn insert_review(conn: &Connection, review: &Review) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO reviews (id, lawyer_id, author_id, author_name, rating, comment,
         created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            review.id,
            review.lawyer_id,
            review.author_id,
            review.author_name,
            review.rating,
            review.comment,
            format_datetime(review.created_at),
            format_datetime(review.updated_at),
        ],
    )?;
    Ok(())
}

/// Reviews for a lawyer, newest first, capped at 50.
pub fn reviews_by_lawyer(
    conn: &Connection,
    lawyer_id: &str,
) -> Result<Vec<Review>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, lawyer_id, author_id, author_name, rating, comment, created_at, updated_at
         FROM reviews WHERE lawyer_id = ?1
         ORDER BY created_at DESC
         LIMIT 50",
    )?;

    let rows = stmt.query_map(params![lawyer_id], review_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// The review a given author left for a lawyer, if any.
pub fn review_by_author(
    conn: &Connection,
    lawyer_id: &str,
    author_id: &str,
) -> Result<Option<Review>, DatabaseError> {
    conn.query_row(
        "SELECT id, lawyer_id, author_id, author_name, rating, comment, created_at, updated_at
         FROM reviews WHERE lawyer_id = ?1 AND author_id = ?2",
        params![lawyer_id, author_id],
        review_from_row,
    )
    .optional()
    .map_err(DatabaseError::from)
}

/// All rating values for a lawyer — input to the rating aggregator.
pub fn ratings_for_lawyer(
    conn: &Connection,
    lawyer_id: &str,
) -> Result<Vec<i64>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT rating FROM reviews WHERE lawyer_id = ?1")?;
    let rows = stmt.query_map(params![lawyer_id], |row| row.get(0))?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// Write the denormalized aggregate to the lawyer row. Lives here, not in
/// the user repository, so the profile-edit path has no way to reach it.
pub fn write_lawyer_rating(
    conn: &Connection,
    lawyer_id: &str,
    rating: f64,
    review_count: i64,
    now: NaiveDateTime,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE users SET rating = ?2, review_count = ?3, updated_at = ?4
         WHERE id = ?1 AND role = 'abogado'",
        params![lawyer_id, rating, review_count, format_datetime(now)],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "LawyerProfile".into(),
            id: lawyer_id.into(),
        });
    }
    Ok(())
}

fn review_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Review> {
    Ok(Review {
        id: row.get(0)?,
        lawyer_id: row.get(1)?,
        author_id: row.get(2)?,
        author_name: row.get(3)?,
        rating: row.get(4)?,
        comment: row.get(5)?,
        created_at: parse_datetime(&row.get::<_, String>(6)?),
        updated_at: parse_datetime(&row.get::<_, String>(7)?),
    })
}
