use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};

use super::{format_datetime, parse_datetime};
use crate::db::DatabaseError;
use crate::models::enums::{Specialty, UserRole};
use crate::models::{AvailabilitySlot, LawyerProfile, LawyerProfileUpdate, UserProfile};

pub fn insert_user(
    conn: &Connection,
    user: &UserProfile,
    password_hash: &str,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO users (id, email, password_hash, display_name, role, photo_url, phone,
         created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            user.id,
            user.email,
            password_hash,
            user.display_name,
            user.role.as_str(),
            user.photo_url,
            user.phone,
            format_datetime(user.created_at),
            format_datetime(user.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_user(conn: &Connection, id: &str) -> Result<Option<UserProfile>, DatabaseError> {
    let result = conn
        .query_row(
            "SELECT id, email, display_name, role, photo_url, phone, created_at, updated_at
             FROM users WHERE id = ?1",
            params![id],
            user_from_row,
        )
        .optional()?;

    result.map(finish_user).transpose()
}

/// Look up a user by email together with the stored password hash.
/// Only the authentication path needs the hash.
pub fn get_user_by_email(
    conn: &Connection,
    email: &str,
) -> Result<Option<(UserProfile, String)>, DatabaseError> {
    let result = conn
        .query_row(
            "SELECT id, email, display_name, role, photo_url, phone, created_at, updated_at,
             password_hash
             FROM users WHERE email = ?1",
            params![email],
            |row| {
                let user = user_from_row(row)?;
                let hash: String = row.get(8)?;
                Ok((user, hash))
            },
        )
        .optional()?;

    match result {
        Some((row, hash)) => Ok(Some((finish_user(row)?, hash))),
        None => Ok(None),
    }
}

pub fn set_password_hash(
    conn: &Connection,
    user_id: &str,
    password_hash: &str,
    now: NaiveDateTime,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE users SET password_hash = ?2, updated_at = ?3 WHERE id = ?1",
        params![user_id, password_hash, format_datetime(now)],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "User".into(),
            id: user_id.into(),
        });
    }
    Ok(())
}

pub fn set_photo_url(
    conn: &Connection,
    user_id: &str,
    photo_url: &str,
    now: NaiveDateTime,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE users SET photo_url = ?2, updated_at = ?3 WHERE id = ?1",
        params![user_id, photo_url, format_datetime(now)],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "User".into(),
            id: user_id.into(),
        });
    }
    Ok(())
}

// Internal row type for UserProfile mapping
struct UserRow {
    id: String,
    email: String,
    display_name: String,
    role: String,
    photo_url: Option<String>,
    phone: Option<String>,
    created_at: String,
    updated_at: String,
}

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        display_name: row.get(2)?,
        role: row.get(3)?,
        photo_url: row.get(4)?,
        phone: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn finish_user(row: UserRow) -> Result<UserProfile, DatabaseError> {
    Ok(UserProfile {
        id: row.id,
        email: row.email,
        display_name: row.display_name,
        role: UserRole::from_str(&row.role)?,
        photo_url: row.photo_url,
        phone: row.phone,
        created_at: parse_datetime(&row.created_at),
        updated_at: parse_datetime(&row.updated_at),
    })
}

// ═══════════════════════════════════════════
// Lawyer profiles
// ═══════════════════════════════════════════

const LAWYER_COLUMNS: &str =
    "id, display_name, photo_url, specialty, bio, price_per_hour, location,
     address, city, country, availability, rating, review_count";

pub fn get_lawyer_profile(
    conn: &Connection,
    id: &str,
) -> Result<Option<LawyerProfile>, DatabaseError> {
    let result = conn
        .query_row(
            &format!("SELECT {LAWYER_COLUMNS} FROM users WHERE id = ?1 AND role = 'abogado'"),
            params![id],
            lawyer_from_row,
        )
        .optional()?;

    result.map(finish_lawyer).transpose()
}

/// Apply an owner-submitted profile update. Rating fields are not part of
/// `LawyerProfileUpdate` and so cannot be written through this path.
pub fn update_lawyer_profile(
    conn: &Connection,
    id: &str,
    update: &LawyerProfileUpdate,
    now: NaiveDateTime,
) -> Result<LawyerProfile, DatabaseError> {
    let current = get_lawyer_profile(conn, id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "LawyerProfile".into(),
        id: id.into(),
    })?;

    let specialty = update.specialty.or(current.specialty);
    let bio = update.bio.clone().unwrap_or(current.bio);
    let price = update.price_per_hour.unwrap_or(current.price_per_hour);
    let location = update.location.clone().unwrap_or(current.location);
    let address = update.address.clone().or(current.address);
    let city = update.city.clone().or(current.city);
    let country = update.country.clone().or(current.country);
    let availability = update
        .availability
        .clone()
        .unwrap_or(current.availability);
    let availability_json = serde_json::to_string(&availability)
        .map_err(|e| DatabaseError::ConstraintViolation(format!("availability JSON: {e}")))?;

    conn.execute(
        "UPDATE users SET specialty = ?2, bio = ?3, price_per_hour = ?4, location = ?5,
         address = ?6, city = ?7, country = ?8, availability = ?9, updated_at = ?10
         WHERE id = ?1 AND role = 'abogado'",
        params![
            id,
            specialty.map(|s| s.as_str()),
            bio,
            price,
            location,
            address,
            city,
            country,
            availability_json,
            format_datetime(now),
        ],
    )?;

    get_lawyer_profile(conn, id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "LawyerProfile".into(),
        id: id.into(),
    })
}

#[derive(Debug, Default, Clone)]
pub struct LawyerSearchFilters {
    pub specialty: Option<Specialty>,
    pub min_rating: Option<f64>,
    pub term: Option<String>,
}

/// Search lawyer profiles: optional specialty and minimum-rating filters
/// plus a case-insensitive term match over name, specialty, bio and
/// location. Best-rated first, capped at 100 rows.
pub fn search_lawyers(
    conn: &Connection,
    filters: &LawyerSearchFilters,
) -> Result<Vec<LawyerProfile>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {LAWYER_COLUMNS} FROM users
         WHERE role = 'abogado' AND specialty IS NOT NULL
         ORDER BY rating DESC, review_count DESC
         LIMIT 100"
    ))?;

    let rows = stmt.query_map([], lawyer_from_row)?;

    let mut lawyers = Vec::new();
    for row in rows {
        lawyers.push(finish_lawyer(row?)?);
    }

    if let Some(specialty) = filters.specialty {
        lawyers.retain(|l| l.specialty == Some(specialty));
    }

    if let Some(min) = filters.min_rating {
        if min > 0.0 {
            lawyers.retain(|l| l.rating >= min);
        }
    }

    if let Some(term) = filters.term.as_deref() {
        let term = term.trim().to_lowercase();
        if !term.is_empty() {
            lawyers.retain(|l| {
                l.display_name.to_lowercase().contains(&term)
                    || l.specialty.map(|s| s.as_str().contains(&term)).unwrap_or(false)
                    || l.bio.to_lowercase().contains(&term)
                    || l.location.to_lowercase().contains(&term)
            });
        }
    }

    Ok(lawyers)
}

/// Batch display-name lookup, deduplicated by id. Unknown ids are simply
/// absent from the result map.
pub fn get_display_names(
    conn: &Connection,
    ids: &[String],
) -> Result<HashMap<String, String>, DatabaseError> {
    let unique: HashSet<&String> = ids.iter().collect();
    let mut names = HashMap::new();

    let mut stmt = conn.prepare("SELECT display_name FROM users WHERE id = ?1")?;
    for id in unique {
        let name: Option<String> = stmt
            .query_row(params![id], |row| row.get(0))
            .optional()?;
        if let Some(name) = name {
            names.insert(id.clone(), name);
        }
    }

    Ok(names)
}

struct LawyerRow {
    id: String,
    display_name: String,
    photo_url: Option<String>,
    specialty: Option<String>,
    bio: Option<String>,
    price_per_hour: Option<f64>,
    location: Option<String>,
    address: Option<String>,
    city: Option<String>,
    country: Option<String>,
    availability: String,
    rating: f64,
    review_count: i64,
}

fn lawyer_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<LawyerRow> {
    Ok(LawyerRow {
        id: row.get(0)?,
        display_name: row.get(1)?,
        photo_url: row.get(2)?,
        specialty: row.get(3)?,
        bio: row.get(4)?,
        price_per_hour: row.get(5)?,
        location: row.get(6)?,
        address: row.get(7)?,
        city: row.get(8)?,
        country: row.get(9)?,
        availability: row.get(10)?,
        rating: row.get(11)?,
        review_count: row.get(12)?,
    })
}

fn finish_lawyer(row: LawyerRow) -> Result<LawyerProfile, DatabaseError> {
    let availability: Vec<AvailabilitySlot> =
        serde_json::from_str(&row.availability).unwrap_or_default();

    Ok(LawyerProfile {
        id: row.id,
        display_name: row.display_name,
        photo_url: row.photo_url,
        specialty: row.specialty.as_deref().map(Specialty::from_str).transpose()?,
        bio: row.bio.unwrap_or_default(),
        price_per_hour: row.price_per_hour.unwrap_or(0.0),
        location: row.location.unwrap_or_default(),
        address: row.address,
        city: row.city,
        country: row.country,
        availability,
        rating: row.rating,
        review_count: row.review_count,
    })
}
