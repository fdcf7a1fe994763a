use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::availability::AvailabilitySlot;
use super::enums::{Specialty, UserRole};

/// Account fields shared by both roles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub role: UserRole,
    pub photo_url: Option<String>,
    pub phone: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Public lawyer profile — a lawyer-role user row plus the marketplace
/// fields clients search and book against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LawyerProfile {
    pub id: String,
    pub display_name: String,
    pub photo_url: Option<String>,
    pub specialty: Option<Specialty>,
    pub bio: String,
    pub price_per_hour: f64,
    pub location: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub availability: Vec<AvailabilitySlot>,
    /// Denormalized mean rating, one decimal, 0.0 when no reviews.
    /// Written only by the rating aggregator.
    pub rating: f64,
    pub review_count: i64,
}

/// Owner-submitted lawyer profile update. Rating fields are deliberately
/// absent: the profile-edit path can never touch them.
#[derive(Debug, Clone, Deserialize)]
pub struct LawyerProfileUpdate {
    pub specialty: Option<Specialty>,
    pub bio: Option<String>,
    pub price_per_hour: Option<f64>,
    pub location: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub availability: Option<Vec<AvailabilitySlot>>,
}
