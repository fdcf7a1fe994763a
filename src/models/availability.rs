use serde::{Deserialize, Serialize};

/// One recurring weekly open-hours window in a lawyer's availability
/// template. `day_of_week` uses 0 = Sunday … 6 = Saturday; times are
/// naive local `"HH:MM"` strings at minute precision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    pub day_of_week: u8,
    pub start_time: String,
    pub end_time: String,
}
