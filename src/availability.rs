//! Availability model — derives concrete bookable start times for a
//! calendar date from a lawyer's recurring weekly template.
//!
//! Pure functions over profile data already loaded; nothing here touches
//! the database. Malformed slots are rejected when the profile is saved
//! (`validate_slots`), so generation treats the template as trusted.

use chrono::{Datelike, NaiveDate};

use crate::models::AvailabilitySlot;

/// Booking granularity in minutes.
pub const SLOT_INTERVAL_MINUTES: u32 = 30;

/// Parse a `"HH:MM"` time-of-day string into minutes since midnight.
pub fn parse_time(s: &str) -> Option<u32> {
    let (h, m) = s.split_once(':')?;
    if h.len() != 2 || m.len() != 2 {
        return None;
    }
    let h: u32 = h.parse().ok()?;
    let m: u32 = m.parse().ok()?;
    if h > 23 || m > 59 {
        return None;
    }
    Some(h * 60 + m)
}

/// Format minutes since midnight back into `"HH:MM"`.
pub fn format_time(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Weekday of a calendar date with 0 = Sunday … 6 = Saturday.
pub fn weekday_of(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// Enumerate bookable start times for `date`: filter the template to the
/// date's weekday, generate times at 30-minute steps from each slot's
/// start (inclusive) to its end (exclusive), in slot order.
///
/// Overlapping slots on the same day are allowed in the template, so
/// repeated times are deduplicated, keeping first-occurrence order.
/// Returns an empty vec when no slot matches the weekday.
pub fn time_options(slots: &[AvailabilitySlot], date: NaiveDate) -> Vec<String> {
    let day = weekday_of(date);
    let mut options: Vec<String> = Vec::new();

    for slot in slots.iter().filter(|s| s.day_of_week == day) {
        let (Some(start), Some(end)) =
            (parse_time(&slot.start_time), parse_time(&slot.end_time))
        else {
            continue;
        };

        let mut m = start;
        while m < end {
            let t = format_time(m);
            if !options.contains(&t) {
                options.push(t);
            }
            m += SLOT_INTERVAL_MINUTES;
        }
    }

    options
}

/// Validate an availability template before it is persisted: every slot
/// needs a weekday in 0–6 and well-formed `"HH:MM"` times with
/// `start < end`. Returns the first problem found.
pub fn validate_slots(slots: &[AvailabilitySlot]) -> Result<(), String> {
    for slot in slots {
        if slot.day_of_week > 6 {
            return Err(format!("Invalid day of week: {}", slot.day_of_week));
        }
        let start = parse_time(&slot.start_time)
            .ok_or_else(|| format!("Invalid start time: {:?}", slot.start_time))?;
        let end = parse_time(&slot.end_time)
            .ok_or_else(|| format!("Invalid end time: {:?}", slot.end_time))?;
        if start >= end {
            return Err(format!(
                "Start time {} must be before end time {}",
                slot.start_time, slot.end_time
            ));
        }
    }
    Ok(())
}
