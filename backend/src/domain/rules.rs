//! Eligibility, calendar, capacity, and stock rules.
//!
//! Every function here is pure. HTTP handlers, domain services, and the
//! notification scheduler all call into this module so the thresholds live in
//! one place.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use serde_json::json;

use super::{Error, StockStatus};

/// Days a donor must wait between donations.
pub const ELIGIBILITY_WINDOW_DAYS: i64 = 90;
/// Quantities below this are [`StockStatus::Critical`].
pub const LOW_STOCK_THRESHOLD: u32 = 10;
/// Quantities at or above this are [`StockStatus::Safe`].
pub const SAFE_STOCK_THRESHOLD: u32 = 20;
/// Maximum donations accepted on one calendar day.
pub const DAILY_DONATION_CAPACITY: u32 = 20;
/// Largest quantity a stock row may hold; the `INTEGER` column bound.
pub const MAX_STOCK_QUANTITY: u32 = 2_147_483_647;
/// Quantity given to a blood type that has no stock row yet.
pub const DEFAULT_STOCK_QUANTITY: u32 = 8;
/// Weekday on which the donation centre is closed.
pub const CLOSED_WEEKDAY: Weekday = Weekday::Sun;
/// Location recorded when a donation does not name one.
pub const DEFAULT_DONATION_LOCATION: &str = "RS Sentra Medika Minahasa Utara";

/// Reasons a donation schedule is refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulingError {
    #[error("the donation centre is closed on {date} (Sunday)")]
    ClosedDay { date: NaiveDate },
    #[error("{date} is before today ({today})")]
    PastDate { date: NaiveDate, today: NaiveDate },
    #[error("{date} is fully booked ({capacity} donations)")]
    DayFullyBooked { date: NaiveDate, capacity: u32 },
    #[error("donor is not eligible again until {next_eligible}")]
    NotEligible { next_eligible: DateTime<Utc> },
}

impl SchedulingError {
    /// Machine-readable reason carried in error details.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::ClosedDay { .. } => "closed_day",
            Self::PastDate { .. } => "past_date",
            Self::DayFullyBooked { .. } => "day_fully_booked",
            Self::NotEligible { .. } => "not_eligible",
        }
    }
}

impl From<SchedulingError> for Error {
    fn from(value: SchedulingError) -> Self {
        let details = match &value {
            SchedulingError::ClosedDay { date } => {
                json!({ "code": value.reason(), "date": date.to_string() })
            }
            SchedulingError::PastDate { date, today } => json!({
                "code": value.reason(),
                "date": date.to_string(),
                "today": today.to_string(),
            }),
            SchedulingError::DayFullyBooked { date, capacity } => json!({
                "code": value.reason(),
                "date": date.to_string(),
                "capacity": capacity,
            }),
            SchedulingError::NotEligible { next_eligible } => json!({
                "code": value.reason(),
                "nextEligibleAt": next_eligible.to_rfc3339(),
            }),
        };
        Error::scheduling_rejected(value.to_string()).with_details(details)
    }
}

/// A fulfilment asked for more bags than are in stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("insufficient stock: {available} bags available, {requested} requested")]
pub struct InsufficientStock {
    pub available: u32,
    pub requested: u32,
}

impl From<InsufficientStock> for Error {
    fn from(value: InsufficientStock) -> Self {
        Error::insufficient_stock(value.to_string()).with_details(json!({
            "available": value.available,
            "requested": value.requested,
        }))
    }
}

/// Cooldown between two donations.
pub fn eligibility_window() -> Duration {
    Duration::days(ELIGIBILITY_WINDOW_DAYS)
}

/// Classify a stock quantity.
///
/// # Examples
/// ```
/// use donor_backend::domain::{StockStatus, rules::stock_status};
///
/// assert_eq!(stock_status(9), StockStatus::Critical);
/// assert_eq!(stock_status(10), StockStatus::Low);
/// assert_eq!(stock_status(20), StockStatus::Safe);
/// ```
pub fn stock_status(quantity: u32) -> StockStatus {
    if quantity < LOW_STOCK_THRESHOLD {
        StockStatus::Critical
    } else if quantity < SAFE_STOCK_THRESHOLD {
        StockStatus::Low
    } else {
        StockStatus::Safe
    }
}

/// Earliest moment a donor may donate again, or `None` for first-time donors.
pub fn next_eligible_date(last_donation: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    last_donation.map(|last| last + eligibility_window())
}

/// Whether a donation at `candidate` respects the cooldown after `last_donation`.
pub fn is_eligible(last_donation: Option<DateTime<Utc>>, candidate: DateTime<Utc>) -> bool {
    next_eligible_date(last_donation).is_none_or(|next| candidate >= next)
}

/// Check a requested donation day against the calendar.
///
/// Sundays are rejected before the past-date check, so a future Sunday still
/// reports [`SchedulingError::ClosedDay`].
pub fn is_valid_schedule_date(date: NaiveDate, today: NaiveDate) -> Result<(), SchedulingError> {
    if date.weekday() == CLOSED_WEEKDAY {
        return Err(SchedulingError::ClosedDay { date });
    }
    if date < today {
        return Err(SchedulingError::PastDate { date, today });
    }
    Ok(())
}

/// UTC half-open interval `[start, end)` covering one calendar day.
pub fn day_bounds(day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = day.and_time(NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1))
}

/// Remaining donation slots on a day that already has `existing` entries.
pub fn day_capacity_remaining(existing: u32, capacity: u32) -> u32 {
    capacity.saturating_sub(existing)
}

/// Whether `stock` bags cover a request for `requested` bags.
pub fn can_fulfill(stock: u32, requested: u32) -> bool {
    stock >= requested
}

/// Decrement `stock` by `requested`, returning the new quantity and status.
pub fn apply_fulfillment(
    stock: u32,
    requested: u32,
) -> Result<(u32, StockStatus), InsufficientStock> {
    if !can_fulfill(stock, requested) {
        return Err(InsufficientStock {
            available: stock,
            requested,
        });
    }
    let remaining = stock - requested;
    Ok((remaining, stock_status(remaining)))
}
