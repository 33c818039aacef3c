//! Indonesian calendar formatting for dashboards and notifications.

use chrono::{Datelike, NaiveDate};

const MONTHS: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

/// Indonesian month name for a 1-based month number.
pub fn month_name(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|index| usize::try_from(index).ok())
        .and_then(|index| MONTHS.get(index))
        .copied()
        .unwrap_or("")
}

/// Format as `D Bulan YYYY`, e.g. `5 Januari 2025`.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use donor_backend::domain::date_format::indonesian_date;
///
/// let date = NaiveDate::from_ymd_opt(2025, 8, 17).unwrap();
/// assert_eq!(indonesian_date(date), "17 Agustus 2025");
/// ```
pub fn indonesian_date(date: NaiveDate) -> String {
    format!("{} {} {}", date.day(), month_name(date.month()), date.year())
}

/// Format as `DD/MM`.
pub fn day_month(date: NaiveDate) -> String {
    format!("{:02}/{:02}", date.day(), date.month())
}
