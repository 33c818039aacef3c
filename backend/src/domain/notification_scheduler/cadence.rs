//! Fire times for the scheduled jobs, as pure functions of local time.

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Weekday};

use crate::domain::ports::NotificationJob;

const STOCK_SWEEP_HOURS: [u32; 4] = [0, 6, 12, 18];
const REMINDER_HOURS: [u32; 1] = [9];
const DIGEST_HOURS: [u32; 1] = [8];
const DIGEST_WEEKDAY: Weekday = Weekday::Mon;

fn hours(job: NotificationJob) -> &'static [u32] {
    match job {
        NotificationJob::StockSweep => &STOCK_SWEEP_HOURS,
        NotificationJob::ReminderSweep => &REMINDER_HOURS,
        NotificationJob::WeeklyDigest => &DIGEST_HOURS,
    }
}

fn fires_on(job: NotificationJob, day: NaiveDate) -> bool {
    match job {
        NotificationJob::WeeklyDigest => day.weekday() == DIGEST_WEEKDAY,
        NotificationJob::StockSweep | NotificationJob::ReminderSweep => true,
    }
}

fn at_hour(day: NaiveDate, hour: u32) -> NaiveDateTime {
    day.and_time(NaiveTime::MIN) + TimeDelta::hours(i64::from(hour))
}

/// First fire time of `job` strictly after `now`.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use donor_backend::domain::notification_scheduler::next_fire;
/// use donor_backend::domain::ports::NotificationJob;
///
/// let now = NaiveDate::from_ymd_opt(2025, 1, 8)
///     .and_then(|d| d.and_hms_opt(7, 30, 0))
///     .expect("valid time");
/// let next = next_fire(NotificationJob::StockSweep, now);
/// assert_eq!(next.to_string(), "2025-01-08 12:00:00");
/// ```
pub fn next_fire(job: NotificationJob, now: NaiveDateTime) -> NaiveDateTime {
    let today = now.date();
    (0..=7_u64)
        .filter_map(|offset| today.checked_add_days(Days::new(offset)))
        .filter(|day| fires_on(job, *day))
        .flat_map(|day| hours(job).iter().map(move |hour| at_hour(day, *hour)))
        .find(|candidate| *candidate > now)
        .unwrap_or_else(|| now + TimeDelta::days(7))
}

/// The soonest fire time across every job and the jobs due at that instant.
pub fn next_due(now: NaiveDateTime) -> (NaiveDateTime, Vec<NotificationJob>) {
    let fires: Vec<(NotificationJob, NaiveDateTime)> = NotificationJob::ALL
        .into_iter()
        .map(|job| (job, next_fire(job, now)))
        .collect();
    let soonest = fires
        .iter()
        .map(|(_, at)| *at)
        .min()
        .unwrap_or_else(|| now + TimeDelta::days(7));
    let due = fires
        .into_iter()
        .filter(|(_, at)| *at == soonest)
        .map(|(job, _)| job)
        .collect();
    (soonest, due)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|day| day.and_hms_opt(h, min, 0))
            .expect("valid local time")
    }

    #[rstest]
    #[case(local(2025, 1, 8, 0, 0), local(2025, 1, 8, 6, 0))]
    #[case(local(2025, 1, 8, 5, 59), local(2025, 1, 8, 6, 0))]
    #[case(local(2025, 1, 8, 12, 0), local(2025, 1, 8, 18, 0))]
    #[case(local(2025, 1, 8, 18, 30), local(2025, 1, 9, 0, 0))]
    fn stock_sweep_runs_every_six_hours(#[case] now: NaiveDateTime, #[case] expected: NaiveDateTime) {
        assert_eq!(next_fire(NotificationJob::StockSweep, now), expected);
    }

    #[rstest]
    #[case(local(2025, 1, 8, 8, 59), local(2025, 1, 8, 9, 0))]
    #[case(local(2025, 1, 8, 9, 0), local(2025, 1, 9, 9, 0))]
    #[case(local(2025, 12, 31, 23, 0), local(2026, 1, 1, 9, 0))]
    fn reminders_run_daily_at_nine(#[case] now: NaiveDateTime, #[case] expected: NaiveDateTime) {
        assert_eq!(next_fire(NotificationJob::ReminderSweep, now), expected);
    }

    #[rstest]
    #[case(local(2025, 1, 8, 9, 0), local(2025, 1, 13, 8, 0))]
    #[case(local(2025, 1, 13, 7, 0), local(2025, 1, 13, 8, 0))]
    #[case(local(2025, 1, 13, 8, 0), local(2025, 1, 20, 8, 0))]
    #[case(local(2025, 1, 12, 23, 59), local(2025, 1, 13, 8, 0))]
    fn digest_runs_monday_morning(#[case] now: NaiveDateTime, #[case] expected: NaiveDateTime) {
        assert_eq!(next_fire(NotificationJob::WeeklyDigest, now), expected);
    }

    #[rstest]
    fn next_due_picks_the_soonest_job() {
        let (at, due) = next_due(local(2025, 1, 13, 7, 0));
        assert_eq!(at, local(2025, 1, 13, 8, 0));
        assert_eq!(due, vec![NotificationJob::WeeklyDigest]);

        let (at, due) = next_due(local(2025, 1, 13, 8, 0));
        assert_eq!(at, local(2025, 1, 13, 9, 0));
        assert_eq!(due, vec![NotificationJob::ReminderSweep]);
    }
}
