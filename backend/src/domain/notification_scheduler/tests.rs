//! Tests for the notification scheduler's sweeps and lifecycle.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use mockable::Clock;
use rstest::rstest;

use super::*;
use crate::domain::notifications::{DispatchResult, Notification, NotificationIntent};
use crate::domain::ports::{
    DonorRecordRepositoryError, MockBloodStockRepository, MockDonorRecordRepository,
    MockNotificationSender, MockUserRepository, UserRepositoryError,
};
use crate::domain::{
    BloodStock, BloodType, DonationLocation, DonorRecord, DonorRecordDraft, DonorRecordId,
    ErrorCode, StockStatus, User,
};
use crate::test_support::clock::MutableClock;
use crate::test_support::fixtures::{admin, donor, fixture_now, requester};
use crate::test_support::notifications::RecordingNotificationSender;

fn stock(blood_type: BloodType, quantity: u32) -> BloodStock {
    BloodStock::new(blood_type, quantity, fixture_now())
}

fn record_for(donor: &User, donated_at: DateTime<Utc>) -> DonorRecord {
    DonorRecord::new(DonorRecordDraft {
        id: DonorRecordId::random(),
        donor_id: *donor.id(),
        donated_at,
        location: DonationLocation::default(),
        note: None,
        created_at: fixture_now(),
    })
}

fn users_with(known: Vec<User>) -> MockUserRepository {
    let mut users = MockUserRepository::new();
    let by_id = known.clone();
    users
        .expect_find_by_id()
        .returning(move |id| Ok(by_id.iter().find(|user| user.id() == id).cloned()));
    users.expect_list_by_role().returning(move |role| {
        Ok(known
            .iter()
            .filter(|user| user.role() == role)
            .cloned()
            .collect())
    });
    users
}

fn scheduler(
    users: MockUserRepository,
    records: MockDonorRecordRepository,
    stocks: MockBloodStockRepository,
    sender: Arc<dyn NotificationSender>,
) -> NotificationScheduler {
    NotificationScheduler::new(
        SchedulerPorts {
            users: Arc::new(users),
            records: Arc::new(records),
            stocks: Arc::new(stocks),
            sender,
        },
        Arc::new(MutableClock::new(fixture_now())),
        SchedulerConfig::default(),
    )
}

#[rstest]
#[tokio::test]
async fn stock_sweep_alerts_admins_for_low_and_critical_rows() {
    let admin = admin();
    let actor = *admin.id();
    let mut stocks = MockBloodStockRepository::new();
    stocks.expect_list().times(1).return_once(|| {
        Ok(vec![
            stock(BloodType::ONegative, 3),
            stock(BloodType::APositive, 15),
            stock(BloodType::BPositive, 30),
        ])
    });
    let sender = Arc::new(RecordingNotificationSender::default());
    let scheduler = scheduler(
        users_with(vec![admin, requester()]),
        MockDonorRecordRepository::new(),
        stocks,
        sender.clone(),
    );

    let report = scheduler
        .run_job_now(&actor, NotificationJob::StockSweep)
        .await
        .expect("sweep runs");

    assert_eq!(
        report,
        JobReport {
            intents: 2,
            delivered: 2,
            failed: 0
        }
    );
    let sent = sender.notifications();
    let statuses: Vec<StockStatus> = sent
        .iter()
        .filter_map(|notification| match notification.intent() {
            NotificationIntent::LowStock { status, .. } => Some(*status),
            _ => None,
        })
        .collect();
    assert_eq!(statuses, vec![StockStatus::Critical, StockStatus::Low]);
    assert!(
        sent.iter()
            .all(|notification| notification.recipients().len() == 1
                && notification.recipients()[0].as_ref() == "admin@hospital.com")
    );
}

#[rstest]
#[tokio::test]
async fn stock_sweep_without_admins_is_skipped() {
    let mut stocks = MockBloodStockRepository::new();
    stocks
        .expect_list()
        .times(1)
        .return_once(|| Ok(vec![stock(BloodType::ONegative, 2)]));
    let sender = Arc::new(RecordingNotificationSender::default());
    let scheduler = scheduler(
        users_with(Vec::new()),
        MockDonorRecordRepository::new(),
        stocks,
        sender.clone(),
    );

    let report = scheduler
        .runner
        .run(NotificationJob::StockSweep)
        .await
        .expect("sweep runs");

    assert_eq!(report, JobReport::default());
    assert!(sender.notifications().is_empty());
}

#[rstest]
#[tokio::test]
async fn reminders_target_three_days_and_one_day_ahead() {
    let briana = donor("Briana Lumowa", "briana@example.com", BloodType::APositive);
    let in_three = record_for(&briana, fixture_now() + Duration::days(3));
    let tomorrow = record_for(&briana, fixture_now() + Duration::days(1) + Duration::hours(2));
    let mut records = MockDonorRecordRepository::new();
    let three_start = Utc
        .with_ymd_and_hms(2025, 1, 11, 0, 0, 0)
        .single()
        .expect("valid timestamp");
    let one_start = Utc
        .with_ymd_and_hms(2025, 1, 9, 0, 0, 0)
        .single()
        .expect("valid timestamp");
    records
        .expect_list_between()
        .withf(move |start, end| *start == three_start && *end - *start == Duration::days(1))
        .times(1)
        .return_once(move |_, _| Ok(vec![in_three]));
    records
        .expect_list_between()
        .withf(move |start, _| *start == one_start)
        .times(1)
        .return_once(move |_, _| Ok(vec![tomorrow]));
    let sender = Arc::new(RecordingNotificationSender::default());
    let scheduler = scheduler(
        users_with(vec![briana]),
        records,
        MockBloodStockRepository::new(),
        sender.clone(),
    );

    let report = scheduler
        .runner
        .run(NotificationJob::ReminderSweep)
        .await
        .expect("sweep runs");

    assert_eq!(report.intents, 2);
    let reminders: Vec<(i64, NaiveDate)> = sender
        .notifications()
        .iter()
        .filter_map(|notification| match notification.intent() {
            NotificationIntent::Reminder {
                days_until, date, ..
            } => Some((*days_until, *date)),
            _ => None,
        })
        .collect();
    let day = |d| NaiveDate::from_ymd_opt(2025, 1, d).expect("valid date");
    assert_eq!(reminders, vec![(3, day(11)), (1, day(9))]);
}

#[rstest]
#[tokio::test]
async fn reminder_for_deleted_donor_is_skipped() {
    let ghost = donor("Hilang", "hilang@example.com", BloodType::BNegative);
    let orphan = record_for(&ghost, fixture_now() + Duration::days(1));
    let mut records = MockDonorRecordRepository::new();
    records
        .expect_list_between()
        .times(2)
        .returning(move |start, _| {
            if start.date_naive() == orphan.donation_day() {
                Ok(vec![orphan.clone()])
            } else {
                Ok(Vec::new())
            }
        });
    let sender = Arc::new(RecordingNotificationSender::default());
    let scheduler = scheduler(
        users_with(Vec::new()),
        records,
        MockBloodStockRepository::new(),
        sender.clone(),
    );

    let report = scheduler
        .runner
        .run(NotificationJob::ReminderSweep)
        .await
        .expect("sweep runs");

    assert_eq!(report.intents, 0);
}

#[rstest]
#[tokio::test]
async fn failed_donor_lookup_skips_only_that_reminder() {
    let briana = donor("Briana Lumowa", "briana@example.com", BloodType::APositive);
    let yosef = donor("Yosef Rumengan", "yosef@example.com", BloodType::ONegative);
    let yosef_id = *yosef.id();
    let records_for_tomorrow = vec![
        record_for(&yosef, fixture_now() + Duration::days(1)),
        record_for(&briana, fixture_now() + Duration::days(1) + Duration::hours(1)),
    ];
    let mut records = MockDonorRecordRepository::new();
    records
        .expect_list_between()
        .times(2)
        .returning(move |start, _| {
            if start.date_naive() == (fixture_now() + Duration::days(1)).date_naive() {
                Ok(records_for_tomorrow.clone())
            } else {
                Ok(Vec::new())
            }
        });
    let mut users = MockUserRepository::new();
    users.expect_find_by_id().returning(move |id| {
        if *id == yosef_id {
            Err(UserRepositoryError::query("transient"))
        } else {
            Ok(Some(briana.clone()))
        }
    });
    let sender = Arc::new(RecordingNotificationSender::default());
    let scheduler = scheduler(
        users,
        records,
        MockBloodStockRepository::new(),
        sender.clone(),
    );

    let report = scheduler
        .runner
        .run(NotificationJob::ReminderSweep)
        .await
        .expect("sweep continues past the failed lookup");

    assert_eq!(report.intents, 1);
    assert_eq!(report.delivered, 1);
    let sent = sender.notifications();
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent.first().map(|n| n.recipients()[0].as_ref().to_owned()),
        Some("briana@example.com".to_owned())
    );
}

#[rstest]
#[tokio::test]
async fn failed_day_listing_keeps_the_other_lead_day() {
    let briana = donor("Briana Lumowa", "briana@example.com", BloodType::APositive);
    let in_three = record_for(&briana, fixture_now() + Duration::days(3));
    let mut records = MockDonorRecordRepository::new();
    records
        .expect_list_between()
        .times(2)
        .returning(move |start, _| {
            if start.date_naive() == in_three.donation_day() {
                Ok(vec![in_three.clone()])
            } else {
                Err(DonorRecordRepositoryError::connection("pool exhausted"))
            }
        });
    let sender = Arc::new(RecordingNotificationSender::default());
    let scheduler = scheduler(
        users_with(vec![briana]),
        records,
        MockBloodStockRepository::new(),
        sender.clone(),
    );

    let report = scheduler
        .runner
        .run(NotificationJob::ReminderSweep)
        .await
        .expect("sweep continues past the failed day");

    assert_eq!(report.intents, 1);
    assert!(matches!(
        sender.notifications().first().map(|n| n.intent().clone()),
        Some(NotificationIntent::Reminder { days_until: 3, .. })
    ));
}

#[rstest]
#[tokio::test]
async fn weekly_digest_aggregates_counts() {
    let briana = donor("Briana Lumowa", "briana@example.com", BloodType::APositive);
    let past = vec![
        record_for(&briana, fixture_now() - Duration::days(2)),
        record_for(&briana, fixture_now() - Duration::days(6)),
    ];
    let upcoming = vec![record_for(&briana, fixture_now() + Duration::days(4))];
    let mut records = MockDonorRecordRepository::new();
    records
        .expect_list_between()
        .withf(|_, end| *end == fixture_now())
        .times(1)
        .return_once(move |_, _| Ok(past));
    records
        .expect_list_between()
        .withf(|start, _| *start == fixture_now())
        .times(1)
        .return_once(move |_, _| Ok(upcoming));
    let mut stocks = MockBloodStockRepository::new();
    stocks.expect_list().times(1).return_once(|| {
        Ok(vec![
            stock(BloodType::ONegative, 3),
            stock(BloodType::AbNegative, 5),
            stock(BloodType::APositive, 12),
            stock(BloodType::OPositive, 40),
        ])
    });
    let sender = Arc::new(RecordingNotificationSender::default());
    let scheduler = scheduler(users_with(vec![admin()]), records, stocks, sender.clone());

    let report = scheduler
        .runner
        .run(NotificationJob::WeeklyDigest)
        .await
        .expect("digest runs");

    assert_eq!(report.intents, 1);
    let sent = sender.notifications();
    let NotificationIntent::WeeklyDigest(summary) = sent[0].intent() else {
        panic!("expected a weekly digest");
    };
    assert_eq!(summary.donations_last_week, 2);
    assert_eq!(summary.upcoming_donations, 1);
    assert_eq!(summary.critical_stocks, 2);
    assert_eq!(summary.low_stocks, 1);
    assert_eq!(
        summary.period_start,
        NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid date")
    );
}

#[rstest]
#[tokio::test]
async fn undelivered_notifications_are_counted_and_the_sweep_continues() {
    let mut stocks = MockBloodStockRepository::new();
    stocks.expect_list().times(1).return_once(|| {
        Ok(vec![stock(BloodType::ONegative, 1), stock(BloodType::BNegative, 4)])
    });
    let mut sender = MockNotificationSender::new();
    let mut calls = 0;
    sender.expect_dispatch().times(2).returning(move |_| {
        calls += 1;
        DispatchResult {
            ok: calls == 2,
            delivered: usize::from(calls == 2),
            recipients_failed: Vec::new(),
        }
    });
    let scheduler = scheduler(
        users_with(vec![admin()]),
        MockDonorRecordRepository::new(),
        stocks,
        Arc::new(sender),
    );

    let report = scheduler
        .runner
        .run(NotificationJob::StockSweep)
        .await
        .expect("sweep runs");

    assert_eq!(
        report,
        JobReport {
            intents: 2,
            delivered: 1,
            failed: 1
        }
    );
}

#[rstest]
#[tokio::test]
async fn manual_trigger_requires_admin() {
    let maria = requester();
    let actor = *maria.id();
    let scheduler = scheduler(
        users_with(vec![maria]),
        MockDonorRecordRepository::new(),
        MockBloodStockRepository::new(),
        Arc::new(RecordingNotificationSender::default()),
    );

    let error = scheduler
        .run_job_now(&actor, NotificationJob::WeeklyDigest)
        .await
        .expect_err("forbidden");
    assert_eq!(error.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn lifecycle_guards_double_start_and_stop_is_idempotent() {
    let scheduler = scheduler(
        users_with(Vec::new()),
        MockDonorRecordRepository::new(),
        MockBloodStockRepository::new(),
        Arc::new(RecordingNotificationSender::default()),
    );
    assert_eq!(scheduler.state(), SchedulerState::Idle);

    scheduler.start().expect("first start");
    assert_eq!(scheduler.state(), SchedulerState::Running);
    let error = scheduler.start().expect_err("double start");
    assert_eq!(error.code(), ErrorCode::Conflict);

    scheduler.stop().await;
    assert_eq!(scheduler.state(), SchedulerState::Stopped);
    scheduler.stop().await;
    assert_eq!(scheduler.state(), SchedulerState::Stopped);
    assert!(scheduler.start().is_err());
}

/// Advances the shared clock instead of waiting, then parks forever once
/// its budget is spent.
struct AdvancingSleeper {
    clock: Arc<MutableClock>,
    budget: Mutex<usize>,
    waits: Mutex<Vec<StdDuration>>,
}

#[async_trait]
impl NotificationSleeper for AdvancingSleeper {
    async fn sleep(&self, duration: StdDuration) {
        let proceed = {
            let mut budget = self.budget.lock().expect("budget mutex");
            self.waits.lock().expect("waits mutex").push(duration);
            if *budget == 0 {
                false
            } else {
                *budget -= 1;
                true
            }
        };
        if !proceed {
            std::future::pending::<()>().await;
        }
        self.clock.advance(duration);
        tokio::task::yield_now().await;
    }
}

#[rstest]
#[tokio::test]
async fn running_loop_waits_for_the_next_fire_and_spawns_jobs() {
    let clock = Arc::new(MutableClock::new(fixture_now()));
    let sleeper = Arc::new(AdvancingSleeper {
        clock: Arc::clone(&clock),
        budget: Mutex::new(3),
        waits: Mutex::new(Vec::new()),
    });
    let admin = admin();
    let mut users = MockUserRepository::new();
    let listed = admin.clone();
    users
        .expect_list_by_role()
        .returning(move |_| Ok(vec![listed.clone()]));
    users
        .expect_find_by_id()
        .returning(move |_| Ok(Some(admin.clone())));
    let mut records = MockDonorRecordRepository::new();
    records
        .expect_list_between()
        .returning(|_, _| Ok(Vec::new()));
    let mut stocks = MockBloodStockRepository::new();
    stocks
        .expect_list()
        .returning(|| Ok(vec![stock(BloodType::ONegative, 2)]));
    let sender = Arc::new(RecordingNotificationSender::default());
    let local_start = clock.local().naive_local();
    let scheduler = NotificationScheduler::with_sleeper(
        SchedulerPorts {
            users: Arc::new(users),
            records: Arc::new(records),
            stocks: Arc::new(stocks),
            sender: sender.clone(),
        },
        clock.clone(),
        sleeper.clone(),
        SchedulerConfig::default(),
    );

    scheduler.start().expect("start");
    for _ in 0..200 {
        if !sender.notifications().is_empty() && sleeper.waits.lock().expect("waits").len() > 3 {
            break;
        }
        tokio::task::yield_now().await;
    }
    scheduler.stop().await;

    let (first_fire, _) = next_due(local_start);
    let waits = sleeper.waits.lock().expect("waits").clone();
    assert_eq!(
        waits.first().copied(),
        (first_fire - local_start).to_std().ok()
    );
    assert!(!sender.notifications().is_empty());
    assert_eq!(scheduler.state(), SchedulerState::Stopped);
}

/// Holds every dispatch until the gate opens.
struct GatedSender {
    gate: tokio::sync::Semaphore,
    entered: AtomicUsize,
    delivered: AtomicUsize,
}

impl GatedSender {
    fn closed() -> Self {
        Self {
            gate: tokio::sync::Semaphore::new(0),
            entered: AtomicUsize::new(0),
            delivered: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl NotificationSender for GatedSender {
    async fn dispatch(&self, notification: &Notification) -> DispatchResult {
        self.entered.fetch_add(1, Ordering::SeqCst);
        let _permit = self.gate.acquire().await;
        self.delivered.fetch_add(1, Ordering::SeqCst);
        DispatchResult {
            ok: true,
            delivered: notification.recipients().len(),
            recipients_failed: Vec::new(),
        }
    }
}

#[rstest]
#[tokio::test]
async fn stop_waits_for_jobs_in_flight() {
    let clock = Arc::new(MutableClock::new(fixture_now()));
    let sleeper = Arc::new(AdvancingSleeper {
        clock: Arc::clone(&clock),
        budget: Mutex::new(1),
        waits: Mutex::new(Vec::new()),
    });
    let admin = admin();
    let briana = donor("Briana Tumundo", "briana@example.com", BloodType::APositive);
    let booked = record_for(&briana, fixture_now() + Duration::days(1));
    let mut users = MockUserRepository::new();
    users
        .expect_list_by_role()
        .returning(move |_| Ok(vec![admin.clone()]));
    users
        .expect_find_by_id()
        .returning(move |_| Ok(Some(briana.clone())));
    let mut records = MockDonorRecordRepository::new();
    records
        .expect_list_between()
        .returning(move |_, _| Ok(vec![booked.clone()]));
    let mut stocks = MockBloodStockRepository::new();
    stocks
        .expect_list()
        .returning(|| Ok(vec![stock(BloodType::ONegative, 2)]));
    let sender = Arc::new(GatedSender::closed());
    let scheduler = Arc::new(NotificationScheduler::with_sleeper(
        SchedulerPorts {
            users: Arc::new(users),
            records: Arc::new(records),
            stocks: Arc::new(stocks),
            sender: sender.clone(),
        },
        clock,
        sleeper,
        SchedulerConfig::default(),
    ));

    scheduler.start().expect("start");
    for _ in 0..200 {
        if sender.entered.load(Ordering::SeqCst) > 0 {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert!(sender.entered.load(Ordering::SeqCst) > 0);

    let stopping = tokio::spawn({
        let scheduler = Arc::clone(&scheduler);
        async move { scheduler.stop().await }
    });
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
    assert!(!stopping.is_finished());
    assert_eq!(sender.delivered.load(Ordering::SeqCst), 0);

    sender.gate.add_permits(16);
    stopping.await.expect("stop completes");

    assert!(sender.delivered.load(Ordering::SeqCst) > 0);
    assert_eq!(scheduler.state(), SchedulerState::Stopped);
}
