//! Behaviour of the in-memory repositories.

use std::sync::Arc;

use super::*;
use crate::domain::rules::{DAILY_DONATION_CAPACITY, day_bounds};
use crate::domain::{
    BloodRequestDraft, DonationLocation, DonorRecordDraft, Justification, PersonName,
    RequestQuantity,
};
use crate::test_support::fixtures::{admin, donor, fixture_now, requester};
use chrono::TimeDelta;
use rstest::{fixture, rstest};

#[fixture]
fn store() -> InMemoryStore {
    InMemoryStore::new()
}

fn request(status: RequestStatus, quantity: u32) -> BloodRequest {
    BloodRequest::new(BloodRequestDraft {
        id: BloodRequestId::random(),
        requester_id: *requester().id(),
        patient_name: PersonName::new("John Doe").expect("valid name"),
        blood_type: BloodType::ONegative,
        quantity: RequestQuantity::new(quantity).expect("valid quantity"),
        justification: Justification::new("emergency surgery").expect("valid justification"),
        status,
        admin_note: None,
        created_at: fixture_now(),
        updated_at: fixture_now(),
    })
}

fn record(donor_id: UserId, offset_days: i64) -> DonorRecord {
    DonorRecord::new(DonorRecordDraft {
        id: DonorRecordId::random(),
        donor_id,
        donated_at: fixture_now() + TimeDelta::days(offset_days),
        location: DonationLocation::or_default(None).expect("default location"),
        note: None,
        created_at: fixture_now(),
    })
}

#[rstest]
#[tokio::test]
async fn duplicate_email_is_rejected(store: InMemoryStore) {
    UserRepository::insert(&store, &admin()).await.expect("first insert");

    let error = UserRepository::insert(&store, &admin())
        .await
        .expect_err("duplicate email");

    assert_eq!(
        error,
        UserRepositoryError::duplicate_email("admin@hospital.com")
    );
}

#[rstest]
#[tokio::test]
async fn users_filter_by_role(store: InMemoryStore) {
    let budi = donor("Budi", "budi@example.com", BloodType::APositive);
    UserRepository::insert(&store, &admin()).await.expect("admin");
    UserRepository::insert(&store, &budi).await.expect("donor");

    let donors = store.list_by_role(UserRole::Donor).await.expect("donors");

    assert_eq!(donors, vec![budi]);
}

#[rstest]
#[tokio::test]
async fn list_between_is_half_open(store: InMemoryStore) {
    let donor_id = UserId::random();
    let inside = record(donor_id, 1);
    let at_end = record(donor_id, 2);
    DonorRecordRepository::insert(&store, &inside).await.expect("insert");
    DonorRecordRepository::insert(&store, &at_end).await.expect("insert");

    let found = store
        .list_between(fixture_now(), fixture_now() + TimeDelta::days(2))
        .await
        .expect("range");

    assert_eq!(found, vec![inside]);
    assert_eq!(store.count().await.expect("count"), 2);
}

#[rstest]
#[tokio::test]
async fn updating_unknown_record_fails(store: InMemoryStore) {
    let error = store
        .update(&record(UserId::random(), 1))
        .await
        .expect_err("unknown record");

    assert!(matches!(error, DonorRecordRepositoryError::Query { .. }));
}

#[rstest]
#[tokio::test]
async fn insert_if_absent_keeps_existing_quantity(store: InMemoryStore) {
    let now = fixture_now();
    store
        .upsert(&BloodStock::new(BloodType::ONegative, 30, now))
        .await
        .expect("upsert");
    store
        .insert_if_absent(&BloodStock::initial(BloodType::ONegative, now))
        .await
        .expect("insert_if_absent");

    let stock = store.find(BloodType::ONegative).await.expect("find");

    assert_eq!(stock.map(|stock| stock.quantity()), Some(30));
}

#[rstest]
#[tokio::test]
async fn fulfil_decrements_stock_and_stores_request(store: InMemoryStore) {
    let now = fixture_now();
    let approved = request(RequestStatus::Approved, 5);
    BloodRequestRepository::insert(&store, &approved).await.expect("insert");
    store
        .upsert(&BloodStock::new(BloodType::ONegative, 30, now))
        .await
        .expect("stock");
    let fulfilled = approved
        .transition(RequestStatus::Fulfilled, None, now)
        .expect("legal");

    let stock = store.fulfil(&fulfilled, now).await.expect("fulfil");

    assert_eq!(stock.quantity(), 25);
    let stored = BloodRequestRepository::find_by_id(&store, &approved.id())
        .await
        .expect("find")
        .expect("present");
    assert_eq!(stored.status(), RequestStatus::Fulfilled);
}

#[rstest]
#[tokio::test]
async fn fulfil_with_short_stock_changes_nothing(store: InMemoryStore) {
    let now = fixture_now();
    let approved = request(RequestStatus::Approved, 10);
    BloodRequestRepository::insert(&store, &approved).await.expect("insert");
    store
        .upsert(&BloodStock::new(BloodType::ONegative, 4, now))
        .await
        .expect("stock");
    let fulfilled = approved
        .transition(RequestStatus::Fulfilled, None, now)
        .expect("legal");

    let error = store.fulfil(&fulfilled, now).await.expect_err("short");

    assert_eq!(
        error,
        BloodRequestRepositoryError::insufficient_stock(4_u32, 10_u32)
    );
    let stock = store.find(BloodType::ONegative).await.expect("find");
    assert_eq!(stock.map(|stock| stock.quantity()), Some(4));
    let stored = BloodRequestRepository::find_by_id(&store, &approved.id())
        .await
        .expect("find")
        .expect("present");
    assert_eq!(stored.status(), RequestStatus::Approved);
}

#[rstest]
#[tokio::test]
async fn stale_transition_is_reported(store: InMemoryStore) {
    let now = fixture_now();
    let pending = request(RequestStatus::Pending, 2);
    BloodRequestRepository::insert(&store, &pending).await.expect("insert");
    let rejected = pending
        .transition(RequestStatus::Rejected, None, now)
        .expect("legal");
    store
        .save_transition(&rejected, RequestStatus::Pending)
        .await
        .expect("first transition");

    let error = store
        .save_transition(&rejected, RequestStatus::Pending)
        .await
        .expect_err("stale");

    assert_eq!(
        error,
        BloodRequestRepositoryError::stale_status("Pending", "Ditolak")
    );
}

#[rstest]
#[tokio::test]
async fn missing_request_cannot_be_fulfilled(store: InMemoryStore) {
    let ghost = request(RequestStatus::Fulfilled, 1);

    let error = store
        .fulfil(&ghost, fixture_now())
        .await
        .expect_err("missing");

    assert!(matches!(error, BloodRequestRepositoryError::Missing { .. }));
}

async fn book_full_day(store: &InMemoryStore, offset_days: i64, booked: u32) {
    for _ in 0..booked {
        DonorRecordRepository::insert(store, &record(UserId::random(), offset_days))
            .await
            .expect("insert");
    }
}

async fn booked_on(store: &InMemoryStore, offset_days: i64) -> usize {
    let (start, end) = day_bounds(record(UserId::random(), offset_days).donation_day());
    store.list_between(start, end).await.expect("list").len()
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_bookings_fill_only_the_last_slot() {
    let store = Arc::new(InMemoryStore::new());
    book_full_day(&store, 3, DAILY_DONATION_CAPACITY - 1).await;

    let attempts: Vec<_> = (0..6)
        .map(|_| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                store
                    .insert_within_capacity(&record(UserId::random(), 3), DAILY_DONATION_CAPACITY)
                    .await
                    .expect("booking")
            })
        })
        .collect();
    let mut accepted = 0;
    for attempt in attempts {
        if attempt.await.expect("task") {
            accepted += 1;
        }
    }

    assert_eq!(accepted, 1);
    assert_eq!(booked_on(&store, 3).await, 20);
}

#[rstest]
#[tokio::test]
async fn full_day_refuses_a_move_in_but_not_a_move_within(store: InMemoryStore) {
    book_full_day(&store, 3, DAILY_DONATION_CAPACITY - 1).await;
    let own = record(UserId::random(), 3);
    DonorRecordRepository::insert(&store, &own).await.expect("own");
    let elsewhere = record(UserId::random(), 4);
    DonorRecordRepository::insert(&store, &elsewhere).await.expect("elsewhere");

    let later_same_day = own.rescheduled(
        own.donated_at() + TimeDelta::hours(1),
        own.location().clone(),
        None,
    );
    let moved_in = elsewhere.rescheduled(
        own.donated_at(),
        elsewhere.location().clone(),
        None,
    );

    assert!(store
        .update_within_capacity(&later_same_day, DAILY_DONATION_CAPACITY)
        .await
        .expect("move within"));
    assert!(!store
        .update_within_capacity(&moved_in, DAILY_DONATION_CAPACITY)
        .await
        .expect("move in"));
    assert_eq!(
        DonorRecordRepository::find_by_id(&store, &elsewhere.id())
            .await
            .expect("find"),
        Some(elsewhere)
    );
}

#[rstest]
#[tokio::test]
async fn capacity_bound_update_of_unknown_record_fails(store: InMemoryStore) {
    let error = store
        .update_within_capacity(&record(UserId::random(), 3), DAILY_DONATION_CAPACITY)
        .await
        .expect_err("unknown record");

    assert!(matches!(error, DonorRecordRepositoryError::Query { .. }));
}
