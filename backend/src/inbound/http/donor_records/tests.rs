//! Tests for donation schedule handlers.

use super::*;
use crate::domain::ports::DonorDashboard;
use crate::domain::{BloodType, DonationLocation, DonorRecordDraft};
use crate::inbound::http::test_utils::{
    MockPorts, TEST_LOGIN_PATH, error_code, session_cookie, test_login, test_session_middleware,
};
use crate::test_support::fixtures::fixture_now;
use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test, web};
use chrono::TimeDelta;
use rstest::rstest;
use serde_json::{Value, json};

fn test_app(
    ports: MockPorts,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(ports.into_state())
        .wrap(test_session_middleware())
        .route(TEST_LOGIN_PATH, web::post().to(test_login))
        .service(
            web::scope("/api/v1")
                .service(list_records)
                .service(schedule)
                .service(reschedule)
                .service(cancel)
                .service(donor_dashboard),
        )
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

#[actix_web::test]
async fn list_derives_status_from_the_clock() {
    let donor_id = UserId::random();
    let mut ports = MockPorts::default();
    ports
        .donations_query
        .expect_list_records()
        .return_once(move |_| Ok(vec![record(donor_id, -120), record(donor_id, -10)]));
    let app = actix_test::init_service(test_app(ports)).await;
    let cookie = session_cookie(&app, &donor_id).await;

    let req = actix_test::TestRequest::get()
        .uri("/api/v1/donor-records")
        .cookie(cookie)
        .to_request();
    let body: Vec<DonorRecordResponse> = actix_test::call_and_read_body_json(&app, req).await;

    let statuses: Vec<&str> = body.iter().map(|entry| entry.status.as_str()).collect();
    assert_eq!(statuses, vec!["Siap Donor", "Masa Tunggu"]);
    assert_eq!(body[0].location, "RS Sentra Medika Minahasa Utara");
}

#[actix_web::test]
async fn donor_schedules_for_themselves() {
    let donor_id = UserId::random();
    let mut ports = MockPorts::default();
    ports
        .donations
        .expect_schedule()
        .withf(move |actor, request| {
            *actor == donor_id
                && request.donor_id.is_none()
                && request.donated_at == fixture_now() + TimeDelta::days(5) - TimeDelta::hours(8)
                && request.location.as_deref() == Some("PMI Manado")
        })
        .times(1)
        .return_once(move |_, _| Ok(record(donor_id, 5)));
    let app = actix_test::init_service(test_app(ports)).await;
    let cookie = session_cookie(&app, &donor_id).await;

    let req = actix_test::TestRequest::post()
        .uri("/api/v1/donor-records")
        .cookie(cookie)
        .set_json(json!({
            "donatedAt": "2025-01-13T09:00:00+08:00",
            "location": "PMI Manado"
        }))
        .to_request();
    let res = actix_test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::CREATED);
}

#[rstest]
#[case::missing_date(json!({}), "donatedAt", "missing_field")]
#[case::bad_date(json!({ "donatedAt": "13/01/2025" }), "donatedAt", "invalid_timestamp")]
#[case::bad_donor(json!({ "donorId": "budi", "donatedAt": "2025-01-13T09:00:00Z" }), "donorId", "invalid_uuid")]
#[actix_web::test]
async fn schedule_rejects_malformed_payloads(
    #[case] payload: Value,
    #[case] field: &str,
    #[case] code: &str,
) {
    let mut ports = MockPorts::default();
    ports.donations.expect_schedule().times(0);
    let app = actix_test::init_service(test_app(ports)).await;
    let cookie = session_cookie(&app, &UserId::random()).await;

    let req = actix_test::TestRequest::post()
        .uri("/api/v1/donor-records")
        .cookie(cookie)
        .set_json(payload)
        .to_request();
    let res = actix_test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["details"]["field"], field);
    assert_eq!(body["details"]["code"], code);
}

#[actix_web::test]
async fn rule_rejection_is_unprocessable_with_reason() {
    let mut ports = MockPorts::default();
    ports.donations.expect_schedule().return_once(|_, _| {
        Err(Error::scheduling_rejected("donation centre is closed on Sundays")
            .with_details(json!({ "code": "closed_day" })))
    });
    let app = actix_test::init_service(test_app(ports)).await;
    let cookie = session_cookie(&app, &UserId::random()).await;

    let req = actix_test::TestRequest::post()
        .uri("/api/v1/donor-records")
        .cookie(cookie)
        .set_json(json!({ "donatedAt": "2025-01-12T09:00:00+08:00" }))
        .to_request();
    let res = actix_test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["code"], "scheduling_rejected");
    assert_eq!(body["details"]["code"], "closed_day");
}

#[actix_web::test]
async fn reschedule_passes_record_id() {
    let donor_id = UserId::random();
    let existing = record(donor_id, 3);
    let record_id = existing.id();
    let mut ports = MockPorts::default();
    ports
        .donations
        .expect_reschedule()
        .withf(move |actor, id, update| {
            *actor == donor_id && *id == record_id && update.location.is_none()
        })
        .times(1)
        .return_once(move |_, _, _| Ok(existing));
    let app = actix_test::init_service(test_app(ports)).await;
    let cookie = session_cookie(&app, &donor_id).await;

    let req = actix_test::TestRequest::put()
        .uri(&format!("/api/v1/donor-records/{record_id}"))
        .cookie(cookie)
        .set_json(json!({ "donatedAt": "2025-01-11T10:00:00+08:00" }))
        .to_request();
    let body: DonorRecordResponse = actix_test::call_and_read_body_json(&app, req).await;

    assert_eq!(body.id, record_id.to_string());
}

#[actix_web::test]
async fn cancel_returns_no_content() {
    let record_id = DonorRecordId::random();
    let mut ports = MockPorts::default();
    ports
        .donations
        .expect_cancel()
        .withf(move |_, id| *id == record_id)
        .times(1)
        .return_once(|_, _| Ok(()));
    let app = actix_test::init_service(test_app(ports)).await;
    let cookie = session_cookie(&app, &UserId::random()).await;

    let req = actix_test::TestRequest::delete()
        .uri(&format!("/api/v1/donor-records/{record_id}"))
        .cookie(cookie)
        .to_request();
    let res = actix_test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[actix_web::test]
async fn cancelling_a_past_record_conflicts() {
    let mut ports = MockPorts::default();
    ports
        .donations
        .expect_cancel()
        .return_once(|_, _| Err(Error::conflict("only upcoming donations can be cancelled")));
    let app = actix_test::init_service(test_app(ports)).await;
    let cookie = session_cookie(&app, &UserId::random()).await;

    let req = actix_test::TestRequest::delete()
        .uri(&format!("/api/v1/donor-records/{}", DonorRecordId::random()))
        .cookie(cookie)
        .to_request();
    let res = actix_test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(error_code(res).await, "conflict");
}

#[actix_web::test]
async fn dashboard_renders_localised_fields() {
    let mut ports = MockPorts::default();
    ports.donations_query.expect_donor_dashboard().return_once(|_| {
        Ok(DonorDashboard {
            name: "Budi Santoso".to_owned(),
            blood_type: Some(BloodType::OPositive),
            next_eligible_date: Some("7 April 2025".to_owned()),
            next_eligible_at: Some(fixture_now() + TimeDelta::days(89)),
            eligible_now: false,
            total_donations: 2,
            recent_donations: vec!["7 Januari 2025 - RS Sentra Medika Minahasa Utara".to_owned()],
        })
    });
    let app = actix_test::init_service(test_app(ports)).await;
    let cookie = session_cookie(&app, &UserId::random()).await;

    let req = actix_test::TestRequest::get()
        .uri("/api/v1/donor/dashboard")
        .cookie(cookie)
        .to_request();
    let body: Value = actix_test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["bloodType"], "O+");
    assert_eq!(body["nextEligibleDate"], "7 April 2025");
    assert_eq!(body["eligibleNow"], false);
    assert_eq!(body["recentDonations"].as_array().map(Vec::len), Some(1));
}
