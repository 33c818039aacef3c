//! Tests for the account service.

use std::sync::Arc;

use rstest::rstest;

use super::*;
use crate::domain::ports::{MockPasswordHasher, MockUserRepository, UserRepositoryError};
use crate::domain::{
    BloodType, EmailAddress, ErrorCode, Password, PasswordHash, PersonName, UserRole,
};
use crate::test_support::clock::MutableClock;
use crate::test_support::fixtures::{donor, fixture_now};

fn make_service(
    users: MockUserRepository,
    hasher: MockPasswordHasher,
) -> AccountServiceImpl<MockUserRepository, MockPasswordHasher> {
    AccountServiceImpl::new(
        Arc::new(users),
        Arc::new(hasher),
        Arc::new(MutableClock::new(fixture_now())),
    )
}

fn registration(role: UserRole, blood_type: Option<BloodType>) -> RegisterUserRequest {
    RegisterUserRequest {
        email: EmailAddress::new("Briana@Example.com").expect("email"),
        name: PersonName::new("Briana Tumundo").expect("name"),
        password: Password::new_for_registration("rahasia").expect("password"),
        role,
        blood_type,
        phone: None,
        address: Some("  ".to_owned()),
    }
}

fn hashing_hasher() -> MockPasswordHasher {
    let mut hasher = MockPasswordHasher::new();
    hasher
        .expect_hash()
        .times(1)
        .return_once(|_| Ok(PasswordHash::new("salt$digest")));
    hasher
}

#[rstest]
#[tokio::test]
async fn register_stores_hashed_donor() {
    let mut users = MockUserRepository::new();
    users
        .expect_insert()
        .withf(|user| {
            user.password_hash().as_str() == "salt$digest"
                && user.email().as_ref() == "briana@example.com"
        })
        .times(1)
        .return_once(|_| Ok(()));

    let service = make_service(users, hashing_hasher());
    let user = service
        .register(registration(UserRole::Donor, Some(BloodType::APositive)))
        .await
        .expect("registered");

    assert_eq!(user.role(), UserRole::Donor);
    assert_eq!(user.blood_type(), Some(BloodType::APositive));
    assert_eq!(user.address(), None);
    assert_eq!(user.registered_at(), fixture_now());
}

#[rstest]
#[tokio::test]
async fn register_rejects_donor_without_blood_type() {
    let mut users = MockUserRepository::new();
    users.expect_insert().times(0);

    let service = make_service(users, hashing_hasher());
    let error = service
        .register(registration(UserRole::Donor, None))
        .await
        .expect_err("invalid");

    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let mut users = MockUserRepository::new();
    users
        .expect_insert()
        .times(1)
        .return_once(|_| Err(UserRepositoryError::duplicate_email("briana@example.com")));

    let service = make_service(users, hashing_hasher());
    let error = service
        .register(registration(UserRole::Requester, None))
        .await
        .expect_err("conflict");

    assert_eq!(error.code(), ErrorCode::Conflict);
}

#[rstest]
#[case(false)]
#[case(true)]
#[tokio::test]
async fn login_failures_share_one_message(#[case] known_email: bool) {
    let stored = donor("Briana Tumundo", "briana@example.com", BloodType::APositive);
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_email()
        .times(1)
        .return_once(move |_| Ok(known_email.then_some(stored)));
    let mut hasher = MockPasswordHasher::new();
    hasher
        .expect_verify()
        .times(usize::from(known_email))
        .returning(|_, _| Ok(false));

    let service = make_service(users, hasher);
    let credentials =
        LoginCredentials::try_from_parts("briana@example.com", "salah").expect("credentials");
    let error = service
        .authenticate(&credentials)
        .await
        .expect_err("rejected");

    assert_eq!(error.code(), ErrorCode::Unauthorized);
    assert_eq!(error.message(), "invalid email or password");
}

#[rstest]
#[tokio::test]
async fn login_returns_user_on_match() {
    let stored = donor("Briana Tumundo", "briana@example.com", BloodType::APositive);
    let expected_id = *stored.id();
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_email()
        .times(1)
        .return_once(move |_| Ok(Some(stored)));
    let mut hasher = MockPasswordHasher::new();
    hasher.expect_verify().times(1).returning(|_, _| Ok(true));

    let service = make_service(users, hasher);
    let credentials =
        LoginCredentials::try_from_parts("briana@example.com", "rahasia").expect("credentials");
    let user = service.authenticate(&credentials).await.expect("login");

    assert_eq!(*user.id(), expected_id);
}

#[rstest]
#[tokio::test]
async fn current_user_requires_existing_account() {
    let mut users = MockUserRepository::new();
    users.expect_find_by_id().times(1).return_once(|_| Ok(None));

    let service = make_service(users, MockPasswordHasher::new());
    let error = service
        .current_user(&UserId::random())
        .await
        .expect_err("unknown");

    assert_eq!(error.code(), ErrorCode::Unauthorized);
}
