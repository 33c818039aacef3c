//! Sample users and timestamps shared by unit and behaviour tests.

use chrono::{DateTime, TimeZone, Utc};

use crate::domain::{
    BloodType, EmailAddress, PasswordHash, PersonName, User, UserDraft, UserId, UserRole,
};

/// Wednesday 8 January 2025, 09:00 UTC.
pub fn fixture_now() -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(2025, 1, 8, 9, 0, 0).single() {
        Some(timestamp) => timestamp,
        None => panic!("fixture timestamp"),
    }
}

/// Build a user with a placeholder hash.
pub fn user(role: UserRole, name: &str, email: &str, blood_type: Option<BloodType>) -> User {
    let draft = UserDraft {
        id: UserId::random(),
        email: match EmailAddress::new(email) {
            Ok(email) => email,
            Err(error) => panic!("fixture email {email}: {error}"),
        },
        name: match PersonName::new(name) {
            Ok(name) => name,
            Err(error) => panic!("fixture name {name}: {error}"),
        },
        role,
        password_hash: PasswordHash::new("fixture-hash"),
        blood_type,
        phone: None,
        address: None,
        registered_at: fixture_now(),
    };
    match User::try_new(draft) {
        Ok(user) => user,
        Err(error) => panic!("fixture user: {error}"),
    }
}

pub fn admin() -> User {
    user(UserRole::Admin, "Admin RS", "admin@hospital.com", None)
}

pub fn donor(name: &str, email: &str, blood_type: BloodType) -> User {
    user(UserRole::Donor, name, email, Some(blood_type))
}

pub fn requester() -> User {
    user(
        UserRole::Requester,
        "Maria Tan",
        "maria.tan@example.com",
        None,
    )
}
