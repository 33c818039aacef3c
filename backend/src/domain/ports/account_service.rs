//! Driving port for registration, login, and the current-user lookup.
//!
//! Inbound adapters call this port after parsing raw payloads into domain
//! values. Session issuance stays in the HTTP adapter: it stores the returned
//! user id in the encrypted session cookie.

use async_trait::async_trait;

use crate::domain::{
    BloodType, EmailAddress, Error, LoginCredentials, Password, PersonName, PhoneNumber, User,
    UserId, UserRole,
};

/// Validated registration payload.
#[derive(Debug, Clone)]
pub struct RegisterUserRequest {
    pub email: EmailAddress,
    pub name: PersonName,
    pub password: Password,
    pub role: UserRole,
    pub blood_type: Option<BloodType>,
    pub phone: Option<PhoneNumber>,
    pub address: Option<String>,
}

/// Domain use-case port for accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Create an account. Duplicate emails fail with a conflict.
    async fn register(&self, request: RegisterUserRequest) -> Result<User, Error>;

    /// Validate credentials and return the matching user.
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<User, Error>;

    /// Resolve the user behind a session.
    async fn current_user(&self, actor: &UserId) -> Result<User, Error>;
}
