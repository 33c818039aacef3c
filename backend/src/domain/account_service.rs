//! Account registration, login, and current-user lookup.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use crate::domain::access::{map_user_repository_error, resolve_actor};
use crate::domain::ports::{
    AccountService, PasswordHasher, PasswordHasherError, RegisterUserRequest, UserRepository,
};
use crate::domain::{Error, LoginCredentials, User, UserDraft, UserId};

const INVALID_CREDENTIALS: &str = "invalid email or password";

/// Account service implementing the [`AccountService`] driving port.
#[derive(Clone)]
pub struct AccountServiceImpl<R, H> {
    users: Arc<R>,
    hasher: Arc<H>,
    clock: Arc<dyn Clock>,
}

impl<R, H> AccountServiceImpl<R, H> {
    /// Create the service from a user repository and password hasher.
    pub fn new(users: Arc<R>, hasher: Arc<H>, clock: Arc<dyn Clock>) -> Self {
        Self {
            users,
            hasher,
            clock,
        }
    }
}

fn map_hasher_error(error: PasswordHasherError) -> Error {
    Error::internal(format!("password hashing failed: {error}"))
}

#[async_trait]
impl<R, H> AccountService for AccountServiceImpl<R, H>
where
    R: UserRepository,
    H: PasswordHasher,
{
    async fn register(&self, request: RegisterUserRequest) -> Result<User, Error> {
        let password_hash = self
            .hasher
            .hash(&request.password)
            .await
            .map_err(map_hasher_error)?;
        let user = User::try_new(UserDraft {
            id: UserId::random(),
            email: request.email,
            name: request.name,
            role: request.role,
            password_hash,
            blood_type: request.blood_type,
            phone: request.phone,
            address: request.address,
            registered_at: self.clock.utc(),
        })
        .map_err(|err| Error::invalid_request(err.to_string()))?;

        self.users
            .insert(&user)
            .await
            .map_err(map_user_repository_error)?;
        info!(user_id = %user.id(), role = %user.role(), "user registered");
        Ok(user)
    }

    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<User, Error> {
        let Some(user) = self
            .users
            .find_by_email(credentials.email())
            .await
            .map_err(map_user_repository_error)?
        else {
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        };
        let matches = self
            .hasher
            .verify(credentials.password(), user.password_hash())
            .await
            .map_err(map_hasher_error)?;
        if matches {
            Ok(user)
        } else {
            Err(Error::unauthorized(INVALID_CREDENTIALS))
        }
    }

    async fn current_user(&self, actor: &UserId) -> Result<User, Error> {
        resolve_actor(self.users.as_ref(), actor).await
    }
}

#[cfg(test)]
#[path = "account_service_tests.rs"]
mod tests;
