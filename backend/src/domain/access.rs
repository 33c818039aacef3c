//! Actor resolution and role checks shared by the domain services.

use crate::domain::ports::{UserRepository, UserRepositoryError};
use crate::domain::{Error, User, UserId, UserRole};

pub(crate) fn map_user_repository_error(error: UserRepositoryError) -> Error {
    match error {
        UserRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserRepositoryError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserRepositoryError::DuplicateEmail { email } => {
            Error::conflict(format!("email already registered: {email}"))
        }
    }
}

/// Load the acting user. A session pointing at a deleted account is
/// treated as unauthenticated.
pub(crate) async fn resolve_actor<R>(users: &R, actor: &UserId) -> Result<User, Error>
where
    R: UserRepository + ?Sized,
{
    users
        .find_by_id(actor)
        .await
        .map_err(map_user_repository_error)?
        .ok_or_else(|| Error::unauthorized("login required"))
}

pub(crate) fn require_admin(user: &User) -> Result<(), Error> {
    require_role(user, UserRole::Admin)
}

pub(crate) fn require_role(user: &User, role: UserRole) -> Result<(), Error> {
    if user.role() == role {
        Ok(())
    } else {
        Err(Error::forbidden(format!("{role} role required")))
    }
}

/// Resolve the actor and insist on the admin role.
pub(crate) async fn resolve_admin<R>(users: &R, actor: &UserId) -> Result<User, Error>
where
    R: UserRepository + ?Sized,
{
    let user = resolve_actor(users, actor).await?;
    require_admin(&user)?;
    Ok(user)
}
