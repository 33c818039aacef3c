//! Admin listings of registered users.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::access::{map_user_repository_error, resolve_admin};
use crate::domain::ports::{UserRepository, UsersQuery};
use crate::domain::{Error, User, UserId, UserRole};

/// Users query service implementing the [`UsersQuery`] driving port.
#[derive(Clone)]
pub struct UsersQueryService<R> {
    users: Arc<R>,
}

impl<R> UsersQueryService<R> {
    pub fn new(users: Arc<R>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl<R> UsersQuery for UsersQueryService<R>
where
    R: UserRepository,
{
    async fn list_users(&self, actor: &UserId) -> Result<Vec<User>, Error> {
        resolve_admin(self.users.as_ref(), actor).await?;
        self.users
            .list_all()
            .await
            .map_err(map_user_repository_error)
    }

    async fn list_donors(&self, actor: &UserId) -> Result<Vec<User>, Error> {
        resolve_admin(self.users.as_ref(), actor).await?;
        self.users
            .list_by_role(UserRole::Donor)
            .await
            .map_err(map_user_repository_error)
    }
}
