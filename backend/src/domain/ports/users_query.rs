//! Driving port for admin user listings.

use async_trait::async_trait;

use crate::domain::{Error, User, UserId};

/// Domain use-case port for listing users.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsersQuery: Send + Sync {
    /// Every registered user. Admin only.
    async fn list_users(&self, actor: &UserId) -> Result<Vec<User>, Error>;

    /// Every donor. Admin only.
    async fn list_donors(&self, actor: &UserId) -> Result<Vec<User>, Error>;
}
