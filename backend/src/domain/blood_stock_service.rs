//! Stock listing and admin adjustments.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use crate::domain::access::resolve_admin;
use crate::domain::ports::{
    BloodStockCommand, BloodStockQuery, BloodStockRepository, BloodStockRepositoryError,
    UserRepository,
};
use crate::domain::rules::MAX_STOCK_QUANTITY;
use crate::domain::{BloodStock, BloodType, Error, UserId};

pub(crate) fn map_stock_repository_error(error: BloodStockRepositoryError) -> Error {
    match error {
        BloodStockRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("blood stock repository unavailable: {message}"))
        }
        BloodStockRepositoryError::Query { message } => {
            Error::internal(format!("blood stock repository error: {message}"))
        }
    }
}

/// Stock service implementing [`BloodStockQuery`] and [`BloodStockCommand`].
#[derive(Clone)]
pub struct BloodStockService<S, U> {
    stocks: Arc<S>,
    users: Arc<U>,
    clock: Arc<dyn Clock>,
}

impl<S, U> BloodStockService<S, U> {
    pub fn new(stocks: Arc<S>, users: Arc<U>, clock: Arc<dyn Clock>) -> Self {
        Self {
            stocks,
            users,
            clock,
        }
    }
}

impl<S, U> BloodStockService<S, U>
where
    S: BloodStockRepository,
{
    /// Current rows for all eight blood types, creating any that are missing.
    pub(crate) async fn ensure_all(&self) -> Result<Vec<BloodStock>, Error> {
        let existing = self
            .stocks
            .list()
            .await
            .map_err(map_stock_repository_error)?;
        if existing.len() == BloodType::ALL.len() {
            return Ok(sorted(existing));
        }

        let now = self.clock.utc();
        let mut rows = existing;
        for blood_type in BloodType::ALL {
            if rows.iter().any(|row| row.blood_type() == blood_type) {
                continue;
            }
            let initial = BloodStock::initial(blood_type, now);
            self.stocks
                .insert_if_absent(&initial)
                .await
                .map_err(map_stock_repository_error)?;
            info!(blood_type = %blood_type, quantity = initial.quantity(), "stock row initialised");
            rows.push(initial);
        }
        Ok(sorted(rows))
    }
}

fn sorted(mut rows: Vec<BloodStock>) -> Vec<BloodStock> {
    rows.sort_by_key(BloodStock::blood_type);
    rows
}

#[async_trait]
impl<S, U> BloodStockQuery for BloodStockService<S, U>
where
    S: BloodStockRepository,
    U: UserRepository,
{
    async fn list_stocks(&self) -> Result<Vec<BloodStock>, Error> {
        self.ensure_all().await
    }
}

#[async_trait]
impl<S, U> BloodStockCommand for BloodStockService<S, U>
where
    S: BloodStockRepository,
    U: UserRepository,
{
    async fn update_quantity(
        &self,
        actor: &UserId,
        blood_type: BloodType,
        quantity: u32,
    ) -> Result<BloodStock, Error> {
        resolve_admin(self.users.as_ref(), actor).await?;
        if quantity > MAX_STOCK_QUANTITY {
            return Err(Error::invalid_request(format!(
                "quantity {quantity} exceeds the maximum of {MAX_STOCK_QUANTITY}"
            )));
        }
        let stock = BloodStock::new(blood_type, quantity, self.clock.utc());
        self.stocks
            .upsert(&stock)
            .await
            .map_err(map_stock_repository_error)?;
        info!(
            blood_type = %blood_type,
            quantity,
            status = %stock.status(),
            "stock updated"
        );
        Ok(stock)
    }
}
