//! PostgreSQL-backed `BloodStockRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{BloodStockRepository, BloodStockRepositoryError};
use crate::domain::{BloodStock, BloodType};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::BloodStockRow;
use super::pool::{DbPool, PoolError};
use super::schema::blood_stocks;

/// Diesel-backed implementation of the `BloodStockRepository` port.
#[derive(Clone)]
pub struct DieselBloodStockRepository {
    pool: DbPool,
}

impl DieselBloodStockRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> BloodStockRepositoryError {
    map_basic_pool_error(error, BloodStockRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> BloodStockRepositoryError {
    map_basic_diesel_error(
        error,
        BloodStockRepositoryError::query,
        BloodStockRepositoryError::connection,
    )
}

#[async_trait]
impl BloodStockRepository for DieselBloodStockRepository {
    async fn list(&self) -> Result<Vec<BloodStock>, BloodStockRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<BloodStockRow> = blood_stocks::table
            .select(BloodStockRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let mut stocks = rows
            .into_iter()
            .map(|row| row.into_domain().map_err(BloodStockRepositoryError::query))
            .collect::<Result<Vec<_>, _>>()?;
        stocks.sort_by_key(BloodStock::blood_type);
        Ok(stocks)
    }

    async fn find(
        &self,
        blood_type: BloodType,
    ) -> Result<Option<BloodStock>, BloodStockRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<BloodStockRow> = blood_stocks::table
            .find(blood_type.as_str())
            .select(BloodStockRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(|row| row.into_domain().map_err(BloodStockRepositoryError::query))
            .transpose()
    }

    async fn insert_if_absent(&self, stock: &BloodStock) -> Result<(), BloodStockRepositoryError> {
        let row = BloodStockRow::try_from(stock).map_err(BloodStockRepositoryError::query)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::insert_into(blood_stocks::table)
            .values(&row)
            .on_conflict(blood_stocks::blood_type)
            .do_nothing()
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn upsert(&self, stock: &BloodStock) -> Result<(), BloodStockRepositoryError> {
        let row = BloodStockRow::try_from(stock).map_err(BloodStockRepositoryError::query)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::insert_into(blood_stocks::table)
            .values(&row)
            .on_conflict(blood_stocks::blood_type)
            .do_update()
            .set((
                blood_stocks::quantity.eq(excluded(blood_stocks::quantity)),
                blood_stocks::updated_at.eq(excluded(blood_stocks::updated_at)),
            ))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }
}
