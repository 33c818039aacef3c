//! PostgreSQL-backed `BloodRequestRepository` implementation using Diesel ORM.
//!
//! Status writes are guarded by the expected current status. Fulfilment
//! locks the request and the matching stock row, decrements the stock, and
//! records the new status in one transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::ports::{BloodRequestRepository, BloodRequestRepositoryError};
use crate::domain::rules::apply_fulfillment;
use crate::domain::{BloodRequest, BloodRequestId, BloodStock, RequestStatus, UserId};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{
    BloodRequestRow, BloodRequestTransition, BloodStockRow, NewBloodRequestRow, quantity_to_db,
};
use super::pool::{DbPool, PoolError};
use super::schema::{blood_requests, blood_stocks};

/// Diesel-backed implementation of the `BloodRequestRepository` port.
#[derive(Clone)]
pub struct DieselBloodRequestRepository {
    pool: DbPool,
}

impl DieselBloodRequestRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> BloodRequestRepositoryError {
    map_basic_pool_error(error, BloodRequestRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> BloodRequestRepositoryError {
    map_basic_diesel_error(
        error,
        BloodRequestRepositoryError::query,
        BloodRequestRepositoryError::connection,
    )
}

/// Failure inside the fulfilment transaction; either aborts it.
#[derive(Debug)]
enum FulfilFailure {
    Database(diesel::result::Error),
    Rejected(BloodRequestRepositoryError),
}

impl From<diesel::result::Error> for FulfilFailure {
    fn from(error: diesel::result::Error) -> Self {
        Self::Database(error)
    }
}

impl From<FulfilFailure> for BloodRequestRepositoryError {
    fn from(failure: FulfilFailure) -> Self {
        match failure {
            FulfilFailure::Database(error) => map_diesel_error(error),
            FulfilFailure::Rejected(error) => error,
        }
    }
}

fn rows_to_requests(
    rows: Vec<BloodRequestRow>,
) -> Result<Vec<BloodRequest>, BloodRequestRepositoryError> {
    rows.into_iter()
        .map(|row| row.into_domain().map_err(BloodRequestRepositoryError::query))
        .collect()
}

fn stale_or_missing(
    id: &BloodRequestId,
    expected: RequestStatus,
    found: Option<String>,
) -> BloodRequestRepositoryError {
    match found {
        Some(found) => BloodRequestRepositoryError::stale_status(expected.as_str(), found),
        None => BloodRequestRepositoryError::missing(id.to_string()),
    }
}

#[async_trait]
impl BloodRequestRepository for DieselBloodRequestRepository {
    async fn insert(&self, request: &BloodRequest) -> Result<(), BloodRequestRepositoryError> {
        let row = NewBloodRequestRow::try_from(request).map_err(BloodRequestRepositoryError::query)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::insert_into(blood_requests::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_by_id(
        &self,
        id: &BloodRequestId,
    ) -> Result<Option<BloodRequest>, BloodRequestRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<BloodRequestRow> = blood_requests::table
            .find(id.as_uuid())
            .select(BloodRequestRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(|row| row.into_domain().map_err(BloodRequestRepositoryError::query))
            .transpose()
    }

    async fn list_all(&self) -> Result<Vec<BloodRequest>, BloodRequestRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<BloodRequestRow> = blood_requests::table
            .order(blood_requests::created_at.desc())
            .select(BloodRequestRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows_to_requests(rows)
    }

    async fn list_for_requester(
        &self,
        requester_id: &UserId,
    ) -> Result<Vec<BloodRequest>, BloodRequestRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<BloodRequestRow> = blood_requests::table
            .filter(blood_requests::requester_id.eq(requester_id.as_uuid()))
            .order(blood_requests::created_at.desc())
            .select(BloodRequestRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows_to_requests(rows)
    }

    async fn save_transition(
        &self,
        request: &BloodRequest,
        expected: RequestStatus,
    ) -> Result<(), BloodRequestRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let id = request.id();

        let updated = diesel::update(
            blood_requests::table
                .filter(blood_requests::id.eq(id.as_uuid()))
                .filter(blood_requests::status.eq(expected.as_str())),
        )
        .set(&BloodRequestTransition::from(request))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;

        if updated > 0 {
            return Ok(());
        }

        let found: Option<String> = blood_requests::table
            .find(id.as_uuid())
            .select(blood_requests::status)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Err(stale_or_missing(&id, expected, found))
    }

    async fn fulfil(
        &self,
        request: &BloodRequest,
        now: DateTime<Utc>,
    ) -> Result<BloodStock, BloodRequestRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let id = request.id();
        let blood_type = request.blood_type();
        let requested = request.quantity().get();
        let transition = BloodRequestTransition::from(request);

        let stock = conn
            .transaction(|conn| {
                async move {
                    let status: Option<String> = blood_requests::table
                        .find(id.as_uuid())
                        .select(blood_requests::status)
                        .for_update()
                        .first(conn)
                        .await
                        .optional()?;
                    let expected = RequestStatus::Approved;
                    if status.as_deref() != Some(expected.as_str()) {
                        return Err(FulfilFailure::Rejected(stale_or_missing(
                            &id, expected, status,
                        )));
                    }

                    let row: Option<BloodStockRow> = blood_stocks::table
                        .find(blood_type.as_str())
                        .select(BloodStockRow::as_select())
                        .for_update()
                        .first(conn)
                        .await
                        .optional()?;
                    let available = match row {
                        Some(row) => row
                            .into_domain()
                            .map_err(|message| {
                                FulfilFailure::Rejected(BloodRequestRepositoryError::query(message))
                            })?
                            .quantity(),
                        None => 0,
                    };
                    let (remaining, _status) =
                        apply_fulfillment(available, requested).map_err(|shortfall| {
                            FulfilFailure::Rejected(
                                BloodRequestRepositoryError::insufficient_stock(
                                    shortfall.available,
                                    shortfall.requested,
                                ),
                            )
                        })?;

                    let remaining_column =
                        quantity_to_db("blood_stocks", remaining).map_err(|message| {
                            FulfilFailure::Rejected(BloodRequestRepositoryError::query(message))
                        })?;
                    diesel::update(blood_stocks::table.find(blood_type.as_str()))
                        .set((
                            blood_stocks::quantity.eq(remaining_column),
                            blood_stocks::updated_at.eq(now),
                        ))
                        .execute(conn)
                        .await?;

                    diesel::update(blood_requests::table.find(id.as_uuid()))
                        .set(&transition)
                        .execute(conn)
                        .await?;

                    Ok::<_, FulfilFailure>(BloodStock::new(blood_type, remaining, now))
                }
                .scope_boxed()
            })
            .await?;

        Ok(stock)
    }
}
