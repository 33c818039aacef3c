//! PostgreSQL-backed `DonorRecordRepository` implementation using Diesel ORM.
//!
//! Capacity-bound writes take a transaction-scoped advisory lock on the
//! donation day, so concurrent bookings for one day count and write in turn.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use diesel::prelude::*;
use diesel::sql_types::Integer;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{DonorRecordRepository, DonorRecordRepositoryError};
use crate::domain::rules::{day_bounds, day_capacity_remaining};
use crate::domain::{DonorRecord, DonorRecordId, UserId};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{DonorRecordRow, DonorRecordUpdate, NewDonorRecordRow};
use super::pool::{DbPool, PoolError};
use super::schema::donor_records;

/// Diesel-backed implementation of the `DonorRecordRepository` port.
#[derive(Clone)]
pub struct DieselDonorRecordRepository {
    pool: DbPool,
}

impl DieselDonorRecordRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> DonorRecordRepositoryError {
    map_basic_pool_error(error, DonorRecordRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> DonorRecordRepositoryError {
    map_basic_diesel_error(
        error,
        DonorRecordRepositoryError::query,
        DonorRecordRepositoryError::connection,
    )
}

/// First key of the advisory lock pair; the second is the day number.
const DONATION_DAY_LOCK_CLASS: i32 = 0x0d0e;

/// Failure inside a capacity-bound write; either aborts the transaction.
#[derive(Debug)]
enum BookingFailure {
    Database(diesel::result::Error),
    Rejected(DonorRecordRepositoryError),
}

impl From<diesel::result::Error> for BookingFailure {
    fn from(error: diesel::result::Error) -> Self {
        Self::Database(error)
    }
}

impl From<BookingFailure> for DonorRecordRepositoryError {
    fn from(failure: BookingFailure) -> Self {
        match failure {
            BookingFailure::Database(error) => map_diesel_error(error),
            BookingFailure::Rejected(error) => error,
        }
    }
}

/// Lock the record's day and report whether it still has a free slot.
///
/// The record itself is never counted, so a reschedule within one day
/// does not compete with its own booking.
async fn lock_day_and_check_room(
    conn: &mut AsyncPgConnection,
    record: &DonorRecord,
    capacity: u32,
) -> Result<bool, BookingFailure> {
    let day = record.donation_day();
    diesel::sql_query("SELECT pg_advisory_xact_lock($1, $2)")
        .bind::<Integer, _>(DONATION_DAY_LOCK_CLASS)
        .bind::<Integer, _>(day.num_days_from_ce())
        .execute(conn)
        .await?;

    let (start, end) = day_bounds(day);
    let own_id: Uuid = *record.id().as_uuid();
    let booked: i64 = donor_records::table
        .filter(donor_records::donated_at.ge(start))
        .filter(donor_records::donated_at.lt(end))
        .filter(donor_records::id.ne(own_id))
        .count()
        .get_result(conn)
        .await?;

    let booked = u32::try_from(booked).unwrap_or(u32::MAX);
    Ok(day_capacity_remaining(booked, capacity) > 0)
}

fn rows_to_records(
    rows: Vec<DonorRecordRow>,
) -> Result<Vec<DonorRecord>, DonorRecordRepositoryError> {
    rows.into_iter()
        .map(|row| row.into_domain().map_err(DonorRecordRepositoryError::query))
        .collect()
}

#[async_trait]
impl DonorRecordRepository for DieselDonorRecordRepository {
    async fn insert(&self, record: &DonorRecord) -> Result<(), DonorRecordRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::insert_into(donor_records::table)
            .values(&NewDonorRecordRow::from(record))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn insert_within_capacity(
        &self,
        record: &DonorRecord,
        capacity: u32,
    ) -> Result<bool, DonorRecordRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewDonorRecordRow::from(record);

        let inserted = conn
            .transaction(|conn| {
                async move {
                    if !lock_day_and_check_room(conn, record, capacity).await? {
                        return Ok(false);
                    }
                    diesel::insert_into(donor_records::table)
                        .values(&row)
                        .execute(conn)
                        .await?;
                    Ok::<_, BookingFailure>(true)
                }
                .scope_boxed()
            })
            .await?;

        Ok(inserted)
    }

    async fn update_within_capacity(
        &self,
        record: &DonorRecord,
        capacity: u32,
    ) -> Result<bool, DonorRecordRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let id = record.id();
        let changes = DonorRecordUpdate {
            donated_at: record.donated_at(),
            location: record.location().as_ref(),
            note: record.note().map(AsRef::<str>::as_ref),
        };

        let moved = conn
            .transaction(|conn| {
                async move {
                    if !lock_day_and_check_room(conn, record, capacity).await? {
                        return Ok(false);
                    }
                    let updated = diesel::update(donor_records::table.find(id.as_uuid()))
                        .set(&changes)
                        .execute(conn)
                        .await?;
                    if updated == 0 {
                        return Err(BookingFailure::Rejected(DonorRecordRepositoryError::query(
                            format!("donor record {id} not found for update"),
                        )));
                    }
                    Ok::<_, BookingFailure>(true)
                }
                .scope_boxed()
            })
            .await?;

        Ok(moved)
    }

    async fn update(&self, record: &DonorRecord) -> Result<(), DonorRecordRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let changes = DonorRecordUpdate {
            donated_at: record.donated_at(),
            location: record.location().as_ref(),
            note: record.note().map(AsRef::<str>::as_ref),
        };

        let updated = diesel::update(donor_records::table.find(record.id().as_uuid()))
            .set(&changes)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        if updated == 0 {
            return Err(DonorRecordRepositoryError::query(format!(
                "donor record {} not found for update",
                record.id()
            )));
        }
        Ok(())
    }

    async fn delete(&self, id: &DonorRecordId) -> Result<bool, DonorRecordRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted = diesel::delete(donor_records::table.find(id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(deleted > 0)
    }

    async fn find_by_id(
        &self,
        id: &DonorRecordId,
    ) -> Result<Option<DonorRecord>, DonorRecordRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<DonorRecordRow> = donor_records::table
            .find(id.as_uuid())
            .select(DonorRecordRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(|row| row.into_domain().map_err(DonorRecordRepositoryError::query))
            .transpose()
    }

    async fn list_all(&self) -> Result<Vec<DonorRecord>, DonorRecordRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<DonorRecordRow> = donor_records::table
            .order(donor_records::donated_at.desc())
            .select(DonorRecordRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows_to_records(rows)
    }

    async fn list_for_donor(
        &self,
        donor_id: &UserId,
    ) -> Result<Vec<DonorRecord>, DonorRecordRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<DonorRecordRow> = donor_records::table
            .filter(donor_records::donor_id.eq(donor_id.as_uuid()))
            .order(donor_records::donated_at.desc())
            .select(DonorRecordRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows_to_records(rows)
    }

    async fn list_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<DonorRecord>, DonorRecordRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<DonorRecordRow> = donor_records::table
            .filter(donor_records::donated_at.ge(start))
            .filter(donor_records::donated_at.lt(end))
            .order(donor_records::donated_at.asc())
            .select(DonorRecordRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows_to_records(rows)
    }

    async fn count(&self) -> Result<u64, DonorRecordRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let total: i64 = donor_records::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        u64::try_from(total).map_err(|_| DonorRecordRepositoryError::query("negative row count"))
    }
}
