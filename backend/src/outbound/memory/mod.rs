//! In-process repositories used when no database URL is configured.
//!
//! One [`InMemoryStore`] implements every repository port over a single
//! mutex, so the fulfilment write (status change plus stock decrement) is
//! atomic in the same way as the database transaction. Data is lost on
//! restart.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{
    BloodRequestRepository, BloodRequestRepositoryError, BloodStockRepository,
    BloodStockRepositoryError, DonorRecordRepository, DonorRecordRepositoryError, UserRepository,
    UserRepositoryError,
};
use crate::domain::rules::{apply_fulfillment, day_capacity_remaining};
use crate::domain::{
    BloodRequest, BloodRequestId, BloodStock, BloodType, DonorRecord, DonorRecordId,
    EmailAddress, RequestStatus, User, UserId, UserRole,
};

#[derive(Default)]
struct State {
    users: HashMap<UserId, User>,
    records: HashMap<DonorRecordId, DonorRecord>,
    stocks: BTreeMap<BloodType, BloodStock>,
    requests: HashMap<BloodRequestId, BloodRequest>,
}

impl State {
    /// Records other than `record` booked on the same UTC day as it.
    fn booked_alongside(&self, record: &DonorRecord) -> usize {
        let day = record.donation_day();
        self.records
            .values()
            .filter(|other| other.id() != record.id() && other.donation_day() == day)
            .count()
    }

    fn has_room_for(&self, record: &DonorRecord, capacity: u32) -> bool {
        let booked = u32::try_from(self.booked_alongside(record)).unwrap_or(u32::MAX);
        day_capacity_remaining(booked, capacity) > 0
    }
}

/// Shared in-memory store for users, donor records, stocks, and requests.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, String> {
        self.state
            .lock()
            .map_err(|_| "in-memory store lock poisoned".to_owned())
    }
}

fn sorted_by<T, K: Ord>(mut items: Vec<T>, key: impl FnMut(&T) -> K) -> Vec<T> {
    items.sort_by_key(key);
    items
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn insert(&self, user: &User) -> Result<(), UserRepositoryError> {
        let mut state = self.lock().map_err(UserRepositoryError::query)?;
        if state.users.values().any(|known| known.email() == user.email()) {
            return Err(UserRepositoryError::duplicate_email(user.email().to_string()));
        }
        state.users.insert(*user.id(), user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        let state = self.lock().map_err(UserRepositoryError::query)?;
        Ok(state.users.get(id).cloned())
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserRepositoryError> {
        let state = self.lock().map_err(UserRepositoryError::query)?;
        Ok(state
            .users
            .values()
            .find(|user| user.email() == email)
            .cloned())
    }

    async fn list_all(&self) -> Result<Vec<User>, UserRepositoryError> {
        let state = self.lock().map_err(UserRepositoryError::query)?;
        let users = state.users.values().cloned().collect();
        Ok(sorted_by(users, User::registered_at))
    }

    async fn list_by_role(&self, role: UserRole) -> Result<Vec<User>, UserRepositoryError> {
        let state = self.lock().map_err(UserRepositoryError::query)?;
        let users = state
            .users
            .values()
            .filter(|user| user.role() == role)
            .cloned()
            .collect();
        Ok(sorted_by(users, User::registered_at))
    }
}

#[async_trait]
impl DonorRecordRepository for InMemoryStore {
    async fn insert(&self, record: &DonorRecord) -> Result<(), DonorRecordRepositoryError> {
        let mut state = self.lock().map_err(DonorRecordRepositoryError::query)?;
        state.records.insert(record.id(), record.clone());
        Ok(())
    }

    async fn insert_within_capacity(
        &self,
        record: &DonorRecord,
        capacity: u32,
    ) -> Result<bool, DonorRecordRepositoryError> {
        let mut state = self.lock().map_err(DonorRecordRepositoryError::query)?;
        if !state.has_room_for(record, capacity) {
            return Ok(false);
        }
        state.records.insert(record.id(), record.clone());
        Ok(true)
    }

    async fn update_within_capacity(
        &self,
        record: &DonorRecord,
        capacity: u32,
    ) -> Result<bool, DonorRecordRepositoryError> {
        let mut state = self.lock().map_err(DonorRecordRepositoryError::query)?;
        if !state.records.contains_key(&record.id()) {
            return Err(DonorRecordRepositoryError::query(format!(
                "donor record {} not found for update",
                record.id()
            )));
        }
        if !state.has_room_for(record, capacity) {
            return Ok(false);
        }
        state.records.insert(record.id(), record.clone());
        Ok(true)
    }

    async fn update(&self, record: &DonorRecord) -> Result<(), DonorRecordRepositoryError> {
        let mut state = self.lock().map_err(DonorRecordRepositoryError::query)?;
        match state.records.get_mut(&record.id()) {
            Some(existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => Err(DonorRecordRepositoryError::query(format!(
                "donor record {} not found for update",
                record.id()
            ))),
        }
    }

    async fn delete(&self, id: &DonorRecordId) -> Result<bool, DonorRecordRepositoryError> {
        let mut state = self.lock().map_err(DonorRecordRepositoryError::query)?;
        Ok(state.records.remove(id).is_some())
    }

    async fn find_by_id(
        &self,
        id: &DonorRecordId,
    ) -> Result<Option<DonorRecord>, DonorRecordRepositoryError> {
        let state = self.lock().map_err(DonorRecordRepositoryError::query)?;
        Ok(state.records.get(id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<DonorRecord>, DonorRecordRepositoryError> {
        let state = self.lock().map_err(DonorRecordRepositoryError::query)?;
        let records = state.records.values().cloned().collect();
        Ok(sorted_by(records, |record: &DonorRecord| {
            std::cmp::Reverse(record.donated_at())
        }))
    }

    async fn list_for_donor(
        &self,
        donor_id: &UserId,
    ) -> Result<Vec<DonorRecord>, DonorRecordRepositoryError> {
        let state = self.lock().map_err(DonorRecordRepositoryError::query)?;
        let records = state
            .records
            .values()
            .filter(|record| record.donor_id() == donor_id)
            .cloned()
            .collect();
        Ok(sorted_by(records, |record: &DonorRecord| {
            std::cmp::Reverse(record.donated_at())
        }))
    }

    async fn list_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<DonorRecord>, DonorRecordRepositoryError> {
        let state = self.lock().map_err(DonorRecordRepositoryError::query)?;
        let records = state
            .records
            .values()
            .filter(|record| record.donated_at() >= start && record.donated_at() < end)
            .cloned()
            .collect();
        Ok(sorted_by(records, DonorRecord::donated_at))
    }

    async fn count(&self) -> Result<u64, DonorRecordRepositoryError> {
        let state = self.lock().map_err(DonorRecordRepositoryError::query)?;
        Ok(state.records.len() as u64)
    }
}

#[async_trait]
impl BloodStockRepository for InMemoryStore {
    async fn list(&self) -> Result<Vec<BloodStock>, BloodStockRepositoryError> {
        let state = self.lock().map_err(BloodStockRepositoryError::query)?;
        Ok(state.stocks.values().cloned().collect())
    }

    async fn find(
        &self,
        blood_type: BloodType,
    ) -> Result<Option<BloodStock>, BloodStockRepositoryError> {
        let state = self.lock().map_err(BloodStockRepositoryError::query)?;
        Ok(state.stocks.get(&blood_type).cloned())
    }

    async fn insert_if_absent(&self, stock: &BloodStock) -> Result<(), BloodStockRepositoryError> {
        let mut state = self.lock().map_err(BloodStockRepositoryError::query)?;
        state
            .stocks
            .entry(stock.blood_type())
            .or_insert_with(|| stock.clone());
        Ok(())
    }

    async fn upsert(&self, stock: &BloodStock) -> Result<(), BloodStockRepositoryError> {
        let mut state = self.lock().map_err(BloodStockRepositoryError::query)?;
        state.stocks.insert(stock.blood_type(), stock.clone());
        Ok(())
    }
}

fn check_status(
    current: Option<&BloodRequest>,
    id: &BloodRequestId,
    expected: RequestStatus,
) -> Result<(), BloodRequestRepositoryError> {
    match current {
        None => Err(BloodRequestRepositoryError::missing(id.to_string())),
        Some(found) if found.status() != expected => Err(
            BloodRequestRepositoryError::stale_status(expected.as_str(), found.status().as_str()),
        ),
        Some(_) => Ok(()),
    }
}

#[async_trait]
impl BloodRequestRepository for InMemoryStore {
    async fn insert(&self, request: &BloodRequest) -> Result<(), BloodRequestRepositoryError> {
        let mut state = self.lock().map_err(BloodRequestRepositoryError::query)?;
        state.requests.insert(request.id(), request.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &BloodRequestId,
    ) -> Result<Option<BloodRequest>, BloodRequestRepositoryError> {
        let state = self.lock().map_err(BloodRequestRepositoryError::query)?;
        Ok(state.requests.get(id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<BloodRequest>, BloodRequestRepositoryError> {
        let state = self.lock().map_err(BloodRequestRepositoryError::query)?;
        let requests = state.requests.values().cloned().collect();
        Ok(sorted_by(requests, |request: &BloodRequest| {
            std::cmp::Reverse(request.created_at())
        }))
    }

    async fn list_for_requester(
        &self,
        requester_id: &UserId,
    ) -> Result<Vec<BloodRequest>, BloodRequestRepositoryError> {
        let state = self.lock().map_err(BloodRequestRepositoryError::query)?;
        let requests = state
            .requests
            .values()
            .filter(|request| request.requester_id() == requester_id)
            .cloned()
            .collect();
        Ok(sorted_by(requests, |request: &BloodRequest| {
            std::cmp::Reverse(request.created_at())
        }))
    }

    async fn save_transition(
        &self,
        request: &BloodRequest,
        expected: RequestStatus,
    ) -> Result<(), BloodRequestRepositoryError> {
        let mut state = self.lock().map_err(BloodRequestRepositoryError::query)?;
        let id = request.id();
        check_status(state.requests.get(&id), &id, expected)?;
        state.requests.insert(id, request.clone());
        Ok(())
    }

    async fn fulfil(
        &self,
        request: &BloodRequest,
        now: DateTime<Utc>,
    ) -> Result<BloodStock, BloodRequestRepositoryError> {
        let mut state = self.lock().map_err(BloodRequestRepositoryError::query)?;
        let id = request.id();
        check_status(state.requests.get(&id), &id, RequestStatus::Approved)?;

        let blood_type = request.blood_type();
        let available = state
            .stocks
            .get(&blood_type)
            .map_or(0, BloodStock::quantity);
        let (remaining, _status) = apply_fulfillment(available, request.quantity().get())
            .map_err(|shortfall| {
                BloodRequestRepositoryError::insufficient_stock(
                    shortfall.available,
                    shortfall.requested,
                )
            })?;

        let stock = BloodStock::new(blood_type, remaining, now);
        state.stocks.insert(blood_type, stock.clone());
        state.requests.insert(id, request.clone());
        Ok(stock)
    }
}

#[cfg(test)]
mod tests;
