//! Donation scheduling, history, and the donor dashboard.
//!
//! Donors self-schedule under the calendar, eligibility, and daily capacity
//! rules. Admins record donations for any donor: capacity still applies to
//! future dates, the other checks do not, and a past-dated record triggers a
//! thank-you email in the background.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use mockable::Clock;
use tracing::{info, warn};

use crate::domain::access::{map_user_repository_error, require_role, resolve_actor};
use crate::domain::date_format::indonesian_date;
use crate::domain::notifications::{Notification, NotificationIntent};
use crate::domain::ports::{
    DonationCommand, DonationQuery, DonorDashboard, DonorRecordRepository,
    DonorRecordRepositoryError, NotificationSender, ScheduleDonationRequest, ScheduleUpdate,
    UserRepository,
};
use crate::domain::rules::{
    DAILY_DONATION_CAPACITY, SchedulingError, is_eligible, is_valid_schedule_date,
    next_eligible_date,
};
use crate::domain::{
    DonationLocation, DonorNote, DonorRecord, DonorRecordDraft, DonorRecordId, Error, TraceId,
    User, UserId, UserRole,
};

const RECENT_DONATIONS: usize = 5;

pub(crate) fn map_record_repository_error(error: DonorRecordRepositoryError) -> Error {
    match error {
        DonorRecordRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("donor record repository unavailable: {message}"))
        }
        DonorRecordRepositoryError::Query { message } => {
            Error::internal(format!("donor record repository error: {message}"))
        }
    }
}

fn day_fully_booked(date: NaiveDate) -> Error {
    SchedulingError::DayFullyBooked {
        date,
        capacity: DAILY_DONATION_CAPACITY,
    }
    .into()
}

fn parse_location(raw: Option<&str>) -> Result<DonationLocation, Error> {
    DonationLocation::or_default(raw).map_err(|err| Error::invalid_request(err.to_string()))
}

fn parse_note(raw: Option<&str>) -> Result<Option<DonorNote>, Error> {
    DonorNote::parse(raw).map_err(|err| Error::invalid_request(err.to_string()))
}

/// Donation service implementing [`DonationCommand`] and [`DonationQuery`].
#[derive(Clone)]
pub struct DonationService<U, D> {
    users: Arc<U>,
    records: Arc<D>,
    notifier: Arc<dyn NotificationSender>,
    clock: Arc<dyn Clock>,
}

impl<U, D> DonationService<U, D> {
    pub fn new(
        users: Arc<U>,
        records: Arc<D>,
        notifier: Arc<dyn NotificationSender>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            records,
            notifier,
            clock,
        }
    }
}

impl<U, D> DonationService<U, D>
where
    U: UserRepository,
    D: DonorRecordRepository + 'static,
{
    async fn load_record(&self, id: &DonorRecordId) -> Result<DonorRecord, Error> {
        self.records
            .find_by_id(id)
            .await
            .map_err(map_record_repository_error)?
            .ok_or_else(|| Error::not_found(format!("donor record {id} not found")))
    }

    async fn load_donor(&self, id: &UserId) -> Result<User, Error> {
        let user = self
            .users
            .find_by_id(id)
            .await
            .map_err(map_user_repository_error)?
            .ok_or_else(|| Error::not_found(format!("donor {id} not found")))?;
        if user.role() != UserRole::Donor {
            return Err(Error::invalid_request(format!("user {id} is not a donor")));
        }
        Ok(user)
    }

    fn ensure_owner_or_admin(actor: &User, record: &DonorRecord) -> Result<(), Error> {
        if actor.is_admin() || record.donor_id() == actor.id() {
            Ok(())
        } else {
            Err(Error::forbidden("only the donor or an admin may change this record"))
        }
    }

    /// Store a new record, counting it against the daily capacity when
    /// `capacity_bound`.
    async fn store_new(&self, record: &DonorRecord, capacity_bound: bool) -> Result<(), Error> {
        if !capacity_bound {
            return self
                .records
                .insert(record)
                .await
                .map_err(map_record_repository_error);
        }
        let inserted = self
            .records
            .insert_within_capacity(record, DAILY_DONATION_CAPACITY)
            .await
            .map_err(map_record_repository_error)?;
        if inserted {
            Ok(())
        } else {
            Err(day_fully_booked(record.donation_day()))
        }
    }

    /// Store a moved record; see [`Self::store_new`].
    async fn store_moved(&self, record: &DonorRecord, capacity_bound: bool) -> Result<(), Error> {
        if !capacity_bound {
            return self
                .records
                .update(record)
                .await
                .map_err(map_record_repository_error);
        }
        let moved = self
            .records
            .update_within_capacity(record, DAILY_DONATION_CAPACITY)
            .await
            .map_err(map_record_repository_error)?;
        if moved {
            Ok(())
        } else {
            Err(day_fully_booked(record.donation_day()))
        }
    }

    /// Calendar and cooldown checks applied to donors. Capacity is checked
    /// when the record is stored.
    async fn check_donor_rules(
        &self,
        donor_id: &UserId,
        donated_at: DateTime<Utc>,
        exclude: Option<DonorRecordId>,
    ) -> Result<(), Error> {
        let now = self.clock.utc();
        is_valid_schedule_date(donated_at.date_naive(), now.date_naive())?;

        let last = self
            .records
            .list_for_donor(donor_id)
            .await
            .map_err(map_record_repository_error)?
            .iter()
            .filter(|record| Some(record.id()) != exclude)
            .map(DonorRecord::donated_at)
            .max();
        if let Some(next_eligible) = next_eligible_date(last).filter(|next| donated_at < *next) {
            return Err(SchedulingError::NotEligible { next_eligible }.into());
        }
        Ok(())
    }

    fn spawn_thank_you(&self, donor: &User) {
        let records = Arc::clone(&self.records);
        let notifier = Arc::clone(&self.notifier);
        let donor = donor.clone();
        let now = self.clock.utc();
        let trace_id = TraceId::current().unwrap_or_else(TraceId::generate);
        tokio::spawn(TraceId::scope(trace_id, async move {
            let total_donations = match records.list_for_donor(donor.id()).await {
                Ok(records) => records.iter().filter(|r| !r.is_upcoming(now)).count(),
                Err(error) => {
                    warn!(donor_id = %donor.id(), %error, "thank-you skipped; history unavailable");
                    return;
                }
            };
            let notification = Notification::new(
                NotificationIntent::ThankYou {
                    donor_name: donor.name().to_string(),
                    blood_type: donor.blood_type(),
                    total_donations,
                },
                vec![donor.email().clone()],
            );
            let result = notifier.dispatch(&notification).await;
            if !result.ok {
                warn!(donor_id = %donor.id(), "thank-you email not delivered");
            }
        }));
    }
}

#[async_trait]
impl<U, D> DonationCommand for DonationService<U, D>
where
    U: UserRepository + 'static,
    D: DonorRecordRepository + 'static,
{
    async fn schedule(
        &self,
        actor: &UserId,
        request: ScheduleDonationRequest,
    ) -> Result<DonorRecord, Error> {
        let actor = resolve_actor(self.users.as_ref(), actor).await?;
        let location = parse_location(request.location.as_deref())?;
        let note = parse_note(request.note.as_deref())?;
        let now = self.clock.utc();

        let donor = match actor.role() {
            UserRole::Donor => {
                if request.donor_id.is_some_and(|id| id != *actor.id()) {
                    return Err(Error::forbidden("donors may only schedule for themselves"));
                }
                self.check_donor_rules(actor.id(), request.donated_at, None)
                    .await?;
                actor.clone()
            }
            UserRole::Admin => {
                let Some(donor_id) = request.donor_id else {
                    return Err(Error::invalid_request("donorId is required"));
                };
                self.load_donor(&donor_id).await?
            }
            UserRole::Requester => {
                return Err(Error::forbidden("requesters cannot schedule donations"));
            }
        };

        let record = DonorRecord::new(DonorRecordDraft {
            id: DonorRecordId::random(),
            donor_id: *donor.id(),
            donated_at: request.donated_at,
            location,
            note,
            created_at: now,
        });
        let capacity_bound = !actor.is_admin() || record.is_upcoming(now);
        self.store_new(&record, capacity_bound).await?;
        info!(
            record_id = %record.id(),
            donor_id = %donor.id(),
            donated_at = %record.donated_at(),
            by_admin = actor.is_admin(),
            "donor record created"
        );

        if actor.is_admin() && !record.is_upcoming(now) {
            self.spawn_thank_you(&donor);
        }
        Ok(record)
    }

    async fn reschedule(
        &self,
        actor: &UserId,
        id: &DonorRecordId,
        update: ScheduleUpdate,
    ) -> Result<DonorRecord, Error> {
        let actor = resolve_actor(self.users.as_ref(), actor).await?;
        let record = self.load_record(id).await?;
        Self::ensure_owner_or_admin(&actor, &record)?;

        let location = match update.location.as_deref() {
            Some(raw) => parse_location(Some(raw))?,
            None => record.location().clone(),
        };
        let note = match update.note.as_deref() {
            Some(raw) => parse_note(Some(raw))?,
            None => record.note().cloned(),
        };

        if !actor.is_admin() {
            self.check_donor_rules(record.donor_id(), update.donated_at, Some(record.id()))
                .await?;
        }

        let capacity_bound = !actor.is_admin() || update.donated_at > self.clock.utc();
        let moved = record.rescheduled(update.donated_at, location, note);
        self.store_moved(&moved, capacity_bound).await?;
        info!(record_id = %moved.id(), donated_at = %moved.donated_at(), "donor record rescheduled");
        Ok(moved)
    }

    async fn cancel(&self, actor: &UserId, id: &DonorRecordId) -> Result<(), Error> {
        let actor = resolve_actor(self.users.as_ref(), actor).await?;
        let record = self.load_record(id).await?;
        Self::ensure_owner_or_admin(&actor, &record)?;
        if !record.is_upcoming(self.clock.utc()) {
            return Err(Error::conflict("only upcoming donations can be cancelled"));
        }

        let deleted = self
            .records
            .delete(id)
            .await
            .map_err(map_record_repository_error)?;
        if !deleted {
            return Err(Error::not_found(format!("donor record {id} not found")));
        }
        info!(record_id = %id, "donor record cancelled");
        Ok(())
    }
}

#[async_trait]
impl<U, D> DonationQuery for DonationService<U, D>
where
    U: UserRepository + 'static,
    D: DonorRecordRepository + 'static,
{
    async fn list_records(&self, actor: &UserId) -> Result<Vec<DonorRecord>, Error> {
        let actor = resolve_actor(self.users.as_ref(), actor).await?;
        match actor.role() {
            UserRole::Admin => self.records.list_all().await,
            UserRole::Donor => self.records.list_for_donor(actor.id()).await,
            UserRole::Requester => {
                return Err(Error::forbidden("requesters have no donation history"));
            }
        }
        .map_err(map_record_repository_error)
    }

    async fn donor_dashboard(&self, actor: &UserId) -> Result<DonorDashboard, Error> {
        let actor = resolve_actor(self.users.as_ref(), actor).await?;
        require_role(&actor, UserRole::Donor)?;

        let records = self
            .records
            .list_for_donor(actor.id())
            .await
            .map_err(map_record_repository_error)?;
        let last = records.iter().map(DonorRecord::donated_at).max();
        let next_eligible_at = next_eligible_date(last);
        let recent_donations = records
            .iter()
            .take(RECENT_DONATIONS)
            .map(|record| {
                format!(
                    "{} - {}",
                    indonesian_date(record.donation_day()),
                    record.location().as_ref()
                )
            })
            .collect();

        Ok(DonorDashboard {
            name: actor.name().to_string(),
            blood_type: actor.blood_type(),
            next_eligible_date: next_eligible_at.map(|at| indonesian_date(at.date_naive())),
            next_eligible_at,
            eligible_now: is_eligible(last, self.clock.utc()),
            total_donations: records.len(),
            recent_donations,
        })
    }
}

#[cfg(test)]
#[path = "donation_service_tests.rs"]
mod tests;
