//! Admin dashboard and system statistics.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;

use crate::domain::access::{map_user_repository_error, resolve_admin};
use crate::domain::blood_request_service::map_request_repository_error;
use crate::domain::blood_stock_service::map_stock_repository_error;
use crate::domain::donation_service::map_record_repository_error;
use crate::domain::ports::{
    AdminDashboard, BloodRequestRepository, BloodStockRepository, DashboardQuery,
    DonorRecordRepository, SystemStatistics, UserRepository,
};
use crate::domain::rules::{DEFAULT_STOCK_QUANTITY, is_eligible, stock_status};
use crate::domain::{BloodType, Error, RequestStatus, StockStatus, UserId, UserRole};

/// Repositories read by the dashboards.
pub struct DashboardRepositories<U, D, S, B> {
    pub users: Arc<U>,
    pub records: Arc<D>,
    pub stocks: Arc<S>,
    pub requests: Arc<B>,
}

/// Dashboard service implementing the [`DashboardQuery`] driving port.
pub struct DashboardService<U, D, S, B> {
    repos: DashboardRepositories<U, D, S, B>,
    clock: Arc<dyn Clock>,
}

impl<U, D, S, B> DashboardService<U, D, S, B> {
    pub fn new(repos: DashboardRepositories<U, D, S, B>, clock: Arc<dyn Clock>) -> Self {
        Self { repos, clock }
    }
}

impl<U, D, S, B> DashboardService<U, D, S, B>
where
    S: BloodStockRepository,
{
    /// Critical blood types, counting never-stocked types at the default level.
    async fn critical_stock_count(&self) -> Result<usize, Error> {
        let rows = self
            .repos
            .stocks
            .list()
            .await
            .map_err(map_stock_repository_error)?;
        let critical = BloodType::ALL
            .into_iter()
            .map(|blood_type| {
                rows.iter()
                    .find(|row| row.blood_type() == blood_type)
                    .map_or(stock_status(DEFAULT_STOCK_QUANTITY), |row| row.status())
            })
            .filter(|status| *status == StockStatus::Critical)
            .count();
        Ok(critical)
    }
}

#[async_trait]
impl<U, D, S, B> DashboardQuery for DashboardService<U, D, S, B>
where
    U: UserRepository,
    D: DonorRecordRepository,
    S: BloodStockRepository,
    B: BloodRequestRepository,
{
    async fn admin_dashboard(&self, actor: &UserId) -> Result<AdminDashboard, Error> {
        resolve_admin(self.repos.users.as_ref(), actor).await?;
        let donors = self
            .repos
            .users
            .list_by_role(UserRole::Donor)
            .await
            .map_err(map_user_repository_error)?;
        let records = self
            .repos
            .records
            .list_all()
            .await
            .map_err(map_record_repository_error)?;

        let mut latest: HashMap<UserId, DateTime<Utc>> = HashMap::new();
        for record in &records {
            latest
                .entry(*record.donor_id())
                .and_modify(|at| *at = (*at).max(record.donated_at()))
                .or_insert(record.donated_at());
        }
        let now = self.clock.utc();
        let eligible_donors = donors
            .iter()
            .filter(|donor| is_eligible(latest.get(donor.id()).copied(), now))
            .count();

        Ok(AdminDashboard {
            total_donors: donors.len(),
            critical_stocks: self.critical_stock_count().await?,
            eligible_donors,
        })
    }

    async fn statistics(&self, actor: &UserId) -> Result<SystemStatistics, Error> {
        resolve_admin(self.repos.users.as_ref(), actor).await?;
        let users = self
            .repos
            .users
            .list_all()
            .await
            .map_err(map_user_repository_error)?;
        let requests = self
            .repos
            .requests
            .list_all()
            .await
            .map_err(map_request_repository_error)?;
        let total_donations = self
            .repos
            .records
            .count()
            .await
            .map_err(map_record_repository_error)?;

        let with_role = |role: UserRole| users.iter().filter(|user| user.role() == role).count();
        Ok(SystemStatistics {
            total_users: users.len(),
            total_donors: with_role(UserRole::Donor),
            total_requesters: with_role(UserRole::Requester),
            total_donations,
            total_requests: requests.len(),
            pending_requests: requests
                .iter()
                .filter(|request| request.status() == RequestStatus::Pending)
                .count(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{
        MockBloodRequestRepository, MockBloodStockRepository, MockDonorRecordRepository,
        MockUserRepository,
    };
    use crate::domain::{
        BloodStock, DonationLocation, DonorRecord, DonorRecordDraft, DonorRecordId, ErrorCode,
        User,
    };
    use crate::test_support::clock::MutableClock;
    use crate::test_support::fixtures::{admin, donor, fixture_now, requester};
    use chrono::Duration;
    use rstest::rstest;

    type Service = DashboardService<
        MockUserRepository,
        MockDonorRecordRepository,
        MockBloodStockRepository,
        MockBloodRequestRepository,
    >;

    fn record(donor: &User, days_ago: i64) -> DonorRecord {
        let at = fixture_now() - Duration::days(days_ago);
        DonorRecord::new(DonorRecordDraft {
            id: DonorRecordId::random(),
            donor_id: *donor.id(),
            donated_at: at,
            location: DonationLocation::default(),
            note: None,
            created_at: at,
        })
    }

    fn make_service(
        users: MockUserRepository,
        records: MockDonorRecordRepository,
        stocks: MockBloodStockRepository,
    ) -> Service {
        DashboardService::new(
            DashboardRepositories {
                users: Arc::new(users),
                records: Arc::new(records),
                stocks: Arc::new(stocks),
                requests: Arc::new(MockBloodRequestRepository::new()),
            },
            Arc::new(MutableClock::new(fixture_now())),
        )
    }

    #[rstest]
    #[tokio::test]
    async fn dashboard_counts_eligible_donors_and_critical_stock() {
        let admin_user = admin();
        let admin_id = *admin_user.id();
        let fresh = donor("Briana Tumundo", "briana@example.com", BloodType::APositive);
        let rested = donor("Joshua Mandagi", "joshua@example.com", BloodType::ONegative);
        let first_timer = donor("Fajar Lumi", "fajar@example.com", BloodType::BPositive);
        let records_list = vec![record(&fresh, 10), record(&rested, 90), record(&rested, 200)];
        let donors = vec![fresh, rested, first_timer];

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(admin_user)));
        users
            .expect_list_by_role()
            .times(1)
            .return_once(move |_| Ok(donors));
        let mut records = MockDonorRecordRepository::new();
        records
            .expect_list_all()
            .times(1)
            .return_once(move || Ok(records_list));
        let mut stocks = MockBloodStockRepository::new();
        stocks.expect_list().times(1).return_once(|| {
            Ok(BloodType::ALL
                .into_iter()
                .map(|blood_type| BloodStock::new(blood_type, 25, fixture_now()))
                .filter(|row| row.blood_type() != BloodType::AbNegative)
                .chain([BloodStock::new(BloodType::AbNegative, 3, fixture_now())])
                .collect())
        });

        let service = make_service(users, records, stocks);
        let dashboard = service.admin_dashboard(&admin_id).await.expect("dashboard");

        assert_eq!(
            dashboard,
            AdminDashboard {
                total_donors: 3,
                critical_stocks: 1,
                eligible_donors: 2,
            }
        );
    }

    #[rstest]
    #[tokio::test]
    async fn missing_stock_rows_count_as_critical() {
        let admin_user = admin();
        let admin_id = *admin_user.id();
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(admin_user)));
        users
            .expect_list_by_role()
            .times(1)
            .return_once(|_| Ok(Vec::new()));
        let mut records = MockDonorRecordRepository::new();
        records
            .expect_list_all()
            .times(1)
            .return_once(|| Ok(Vec::new()));
        let mut stocks = MockBloodStockRepository::new();
        stocks.expect_list().times(1).return_once(|| Ok(Vec::new()));

        let service = make_service(users, records, stocks);
        let dashboard = service.admin_dashboard(&admin_id).await.expect("dashboard");

        assert_eq!(dashboard.critical_stocks, 8);
    }

    #[rstest]
    #[tokio::test]
    async fn statistics_are_admin_only() {
        let maria = requester();
        let maria_id = *maria.id();
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(maria)));
        users.expect_list_all().times(0);

        let service = make_service(
            users,
            MockDonorRecordRepository::new(),
            MockBloodStockRepository::new(),
        );
        let error = service.statistics(&maria_id).await.expect_err("forbidden");

        assert_eq!(error.code(), ErrorCode::Forbidden);
    }

    #[rstest]
    #[tokio::test]
    async fn statistics_count_roles_and_pending_requests() {
        use crate::domain::{
            BloodRequest, BloodRequestDraft, BloodRequestId, Justification, PersonName,
            RequestQuantity,
        };

        let admin_user = admin();
        let admin_id = *admin_user.id();
        let everyone = vec![
            admin_user.clone(),
            donor("Briana Tumundo", "briana@example.com", BloodType::APositive),
            requester(),
        ];
        let request = |status| {
            BloodRequest::new(BloodRequestDraft {
                id: BloodRequestId::random(),
                requester_id: UserId::random(),
                patient_name: PersonName::new("John Doe").expect("name"),
                blood_type: BloodType::OPositive,
                quantity: RequestQuantity::new(2).expect("quantity"),
                justification: Justification::new("scheduled surgery").expect("justification"),
                status,
                admin_note: None,
                created_at: fixture_now(),
                updated_at: fixture_now(),
            })
        };
        let all_requests = vec![
            request(RequestStatus::Pending),
            request(RequestStatus::Pending),
            request(RequestStatus::Fulfilled),
        ];

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(admin_user)));
        users
            .expect_list_all()
            .times(1)
            .return_once(move || Ok(everyone));
        let mut records = MockDonorRecordRepository::new();
        records.expect_count().times(1).return_once(|| Ok(7));
        let mut requests = MockBloodRequestRepository::new();
        requests
            .expect_list_all()
            .times(1)
            .return_once(move || Ok(all_requests));

        let service: Service = DashboardService::new(
            DashboardRepositories {
                users: Arc::new(users),
                records: Arc::new(records),
                stocks: Arc::new(MockBloodStockRepository::new()),
                requests: Arc::new(requests),
            },
            Arc::new(MutableClock::new(fixture_now())),
        );
        let stats = service.statistics(&admin_id).await.expect("statistics");

        assert_eq!(
            stats,
            SystemStatistics {
                total_users: 3,
                total_donors: 1,
                total_requesters: 1,
                total_donations: 7,
                total_requests: 3,
                pending_requests: 2,
            }
        );
    }
}
