//! Demonstration dataset loading and seeding.
//!
//! The dataset is a JSON document describing accounts, stock levels, donation
//! history, and blood requests. Seeding is keyed on account email: users that
//! already exist are left untouched, and history rows are only written for
//! accounts created by the current run, so repeated runs do not duplicate
//! anything.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use cap_std::{ambient_authority, fs::Dir};
use chrono::{DateTime, Duration, Utc};
use mockable::Clock;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::ports::{
    BloodRequestRepository, BloodRequestRepositoryError, BloodStockRepository,
    BloodStockRepositoryError, DonorRecordRepository, DonorRecordRepositoryError, PasswordHasher,
    PasswordHasherError, UserRepository, UserRepositoryError,
};
use crate::domain::{
    BloodRequest, BloodRequestDraft, BloodRequestId, BloodStock, BloodType, DonationLocation,
    DonorNote, DonorRecord, DonorRecordDraft, DonorRecordId, EmailAddress, Justification,
    Password, PersonName, PhoneNumber, RequestQuantity, RequestStatus, User, UserDraft, UserId,
    UserRole,
};

/// Errors raised while loading or applying a demonstration dataset.
#[derive(Debug, Error)]
pub enum DemoDataError {
    /// The dataset file could not be read.
    #[error("failed to read dataset at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The dataset is not valid JSON for [`DemoDataset`].
    #[error("failed to parse dataset at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// An entry failed domain validation.
    #[error("invalid {entry}: {message}")]
    Invalid { entry: String, message: String },
    /// A history entry names an account missing from the dataset.
    #[error("{entry} refers to unknown account {email}")]
    UnknownAccount { entry: String, email: String },
    #[error(transparent)]
    Users(#[from] UserRepositoryError),
    #[error(transparent)]
    Records(#[from] DonorRecordRepositoryError),
    #[error(transparent)]
    Stocks(#[from] BloodStockRepositoryError),
    #[error(transparent)]
    Requests(#[from] BloodRequestRepositoryError),
    #[error(transparent)]
    Hashing(#[from] PasswordHasherError),
}

fn invalid(entry: impl Into<String>, err: impl std::fmt::Display) -> DemoDataError {
    DemoDataError::Invalid {
        entry: entry.into(),
        message: err.to_string(),
    }
}

/// Account entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
    #[serde(default)]
    pub blood_type: Option<BloodType>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Initial stock level for one blood type.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoStock {
    pub blood_type: BloodType,
    pub quantity: u32,
}

/// Past donation relative to the seeding time.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoDonorRecord {
    pub donor_email: String,
    pub days_ago: i64,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Blood request submitted `days_ago` days before seeding.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoBloodRequest {
    pub requester_email: String,
    pub patient_name: String,
    pub blood_type: BloodType,
    pub quantity: u32,
    pub justification: String,
    #[serde(default)]
    pub days_ago: i64,
    pub status: RequestStatus,
    #[serde(default)]
    pub admin_note: Option<String>,
}

/// Whole demonstration dataset.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoDataset {
    #[serde(default)]
    pub users: Vec<DemoUser>,
    #[serde(default)]
    pub stocks: Vec<DemoStock>,
    #[serde(default)]
    pub donor_records: Vec<DemoDonorRecord>,
    #[serde(default)]
    pub blood_requests: Vec<DemoBloodRequest>,
}

impl DemoDataset {
    /// Parse a dataset from JSON text.
    ///
    /// # Examples
    ///
    /// ```
    /// use donor_backend::demo_data::DemoDataset;
    ///
    /// let dataset = DemoDataset::from_json(r#"{"stocks":[{"bloodType":"O-","quantity":10}]}"#)
    ///     .expect("valid dataset");
    /// assert_eq!(dataset.stocks.len(), 1);
    /// assert!(dataset.users.is_empty());
    /// ```
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Read and parse a dataset file.
///
/// # Errors
///
/// Returns [`DemoDataError::Read`] when the file cannot be opened and
/// [`DemoDataError::Parse`] when it is not a valid dataset.
pub fn load_dataset(path: &Path) -> Result<DemoDataset, DemoDataError> {
    let read_error = |source| DemoDataError::Read {
        path: path.to_path_buf(),
        source,
    };
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path.file_name().ok_or_else(|| {
        read_error(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "dataset path has no file name",
        ))
    })?;
    let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(read_error)?;
    let text = dir.read_to_string(file_name).map_err(read_error)?;
    DemoDataset::from_json(&text).map_err(|source| DemoDataError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Counts of rows written by one seeding run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users_created: usize,
    pub users_skipped: usize,
    pub stocks_written: usize,
    pub donor_records_created: usize,
    pub blood_requests_created: usize,
}

/// Repository and hashing adapters used by [`DemoSeeder`].
pub struct SeedPorts<U, D, S, B, H> {
    pub users: Arc<U>,
    pub records: Arc<D>,
    pub stocks: Arc<S>,
    pub requests: Arc<B>,
    pub hasher: Arc<H>,
}

/// Applies a [`DemoDataset`] through the repository ports.
pub struct DemoSeeder<U, D, S, B, H> {
    ports: SeedPorts<U, D, S, B, H>,
    clock: Arc<dyn Clock>,
}

impl<U, D, S, B, H> DemoSeeder<U, D, S, B, H>
where
    U: UserRepository,
    D: DonorRecordRepository,
    S: BloodStockRepository,
    B: BloodRequestRepository,
    H: PasswordHasher,
{
    pub fn new(ports: SeedPorts<U, D, S, B, H>, clock: Arc<dyn Clock>) -> Self {
        Self { ports, clock }
    }

    /// Write `dataset`, skipping accounts whose email is already registered.
    ///
    /// Stock rows are only inserted when absent, so live stock levels are
    /// never overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`DemoDataError`] when an entry fails validation or an adapter
    /// call fails. Rows written before the failure are kept.
    pub async fn seed(&self, dataset: &DemoDataset) -> Result<SeedReport, DemoDataError> {
        let now = self.clock.utc();
        let mut report = SeedReport::default();
        let mut created: Vec<(EmailAddress, UserId)> = Vec::new();
        let mut known: Vec<EmailAddress> = Vec::new();

        for entry in &dataset.users {
            let email = EmailAddress::new(&entry.email)
                .map_err(|err| invalid(format!("user {}", entry.email), err))?;
            known.push(email.clone());
            if self.ports.users.find_by_email(&email).await?.is_some() {
                debug!(email = %email, "demo account already present");
                report.users_skipped += 1;
                continue;
            }
            let user = self.build_user(entry, email.clone(), now).await?;
            self.ports.users.insert(&user).await?;
            created.push((email, *user.id()));
            report.users_created += 1;
        }

        for entry in &dataset.stocks {
            let stock = BloodStock::new(entry.blood_type, entry.quantity, now);
            self.ports.stocks.insert_if_absent(&stock).await?;
            report.stocks_written += 1;
        }

        for entry in &dataset.donor_records {
            let label = format!("donor record for {}", entry.donor_email);
            let Some(donor_id) = resolve(&created, &known, &entry.donor_email, &label)? else {
                continue;
            };
            let donated_at = now - Duration::days(entry.days_ago);
            let record = DonorRecord::new(DonorRecordDraft {
                id: DonorRecordId::random(),
                donor_id,
                donated_at,
                location: DonationLocation::or_default(entry.location.as_deref())
                    .map_err(|err| invalid(label.as_str(), err))?,
                note: DonorNote::parse(entry.note.as_deref())
                    .map_err(|err| invalid(label.as_str(), err))?,
                created_at: donated_at,
            });
            self.ports.records.insert(&record).await?;
            report.donor_records_created += 1;
        }

        for entry in &dataset.blood_requests {
            let label = format!("blood request for {}", entry.patient_name);
            let Some(requester_id) = resolve(&created, &known, &entry.requester_email, &label)?
            else {
                continue;
            };
            let request = build_request(entry, requester_id, now, &label)?;
            self.ports.requests.insert(&request).await?;
            report.blood_requests_created += 1;
        }

        info!(
            users_created = report.users_created,
            users_skipped = report.users_skipped,
            stocks = report.stocks_written,
            donor_records = report.donor_records_created,
            blood_requests = report.blood_requests_created,
            "demo data seeded"
        );
        Ok(report)
    }

    async fn build_user(
        &self,
        entry: &DemoUser,
        email: EmailAddress,
        now: DateTime<Utc>,
    ) -> Result<User, DemoDataError> {
        let label = format!("user {}", entry.email);
        let password = Password::new_for_registration(&entry.password)
            .map_err(|err| invalid(label.as_str(), err))?;
        let password_hash = self.ports.hasher.hash(&password).await?;
        let phone = entry
            .phone
            .as_deref()
            .map(PhoneNumber::new)
            .transpose()
            .map_err(|err| invalid(label.as_str(), err))?;
        User::try_new(UserDraft {
            id: UserId::random(),
            email,
            name: PersonName::new(&entry.name).map_err(|err| invalid(label.as_str(), err))?,
            role: entry.role,
            password_hash,
            blood_type: entry.blood_type,
            phone,
            address: entry.address.clone(),
            registered_at: now,
        })
        .map_err(|err| invalid(label, err))
    }
}

/// Id of an account created in this run, `None` for a pre-existing account.
fn resolve(
    created: &[(EmailAddress, UserId)],
    known: &[EmailAddress],
    raw_email: &str,
    label: &str,
) -> Result<Option<UserId>, DemoDataError> {
    let email = EmailAddress::new(raw_email).map_err(|err| invalid(label, err))?;
    if let Some((_, id)) = created.iter().find(|(candidate, _)| *candidate == email) {
        return Ok(Some(*id));
    }
    if known.contains(&email) {
        return Ok(None);
    }
    Err(DemoDataError::UnknownAccount {
        entry: label.to_owned(),
        email: raw_email.to_owned(),
    })
}

fn build_request(
    entry: &DemoBloodRequest,
    requester_id: UserId,
    now: DateTime<Utc>,
    label: &str,
) -> Result<BloodRequest, DemoDataError> {
    let created_at = now - Duration::days(entry.days_ago);
    Ok(BloodRequest::new(BloodRequestDraft {
        id: BloodRequestId::random(),
        requester_id,
        patient_name: PersonName::new(&entry.patient_name).map_err(|err| invalid(label, err))?,
        blood_type: entry.blood_type,
        quantity: RequestQuantity::new(entry.quantity).map_err(|err| invalid(label, err))?,
        justification: Justification::new(&entry.justification)
            .map_err(|err| invalid(label, err))?,
        status: entry.status,
        admin_note: entry.admin_note.clone(),
        created_at,
        updated_at: created_at,
    }))
}

#[cfg(test)]
mod tests {
    //! Seeding over the in-memory store.

    use super::*;
    use crate::outbound::credentials::Argon2idHasher;
    use crate::outbound::memory::InMemoryStore;
    use crate::test_support::clock::MutableClock;
    use crate::test_support::fixtures::fixture_now;
    use rstest::{fixture, rstest};

    type MemorySeeder = DemoSeeder<
        InMemoryStore,
        InMemoryStore,
        InMemoryStore,
        InMemoryStore,
        Argon2idHasher,
    >;

    const DATASET: &str = r#"{
        "users": [
            {"name": "Admin System", "email": "admin@hospital.com", "password": "admin123", "role": "admin"},
            {"name": "Briana Tumundo", "email": "briana@email.com", "password": "donor123", "role": "pendonor", "bloodType": "A+"},
            {"name": "Maria Tan", "email": "maria@email.com", "password": "pemohon123", "role": "pemohon", "address": "Manado"}
        ],
        "stocks": [{"bloodType": "A+", "quantity": 8}, {"bloodType": "O-", "quantity": 10}],
        "donorRecords": [
            {"donorEmail": "briana@email.com", "daysAgo": 94, "note": "Donor rutin"},
            {"donorEmail": "briana@email.com", "daysAgo": 184}
        ],
        "bloodRequests": [
            {"requesterEmail": "maria@email.com", "patientName": "Siti Aminah", "bloodType": "B+",
             "quantity": 1, "justification": "Anemia berat", "daysAgo": 5, "status": "Selesai"}
        ]
    }"#;

    #[fixture]
    fn store() -> Arc<InMemoryStore> {
        Arc::new(InMemoryStore::new())
    }

    fn seeder(store: &Arc<InMemoryStore>) -> MemorySeeder {
        DemoSeeder::new(
            SeedPorts {
                users: Arc::clone(store),
                records: Arc::clone(store),
                stocks: Arc::clone(store),
                requests: Arc::clone(store),
                hasher: Arc::new(Argon2idHasher::with_cost(8, 1).expect("minimal argon2 cost")),
            },
            Arc::new(MutableClock::new(fixture_now())),
        )
    }

    #[rstest]
    #[tokio::test]
    async fn seeds_every_section(store: Arc<InMemoryStore>) {
        let dataset = DemoDataset::from_json(DATASET).expect("dataset");

        let report = seeder(&store).seed(&dataset).await.expect("seed");

        assert_eq!(
            report,
            SeedReport {
                users_created: 3,
                users_skipped: 0,
                stocks_written: 2,
                donor_records_created: 2,
                blood_requests_created: 1,
            }
        );
        let records = DonorRecordRepository::list_all(store.as_ref())
            .await
            .expect("records");
        assert_eq!(
            records.first().map(DonorRecord::donated_at),
            Some(fixture_now() - Duration::days(94))
        );
        let requests = BloodRequestRepository::list_all(store.as_ref())
            .await
            .expect("requests");
        assert_eq!(requests[0].status(), RequestStatus::Fulfilled);
    }

    #[rstest]
    #[tokio::test]
    async fn second_run_skips_existing_accounts(store: Arc<InMemoryStore>) {
        let dataset = DemoDataset::from_json(DATASET).expect("dataset");
        let seeder = seeder(&store);
        seeder.seed(&dataset).await.expect("first run");

        let report = seeder.seed(&dataset).await.expect("second run");

        assert_eq!(report.users_created, 0);
        assert_eq!(report.users_skipped, 3);
        assert_eq!(report.donor_records_created, 0);
        assert_eq!(report.blood_requests_created, 0);
        assert_eq!(
            DonorRecordRepository::count(store.as_ref())
                .await
                .expect("count"),
            2
        );
    }

    #[rstest]
    #[tokio::test]
    async fn existing_stock_levels_are_preserved(store: Arc<InMemoryStore>) {
        let live = BloodStock::new(BloodType::ONegative, 42, fixture_now());
        store.upsert(&live).await.expect("upsert");
        let dataset = DemoDataset::from_json(DATASET).expect("dataset");

        seeder(&store).seed(&dataset).await.expect("seed");

        let stock = store.find(BloodType::ONegative).await.expect("find");
        assert_eq!(stock.map(|s| s.quantity()), Some(42));
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_account_reference_is_rejected(store: Arc<InMemoryStore>) {
        let dataset = DemoDataset::from_json(
            r#"{"donorRecords": [{"donorEmail": "ghost@email.com", "daysAgo": 3}]}"#,
        )
        .expect("dataset");

        let err = seeder(&store).seed(&dataset).await.expect_err("unknown donor");

        assert!(matches!(err, DemoDataError::UnknownAccount { .. }));
    }

    #[rstest]
    #[tokio::test]
    async fn donor_without_blood_type_is_invalid(store: Arc<InMemoryStore>) {
        let dataset = DemoDataset::from_json(
            r#"{"users": [{"name": "Angela Lengkong", "email": "angela@email.com",
                 "password": "donor123", "role": "pendonor"}]}"#,
        )
        .expect("dataset");

        let err = seeder(&store).seed(&dataset).await.expect_err("missing blood type");

        assert!(matches!(err, DemoDataError::Invalid { .. }));
    }

    #[rstest]
    fn load_dataset_reads_the_bundled_fixture() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/demo-data.json");

        let dataset = load_dataset(&path).expect("bundled dataset");

        assert_eq!(dataset.stocks.len(), BloodType::ALL.len());
        assert!(dataset.users.iter().any(|user| user.role == UserRole::Admin));
    }

    #[rstest]
    fn load_dataset_reports_missing_files() {
        let dir = tempfile::tempdir().expect("tempdir");

        let err = load_dataset(&dir.path().join("absent.json")).expect_err("missing");

        assert!(matches!(err, DemoDataError::Read { .. }));
    }

    #[rstest]
    fn load_dataset_reports_malformed_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").expect("write");

        let err = load_dataset(&path).expect_err("malformed");

        assert!(matches!(err, DemoDataError::Parse { .. }));
    }
}
