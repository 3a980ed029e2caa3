use crate::domain::contract::{Contract, ContractId};
use crate::domain::job::{Job, JobId, JobPayment};
use crate::domain::money::Balance;
use crate::domain::ports::{ContractFilter, EntityStore, JobFilter, LedgerTransaction};
use crate::domain::profile::{Profile, ProfileId};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, IteratorMode, Options, Transaction, TransactionDB,
    TransactionDBOptions,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

/// Column Family for storing profiles.
pub const CF_PROFILES: &str = "profiles";
/// Column Family for storing contracts.
pub const CF_CONTRACTS: &str = "contracts";
/// Column Family for storing jobs.
pub const CF_JOBS: &str = "jobs";

/// How long a transaction waits for a row lock before giving up with `Conflict`.
const LOCK_TIMEOUT_MS: i64 = 2_000;

/// A persistent store implementation using a pessimistic RocksDB `TransactionDB`.
///
/// Each entity lives in its own Column Family keyed by the big-endian id, so
/// iteration yields rows in ascending id order. Values are JSON.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<TransactionDB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<TransactionDB>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the "profiles", "contracts" and "jobs" column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let mut txn_opts = TransactionDBOptions::default();
        txn_opts.set_txn_lock_timeout(LOCK_TIMEOUT_MS);

        let cfs = [CF_PROFILES, CF_CONTRACTS, CF_JOBS]
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()));
        let db = TransactionDB::open_cf_descriptors(&opts, &txn_opts, path, cfs)?;

        Ok(Self { db: Arc::new(db) })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| LedgerError::Storage(format!("{name} column family not found")))
    }

    fn put<T: Serialize>(&self, cf: &str, id: u32, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        self.db.put_cf(self.cf(cf)?, id.to_be_bytes(), bytes)?;
        Ok(())
    }

    fn get<T: DeserializeOwned>(&self, cf: &str, id: u32) -> Result<Option<T>> {
        let bytes = self.db.get_cf(self.cf(cf)?, id.to_be_bytes())?;
        Ok(bytes.map(|b| serde_json::from_slice(&b)).transpose()?)
    }

    fn scan<T: DeserializeOwned>(&self, cf: &str) -> Result<Vec<T>> {
        self.db
            .iterator_cf(self.cf(cf)?, IteratorMode::Start)
            .map(|item| -> Result<T> {
                let (_key, value) = item?;
                Ok(serde_json::from_slice(&value)?)
            })
            .collect()
    }
}

#[async_trait]
impl EntityStore for RocksDBStore {
    async fn insert_profile(&self, profile: Profile) -> Result<()> {
        self.put(CF_PROFILES, profile.id.0, &profile)
    }

    async fn insert_contract(&self, contract: Contract) -> Result<()> {
        contract.validate()?;
        self.put(CF_CONTRACTS, contract.id.0, &contract)
    }

    async fn insert_job(&self, job: Job) -> Result<()> {
        self.put(CF_JOBS, job.id.0, &job)
    }

    async fn profile(&self, id: ProfileId) -> Result<Option<Profile>> {
        self.get(CF_PROFILES, id.0)
    }

    async fn profiles(&self, ids: &BTreeSet<ProfileId>) -> Result<Vec<Profile>> {
        let mut profiles = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(profile) = self.get(CF_PROFILES, id.0)? {
                profiles.push(profile);
            }
        }
        Ok(profiles)
    }

    async fn contract(&self, id: ContractId) -> Result<Option<Contract>> {
        self.get(CF_CONTRACTS, id.0)
    }

    async fn contracts(&self, filter: &ContractFilter) -> Result<Vec<Contract>> {
        let mut contracts: Vec<Contract> = self.scan(CF_CONTRACTS)?;
        contracts.retain(|c| filter.matches(c));
        Ok(contracts)
    }

    async fn jobs(&self, filter: &JobFilter) -> Result<Vec<Job>> {
        let mut jobs: Vec<Job> = self.scan(CF_JOBS)?;
        jobs.retain(|j| filter.matches(j));
        Ok(jobs)
    }

    async fn begin(&self) -> Result<Box<dyn LedgerTransaction + '_>> {
        Ok(Box::new(RocksDBTransaction {
            store: self,
            txn: self.db.transaction(),
        }))
    }
}

/// A RocksDB transaction. `*_for_update` reads take exclusive row locks.
struct RocksDBTransaction<'a> {
    store: &'a RocksDBStore,
    txn: Transaction<'a, TransactionDB>,
}

impl RocksDBTransaction<'_> {
    fn get_for_update<T: DeserializeOwned>(&self, cf: &str, id: u32) -> Result<Option<T>> {
        let bytes = self
            .txn
            .get_for_update_cf(self.store.cf(cf)?, id.to_be_bytes(), true)?;
        Ok(bytes.map(|b| serde_json::from_slice(&b)).transpose()?)
    }

    fn scan<T: DeserializeOwned>(&self, cf: &str) -> Result<Vec<T>> {
        self.txn
            .iterator_cf(self.store.cf(cf)?, IteratorMode::Start)
            .map(|item| -> Result<T> {
                let (_key, value) = item?;
                Ok(serde_json::from_slice(&value)?)
            })
            .collect()
    }

    fn put<T: Serialize>(&self, cf: &str, id: u32, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        self.txn.put_cf(self.store.cf(cf)?, id.to_be_bytes(), bytes)?;
        Ok(())
    }
}

impl LedgerTransaction for RocksDBTransaction<'_> {
    fn profile_for_update(&mut self, id: ProfileId) -> Result<Option<Profile>> {
        self.get_for_update(CF_PROFILES, id.0)
    }

    fn job_for_update(&mut self, id: JobId) -> Result<Option<Job>> {
        self.get_for_update(CF_JOBS, id.0)
    }

    fn contract(&mut self, id: ContractId) -> Result<Option<Contract>> {
        let bytes = self.txn.get_cf(self.store.cf(CF_CONTRACTS)?, id.0.to_be_bytes())?;
        Ok(bytes.map(|b| serde_json::from_slice(&b)).transpose()?)
    }

    fn contracts(&mut self, filter: &ContractFilter) -> Result<Vec<Contract>> {
        let mut contracts: Vec<Contract> = self.scan(CF_CONTRACTS)?;
        contracts.retain(|c| filter.matches(c));
        Ok(contracts)
    }

    fn jobs(&mut self, filter: &JobFilter) -> Result<Vec<Job>> {
        let mut jobs: Vec<Job> = self.scan(CF_JOBS)?;
        jobs.retain(|j| filter.matches(j));
        Ok(jobs)
    }

    fn set_balance(&mut self, id: ProfileId, balance: Balance) -> Result<()> {
        let mut profile: Profile = self
            .get_for_update(CF_PROFILES, id.0)?
            .ok_or_else(|| LedgerError::not_found(format!("profile {id} not found")))?;
        profile.balance = balance;
        self.put(CF_PROFILES, id.0, &profile)
    }

    fn mark_paid(&mut self, id: JobId, at: DateTime<Utc>) -> Result<()> {
        let mut job: Job = self
            .get_for_update(CF_JOBS, id.0)?
            .ok_or_else(|| LedgerError::not_found(format!("job {id} not found")))?;
        job.payment = JobPayment::Paid { at };
        self.put(CF_JOBS, id.0, &job)
    }

    fn commit(self: Box<Self>) -> Result<()> {
        self.txn.commit()?;
        Ok(())
    }
}
