use crate::domain::contract::{Contract, ContractId};
use crate::domain::job::{Job, JobId, JobPayment};
use crate::domain::money::Balance;
use crate::domain::ports::{ContractFilter, EntityStore, JobFilter, LedgerTransaction};
use crate::domain::profile::{Profile, ProfileId};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

#[derive(Default)]
struct Tables {
    profiles: BTreeMap<ProfileId, Profile>,
    contracts: BTreeMap<ContractId, Contract>,
    jobs: BTreeMap<JobId, Job>,
}

/// A thread-safe in-memory entity store.
///
/// Uses `Arc<RwLock<..>>` so reads run concurrently while a ledger transaction
/// holds the write guard for its whole lifetime, which serializes writers.
/// Ideal for testing or when persistence is not required.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntityStore for InMemoryStore {
    async fn insert_profile(&self, profile: Profile) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.profiles.insert(profile.id, profile);
        Ok(())
    }

    async fn insert_contract(&self, contract: Contract) -> Result<()> {
        contract.validate()?;
        let mut tables = self.tables.write().await;
        tables.contracts.insert(contract.id, contract);
        Ok(())
    }

    async fn insert_job(&self, job: Job) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.jobs.insert(job.id, job);
        Ok(())
    }

    async fn profile(&self, id: ProfileId) -> Result<Option<Profile>> {
        let tables = self.tables.read().await;
        Ok(tables.profiles.get(&id).cloned())
    }

    async fn profiles(&self, ids: &BTreeSet<ProfileId>) -> Result<Vec<Profile>> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.profiles.get(id).cloned())
            .collect())
    }

    async fn contract(&self, id: ContractId) -> Result<Option<Contract>> {
        let tables = self.tables.read().await;
        Ok(tables.contracts.get(&id).cloned())
    }

    async fn contracts(&self, filter: &ContractFilter) -> Result<Vec<Contract>> {
        let tables = self.tables.read().await;
        Ok(tables
            .contracts
            .values()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect())
    }

    async fn jobs(&self, filter: &JobFilter) -> Result<Vec<Job>> {
        let tables = self.tables.read().await;
        Ok(tables
            .jobs
            .values()
            .filter(|j| filter.matches(j))
            .cloned()
            .collect())
    }

    async fn begin(&self) -> Result<Box<dyn LedgerTransaction + '_>> {
        let tables = self.tables.clone().write_owned().await;
        Ok(Box::new(InMemoryTransaction {
            tables,
            balances: HashMap::new(),
            payments: HashMap::new(),
        }))
    }
}

/// Holds the store's write guard and stages changes until commit.
struct InMemoryTransaction {
    tables: OwnedRwLockWriteGuard<Tables>,
    balances: HashMap<ProfileId, Balance>,
    payments: HashMap<JobId, DateTime<Utc>>,
}

impl InMemoryTransaction {
    fn staged_job(&self, job: &Job) -> Job {
        let mut job = job.clone();
        if let Some(at) = self.payments.get(&job.id) {
            job.payment = JobPayment::Paid { at: *at };
        }
        job
    }
}

impl LedgerTransaction for InMemoryTransaction {
    fn profile_for_update(&mut self, id: ProfileId) -> Result<Option<Profile>> {
        Ok(self.tables.profiles.get(&id).map(|profile| {
            let mut profile = profile.clone();
            if let Some(balance) = self.balances.get(&id) {
                profile.balance = *balance;
            }
            profile
        }))
    }

    fn job_for_update(&mut self, id: JobId) -> Result<Option<Job>> {
        Ok(self.tables.jobs.get(&id).map(|job| self.staged_job(job)))
    }

    fn contract(&mut self, id: ContractId) -> Result<Option<Contract>> {
        Ok(self.tables.contracts.get(&id).cloned())
    }

    fn contracts(&mut self, filter: &ContractFilter) -> Result<Vec<Contract>> {
        Ok(self
            .tables
            .contracts
            .values()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect())
    }

    fn jobs(&mut self, filter: &JobFilter) -> Result<Vec<Job>> {
        Ok(self
            .tables
            .jobs
            .values()
            .map(|job| self.staged_job(job))
            .filter(|job| filter.matches(job))
            .collect())
    }

    fn set_balance(&mut self, id: ProfileId, balance: Balance) -> Result<()> {
        if !self.tables.profiles.contains_key(&id) {
            return Err(LedgerError::not_found(format!("profile {id} not found")));
        }
        self.balances.insert(id, balance);
        Ok(())
    }

    fn mark_paid(&mut self, id: JobId, at: DateTime<Utc>) -> Result<()> {
        if !self.tables.jobs.contains_key(&id) {
            return Err(LedgerError::not_found(format!("job {id} not found")));
        }
        self.payments.insert(id, at);
        Ok(())
    }

    fn commit(self: Box<Self>) -> Result<()> {
        let Self {
            mut tables,
            balances,
            payments,
        } = *self;
        for (id, balance) in balances {
            if let Some(profile) = tables.profiles.get_mut(&id) {
                profile.balance = balance;
            }
        }
        for (id, at) in payments {
            if let Some(job) = tables.jobs.get_mut(&id) {
                job.payment = JobPayment::Paid { at };
            }
        }
        Ok(())
    }
}
