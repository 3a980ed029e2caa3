use super::contract::{Contract, ContractId, ContractStatus};
use super::job::{Job, JobId};
use super::money::Balance;
use super::period::DateRange;
use super::profile::{Profile, ProfileId};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Typed contract predicate. Every populated field must hold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContractFilter {
    pub ids: Option<BTreeSet<ContractId>>,
    /// Profile that must be the client or the contractor.
    pub party: Option<ProfileId>,
    pub client: Option<ProfileId>,
    pub status: Option<ContractStatus>,
    pub exclude_status: Option<ContractStatus>,
}

impl ContractFilter {
    pub fn visible_to(mut self, profile: ProfileId) -> Self {
        self.party = Some(profile);
        self
    }

    pub fn for_client(mut self, client: ProfileId) -> Self {
        self.client = Some(client);
        self
    }

    pub fn with_status(mut self, status: ContractStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn excluding(mut self, status: ContractStatus) -> Self {
        self.exclude_status = Some(status);
        self
    }

    pub fn with_ids(mut self, ids: impl IntoIterator<Item = ContractId>) -> Self {
        self.ids = Some(ids.into_iter().collect());
        self
    }

    pub fn matches(&self, contract: &Contract) -> bool {
        self.ids.as_ref().is_none_or(|ids| ids.contains(&contract.id))
            && self.party.is_none_or(|p| contract.is_party(p))
            && self.client.is_none_or(|c| contract.client_id == c)
            && self.status.is_none_or(|s| contract.status == s)
            && self.exclude_status.is_none_or(|s| contract.status != s)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum PaymentFilter {
    #[default]
    Any,
    Unpaid,
    /// Paid jobs, optionally restricted to a payment-date range.
    Paid(Option<DateRange>),
}

/// Typed job predicate. Every populated field must hold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobFilter {
    pub contract_ids: Option<BTreeSet<ContractId>>,
    pub payment: PaymentFilter,
}

impl JobFilter {
    pub fn unpaid() -> Self {
        Self {
            payment: PaymentFilter::Unpaid,
            ..Self::default()
        }
    }

    pub fn paid(within: Option<DateRange>) -> Self {
        Self {
            payment: PaymentFilter::Paid(within),
            ..Self::default()
        }
    }

    pub fn in_contracts(mut self, ids: impl IntoIterator<Item = ContractId>) -> Self {
        self.contract_ids = Some(ids.into_iter().collect());
        self
    }

    pub fn matches(&self, job: &Job) -> bool {
        let contract_ok = self
            .contract_ids
            .as_ref()
            .is_none_or(|ids| ids.contains(&job.contract_id));
        let payment_ok = match self.payment {
            PaymentFilter::Any => true,
            PaymentFilter::Unpaid => !job.is_paid(),
            PaymentFilter::Paid(within) => job
                .payment_date()
                .is_some_and(|at| within.is_none_or(|range| range.contains(at))),
        };
        contract_ok && payment_ok
    }
}

/// Read and provisioning access to persisted profiles, contracts and jobs.
///
/// Set lookups return rows in ascending id order.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn insert_profile(&self, profile: Profile) -> Result<()>;
    async fn insert_contract(&self, contract: Contract) -> Result<()>;
    async fn insert_job(&self, job: Job) -> Result<()>;

    async fn profile(&self, id: ProfileId) -> Result<Option<Profile>>;
    async fn profiles(&self, ids: &BTreeSet<ProfileId>) -> Result<Vec<Profile>>;
    async fn contract(&self, id: ContractId) -> Result<Option<Contract>>;
    async fn contracts(&self, filter: &ContractFilter) -> Result<Vec<Contract>>;
    async fn jobs(&self, filter: &JobFilter) -> Result<Vec<Job>>;

    /// Opens an isolated read-modify-write transaction.
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction + '_>>;
}

/// A single isolated unit of work against the store.
///
/// Rows read through `*_for_update` stay locked until the transaction ends.
/// Writes are staged and only become visible on `commit`; dropping the
/// transaction discards them.
pub trait LedgerTransaction: Send {
    fn profile_for_update(&mut self, id: ProfileId) -> Result<Option<Profile>>;
    fn job_for_update(&mut self, id: JobId) -> Result<Option<Job>>;
    fn contract(&mut self, id: ContractId) -> Result<Option<Contract>>;
    fn contracts(&mut self, filter: &ContractFilter) -> Result<Vec<Contract>>;
    fn jobs(&mut self, filter: &JobFilter) -> Result<Vec<Job>>;

    fn set_balance(&mut self, id: ProfileId, balance: Balance) -> Result<()>;
    fn mark_paid(&mut self, id: JobId, at: DateTime<Utc>) -> Result<()>;

    fn commit(self: Box<Self>) -> Result<()>;
}

pub type EntityStoreRef = Arc<dyn EntityStore>;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
