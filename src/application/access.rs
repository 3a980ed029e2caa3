use crate::domain::contract::{Contract, ContractId, ContractStatus};
use crate::domain::job::Job;
use crate::domain::ports::{ContractFilter, EntityStoreRef, JobFilter};
use crate::domain::profile::ProfileId;
use crate::error::{CONTRACT_NOT_FOUND, LedgerError, Result};

/// Narrows contracts and jobs to the ones a caller is party to.
pub struct AccessFilter {
    store: EntityStoreRef,
}

impl AccessFilter {
    pub fn new(store: EntityStoreRef) -> Self {
        Self { store }
    }

    /// A single contract the caller is party to, whatever its status.
    ///
    /// Contracts between other profiles are reported as missing.
    pub async fn contract(&self, caller: ProfileId, id: ContractId) -> Result<Contract> {
        self.store
            .contract(id)
            .await?
            .filter(|contract| contract.is_party(caller))
            .ok_or_else(|| LedgerError::not_found(CONTRACT_NOT_FOUND))
    }

    /// Non-terminated contracts where the caller is client or contractor.
    pub async fn visible_contracts(&self, caller: ProfileId) -> Result<Vec<Contract>> {
        self.store
            .contracts(
                &ContractFilter::default()
                    .visible_to(caller)
                    .excluding(ContractStatus::Terminated),
            )
            .await
    }

    /// Unpaid jobs on the caller's in-progress contracts.
    pub async fn unpaid_jobs(&self, caller: ProfileId) -> Result<Vec<Job>> {
        let active = self
            .store
            .contracts(
                &ContractFilter::default()
                    .visible_to(caller)
                    .with_status(ContractStatus::InProgress),
            )
            .await?;
        if active.is_empty() {
            return Ok(Vec::new());
        }
        self.store
            .jobs(&JobFilter::unpaid().in_contracts(active.iter().map(|c| c.id)))
            .await
    }
}
