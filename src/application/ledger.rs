use crate::config::LedgerConfig;
use crate::domain::contract::ContractStatus;
use crate::domain::job::JobId;
use crate::domain::money::{Amount, Balance};
use crate::domain::ports::{
    Clock, ContractFilter, EntityStoreRef, JobFilter, LedgerTransaction, SystemClock,
};
use crate::domain::profile::{Profile, ProfileId};
use crate::error::{
    CLIENT_NOT_FOUND, CONTRACTOR_NOT_FOUND, JOB_UNAVAILABLE, LedgerError, Result, USER_NOT_FOUND,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::future::Future;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Outcome of a successful job payment.
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    pub job: JobId,
    pub client: ProfileId,
    pub contractor: ProfileId,
    pub client_balance: Balance,
    pub contractor_balance: Balance,
    pub paid_at: DateTime<Utc>,
}

/// Moves money between profile balances.
///
/// `LedgerEngine` owns no state of its own: every operation opens a store
/// transaction, re-reads the rows it needs with locks held, and commits all of
/// its writes at once. Transactions that hit a store conflict are replayed
/// from scratch up to `LedgerConfig::max_retries` times.
pub struct LedgerEngine {
    store: EntityStoreRef,
    clock: Arc<dyn Clock>,
    config: LedgerConfig,
}

impl LedgerEngine {
    /// Creates a new `LedgerEngine` stamping payments with the system clock.
    pub fn new(store: EntityStoreRef, config: LedgerConfig) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Pays a job: debits the contract's client, credits its contractor and
    /// marks the job paid, all in one transaction.
    ///
    /// Only the contract's client, or an admin, may pay.
    #[instrument(skip_all, fields(caller = %caller.id, job = %job_id))]
    pub async fn pay_job(&self, caller: &Profile, job_id: JobId) -> Result<Settlement> {
        self.with_retries(move || self.try_pay_job(caller, job_id)).await
    }

    /// Adds `amount` to a client's balance, bounded by the total price of the
    /// client's unpaid jobs on in-progress contracts.
    #[instrument(skip_all, fields(client = %client_id, amount = %amount))]
    pub async fn deposit(&self, client_id: ProfileId, amount: Amount) -> Result<Balance> {
        self.with_retries(move || self.try_deposit(client_id, amount)).await
    }

    async fn try_pay_job(&self, caller: &Profile, job_id: JobId) -> Result<Settlement> {
        let mut tx = self.store.begin().await?;

        let job = tx
            .job_for_update(job_id)?
            .filter(|job| !job.is_paid())
            .ok_or_else(|| LedgerError::not_found(JOB_UNAVAILABLE))?;
        let contract = tx
            .contract(job.contract_id)?
            .ok_or_else(|| LedgerError::not_found(JOB_UNAVAILABLE))?;

        if caller.id != contract.client_id && !caller.is_admin() {
            return Err(LedgerError::Forbidden(
                "only the contract's client can pay this job".to_string(),
            ));
        }

        let [client, contractor] =
            lock_profiles(tx.as_mut(), [contract.client_id, contract.contractor_id])?;
        let mut client = client.ok_or_else(|| LedgerError::not_found(CLIENT_NOT_FOUND))?;
        let mut contractor =
            contractor.ok_or_else(|| LedgerError::not_found(CONTRACTOR_NOT_FOUND))?;

        client.debit(job.price)?;
        contractor.credit(job.price);
        let paid_at = self.clock.now();

        tx.set_balance(client.id, client.balance)?;
        tx.set_balance(contractor.id, contractor.balance)?;
        tx.mark_paid(job.id, paid_at)?;
        tx.commit()?;

        info!(price = %job.price, client = %client.id, contractor = %contractor.id, "job paid");
        Ok(Settlement {
            job: job.id,
            client: client.id,
            contractor: contractor.id,
            client_balance: client.balance,
            contractor_balance: contractor.balance,
            paid_at,
        })
    }

    async fn try_deposit(&self, client_id: ProfileId, amount: Amount) -> Result<Balance> {
        let mut tx = self.store.begin().await?;

        // The client row is locked before the ceiling is computed, so a
        // concurrent payment cannot settle one of these jobs in between.
        let mut client = tx
            .profile_for_update(client_id)?
            .filter(Profile::is_client)
            .ok_or_else(|| LedgerError::not_found(USER_NOT_FOUND))?;

        let ceiling = deposit_ceiling(tx.as_mut(), client_id)?;
        if amount.value() > ceiling {
            warn!(%ceiling, "deposit above outstanding work");
            return Err(LedgerError::DepositLimitExceeded);
        }

        client.credit(amount);
        tx.set_balance(client.id, client.balance)?;
        tx.commit()?;

        info!(balance = %client.balance, "deposit accepted");
        Ok(client.balance)
    }

    async fn with_retries<T, F, Fut>(&self, mut attempt: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut retries = 0;
        loop {
            match attempt().await {
                Err(err) if err.is_transient() && retries < self.config.max_retries => {
                    retries += 1;
                    warn!(error = %err, retries, "store conflict, replaying transaction");
                    tokio::time::sleep(self.config.retry_backoff * retries).await;
                }
                outcome => return outcome,
            }
        }
    }
}

/// Sum of prices of the client's unpaid jobs on in-progress contracts.
fn deposit_ceiling(
    tx: &mut (dyn LedgerTransaction + '_),
    client_id: ProfileId,
) -> Result<Decimal> {
    let contracts = tx.contracts(
        &ContractFilter::default()
            .for_client(client_id)
            .with_status(ContractStatus::InProgress),
    )?;
    if contracts.is_empty() {
        return Ok(Decimal::ZERO);
    }
    let outstanding =
        tx.jobs(&JobFilter::unpaid().in_contracts(contracts.iter().map(|c| c.id)))?;
    Ok(outstanding.iter().map(|job| job.price.value()).sum())
}

/// Locks both profiles in ascending id order so opposing transfers cannot deadlock.
fn lock_profiles(
    tx: &mut (dyn LedgerTransaction + '_),
    ids: [ProfileId; 2],
) -> Result<[Option<Profile>; 2]> {
    let order = if ids[0] <= ids[1] { [0, 1] } else { [1, 0] };
    let mut locked = [None, None];
    for i in order {
        locked[i] = tx.profile_for_update(ids[i])?;
    }
    Ok(locked)
}
