use crate::application::access::AccessFilter;
use crate::application::identity::IdentityResolver;
use crate::application::ledger::LedgerEngine;
use crate::application::reporting::{ClientRanking, Limit, ReportingEngine};
use crate::config::LedgerConfig;
use crate::domain::contract::ContractId;
use crate::domain::job::JobId;
use crate::domain::money::{Amount, Balance};
use crate::domain::period::DateRange;
use crate::domain::ports::EntityStoreRef;
use crate::domain::profile::ProfileId;
use crate::error::{LedgerError, Result};
use crate::infrastructure::in_memory::InMemoryStore;
use crate::interfaces::json::response::{acknowledge, respond};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// JSON file with profiles, contracts and jobs to provision before running
    #[arg(long, global = true)]
    pub seed: Option<PathBuf>,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, global = true)]
    pub db_path: Option<PathBuf>,

    /// How many times a ledger transaction is replayed after a store conflict
    #[arg(long, global = true, default_value_t = 3)]
    pub max_retries: u32,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show one contract the caller is party to
    Contract {
        #[arg(long)]
        profile_id: String,
        id: u32,
    },
    /// List the caller's non-terminated contracts
    Contracts {
        #[arg(long)]
        profile_id: String,
    },
    /// List unpaid jobs on the caller's in-progress contracts
    UnpaidJobs {
        #[arg(long)]
        profile_id: String,
    },
    /// Pay a job from the client's balance to the contractor's
    Pay {
        #[arg(long)]
        profile_id: String,
        job_id: u32,
    },
    /// Add funds to a client's balance
    Deposit {
        user_id: String,
        #[arg(allow_hyphen_values = true)]
        amount: String,
    },
    /// Profession that earned the most in the date range
    BestProfession {
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
    },
    /// Clients that paid the most in the date range
    BestClients {
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        limit: Option<String>,
    },
}

/// Opens the configured store, falling back to memory when persistence is
/// requested but not compiled in.
pub fn open_store(db_path: Option<PathBuf>) -> Result<EntityStoreRef> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => Ok(Arc::new(
            crate::infrastructure::rocksdb::RocksDBStore::open(path)?,
        )),
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            tracing::warn!(
                "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
            Ok(Arc::new(InMemoryStore::new()))
        }
        None => Ok(Arc::new(InMemoryStore::new())),
    }
}

/// Dispatches commands to the engines and renders their JSON responses.
pub struct Gateway {
    identity: IdentityResolver,
    access: AccessFilter,
    ledger: LedgerEngine,
    reporting: ReportingEngine,
}

impl Gateway {
    pub fn new(store: EntityStoreRef, config: LedgerConfig) -> Self {
        Self {
            identity: IdentityResolver::new(store.clone()),
            access: AccessFilter::new(store.clone()),
            ledger: LedgerEngine::new(store.clone(), config),
            reporting: ReportingEngine::new(store),
        }
    }

    /// Runs one command. Domain failures come back as `{"error": ..}` bodies;
    /// unknown callers and store faults are returned as errors.
    pub async fn dispatch(&self, command: Command) -> Result<Value> {
        match command {
            Command::Contract { profile_id, id } => {
                let caller = self.identity.resolve(&profile_id).await?;
                respond(self.access.contract(caller.id, ContractId(id)).await)
            }
            Command::Contracts { profile_id } => {
                let caller = self.identity.resolve(&profile_id).await?;
                respond(self.access.visible_contracts(caller.id).await)
            }
            Command::UnpaidJobs { profile_id } => {
                let caller = self.identity.resolve(&profile_id).await?;
                respond(self.access.unpaid_jobs(caller.id).await)
            }
            Command::Pay { profile_id, job_id } => {
                let caller = self.identity.resolve(&profile_id).await?;
                acknowledge(self.ledger.pay_job(&caller, JobId(job_id)).await)
            }
            Command::Deposit { user_id, amount } => {
                acknowledge(self.deposit(&user_id, &amount).await)
            }
            Command::BestProfession { start, end } => {
                let outcome = match DateRange::from_params(start.as_deref(), end.as_deref()) {
                    Ok(range) => self.reporting.best_profession(range).await,
                    Err(err) => Err(err),
                };
                respond(outcome)
            }
            Command::BestClients { start, end, limit } => {
                respond(self.best_clients(start, end, limit).await)
            }
        }
    }

    async fn deposit(&self, user_id: &str, amount: &str) -> Result<Balance> {
        let client = user_id
            .trim()
            .parse::<u32>()
            .map(ProfileId)
            .map_err(|_| LedgerError::validation("user id must be a positive integer"))?;
        let amount = amount.parse::<Amount>()?;
        self.ledger.deposit(client, amount).await
    }

    async fn best_clients(
        &self,
        start: Option<String>,
        end: Option<String>,
        limit: Option<String>,
    ) -> Result<Vec<ClientRanking>> {
        let range = DateRange::from_params(start.as_deref(), end.as_deref())?;
        let limit = limit
            .as_deref()
            .map(str::parse::<Limit>)
            .transpose()?
            .unwrap_or_default();
        self.reporting.best_clients(range, limit).await
    }
}
