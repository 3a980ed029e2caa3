use super::contract::ContractId;
use super::money::Amount;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub u32);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Settlement state of a job. A payment date exists only once the job is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobPayment {
    #[default]
    Unpaid,
    Paid { at: DateTime<Utc> },
}

/// A billable unit of work under a contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "JobRecord", into = "JobRecord")]
pub struct Job {
    pub id: JobId,
    pub description: String,
    pub contract_id: ContractId,
    pub price: Amount,
    pub payment: JobPayment,
}

impl Job {
    pub fn new(id: u32, contract_id: ContractId, price: Amount) -> Self {
        Self {
            id: JobId(id),
            description: String::new(),
            contract_id,
            price,
            payment: JobPayment::Unpaid,
        }
    }

    pub fn paid_at(mut self, at: DateTime<Utc>) -> Self {
        self.payment = JobPayment::Paid { at };
        self
    }

    pub fn is_paid(&self) -> bool {
        matches!(self.payment, JobPayment::Paid { .. })
    }

    pub fn payment_date(&self) -> Option<DateTime<Utc>> {
        match self.payment {
            JobPayment::Paid { at } => Some(at),
            JobPayment::Unpaid => None,
        }
    }
}

/// Wire and storage shape of a job: `paid` flag plus an optional payment date.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobRecord {
    id: JobId,
    #[serde(default)]
    description: String,
    contract_id: ContractId,
    price: Amount,
    #[serde(default)]
    paid: bool,
    #[serde(default)]
    payment_date: Option<DateTime<Utc>>,
}

impl TryFrom<JobRecord> for Job {
    type Error = String;

    fn try_from(record: JobRecord) -> Result<Self, Self::Error> {
        let payment = match (record.paid, record.payment_date) {
            (true, Some(at)) => JobPayment::Paid { at },
            (false, None) => JobPayment::Unpaid,
            (true, None) => {
                return Err(format!("job {} is paid but has no payment date", record.id));
            }
            (false, Some(_)) => {
                return Err(format!("job {} is unpaid but has a payment date", record.id));
            }
        };
        Ok(Self {
            id: record.id,
            description: record.description,
            contract_id: record.contract_id,
            price: record.price,
            payment,
        })
    }
}

impl From<Job> for JobRecord {
    fn from(job: Job) -> Self {
        Self {
            id: job.id,
            paid: job.is_paid(),
            payment_date: job.payment_date(),
            description: job.description,
            contract_id: job.contract_id,
            price: job.price,
        }
    }
}
