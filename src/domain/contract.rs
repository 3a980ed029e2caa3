use super::profile::ProfileId;
use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractId(pub u32);

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    New,
    InProgress,
    Terminated,
}

/// An agreement binding one client to one contractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub id: ContractId,
    #[serde(default)]
    pub terms: String,
    pub status: ContractStatus,
    pub client_id: ProfileId,
    pub contractor_id: ProfileId,
}

impl Contract {
    pub fn new(
        id: u32,
        client_id: ProfileId,
        contractor_id: ProfileId,
        status: ContractStatus,
    ) -> Result<Self> {
        let contract = Self {
            id: ContractId(id),
            terms: String::new(),
            status,
            client_id,
            contractor_id,
        };
        contract.validate()?;
        Ok(contract)
    }

    /// A contract cannot bind a profile to itself.
    pub fn validate(&self) -> Result<()> {
        if self.client_id == self.contractor_id {
            return Err(LedgerError::validation(format!(
                "contract {} names profile {} as both client and contractor",
                self.id, self.client_id
            )));
        }
        Ok(())
    }

    pub fn is_party(&self, profile: ProfileId) -> bool {
        self.client_id == profile || self.contractor_id == profile
    }
}
