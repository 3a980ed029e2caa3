use crate::domain::contract::Contract;
use crate::domain::job::Job;
use crate::domain::ports::EntityStore;
use crate::domain::profile::{Profile, ProfileId};
use crate::error::{LedgerError, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::io::Read;
use tracing::info;

/// Provisioning data: the profiles, contracts and jobs a store starts with.
#[derive(Debug, Default, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub profiles: Vec<Profile>,
    #[serde(default)]
    pub contracts: Vec<Contract>,
    #[serde(default)]
    pub jobs: Vec<Job>,
}

/// Reads a JSON seed document from any `Read` source (e.g., File, Stdin).
pub struct SeedReader<R: Read> {
    source: R,
}

impl<R: Read> SeedReader<R> {
    pub fn new(source: R) -> Self {
        Self { source }
    }

    /// Parses and validates the seed. Every contract must name two distinct
    /// known profiles and every job a known contract.
    pub fn read(self) -> Result<Seed> {
        let seed: Seed = serde_json::from_reader(self.source)?;

        let profiles: BTreeSet<ProfileId> = seed.profiles.iter().map(|p| p.id).collect();
        for contract in &seed.contracts {
            contract.validate()?;
            for party in [contract.client_id, contract.contractor_id] {
                if !profiles.contains(&party) {
                    return Err(LedgerError::validation(format!(
                        "contract {} references unknown profile {party}",
                        contract.id
                    )));
                }
            }
        }

        let contracts: BTreeSet<_> = seed.contracts.iter().map(|c| c.id).collect();
        if let Some(job) = seed.jobs.iter().find(|j| !contracts.contains(&j.contract_id)) {
            return Err(LedgerError::validation(format!(
                "job {} references unknown contract {}",
                job.id, job.contract_id
            )));
        }
        Ok(seed)
    }
}

impl Seed {
    /// Writes every entity into `store`, replacing rows with the same id.
    pub async fn provision(self, store: &dyn EntityStore) -> Result<()> {
        let counts = (self.profiles.len(), self.contracts.len(), self.jobs.len());
        for profile in self.profiles {
            store.insert_profile(profile).await?;
        }
        for contract in self.contracts {
            store.insert_contract(contract).await?;
        }
        for job in self.jobs {
            store.insert_job(job).await?;
        }
        info!(
            profiles = counts.0,
            contracts = counts.1,
            jobs = counts.2,
            "store provisioned"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::contract::ContractId;
    use crate::domain::ports::{ContractFilter, JobFilter};
    use crate::infrastructure::in_memory::InMemoryStore;

    const SEED: &str = r#"{
        "profiles": [
            {"id": 1, "firstName": "Harry", "lastName": "Potter", "profession": "Wizard", "balance": 1150, "type": "client"},
            {"id": 5, "firstName": "John", "lastName": "Lenon", "profession": "Musician", "balance": 64, "type": "contractor"}
        ],
        "contracts": [
            {"id": 1, "terms": "bla bla bla", "status": "in_progress", "clientId": 1, "contractorId": 5}
        ],
        "jobs": [
            {"id": 1, "description": "work", "price": 200, "contractId": 1},
            {"id": 2, "description": "work", "price": 201, "contractId": 1, "paid": true, "paymentDate": "2020-08-15T19:11:26.737Z"}
        ]
    }"#;

    #[tokio::test]
    async fn test_seed_provisions_store() {
        let seed = SeedReader::new(SEED.as_bytes()).read().unwrap();
        let store = InMemoryStore::new();
        seed.provision(&store).await.unwrap();

        assert_eq!(
            store
                .contracts(&ContractFilter::default())
                .await
                .unwrap()
                .len(),
            1
        );
        assert_eq!(store.jobs(&JobFilter::unpaid()).await.unwrap().len(), 1);
        assert_eq!(store.jobs(&JobFilter::paid(None)).await.unwrap().len(), 1);
    }

    #[test]
    fn test_seed_rejects_dangling_references() {
        let dangling_profile = r#"{"contracts": [{"id": 1, "status": "new", "clientId": 1, "contractorId": 2}]}"#;
        assert!(matches!(
            SeedReader::new(dangling_profile.as_bytes()).read(),
            Err(LedgerError::Validation(_))
        ));

        let dangling_contract = r#"{"jobs": [{"id": 1, "price": 5, "contractId": 3}]}"#;
        let err = SeedReader::new(dangling_contract.as_bytes())
            .read()
            .unwrap_err();
        assert!(err.to_string().contains(&ContractId(3).to_string()));
    }

    #[test]
    fn test_seed_rejects_malformed_json() {
        assert!(matches!(
            SeedReader::new("{not json".as_bytes()).read(),
            Err(LedgerError::Serialization(_))
        ));
    }
}
