use crate::domain::contract::{Contract, ContractId};
use crate::domain::job::Job;
use crate::domain::period::DateRange;
use crate::domain::ports::{ContractFilter, EntityStoreRef, JobFilter};
use crate::domain::profile::{Profile, ProfileId};
use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::str::FromStr;
use tracing::debug;

/// Number of rows returned by `best_clients`. Always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit(usize);

impl Limit {
    pub fn new(value: usize) -> Result<Self> {
        if value == 0 {
            return Err(LedgerError::validation("limit must be a positive integer"));
        }
        Ok(Self(value))
    }

    pub fn get(&self) -> usize {
        self.0
    }
}

impl Default for Limit {
    fn default() -> Self {
        Self(2)
    }
}

impl FromStr for Limit {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        let value = s
            .trim()
            .parse::<usize>()
            .map_err(|_| LedgerError::validation("limit must be a positive integer"))?;
        Self::new(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestProfession {
    pub profession: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRanking {
    pub id: ProfileId,
    pub paid: Decimal,
    pub full_name: String,
}

/// Leaderboards over paid jobs. Read-only.
pub struct ReportingEngine {
    store: EntityStoreRef,
}

impl ReportingEngine {
    pub fn new(store: EntityStoreRef) -> Self {
        Self { store }
    }

    /// The contractor profession that earned the most, or `None` without
    /// matching payments. Ties go to the profession seen first in job order.
    pub async fn best_profession(
        &self,
        range: Option<DateRange>,
    ) -> Result<Option<BestProfession>> {
        let rows = self.paid_rows(range).await?;
        let contractors = self
            .profiles(rows.iter().map(|(_, contract)| contract.contractor_id))
            .await?;

        let mut totals: Vec<(&str, Decimal)> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();
        for (job, contract) in &rows {
            let Some(contractor) = contractors.get(&contract.contractor_id) else {
                continue;
            };
            let profession = contractor.profession.as_str();
            let slot = *index.entry(profession).or_insert_with(|| {
                totals.push((profession, Decimal::ZERO));
                totals.len() - 1
            });
            totals[slot].1 += job.price.value();
        }

        let mut best: Option<(&str, Decimal)> = None;
        for (profession, total) in totals {
            if best.is_none_or(|(_, top)| total > top) {
                best = Some((profession, total));
            }
        }
        debug!(?best, "best profession computed");
        Ok(best.map(|(profession, _)| BestProfession {
            profession: profession.to_string(),
        }))
    }

    /// Clients ranked by total paid, highest first, at most `limit` rows.
    pub async fn best_clients(
        &self,
        range: Option<DateRange>,
        limit: Limit,
    ) -> Result<Vec<ClientRanking>> {
        let rows = self.paid_rows(range).await?;

        let mut totals: BTreeMap<ProfileId, Decimal> = BTreeMap::new();
        for (job, contract) in &rows {
            *totals.entry(contract.client_id).or_default() += job.price.value();
        }
        let clients = self.profiles(totals.keys().copied()).await?;

        let mut ranking: Vec<ClientRanking> = totals
            .into_iter()
            .filter_map(|(id, paid)| {
                clients.get(&id).map(|client| ClientRanking {
                    id,
                    paid,
                    full_name: client.full_name(),
                })
            })
            .collect();
        ranking.sort_by(|a, b| b.paid.cmp(&a.paid).then(a.id.cmp(&b.id)));
        ranking.truncate(limit.get());
        Ok(ranking)
    }

    /// Paid jobs in range joined with their contracts, in ascending job id order.
    async fn paid_rows(&self, range: Option<DateRange>) -> Result<Vec<(Job, Contract)>> {
        let jobs = self.store.jobs(&JobFilter::paid(range)).await?;
        if jobs.is_empty() {
            return Ok(Vec::new());
        }
        let ids: BTreeSet<ContractId> = jobs.iter().map(|job| job.contract_id).collect();
        let contracts: HashMap<ContractId, Contract> = self
            .store
            .contracts(&ContractFilter::default().with_ids(ids))
            .await?
            .into_iter()
            .map(|contract| (contract.id, contract))
            .collect();

        Ok(jobs
            .into_iter()
            .filter_map(|job| {
                let contract = contracts.get(&job.contract_id)?.clone();
                Some((job, contract))
            })
            .collect())
    }

    async fn profiles(
        &self,
        ids: impl Iterator<Item = ProfileId>,
    ) -> Result<HashMap<ProfileId, Profile>> {
        let ids: BTreeSet<ProfileId> = ids.collect();
        Ok(self
            .store
            .profiles(&ids)
            .await?
            .into_iter()
            .map(|profile| (profile.id, profile))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::contract::ContractStatus;
    use crate::domain::money::Amount;
    use crate::domain::ports::EntityStore;
    use crate::domain::profile::ProfileRole;
    use crate::infrastructure::in_memory::InMemoryStore;
    use chrono::{DateTime, Utc};
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn range(start: &str, end: &str) -> Option<DateRange> {
        DateRange::from_params(Some(start), Some(end)).unwrap()
    }

    async fn insert_paid(
        store: &InMemoryStore,
        id: u32,
        contract: u32,
        price: Decimal,
        day: &str,
    ) {
        let job = Job::new(id, ContractId(contract), Amount::new(price).unwrap())
            .paid_at(at(&format!("{day}T12:00:00Z")));
        store.insert_job(job).await.unwrap();
    }

    /// Clients 1 and 2; contractors 10 (Programmer) and 11 (Musician).
    async fn engine() -> (Arc<InMemoryStore>, ReportingEngine) {
        let store = Arc::new(InMemoryStore::new());
        let profiles = [
            Profile::new(1, "Harry", "Potter", ProfileRole::Client),
            Profile::new(2, "Mr", "Robot", ProfileRole::Client),
            Profile::new(10, "Linus", "Torvalds", ProfileRole::Contractor)
                .with_profession("Programmer"),
            Profile::new(11, "John", "Lenon", ProfileRole::Contractor).with_profession("Musician"),
        ];
        for profile in profiles {
            store.insert_profile(profile).await.unwrap();
        }
        let contracts = [(1, 1, 10), (2, 1, 11), (3, 2, 10)];
        for (id, client, contractor) in contracts {
            let contract = Contract::new(
                id,
                ProfileId(client),
                ProfileId(contractor),
                ContractStatus::InProgress,
            )
            .unwrap();
            store.insert_contract(contract).await.unwrap();
        }
        (store.clone(), ReportingEngine::new(store))
    }

    #[tokio::test]
    async fn test_no_paid_jobs_yields_empty_reports() {
        let (store, engine) = engine().await;
        store
            .insert_job(Job::new(1, ContractId(1), Amount::new(dec!(10)).unwrap()))
            .await
            .unwrap();

        assert_eq!(engine.best_profession(None).await.unwrap(), None);
        assert!(engine.best_clients(None, Limit::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_best_profession_sums_per_profession() {
        let (store, engine) = engine().await;
        insert_paid(&store, 1, 1, dec!(100), "2020-08-10").await;
        insert_paid(&store, 2, 2, dec!(150), "2020-08-11").await;
        insert_paid(&store, 3, 3, dec!(100), "2020-08-20").await;

        let best = engine.best_profession(None).await.unwrap().unwrap();
        assert_eq!(best.profession, "Programmer");

        let best = engine
            .best_profession(range("2020-08-01", "2020-08-15"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(best.profession, "Musician");

        let none = engine
            .best_profession(range("2021-01-01", "2021-12-31"))
            .await
            .unwrap();
        assert_eq!(none, None);
    }

    #[tokio::test]
    async fn test_best_profession_tie_goes_to_first_seen() {
        let (store, engine) = engine().await;
        insert_paid(&store, 1, 2, dec!(50), "2020-08-10").await;
        insert_paid(&store, 2, 1, dec!(50), "2020-08-10").await;

        let best = engine.best_profession(None).await.unwrap().unwrap();
        assert_eq!(best.profession, "Musician");
    }

    #[tokio::test]
    async fn test_best_clients_ranked_and_limited() {
        let (store, engine) = engine().await;
        insert_paid(&store, 1, 1, dec!(100), "2020-08-10").await;
        insert_paid(&store, 2, 2, dec!(150), "2020-08-11").await;
        insert_paid(&store, 3, 3, dec!(200), "2020-08-20").await;

        let ranking = engine.best_clients(None, Limit::default()).await.unwrap();
        assert_eq!(
            ranking,
            vec![
                ClientRanking {
                    id: ProfileId(1),
                    paid: dec!(250),
                    full_name: "Harry Potter".to_string(),
                },
                ClientRanking {
                    id: ProfileId(2),
                    paid: dec!(200),
                    full_name: "Mr Robot".to_string(),
                },
            ]
        );

        let top = engine.best_clients(None, Limit::new(1).unwrap()).await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].id, ProfileId(1));

        let august_tenth = engine
            .best_clients(range("2020-08-10", "2020-08-10"), Limit::default())
            .await
            .unwrap();
        assert_eq!(august_tenth.len(), 1);
        assert_eq!(august_tenth[0].paid, dec!(100));
    }

    #[test]
    fn test_limit_parsing() {
        assert_eq!("3".parse::<Limit>().unwrap().get(), 3);
        assert_eq!(Limit::default().get(), 2);
        for bad in ["0", "-1", "two", ""] {
            assert!(matches!(bad.parse::<Limit>(), Err(LedgerError::Validation(_))));
        }
    }

    #[test]
    fn test_ranking_wire_shape() {
        let row = ClientRanking {
            id: ProfileId(4),
            paid: dec!(2020),
            full_name: "Ash Kethcum".to_string(),
        };
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["id"], 4);
        assert_eq!(value["fullName"], "Ash Kethcum");
        assert_eq!(value["paid"], 2020.0);
    }
}
