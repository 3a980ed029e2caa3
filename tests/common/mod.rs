use jobledger::domain::contract::{Contract, ContractStatus};
use jobledger::domain::job::Job;
use jobledger::domain::money::{Amount, Balance};
use jobledger::domain::ports::EntityStore;
use jobledger::domain::profile::{Profile, ProfileId, ProfileRole};
use jobledger::infrastructure::in_memory::InMemoryStore;
use jobledger::interfaces::json::seed_reader::SeedReader;
use rust_decimal::Decimal;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

pub const CLIENT: ProfileId = ProfileId(1);
pub const CONTRACTOR: ProfileId = ProfileId(2);

pub fn seed_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/seed.json")
}

/// In-memory store loaded with `tests/fixtures/seed.json`.
pub async fn seeded_store() -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    let file = File::open(seed_path()).unwrap();
    SeedReader::new(file)
        .read()
        .unwrap()
        .provision(store.as_ref())
        .await
        .unwrap();
    store
}

/// One client and one contractor sharing an in-progress contract with an
/// unpaid job per entry of `prices`, ids starting at 1.
pub async fn marketplace(client_balance: Decimal, prices: &[Decimal]) -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    store
        .insert_profile(
            Profile::new(CLIENT.0, "Harry", "Potter", ProfileRole::Client)
                .with_balance(Balance::new(client_balance).unwrap()),
        )
        .await
        .unwrap();
    store
        .insert_profile(
            Profile::new(CONTRACTOR.0, "John", "Lenon", ProfileRole::Contractor)
                .with_profession("Musician"),
        )
        .await
        .unwrap();
    let contract = Contract::new(1, CLIENT, CONTRACTOR, ContractStatus::InProgress).unwrap();
    store.insert_contract(contract.clone()).await.unwrap();
    for (i, price) in prices.iter().enumerate() {
        let job = Job::new(i as u32 + 1, contract.id, Amount::new(*price).unwrap());
        store.insert_job(job).await.unwrap();
    }
    store
}

pub async fn balance(store: &InMemoryStore, id: ProfileId) -> Decimal {
    store.profile(id).await.unwrap().unwrap().balance.value()
}
