#![cfg(feature = "storage-rocksdb")]

mod common;

use assert_cmd::cargo_bin;
use serde_json::{Value, json};
use std::process::Command;
use tempfile::tempdir;

fn run(db_path: &std::path::Path, args: &[&str]) -> Value {
    let output = Command::new(cargo_bin!("jobledger"))
        .arg("--db-path")
        .arg(db_path)
        .args(args)
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success(), "{output:?}");
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_rocksdb_persistence_recovery() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test_db");
    let seed = common::seed_path();

    // 1. First run: seed the database and pay a job
    let output = Command::new(cargo_bin!("jobledger"))
        .arg("--db-path")
        .arg(&db_path)
        .arg("--seed")
        .arg(&seed)
        .args(["pay", "--profile-id", "1", "2"])
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());

    // 2. Second run: the payment survived and is not repeated
    let again = run(&db_path, &["pay", "--profile-id", "1", "2"]);
    assert_eq!(
        again,
        json!({"error": "job not found or it has been payed already"})
    );

    // Client 1 has nothing outstanding on its in-progress contract any more
    let deposit = run(&db_path, &["deposit", "1", "1"]);
    assert_eq!(deposit, json!({"error": "limit of deposit exceeded"}));

    let ranking = run(&db_path, &["best-clients", "--limit", "1"]);
    assert_eq!(ranking[0]["id"], 4);
}
