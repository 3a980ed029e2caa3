//! Application layer containing the marketplace use cases.
//!
//! `LedgerEngine` performs the balance-moving operations, each inside a single
//! store transaction. `AccessFilter` and `ReportingEngine` are read-only views
//! over the same `EntityStore`, and `IdentityResolver` turns a caller
//! credential into a profile.

pub mod access;
pub mod identity;
pub mod ledger;
pub mod reporting;
