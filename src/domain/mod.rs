//! Marketplace entities, money value objects and the storage ports.

pub mod contract;
pub mod job;
pub mod money;
pub mod period;
pub mod ports;
pub mod profile;
