use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A profile balance. Never negative.
///
/// Wraps `rust_decimal::Decimal` so money arithmetic stays exact and the
/// non-negative invariant can only be broken through `checked_sub`, which refuses.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Balance(Decimal);

/// A strictly positive whole amount of money: a job price or a deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self> {
        if value > Decimal::ZERO && value.fract().is_zero() {
            Ok(Self(value.normalize()))
        } else {
            Err(LedgerError::validation("amount must be a positive integer"))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = LedgerError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl FromStr for Amount {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        let value = Decimal::from_str(s.trim())
            .map_err(|_| LedgerError::validation(format!("invalid amount: {s:?}")))?;
        Self::new(value)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Balance {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Result<Self> {
        if value >= Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(LedgerError::validation("balance cannot be negative"))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn add(self, amount: Amount) -> Self {
        Self(self.0 + amount.0)
    }

    /// Subtracts `amount`, failing with `InsufficientFunds` instead of going below zero.
    pub fn checked_sub(self, amount: Amount) -> Result<Self> {
        if self.0 >= amount.0 {
            Ok(Self(self.0 - amount.0))
        } else {
            Err(LedgerError::InsufficientFunds)
        }
    }
}

impl TryFrom<Decimal> for Balance {
    type Error = LedgerError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Balance> for Decimal {
    fn from(balance: Balance) -> Self {
        balance.0
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
