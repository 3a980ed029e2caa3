use super::money::{Amount, Balance};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(pub u32);

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileRole {
    Client,
    Contractor,
    Admin,
}

/// An account on the marketplace holding a balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: ProfileId,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub profession: String,
    #[serde(default)]
    pub balance: Balance,
    #[serde(rename = "type")]
    pub role: ProfileRole,
}

impl Profile {
    pub fn new(id: u32, first_name: &str, last_name: &str, role: ProfileRole) -> Self {
        Self {
            id: ProfileId(id),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            profession: String::new(),
            balance: Balance::ZERO,
            role,
        }
    }

    pub fn with_profession(mut self, profession: &str) -> Self {
        self.profession = profession.to_string();
        self
    }

    pub fn with_balance(mut self, balance: Balance) -> Self {
        self.balance = balance;
        self
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_client(&self) -> bool {
        self.role == ProfileRole::Client
    }

    pub fn is_admin(&self) -> bool {
        self.role == ProfileRole::Admin
    }

    pub fn credit(&mut self, amount: Amount) {
        self.balance = self.balance.add(amount);
    }

    /// Takes `amount` out of the balance; the balance is untouched on failure.
    pub fn debit(&mut self, amount: Amount) -> Result<()> {
        self.balance = self.balance.checked_sub(amount)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;
    use rust_decimal_macros::dec;

    #[test]
    fn test_profile_deserialization() {
        let json = r#"{"id":1,"firstName":"Harry","lastName":"Potter","profession":"Wizard","balance":1150,"type":"client"}"#;
        let profile: Profile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.id, ProfileId(1));
        assert_eq!(profile.role, ProfileRole::Client);
        assert_eq!(profile.balance.value(), dec!(1150));
        assert_eq!(profile.full_name(), "Harry Potter");
    }

    #[test]
    fn test_debit_keeps_balance_on_failure() {
        let mut profile = Profile::new(1, "Harry", "Potter", ProfileRole::Client)
            .with_balance(Balance::new(dec!(100)).unwrap());

        let result = profile.debit(Amount::new(dec!(150)).unwrap());
        assert!(matches!(result, Err(LedgerError::InsufficientFunds)));
        assert_eq!(profile.balance.value(), dec!(100));

        profile.debit(Amount::new(dec!(40)).unwrap()).unwrap();
        profile.credit(Amount::new(dec!(5)).unwrap());
        assert_eq!(profile.balance.value(), dec!(65));
    }
}
