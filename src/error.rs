use thiserror::Error;

pub const JOB_UNAVAILABLE: &str = "job not found or it has been payed already";
pub const CLIENT_NOT_FOUND: &str = "client not found";
pub const CONTRACTOR_NOT_FOUND: &str = "contractor not found";
pub const USER_NOT_FOUND: &str = "user doesnt exist";
pub const CONTRACT_NOT_FOUND: &str = "contract not found";
pub const DATE_RANGE_REQUIRED: &str = "need both dates to make a range";

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("unauthorized: no profile matches the supplied credential")]
    Unauthorized,
    #[error("insufficient funds")]
    InsufficientFunds,
    #[error("limit of deposit exceeded")]
    DepositLimitExceeded,
    #[error("transaction conflict: {0}")]
    Conflict(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

impl LedgerError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Errors the caller caused and can be told about in a response body.
    pub fn is_domain(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::NotFound(_)
                | Self::Forbidden(_)
                | Self::InsufficientFunds
                | Self::DepositLimitExceeded
        )
    }

    /// Errors after which the whole operation may be replayed from scratch.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for LedgerError {
    fn from(err: rocksdb::Error) -> Self {
        use rocksdb::ErrorKind;

        match err.kind() {
            ErrorKind::Busy | ErrorKind::TimedOut | ErrorKind::TryAgain => {
                Self::Conflict(err.into_string())
            }
            _ => Self::Storage(err.into_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_are_reported_to_caller() {
        assert!(LedgerError::InsufficientFunds.is_domain());
        assert!(LedgerError::not_found(JOB_UNAVAILABLE).is_domain());
        assert!(!LedgerError::Unauthorized.is_domain());
        assert!(!LedgerError::Storage("disk full".to_string()).is_domain());
    }

    #[test]
    fn test_only_conflicts_are_transient() {
        assert!(LedgerError::Conflict("lock timeout".to_string()).is_transient());
        assert!(!LedgerError::DepositLimitExceeded.is_transient());
    }

    #[test]
    fn test_messages_match_response_contract() {
        assert_eq!(
            LedgerError::DepositLimitExceeded.to_string(),
            "limit of deposit exceeded"
        );
        assert_eq!(
            LedgerError::not_found(USER_NOT_FOUND).to_string(),
            "user doesnt exist"
        );
    }
}
