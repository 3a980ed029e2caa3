use crate::error::{LedgerError, Result};
use serde::Serialize;
use serde_json::{Value, json};

/// Turns an operation outcome into the response body.
///
/// Domain errors become `{"error": <message>}`; anything else (store faults,
/// unresolved callers) is returned as an error for the caller to handle.
pub fn respond<T: Serialize>(outcome: Result<T>) -> Result<Value> {
    match outcome {
        Ok(body) => Ok(serde_json::to_value(body)?),
        Err(err) if err.is_domain() => Ok(error_body(&err)),
        Err(err) => Err(err),
    }
}

/// Empty success acknowledgment for write operations.
pub fn acknowledge<T>(outcome: Result<T>) -> Result<Value> {
    respond(outcome.map(|_| json!({})))
}

pub fn error_body(err: &LedgerError) -> Value {
    json!({ "error": err.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_become_bodies() {
        let body = respond::<()>(Err(LedgerError::DepositLimitExceeded)).unwrap();
        assert_eq!(body, json!({"error": "limit of deposit exceeded"}));
    }

    #[test]
    fn test_faults_propagate() {
        let outcome = respond::<()>(Err(LedgerError::Storage("gone".to_string())));
        assert!(matches!(outcome, Err(LedgerError::Storage(_))));
        assert!(matches!(
            acknowledge::<()>(Err(LedgerError::Unauthorized)),
            Err(LedgerError::Unauthorized)
        ));
    }

    #[test]
    fn test_acknowledge_hides_payload() {
        assert_eq!(acknowledge(Ok(42)).unwrap(), json!({}));
    }
}
