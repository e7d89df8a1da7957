use serde::Serialize;

use crate::error::{ErrorKind, SprocError};

/// Outcome of one stored-procedure call.
///
/// Either a success carrying the affected-row count, or a failure carrying a category-prefixed
/// message. Serializes as `{"success": .., "error_message": .., "rows_updated": ..}` with
/// `rows_updated` present only on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    success: bool,
    error_message: Option<String>,
    #[serde(rename = "rows_updated", skip_serializing_if = "Option::is_none")]
    rows_affected: Option<u64>,
    #[serde(skip)]
    error_kind: Option<ErrorKind>,
}

impl ExecutionResult {
    #[must_use]
    pub fn succeeded(rows_affected: u64) -> Self {
        Self {
            success: true,
            error_message: None,
            rows_affected: Some(rows_affected),
            error_kind: None,
        }
    }

    #[must_use]
    pub fn failed(err: &SprocError) -> Self {
        let kind = err.kind();
        Self {
            success: false,
            error_message: Some(format!("{}: {err}", kind.prefix())),
            rows_affected: None,
            error_kind: Some(kind),
        }
    }

    #[must_use]
    pub fn success(&self) -> bool {
        self.success
    }

    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    #[must_use]
    pub fn rows_affected(&self) -> Option<u64> {
        self.rows_affected
    }

    #[must_use]
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error_kind
    }
}

impl From<Result<u64, SprocError>> for ExecutionResult {
    fn from(outcome: Result<u64, SprocError>) -> Self {
        match outcome {
            Ok(rows) => Self::succeeded(rows),
            Err(err) => Self::failed(&err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_shape() {
        let res = ExecutionResult::succeeded(3);
        assert!(res.success());
        assert_eq!(res.error_message(), None);
        assert_eq!(
            serde_json::to_value(&res).unwrap(),
            json!({"success": true, "error_message": null, "rows_updated": 3})
        );
    }

    #[test]
    fn failure_shape() {
        let res: ExecutionResult = Err(SprocError::ExecutionError("deadlock".into())).into();
        assert!(!res.success());
        assert_eq!(res.rows_affected(), None);
        assert_eq!(res.error_kind(), Some(ErrorKind::Database));
        assert_eq!(
            res.error_message(),
            Some("Database error: SQL execution error: deadlock")
        );
        assert_eq!(
            serde_json::to_value(&res).unwrap(),
            json!({"success": false, "error_message": "Database error: SQL execution error: deadlock"})
        );
    }
}
