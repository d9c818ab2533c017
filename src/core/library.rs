use std::fmt;
use std::fmt::{Display, Formatter};
use serde::{Deserialize, Serialize};

#[derive(Debug)]
pub enum LibraryError {
    Database {
        message: String,
        reason_code: Option<String>,
        retryable: bool,
    },
    AccessDenied {
        message: String,
        reason_code: Option<String>,
    },
    DuplicateKey {
        message: String,
    },
    NotFound {
        message: String,
    },
    // No copy of the title is left on the shelf.
    OutOfStock {
        message: String,
    },
    // Return was requested for a patron/isbn pair without an open loan.
    NoActiveLoan {
        message: String,
    },
    // The store gave up on the transaction (conflict, deadlock or timeout). Nothing
    // was persisted and the caller may run the whole operation again.
    TransactionFailed {
        message: String,
        reason_code: Option<String>,
        retryable: bool,
    },
    // Persisted state disagrees with itself, e.g. an open loan whose book row is gone.
    InvariantViolation {
        message: String,
    },
    // This is a retry-able error, which indicates that the store is throttling or
    // temporarily unreachable.
    CurrentlyUnavailable {
        message: String,
        reason_code: Option<String>,
        retryable: bool,
    },
    Validation {
        message: String,
        reason_code: Option<String>,
    },
    Serialization {
        message: String,
    },
    Runtime {
        message: String,
        reason_code: Option<String>,
    },
}

impl LibraryError {
    pub fn database(message: &str, reason_code: Option<String>, retryable: bool) -> LibraryError {
        LibraryError::Database { message: message.to_string(), reason_code, retryable }
    }

    pub fn access_denied(message: &str, reason_code: Option<String>) -> LibraryError {
        LibraryError::AccessDenied { message: message.to_string(), reason_code }
    }

    pub fn duplicate_key(message: &str) -> LibraryError {
        LibraryError::DuplicateKey { message: message.to_string() }
    }

    pub fn not_found(message: &str) -> LibraryError {
        LibraryError::NotFound { message: message.to_string() }
    }

    pub fn out_of_stock(message: &str) -> LibraryError {
        LibraryError::OutOfStock { message: message.to_string() }
    }

    pub fn no_active_loan(message: &str) -> LibraryError {
        LibraryError::NoActiveLoan { message: message.to_string() }
    }

    pub fn transaction_failed(message: &str, reason_code: Option<String>, retryable: bool) -> LibraryError {
        LibraryError::TransactionFailed { message: message.to_string(), reason_code, retryable }
    }

    pub fn invariant_violation(message: &str) -> LibraryError {
        LibraryError::InvariantViolation { message: message.to_string() }
    }

    pub fn unavailable(message: &str, reason_code: Option<String>, retryable: bool) -> LibraryError {
        LibraryError::CurrentlyUnavailable { message: message.to_string(), reason_code, retryable }
    }

    pub fn database_or_unavailable(message: &str, reason: Option<String>, retryable: bool) -> LibraryError {
        if retryable {
            LibraryError::unavailable(
                format!("ddb database unavailable error {:?} {:?}", message, reason).as_str(), reason, true)
        } else if let Some(ref reason_val) = reason {
            if reason_val.as_str().contains("404") {
                LibraryError::not_found(
                    format!("not found error {:?} {:?}", message, reason).as_str())
            } else if reason_val.as_str().contains("400") {
                LibraryError::access_denied(
                    format!("access-denied error {:?} {:?}", message, reason).as_str(), reason)
            } else {
                LibraryError::database(
                    format!("ddb database error {:?} {:?}", message, reason).as_str(), reason, false)
            }
        } else {
            LibraryError::database(
                format!("ddb database error {:?} {:?}", message, reason).as_str(), reason, false)
        }
    }

    pub fn validation(message: &str, reason_code: Option<String>) -> LibraryError {
        LibraryError::Validation { message: message.to_string(), reason_code }
    }

    pub fn serialization(message: &str) -> LibraryError {
        LibraryError::Serialization { message: message.to_string() }
    }

    pub fn runtime(message: &str, reason_code: Option<String>) -> LibraryError {
        LibraryError::Runtime { message: message.to_string(), reason_code }
    }

    pub fn retryable(&self) -> bool {
        match self {
            LibraryError::Database { retryable, .. } => { *retryable }
            LibraryError::AccessDenied { .. } => { false }
            LibraryError::DuplicateKey { .. } => { false }
            LibraryError::NotFound { .. } => { false }
            LibraryError::OutOfStock { .. } => { false }
            LibraryError::NoActiveLoan { .. } => { false }
            LibraryError::TransactionFailed { retryable, .. } => { *retryable }
            LibraryError::InvariantViolation { .. } => { false }
            LibraryError::CurrentlyUnavailable { retryable, .. } => { *retryable }
            LibraryError::Validation { .. } => { false }
            LibraryError::Serialization { .. } => { false }
            LibraryError::Runtime { .. } => { false }
        }
    }
}

impl From<std::io::Error> for LibraryError {
    fn from(err: std::io::Error) -> Self {
        LibraryError::runtime(
            format!("io error {:?}", err).as_str(), None)
    }
}

impl From<serde_json::Error> for LibraryError {
    fn from(err: serde_json::Error) -> Self {
        LibraryError::serialization(
            format!("serde json parsing {:?}", err).as_str())
    }
}

impl From<String> for LibraryError {
    fn from(err: String) -> Self {
        LibraryError::serialization(
            format!("serde parsing {:?}", err).as_str())
    }
}

impl From<config::ConfigError> for LibraryError {
    fn from(err: config::ConfigError) -> Self {
        LibraryError::validation(
            format!("invalid configuration {}", err).as_str(), None)
    }
}

impl Display for LibraryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LibraryError::Database { message, reason_code, retryable } => {
                write!(f, "{} {:?} {}", message, reason_code, retryable)
            }
            LibraryError::AccessDenied { message, reason_code } => {
                write!(f, "{} {:?}", message, reason_code)
            }
            LibraryError::DuplicateKey { message } => {
                write!(f, "{}", message)
            }
            LibraryError::NotFound { message } => {
                write!(f, "{}", message)
            }
            LibraryError::OutOfStock { message } => {
                write!(f, "{}", message)
            }
            LibraryError::NoActiveLoan { message } => {
                write!(f, "{}", message)
            }
            LibraryError::TransactionFailed { message, reason_code, retryable } => {
                write!(f, "{} {:?} {}", message, reason_code, retryable)
            }
            LibraryError::InvariantViolation { message } => {
                write!(f, "{}", message)
            }
            LibraryError::CurrentlyUnavailable { message, reason_code, retryable } => {
                write!(f, "{} {:?} {}", message, reason_code, retryable)
            }
            LibraryError::Validation { message, reason_code } => {
                write!(f, "{} {:?}", message, reason_code)
            }
            LibraryError::Serialization { message } => {
                write!(f, "{}", message)
            }
            LibraryError::Runtime { message, reason_code } => {
                write!(f, "{} {:?}", message, reason_code)
            }
        }
    }
}

impl std::error::Error for LibraryError {}

/// A specialized Result type for the circulation stores and services.
pub type LibraryResult<T> = Result<T, LibraryError>;

// It defines abstraction for paginated result
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    // The page number or token
    pub page: Option<String>,
    // page size
    pub page_size: usize,
    // Next page if available
    pub next_page: Option<String>,
    // list of records
    pub records: Vec<T>,
}

impl<T> PaginatedResult<T> {
    pub(crate) fn new(page: Option<&str>, page_size: usize,
                      next_page: Option<String>, records: Vec<T>) -> Self {
        PaginatedResult {
            page: page.map(str::to_string),
            page_size,
            next_page,
            records,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum LoanStatus {
    Open,
    Returned,
}

impl From<String> for LoanStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Open" => LoanStatus::Open,
            "Returned" => LoanStatus::Returned,
            _ => LoanStatus::Open,
        }
    }
}

impl Display for LoanStatus {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            LoanStatus::Open => write!(f, "Open"),
            LoanStatus::Returned => write!(f, "Returned"),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::core::library::{LibraryError, LoanStatus, PaginatedResult};

    #[tokio::test]
    async fn test_should_create_circulation_errors() {
        assert!(matches!(LibraryError::out_of_stock("test"), LibraryError::OutOfStock{ message: _ }));
        assert!(matches!(LibraryError::no_active_loan("test"), LibraryError::NoActiveLoan{ message: _ }));
        assert!(matches!(LibraryError::transaction_failed("test", None, true), LibraryError::TransactionFailed{ message: _, reason_code: _, retryable: true }));
        assert!(matches!(LibraryError::invariant_violation("test"), LibraryError::InvariantViolation{ message: _ }));
    }

    #[tokio::test]
    async fn test_should_create_database_or_unavailable_error() {
        assert!(matches!(LibraryError::database_or_unavailable("test", None, true), LibraryError::CurrentlyUnavailable{ .. }));
        assert!(matches!(LibraryError::database_or_unavailable("test", Some("404".to_string()), false), LibraryError::NotFound{ .. }));
        assert!(matches!(LibraryError::database_or_unavailable("test", Some("400".to_string()), false), LibraryError::AccessDenied{ .. }));
        assert!(matches!(LibraryError::database_or_unavailable("test", Some("500".to_string()), false), LibraryError::Database{ .. }));
        assert!(matches!(LibraryError::database_or_unavailable("test", None, false), LibraryError::Database{ .. }));
    }

    #[tokio::test]
    async fn test_should_only_retry_transient_failures() {
        assert!(LibraryError::transaction_failed("test", None, true).retryable());
        assert!(LibraryError::unavailable("test", None, true).retryable());
        assert!(!LibraryError::transaction_failed("test", None, false).retryable());
        assert!(!LibraryError::out_of_stock("test").retryable());
        assert!(!LibraryError::no_active_loan("test").retryable());
        assert!(!LibraryError::invariant_violation("test").retryable());
        assert!(!LibraryError::not_found("test").retryable());
        assert!(!LibraryError::duplicate_key("test").retryable());
        assert!(!LibraryError::validation("test", None).retryable());
    }

    #[tokio::test]
    async fn test_should_format_loan_status() {
        for status in [LoanStatus::Open, LoanStatus::Returned] {
            assert_eq!(status, LoanStatus::from(status.to_string()));
        }
        assert_eq!(LoanStatus::Open, LoanStatus::from("bogus".to_string()));
    }

    #[tokio::test]
    async fn test_should_build_paginated_result() {
        let res = PaginatedResult::new(Some("p1"), 10, None, vec![1, 2, 3]);
        assert_eq!(Some("p1".to_string()), res.page);
        assert_eq!(3, res.records.len());
        assert!(res.next_page.is_none());
    }
}
