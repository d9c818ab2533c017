use std::fmt;
use std::fmt::{Display, Formatter};
use async_trait::async_trait;
use crate::core::library::LibraryError;

#[derive(Debug)]
pub enum CommandError {
    Access {
        message: String,
        reason_code: Option<String>,
    },
    Database {
        message: String,
        reason_code: Option<String>,
        retryable: bool,
    },
    DuplicateKey {
        message: String,
    },
    NotFound {
        message: String,
    },
    // the request is well formed but the circulation state does not allow it
    Conflict {
        message: String,
    },
    // the store kept rejecting the transaction, nothing was written
    Transaction {
        message: String,
        reason_code: Option<String>,
    },
    Invariant {
        message: String,
    },
    Runtime {
        message: String,
        reason_code: Option<String>,
        retryable: bool,
    },
    Serialization {
        message: String,
    },
    Validation {
        message: String,
        reason_code: Option<String>,
    },
}

#[async_trait]
pub trait Command<Request, Response> {
    async fn execute(&self, req: Request) -> Result<Response, CommandError>;
}

impl From<LibraryError> for CommandError {
    fn from(other: LibraryError) -> Self {
        match other {
            LibraryError::Database { message, reason_code, retryable } => {
                CommandError::Database { message, reason_code, retryable }
            }
            LibraryError::AccessDenied { message, reason_code } => {
                CommandError::Access { message, reason_code }
            }
            LibraryError::DuplicateKey { message } => {
                CommandError::DuplicateKey { message }
            }
            LibraryError::NotFound { message } => {
                CommandError::NotFound { message }
            }
            LibraryError::OutOfStock { message } => {
                CommandError::Conflict { message }
            }
            LibraryError::NoActiveLoan { message } => {
                CommandError::Conflict { message }
            }
            LibraryError::TransactionFailed { message, reason_code, .. } => {
                CommandError::Transaction { message, reason_code }
            }
            LibraryError::InvariantViolation { message } => {
                CommandError::Invariant { message }
            }
            LibraryError::CurrentlyUnavailable { message, reason_code, retryable } => {
                CommandError::Runtime { message, reason_code, retryable }
            }
            LibraryError::Validation { message, reason_code } => {
                CommandError::Validation { message, reason_code }
            }
            LibraryError::Serialization { message } => {
                CommandError::Serialization { message }
            }
            LibraryError::Runtime { message, reason_code } => {
                CommandError::Runtime { message, reason_code, retryable: false }
            }
        }
    }
}

impl Display for CommandError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Access { message, .. } => write!(f, "access denied: {}", message),
            CommandError::Database { message, .. } => write!(f, "database error: {}", message),
            CommandError::DuplicateKey { message } => write!(f, "duplicate: {}", message),
            CommandError::NotFound { message } => write!(f, "not found: {}", message),
            CommandError::Conflict { message } => write!(f, "conflict: {}", message),
            CommandError::Transaction { message, .. } => write!(f, "transaction failed: {}", message),
            CommandError::Invariant { message } => write!(f, "invariant violated: {}", message),
            CommandError::Runtime { message, .. } => write!(f, "runtime error: {}", message),
            CommandError::Serialization { message } => write!(f, "serialization error: {}", message),
            CommandError::Validation { message, .. } => write!(f, "invalid request: {}", message),
        }
    }
}

impl std::error::Error for CommandError {}

#[cfg(test)]
mod tests {
    use crate::core::command::CommandError;
    use crate::core::library::LibraryError;

    #[tokio::test]
    async fn test_should_map_circulation_errors() {
        assert!(matches!(CommandError::from(LibraryError::out_of_stock("none left")), CommandError::Conflict { .. }));
        assert!(matches!(CommandError::from(LibraryError::no_active_loan("no loan")), CommandError::Conflict { .. }));
        assert!(matches!(CommandError::from(LibraryError::transaction_failed("gave up", None, true)), CommandError::Transaction { .. }));
        assert!(matches!(CommandError::from(LibraryError::invariant_violation("book gone")), CommandError::Invariant { .. }));
        assert!(matches!(CommandError::from(LibraryError::not_found("isbn")), CommandError::NotFound { .. }));
        assert!(matches!(CommandError::from(LibraryError::duplicate_key("isbn")), CommandError::DuplicateKey { .. }));
    }

    #[tokio::test]
    async fn test_should_display_command_error() {
        let err = CommandError::from(LibraryError::out_of_stock("no copies of isbn are available"));
        assert_eq!("conflict: no copies of isbn are available", err.to_string());
    }
}
