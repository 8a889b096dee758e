//! Unified error types for the festival ledger.
//!
//! Every core operation returns [`Result`]. Failures are typed so the presentation
//! layer can choose its own messaging; none of them leave a partial balance change
//! behind.

use sea_orm::{ConnAcquireErr, DbErr};
use thiserror::Error;

/// Substrings of driver messages that mark a commit as safe to retry.
const TRANSIENT_MARKERS: &[&str] = &[
    "database is locked",
    "database table is locked",
    "could not serialize access",
    "deadlock detected",
];

/// All failures surfaced by the ledger.
#[derive(Debug, Error)]
pub enum Error {
    /// A transfer named no account at all, or the same account on both sides.
    #[error("Invalid transfer parties: {reason}")]
    InvalidParty {
        /// What was wrong with the parties
        reason: String,
    },

    /// A referenced account, activity or transaction does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record that was looked up
        entity: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// A debit would leave the account below zero.
    #[error("Insufficient balance on {account}: current {current}, required {required}")]
    InsufficientBalance {
        /// Account that would go negative
        account: String,
        /// Balance at the time of the check
        current: i64,
        /// Amount the operation needed
        required: i64,
    },

    /// Amount missing, non-positive where positive is required, or a negative SET.
    #[error("Invalid amount: {reason}")]
    InvalidAmount {
        /// Why the amount was refused
        reason: String,
    },

    /// The caller may not perform this mutation.
    #[error("Forbidden: {reason}")]
    Forbidden {
        /// Why the caller was refused
        reason: String,
    },

    /// Transient store-level failure; the operation may be retried.
    #[error("Conflict: {message}")]
    Conflict {
        /// Underlying driver message
        message: String,
    },

    /// Malformed input that is not an amount (empty titles, bad booth ids).
    #[error("Validation error: {message}")]
    Validation {
        /// Description of the invalid input
        message: String,
    },

    /// Password hashing or hash parsing failed.
    #[error("Credential error: {message}")]
    Credential {
        /// Description of the failure
        message: String,
    },

    /// Configuration file could not be read or parsed.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the failure
        message: String,
    },

    /// Non-transient database failure.
    #[error("Database error: {0}")]
    Database(#[source] DbErr),

    /// I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or malformed environment variable.
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

impl Error {
    /// Returns true when the failed call may be attempted again unchanged.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<DbErr> for Error {
    fn from(err: DbErr) -> Self {
        if is_transient(&err) {
            Self::Conflict {
                message: err.to_string(),
            }
        } else {
            Self::Database(err)
        }
    }
}

fn is_transient(err: &DbErr) -> bool {
    if matches!(err, DbErr::ConnectionAcquire(ConnAcquireErr::Timeout)) {
        return true;
    }
    let message = err.to_string().to_lowercase();
    TRANSIENT_MARKERS
        .iter()
        .any(|marker| message.contains(marker))
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
