//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`InvalidAmount`] thrown when an amount is not a finite number > 0.
//! - [`PayerNotInSplit`] thrown when a personal equal split leaves out the payer.
//! - [`SplitMismatch`] thrown when the shares do not add up to the expense.
//! - [`NotFound`] thrown when a user, group, thread or expense is missing.
//! - [`StoreUnavailable`] thrown when the database fails.
//!
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`PayerNotInSplit`]: EngineError::PayerNotInSplit
//!  [`SplitMismatch`]: EngineError::SplitMismatch
//!  [`NotFound`]: EngineError::NotFound
//!  [`StoreUnavailable`]: EngineError::StoreUnavailable
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Payer not in split: {0}")]
    PayerNotInSplit(String),
    #[error("Split mismatch: {0}")]
    SplitMismatch(String),
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error(transparent)]
    StoreUnavailable(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::PayerNotInSplit(a), Self::PayerNotInSplit(b)) => a == b,
            (Self::SplitMismatch(a), Self::SplitMismatch(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidName(a), Self::InvalidName(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::StoreUnavailable(a), Self::StoreUnavailable(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
