use thiserror::Error;

use crate::domain::LedgerError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Invalid mobile number '{0}': enter a valid 10-digit mobile number")]
    InvalidMobile(String),

    #[error("Invalid OTP: please enter the correct code")]
    InvalidOtp,

    #[error("Not signed in: log in with your mobile number first")]
    NotAuthenticated,

    #[error("Persistence error: {0}")]
    Persistence(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable kind of the failure.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Ledger(err) => err.code(),
            AppError::InvalidMobile(_) => "invalid_mobile",
            AppError::InvalidOtp => "invalid_otp",
            AppError::NotAuthenticated => "not_authenticated",
            AppError::Persistence(_) => "persistence_error",
        }
    }

    /// Whether retrying the same call could succeed. Only storage failures
    /// qualify; validation failures are deterministic.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Persistence(_))
    }
}
