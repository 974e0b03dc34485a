//! Error types for the estimation engine and its service boundary.

use std::path::PathBuf;
use std::time::Duration;

/// Errors produced while turning a request into a breakdown.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EstimateError {
    /// The request cannot be priced (missing or non-positive area, missing tier).
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// The local fallback calculation failed after the authoritative path did.
    #[error("Calculation failed: {reason}")]
    LocalCalculationFailed { reason: String },
}

impl EstimateError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        EstimateError::InvalidRequest {
            reason: reason.into(),
        }
    }
}

/// Failure to obtain the authoritative rate table.
#[derive(Debug, thiserror::Error)]
pub enum RateFetchError {
    #[error("Rate table request failed: {reason}")]
    RequestFailed { reason: String },

    #[error("Rate table endpoint returned HTTP {status}")]
    HttpStatus { status: u16 },

    #[error("Rate table response malformed: {reason}")]
    InvalidResponse { reason: String },
}

/// Failure of the authoritative calculation path.
#[derive(Debug, thiserror::Error)]
pub enum RemoteCalculationError {
    #[error("Calculation request failed: {reason}")]
    RequestFailed { reason: String },

    #[error("Calculation request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Calculation endpoint returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Calculation response malformed: {reason}")]
    InvalidResponse { reason: String },

    #[error("Calculation response breaks breakdown invariants: {reason}")]
    InvalidBreakdown { reason: String },
}

/// Failure to run the authoritative HTTP service.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind to {addr}: {reason}")]
    Bind { addr: String, reason: String },

    #[error("Server already started")]
    AlreadyStarted,
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Failed to load rates file {path}: {reason}")]
    RatesFile { path: PathBuf, reason: String },
}

