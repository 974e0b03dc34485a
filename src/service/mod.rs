//! Service boundary around the estimation engine.
//!
//! ```text
//!   caller ──► DualPathEstimator ──► AuthoritativeCalculator (HTTP) ──► QuoteApi
//!                     │                                                   │
//!                     └─ on failure ─► estimation::estimate ◄─────────────┘
//! ```
//!
//! Both the authoritative service and the local fallback run the same
//! `estimation::estimate` function.

mod api;
mod client;
mod dual_path;

pub use api::{QuoteApi, QuoteServer, QuoteState};
pub use client::HttpQuoteService;
pub use dual_path::{
    CalculationPath, DualPathEstimator, Estimate, QuoteSession, SessionOutcome, estimate_offline,
};

use async_trait::async_trait;

use crate::error::{RateFetchError, RemoteCalculationError};
use crate::estimation::{CalculateRequest, CostBreakdown, RateSnapshot, RateTable};

/// Source of the authoritative rate table.
#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn fetch_rate_table(&self) -> Result<RateTable, RateFetchError>;
}

/// The authoritative calculation path.
#[async_trait]
pub trait AuthoritativeCalculator: Send + Sync {
    async fn calculate(
        &self,
        request: &CalculateRequest,
    ) -> Result<CostBreakdown, RemoteCalculationError>;
}

/// Fetch the rate table once, substituting the built-in table on any failure.
pub async fn fetch_rate_snapshot(provider: &dyn RateProvider) -> RateSnapshot {
    match provider.fetch_rate_table().await {
        Ok(table) => {
            tracing::debug!(complete = table.is_complete(), "Fetched authoritative rate table");
            RateSnapshot::authoritative(table)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Rate table unavailable, using fallback rates");
            RateSnapshot::fallback(e.to_string())
        }
    }
}
