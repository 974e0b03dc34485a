//! Authoritative-first estimation with a local fallback.
//!
//! The fallback is an explicit branch on the authoritative result, and it
//! runs the same `estimation::estimate` the service runs. The rate table used
//! by the fallback is fetched at most once per estimator.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{OnceCell, RwLock};

use crate::config::ClientConfig;
use crate::error::{EstimateError, RemoteCalculationError};
use crate::estimation::{
    self, CalculateRequest, CostBreakdown, ProjectRequest, RateSnapshot, RateSource,
};
use crate::service::{AuthoritativeCalculator, HttpQuoteService, RateProvider, fetch_rate_snapshot};

/// Which execution site produced a breakdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalculationPath {
    Authoritative,
    /// The authoritative path failed; the breakdown was computed locally.
    LocalFallback {
        /// Why the authoritative path was abandoned.
        reason: String,
        /// Provenance of the rates used locally.
        rate_source: RateSource,
    },
}

/// A complete, invariant-satisfying result and how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Estimate {
    pub request: ProjectRequest,
    pub breakdown: CostBreakdown,
    pub path: CalculationPath,
}

impl Estimate {
    pub fn is_fallback(&self) -> bool {
        matches!(self.path, CalculationPath::LocalFallback { .. })
    }
}

pub struct DualPathEstimator {
    remote: Arc<dyn AuthoritativeCalculator>,
    rates: Arc<dyn RateProvider>,
    snapshot: OnceCell<RateSnapshot>,
    timeout: Duration,
}

impl DualPathEstimator {
    pub fn new(remote: Arc<dyn AuthoritativeCalculator>, rates: Arc<dyn RateProvider>) -> Self {
        Self {
            remote,
            rates,
            snapshot: OnceCell::new(),
            timeout: ClientConfig::default().timeout,
        }
    }

    /// Estimator that uses one HTTP service for both rates and calculation.
    pub fn over_http(config: ClientConfig) -> Self {
        let timeout = config.timeout;
        let service = Arc::new(HttpQuoteService::new(config));
        Self::new(service.clone(), service).with_timeout(timeout)
    }

    /// Upper bound on the authoritative attempt. Exceeding it triggers the fallback.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The session's rate table, fetched on first use.
    pub async fn rate_snapshot(&self) -> &RateSnapshot {
        self.snapshot
            .get_or_init(|| fetch_rate_snapshot(self.rates.as_ref()))
            .await
    }

    /// Estimate a request: authoritative path first, local pipeline on failure.
    ///
    /// Invalid requests are rejected before either path runs.
    pub async fn estimate(&self, request: &CalculateRequest) -> Result<Estimate, EstimateError> {
        let project = request.normalize()?;

        match self.calculate_remote(&project).await {
            Ok(breakdown) => {
                tracing::debug!(total = breakdown.total, "Authoritative calculation succeeded");
                Ok(Estimate {
                    request: project,
                    breakdown,
                    path: CalculationPath::Authoritative,
                })
            }
            Err(e) => {
                tracing::warn!(error = %e, "Authoritative calculation failed, calculating locally");
                self.calculate_locally(&project, e.to_string()).await
            }
        }
    }

    async fn calculate_remote(
        &self,
        project: &ProjectRequest,
    ) -> Result<CostBreakdown, RemoteCalculationError> {
        let wire = project.to_wire();
        match tokio::time::timeout(self.timeout, self.remote.calculate(&wire)).await {
            Ok(result) => result,
            Err(_) => Err(RemoteCalculationError::Timeout(self.timeout)),
        }
    }

    /// Run the shared pipeline in-process with the session's rate table.
    pub async fn calculate_locally(
        &self,
        project: &ProjectRequest,
        reason: impl Into<String>,
    ) -> Result<Estimate, EstimateError> {
        let snapshot = self.rate_snapshot().await;
        local_estimate(project, snapshot, reason.into())
    }
}

/// Calculate with the built-in rates only. Nothing is fetched.
pub fn estimate_offline(request: &CalculateRequest) -> Result<Estimate, EstimateError> {
    let project = request.normalize()?;
    let snapshot = RateSnapshot::fallback("offline mode requested");
    local_estimate(&project, &snapshot, "offline mode requested".to_string())
}

fn local_estimate(
    project: &ProjectRequest,
    snapshot: &RateSnapshot,
    reason: String,
) -> Result<Estimate, EstimateError> {
    let breakdown = estimation::estimate(project, &snapshot.table).map_err(|e| {
        tracing::error!(error = %e, "Local calculation failed");
        EstimateError::LocalCalculationFailed {
            reason: e.to_string(),
        }
    })?;

    tracing::info!(
        total = breakdown.total,
        fallback_rates = snapshot.is_fallback(),
        "Calculated breakdown locally"
    );

    Ok(Estimate {
        request: *project,
        breakdown,
        path: CalculationPath::LocalFallback {
            reason,
            rate_source: snapshot.source.clone(),
        },
    })
}

/// Result of a session calculation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    Completed(Estimate),
    /// A newer calculation started while this one was in flight; its result
    /// was discarded.
    Superseded,
}

/// One caller's sequence of calculations.
///
/// Starting a calculation clears the previous result. A result only becomes
/// the session's latest if no newer calculation started in the meantime.
pub struct QuoteSession {
    estimator: DualPathEstimator,
    generation: AtomicU64,
    latest: RwLock<Option<Estimate>>,
}

impl QuoteSession {
    pub fn new(estimator: DualPathEstimator) -> Self {
        Self {
            estimator,
            generation: AtomicU64::new(0),
            latest: RwLock::new(None),
        }
    }

    pub async fn calculate(
        &self,
        request: &CalculateRequest,
    ) -> Result<SessionOutcome, EstimateError> {
        // Ticket and clear happen together so an older calculation can't
        // clear a result published by a newer one.
        let ticket = {
            let mut latest = self.latest.write().await;
            *latest = None;
            self.generation.fetch_add(1, Ordering::SeqCst) + 1
        };

        let result = self.estimator.estimate(request).await;

        // Checked under the lock so a newer calculation can't clear in between.
        let mut latest = self.latest.write().await;
        if self.generation.load(Ordering::SeqCst) != ticket {
            tracing::debug!(ticket, "Discarding superseded calculation");
            return Ok(SessionOutcome::Superseded);
        }

        let estimate = result?;
        *latest = Some(estimate.clone());
        Ok(SessionOutcome::Completed(estimate))
    }

    /// The most recent completed, non-superseded estimate.
    pub async fn latest(&self) -> Option<Estimate> {
        self.latest.read().await.clone()
    }
}
