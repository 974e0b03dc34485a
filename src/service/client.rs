//! HTTP client for the authoritative quote service.

use async_trait::async_trait;
use reqwest::Client;

use crate::config::ClientConfig;
use crate::error::{RateFetchError, RemoteCalculationError};
use crate::estimation::{CalculateRequest, CostBreakdown, RateTable};
use crate::service::{AuthoritativeCalculator, RateProvider};

/// Talks to a running [`QuoteApi`](crate::service::QuoteApi).
pub struct HttpQuoteService {
    client: Client,
    config: ClientConfig,
}

impl HttpQuoteService {
    pub fn new(config: ClientConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, config }
    }

    fn api_url(&self, path: &str) -> String {
        format!(
            "{}/api/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl RateProvider for HttpQuoteService {
    async fn fetch_rate_table(&self) -> Result<RateTable, RateFetchError> {
        let url = self.api_url("rates");
        tracing::debug!("Fetching rate table from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RateFetchError::RequestFailed {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RateFetchError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| RateFetchError::RequestFailed {
                reason: e.to_string(),
            })?;

        serde_json::from_str(&body).map_err(|e| RateFetchError::InvalidResponse {
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl AuthoritativeCalculator for HttpQuoteService {
    async fn calculate(
        &self,
        request: &CalculateRequest,
    ) -> Result<CostBreakdown, RemoteCalculationError> {
        let url = self.api_url("calculate");
        tracing::debug!("Submitting calculation to {}", url);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RemoteCalculationError::Timeout(self.config.timeout)
                } else {
                    RemoteCalculationError::RequestFailed {
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        tracing::debug!("Calculation response status: {}", status);

        if !status.is_success() {
            return Err(RemoteCalculationError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let breakdown: CostBreakdown =
            serde_json::from_str(&body).map_err(|e| RemoteCalculationError::InvalidResponse {
                reason: format!("JSON parse error: {}", e),
            })?;

        breakdown
            .verify()
            .map_err(|reason| RemoteCalculationError::InvalidBreakdown { reason })?;

        Ok(breakdown)
    }
}
