//! Authoritative HTTP API.
//!
//! `POST /api/calculate` prices a request with the server's rate table using
//! the shared estimation pipeline; `GET /api/rates` publishes that table so
//! clients can run the identical pipeline locally when calculation requests
//! fail.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::{EstimateError, ServerError};
use crate::estimation::{self, CalculateRequest, CostBreakdown, RateTable};

/// Maximum JSON body size for calculation requests (16 KB).
const MAX_BODY_BYTES: usize = 16 * 1024;

/// Shared state for the quote API.
#[derive(Clone)]
pub struct QuoteState {
    /// Table this server treats as authoritative. May be partial.
    pub rates: Arc<RateTable>,
}

impl QuoteState {
    pub fn new(rates: RateTable) -> Self {
        Self {
            rates: Arc::new(rates),
        }
    }
}

/// The quote service's routes.
pub struct QuoteApi;

impl QuoteApi {
    /// Build the axum router.
    pub fn router(state: QuoteState) -> Router {
        Router::new()
            .route("/api/rates", get(get_rates))
            .route("/api/calculate", post(calculate_handler))
            .route("/health", get(health_check))
            .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}

impl IntoResponse for EstimateError {
    fn into_response(self) -> Response {
        let status = match self {
            EstimateError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            EstimateError::LocalCalculationFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (
            status,
            Json(serde_json::json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}

// -- Handlers --

async fn health_check() -> &'static str {
    "ok"
}

async fn get_rates(State(state): State<QuoteState>) -> Json<RateTable> {
    Json(state.rates.as_ref().clone())
}

async fn calculate_handler(
    State(state): State<QuoteState>,
    body: Bytes,
) -> Result<Json<CostBreakdown>, EstimateError> {
    let request: CalculateRequest = serde_json::from_slice(&body)
        .map_err(|e| EstimateError::invalid(format!("malformed request: {}", e)))?;

    let project = request.normalize().inspect_err(|e| {
        tracing::debug!(error = %e, "Rejected calculation request");
    })?;
    let breakdown = estimation::estimate(&project, &state.rates)?;

    tracing::info!(
        area = %project.area,
        unit = ?project.unit,
        total = breakdown.total,
        "Calculated breakdown"
    );

    Ok(Json(breakdown))
}

/// Runs [`QuoteApi`] on a background task.
///
/// `start()` binds the listener and spawns the server; `shutdown()` signals
/// graceful shutdown and waits for the task.
pub struct QuoteServer {
    addr: SocketAddr,
    router: Option<Router>,
    local_addr: Option<SocketAddr>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl QuoteServer {
    pub fn new(addr: SocketAddr, state: QuoteState) -> Self {
        Self {
            addr,
            router: Some(QuoteApi::router(state)),
            local_addr: None,
            shutdown_tx: None,
            handle: None,
        }
    }

    /// Bind the listener and spawn the server. Returns the bound address,
    /// which differs from the configured one when port 0 was requested.
    pub async fn start(&mut self) -> Result<SocketAddr, ServerError> {
        let router = self.router.take().ok_or(ServerError::AlreadyStarted)?;

        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: self.addr.to_string(),
                reason: e.to_string(),
            })?;
        let local_addr = listener.local_addr().map_err(|e| ServerError::Bind {
            addr: self.addr.to_string(),
            reason: e.to_string(),
        })?;

        tracing::info!("Quote API listening on {}", local_addr);

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        self.shutdown_tx = Some(shutdown_tx);
        self.local_addr = Some(local_addr);

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                    tracing::info!("Quote API shutting down");
                })
                .await
            {
                tracing::error!("Quote API error: {}", e);
            }
        });

        self.handle = Some(handle);
        Ok(local_addr)
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Signal graceful shutdown and wait for the server task to finish.
    pub async fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}
