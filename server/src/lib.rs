//! HTTP API for SeatKey.
//!
//! Two `POST` endpoints:
//! - `/api/v1/webhooks/stripe` reconciles payment webhooks into licenses
//! - `/api/v1/licenses/activate` claims a seat for a device
//!
//! Any other method on these paths is answered with `405`.

mod error;

use std::sync::Arc;

use axum::{Router, body::Bytes, extract::State, http::HeaderMap, routing::post};
use seatkey_billing::{EventVerifier, SIGNATURE_HEADER};
use seatkey_license::{
    ActivationOutcome, ActivationRequest, LicenseStore, SeatActivator, WebhookReconciler,
};

pub use error::ApiError;

/// Route of the payment webhook.
pub const WEBHOOK_PATH: &str = "/api/v1/webhooks/stripe";

/// Route of device activation.
pub const ACTIVATE_PATH: &str = "/api/v1/licenses/activate";

/// Handlers shared by every request.
#[derive(Clone)]
pub struct AppState {
    reconciler: Arc<WebhookReconciler>,
    activator: Arc<SeatActivator>,
}

impl AppState {
    /// Wires the handlers to their collaborators.
    #[must_use]
    pub fn new(store: Arc<dyn LicenseStore>, verifier: Arc<dyn EventVerifier>) -> Self {
        Self {
            reconciler: Arc::new(WebhookReconciler::new(verifier, store.clone())),
            activator: Arc::new(SeatActivator::new(store)),
        }
    }
}

async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<&'static str, ApiError> {
    // A missing or non-ASCII header verifies as an empty one and fails.
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned();

    let reconciler = state.reconciler.clone();
    tokio::task::spawn_blocking(move || reconciler.reconcile(&body, &signature)).await??;

    // Handled and ignored events are acknowledged alike.
    Ok("ok")
}

async fn activate_license(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<&'static str, ApiError> {
    // Parsed by hand so a missing Content-Type is not a rejection.
    let request: ActivationRequest =
        serde_json::from_slice(&body).map_err(|_| ApiError::InvalidJson)?;
    let seat = request.validate()?;

    let activator = state.activator.clone();
    let outcome = tokio::task::spawn_blocking(move || activator.activate(&seat)).await??;

    Ok(match outcome {
        ActivationOutcome::AlreadyActivated => "Device already activated",
        ActivationOutcome::Activated => "Activation successful",
    })
}

/// Build the HTTP API router with the given state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(WEBHOOK_PATH, post(stripe_webhook))
        .route(ACTIVATE_PATH, post(activate_license))
        .with_state(state)
}
