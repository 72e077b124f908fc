//! Payment webhook → license reconciliation.

use crate::error::LicenseResult;
use crate::model::{License, LicenseUpsert};
use crate::store::LicenseStore;
use seatkey_billing::{EventVerifier, PaymentEventKind};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// What a webhook delivery did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// A checkout created or updated this license.
    Upserted(License),
    /// The event type is not one SeatKey acts on.
    Ignored { event_type: String },
}

/// Keeps license rows in step with payment-provider events.
pub struct WebhookReconciler {
    verifier: Arc<dyn EventVerifier>,
    store: Arc<dyn LicenseStore>,
}

impl WebhookReconciler {
    #[must_use]
    pub fn new(verifier: Arc<dyn EventVerifier>, store: Arc<dyn LicenseStore>) -> Self {
        Self { verifier, store }
    }

    /// Authenticates a delivery and applies it.
    ///
    /// `raw` must be the body exactly as received. Nothing is written unless
    /// the signature checks out and the event is a completed checkout.
    ///
    /// # Errors
    ///
    /// `InvalidSignature` and `MalformedEvent` for bad deliveries, `Store`
    /// when the upsert fails. The provider redelivers on its own; nothing is
    /// retried here.
    pub fn reconcile(&self, raw: &[u8], signature_header: &str) -> LicenseResult<ReconcileOutcome> {
        let event = self.verifier.verify(raw, signature_header).map_err(|e| {
            warn!(error = %e, "rejected webhook delivery");
            e
        })?;

        let checkout = match event.kind {
            PaymentEventKind::CheckoutCompleted(checkout) => checkout,
            PaymentEventKind::Unhandled { event_type } => {
                debug!(event_id = ?event.id, %event_type, "ignoring unhandled event type");
                return Ok(ReconcileOutcome::Ignored { event_type });
            }
        };

        info!(
            event_id = ?event.id,
            customer = %checkout.customer_reference,
            seats = checkout.seats,
            "checkout completed"
        );

        let upsert = LicenseUpsert::from(checkout);
        let license = self.store.upsert_license(&upsert).map_err(|e| {
            error!(customer = %upsert.customer_reference, error = %e, "license upsert failed");
            e
        })?;

        Ok(ReconcileOutcome::Upserted(license))
    }
}
