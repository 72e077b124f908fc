//! Webhook verification entry point.

use crate::error::{BillingError, BillingResult};
use crate::event::PaymentEvent;
use crate::signature::SignatureHeader;
use std::fmt;

/// Default replay window, matching the provider's own client libraries.
pub const DEFAULT_TOLERANCE_SECS: u64 = 300;

/// Authenticates a raw webhook delivery and decodes it.
pub trait EventVerifier: Send + Sync {
    /// Verifies `raw` against `signature_header` and returns the typed event.
    ///
    /// # Errors
    ///
    /// `InvalidSignature` when the delivery is not authentic, `MalformedEvent`
    /// when it is authentic but cannot be decoded.
    fn verify(&self, raw: &[u8], signature_header: &str) -> BillingResult<PaymentEvent>;
}

/// Verifies Stripe webhook deliveries with the endpoint's signing secret.
#[derive(Clone)]
pub struct StripeVerifier {
    secret: String,
    tolerance_secs: u64,
}

impl StripeVerifier {
    /// Creates a verifier for the given endpoint secret (`whsec_...`).
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
        }
    }

    /// Sets the maximum accepted signature age. Zero disables the check.
    #[must_use]
    pub fn with_tolerance_secs(mut self, tolerance_secs: u64) -> Self {
        self.tolerance_secs = tolerance_secs;
        self
    }

    /// Verifies a delivery as if the current time were `now` (unix seconds).
    pub fn verify_at(
        &self,
        raw: &[u8],
        signature_header: &str,
        now: i64,
    ) -> BillingResult<PaymentEvent> {
        let header = SignatureHeader::parse(signature_header)?;

        if !header.matches(raw, &self.secret)? {
            return Err(BillingError::InvalidSignature(
                "no signature matches the payload".to_string(),
            ));
        }

        if self.tolerance_secs > 0 {
            let age = now.saturating_sub(header.timestamp);
            if age > i64::try_from(self.tolerance_secs).unwrap_or(i64::MAX) {
                return Err(BillingError::InvalidSignature(format!(
                    "timestamp outside tolerance ({age}s old)"
                )));
            }
        }

        PaymentEvent::parse(raw)
    }
}

impl EventVerifier for StripeVerifier {
    fn verify(&self, raw: &[u8], signature_header: &str) -> BillingResult<PaymentEvent> {
        self.verify_at(raw, signature_header, chrono::Utc::now().timestamp())
    }
}

impl fmt::Debug for StripeVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StripeVerifier")
            .field("secret", &"<redacted>")
            .field("tolerance_secs", &self.tolerance_secs)
            .finish()
    }
}
