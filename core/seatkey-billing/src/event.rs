//! Typed webhook events.
//!
//! The provider envelope is `{"id": .., "type": .., "data": {"object": ..}}`.
//! Only `checkout.session.completed` is acted on; every other type decodes
//! to [`PaymentEventKind::Unhandled`] so callers can acknowledge it without
//! touching the store.

use crate::error::{BillingError, BillingResult};
use seatkey_types::CustomerRef;
use serde::Deserialize;
use serde_json::Value;

/// Event type that creates or updates a license.
pub const CHECKOUT_SESSION_COMPLETED: &str = "checkout.session.completed";

/// Seat count used when the checkout carries no usable `metadata.seats`.
pub const DEFAULT_SEATS: u32 = 1;

/// An authenticated provider event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentEvent {
    /// Provider event id (`evt_...`), when present.
    pub id: Option<String>,
    /// What happened.
    pub kind: PaymentEventKind,
}

/// The event variants SeatKey distinguishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEventKind {
    /// A checkout session finished and the customer paid.
    CheckoutCompleted(CheckoutCompleted),
    /// Any other event type. Acknowledged, never acted on.
    Unhandled {
        /// The provider's event type string.
        event_type: String,
    },
}

/// The fields of a completed checkout that a license is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutCompleted {
    /// Paying customer. Required.
    pub customer_reference: CustomerRef,
    /// Subscription created by the checkout, if any.
    pub subscription_reference: Option<String>,
    /// Seats purchased, [`DEFAULT_SEATS`] unless metadata says otherwise.
    pub seats: u32,
}

/// Only `type` is required up front. The rest of the envelope is read
/// loosely so that unhandled events are acknowledged whatever their shape.
#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    id: Option<Value>,
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Deserialize)]
struct RawCheckoutSession {
    #[serde(default)]
    customer: Option<Expandable>,
    #[serde(default)]
    subscription: Option<Expandable>,
    #[serde(default)]
    metadata: Option<serde_json::Map<String, Value>>,
}

/// A reference the provider sends either as a bare id or an expanded object.
#[derive(Deserialize)]
#[serde(untagged)]
enum Expandable {
    Id(String),
    Object { id: String },
}

impl Expandable {
    fn into_id(self) -> String {
        match self {
            Self::Id(id) | Self::Object { id } => id,
        }
    }
}

impl PaymentEvent {
    /// Decodes an already authenticated payload.
    pub(crate) fn parse(payload: &[u8]) -> BillingResult<Self> {
        let envelope: Envelope = serde_json::from_slice(payload)
            .map_err(|e| BillingError::MalformedEvent(format!("invalid event envelope: {e}")))?;

        let id = match envelope.id {
            Some(Value::String(id)) => Some(id),
            _ => None,
        };

        if envelope.event_type != CHECKOUT_SESSION_COMPLETED {
            return Ok(Self {
                id,
                kind: PaymentEventKind::Unhandled {
                    event_type: envelope.event_type,
                },
            });
        }

        let object = envelope
            .data
            .and_then(|mut data| data.get_mut("object").map(Value::take))
            .filter(|object| !object.is_null())
            .ok_or_else(|| BillingError::MalformedEvent("missing data.object".to_string()))?;
        let session: RawCheckoutSession = serde_json::from_value(object)
            .map_err(|e| BillingError::MalformedEvent(format!("invalid checkout session: {e}")))?;

        let customer_reference = session
            .customer
            .map(Expandable::into_id)
            .ok_or_else(|| {
                BillingError::MalformedEvent("checkout session has no customer".to_string())
            })
            .and_then(|id| {
                CustomerRef::new(id).map_err(|e| BillingError::MalformedEvent(e.to_string()))
            })?;

        let subscription_reference = session
            .subscription
            .map(Expandable::into_id)
            .filter(|id| !id.trim().is_empty());

        let seats = coerce_seats(session.metadata.as_ref().and_then(|m| m.get("seats")));

        Ok(Self {
            id,
            kind: PaymentEventKind::CheckoutCompleted(CheckoutCompleted {
                customer_reference,
                subscription_reference,
                seats,
            }),
        })
    }
}

/// Reads `metadata.seats`, falling back to [`DEFAULT_SEATS`].
///
/// Metadata values are strings on the wire, but a JSON number is accepted
/// too. Anything that reads as a number (`"3"`, `"3.0"`, `"1e1"`, `3.0`) is
/// used when it is a whole count that fits a `u32`. Negative, fractional and
/// non-numeric values fall back to the default.
fn coerce_seats(value: Option<&Value>) -> u32 {
    let parsed = match value {
        None | Some(Value::Null) => return DEFAULT_SEATS,
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) if s.trim().is_empty() => return DEFAULT_SEATS,
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    }
    .and_then(whole_seat_count);

    parsed.unwrap_or_else(|| {
        tracing::warn!(seats = ?value, "unusable seat count in checkout metadata, using default");
        DEFAULT_SEATS
    })
}

fn whole_seat_count(n: f64) -> Option<u32> {
    if n.is_finite() && n >= 0.0 && n.fract() == 0.0 && n <= f64::from(u32::MAX) {
        // Exact: `n` is a whole number within range.
        Some(n as u32)
    } else {
        None
    }
}
