//! Shared test helpers for webhook tests.

#![allow(dead_code)]

use hmac::{Hmac, Mac};
use sha2::Sha256;

pub const SECRET: &str = "whsec_test123secret456";

/// Fixed "current time" used by the tests.
pub const NOW: i64 = 1_750_000_000;

/// Signs `payload` the way the provider does: HMAC-SHA256 over `"{t}.{payload}"`.
pub fn sign(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(format!("{timestamp}.").as_bytes());
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Builds a full `Stripe-Signature` header value.
pub fn header(payload: &[u8], secret: &str, timestamp: i64) -> String {
    format!("t={timestamp},v1={}", sign(payload, secret, timestamp))
}

/// A checkout event with the given `data.object` body.
pub fn checkout_event(object: serde_json::Value) -> Vec<u8> {
    serde_json::json!({
        "id": "evt_test_1",
        "object": "event",
        "type": "checkout.session.completed",
        "data": { "object": object }
    })
    .to_string()
    .into_bytes()
}
