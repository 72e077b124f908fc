//! `Stripe-Signature` header handling.
//!
//! The header looks like `t=1492774577,v1=5257a8...,v0=6ffbb5...`. The
//! provider may list several `v1` entries while a secret is being rolled,
//! and any one of them matching is enough.

use crate::error::{BillingError, BillingResult};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Name of the HTTP header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Scheme whose signatures are checked. `v0` is a test-mode scheme and is ignored.
const SCHEME: &str = "v1";

/// A parsed signature header.
#[derive(Debug)]
pub(crate) struct SignatureHeader {
    pub(crate) timestamp: i64,
    pub(crate) signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    /// Parses the comma-separated `key=value` list.
    pub(crate) fn parse(header: &str) -> BillingResult<Self> {
        let mut timestamp = None;
        let mut signatures = Vec::new();

        for item in header.split(',') {
            let Some((key, value)) = item.trim().split_once('=') else {
                continue;
            };
            match key {
                "t" => timestamp = value.parse::<i64>().ok(),
                SCHEME => {
                    // Undecodable candidates can never match, so they are skipped.
                    if let Ok(bytes) = hex::decode(value) {
                        signatures.push(bytes);
                    }
                }
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or_else(|| {
            BillingError::InvalidSignature("missing or invalid timestamp".to_string())
        })?;
        if signatures.is_empty() {
            return Err(BillingError::InvalidSignature(format!(
                "no {SCHEME} signature in header"
            )));
        }

        Ok(Self {
            timestamp,
            signatures,
        })
    }

    /// Returns true if any listed signature matches `payload` under `secret`.
    pub(crate) fn matches(&self, payload: &[u8], secret: &str) -> BillingResult<bool> {
        let mac = signed_mac(self.timestamp, payload, secret)?;
        Ok(self
            .signatures
            .iter()
            .any(|candidate| mac.clone().verify_slice(candidate).is_ok()))
    }
}

/// Computes the hex `v1` signature for `payload` sent at `timestamp`.
///
/// The signed message is `"{timestamp}." ++ payload`, keyed with the
/// endpoint secret exactly as issued (including its `whsec_` prefix).
///
/// # Errors
///
/// Returns `InvalidSignature` if the secret cannot key the MAC.
pub fn compute_signature(payload: &[u8], secret: &str, timestamp: i64) -> BillingResult<String> {
    let mac = signed_mac(timestamp, payload, secret)?;
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn signed_mac(timestamp: i64, payload: &[u8], secret: &str) -> BillingResult<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| BillingError::InvalidSignature(format!("unusable secret: {e}")))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}
