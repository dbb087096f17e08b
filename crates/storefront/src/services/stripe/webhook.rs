//! Stripe webhook signature verification.
//!
//! The `Stripe-Signature` header looks like `t=1700000000,v1=<hex>,v1=<hex>`.
//! Each `v1` is an HMAC-SHA256 of `"{t}.{payload}"` keyed by the endpoint's
//! signing secret; any one matching is enough.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::StripeError;

/// Largest accepted difference between the signed timestamp and now.
pub const TOLERANCE_SECS: i64 = 300;

/// Parsed `Stripe-Signature` header.
#[derive(Debug, PartialEq, Eq)]
struct SignatureHeader<'a> {
    timestamp: i64,
    signatures: Vec<&'a str>,
}

fn parse_header(header: &str) -> Result<SignatureHeader<'_>, StripeError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => {
                timestamp = Some(value.parse::<i64>().map_err(|_| {
                    StripeError::InvalidSignature("invalid timestamp".to_owned())
                })?);
            }
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp =
        timestamp.ok_or_else(|| StripeError::InvalidSignature("missing timestamp".to_owned()))?;
    if signatures.is_empty() {
        return Err(StripeError::InvalidSignature(
            "missing v1 signature".to_owned(),
        ));
    }

    Ok(SignatureHeader {
        timestamp,
        signatures,
    })
}

/// Hex HMAC-SHA256 of `"{timestamp}.{payload}"`.
pub(crate) fn compute_signature(
    secret: &str,
    timestamp: i64,
    payload: &str,
) -> Result<String, StripeError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|e| StripeError::InvalidSignature(e.to_string()))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verify a webhook payload against its `Stripe-Signature` header.
///
/// # Errors
///
/// Returns `StripeError::InvalidSignature` for a malformed header, a
/// timestamp outside [`TOLERANCE_SECS`] of `now`, or no matching signature.
pub fn verify_signature(
    secret: &str,
    payload: &str,
    header: &str,
    now: i64,
) -> Result<(), StripeError> {
    let header = parse_header(header)?;

    if now.abs_diff(header.timestamp) > TOLERANCE_SECS.unsigned_abs() {
        return Err(StripeError::InvalidSignature(
            "timestamp outside tolerance".to_owned(),
        ));
    }

    let expected = compute_signature(secret, header.timestamp, payload)?;
    if !header
        .signatures
        .iter()
        .any(|candidate| constant_time_compare(&expected, candidate))
    {
        return Err(StripeError::InvalidSignature(
            "signature mismatch".to_owned(),
        ));
    }

    Ok(())
}

/// Constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}
