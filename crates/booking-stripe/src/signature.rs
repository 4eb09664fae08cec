//! # Webhook Signature Verification
//!
//! Stripe signs `"<timestamp>.<raw body>"` with HMAC-SHA256 and sends
//! `Stripe-Signature: t=<timestamp>,v1=<hex>[,v1=<hex>...]`. The body must
//! be verified exactly as received, before any JSON parsing.

use booking_core::{BookingError, BookingResult};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Maximum accepted age (or clock skew) of a signed event, in seconds
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// Parsed `Stripe-Signature` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    pub signatures: Vec<String>,
}

pub fn parse_signature_header(header: &str) -> BookingResult<SignatureHeader> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => {
                timestamp = Some(value.parse::<i64>().map_err(|_| {
                    BookingError::SignatureInvalid("Invalid timestamp in signature".to_string())
                })?);
            }
            "v1" => signatures.push(value.to_string()),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(|| {
        BookingError::SignatureInvalid("Missing timestamp in signature".to_string())
    })?;

    if signatures.is_empty() {
        return Err(BookingError::SignatureInvalid(
            "No v1 signature found".to_string(),
        ));
    }

    Ok(SignatureHeader {
        timestamp,
        signatures,
    })
}

fn signed_mac(secret: &str, timestamp: i64, payload: &[u8]) -> BookingResult<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| BookingError::Internal(format!("HMAC key rejected: {}", e)))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}

/// Hex HMAC-SHA256 of `"<timestamp>.<payload>"`
pub fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> BookingResult<String> {
    let mac = signed_mac(secret, timestamp, payload)?;
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Build a complete `Stripe-Signature` header value (tests, local tooling)
pub fn sign_payload(secret: &str, timestamp: i64, payload: &[u8]) -> BookingResult<String> {
    Ok(format!(
        "t={},v1={}",
        timestamp,
        compute_signature(secret, timestamp, payload)?
    ))
}

/// Verify a signature header against the raw body at time `now` (unix seconds)
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance_secs: i64,
    now: i64,
) -> BookingResult<()> {
    let parsed = parse_signature_header(header)?;

    // `t` is attacker-controlled; abs_diff cannot overflow
    if now.abs_diff(parsed.timestamp) > tolerance_secs.unsigned_abs() {
        return Err(BookingError::SignatureInvalid(
            "Timestamp outside tolerance".to_string(),
        ));
    }

    let mac = signed_mac(secret, parsed.timestamp, payload)?;

    // verify_slice compares in constant time
    let valid = parsed
        .signatures
        .iter()
        .filter_map(|sig| hex::decode(sig).ok())
        .any(|sig| mac.clone().verify_slice(&sig).is_ok());

    if !valid {
        return Err(BookingError::SignatureInvalid(
            "Signature mismatch".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test123secret456";
    const PAYLOAD: &[u8] = br#"{"id":"evt_1","type":"checkout.session.completed"}"#;
    const NOW: i64 = 1_730_000_000;

    #[test]
    fn test_parse_signature_header() {
        let parsed = parse_signature_header("t=1234567890,v1=abc123,v1=def456,v0=old").unwrap();
        assert_eq!(parsed.timestamp, 1234567890);
        assert_eq!(parsed.signatures, vec!["abc123", "def456"]);
    }

    #[test]
    fn test_parse_rejects_incomplete_headers() {
        assert!(parse_signature_header("v1=abc").is_err());
        assert!(parse_signature_header("t=123").is_err());
        assert!(parse_signature_header("t=notanumber,v1=abc").is_err());
        assert!(parse_signature_header("").is_err());
    }

    #[test]
    fn test_compute_signature_is_hex_sha256() {
        let sig = compute_signature(SECRET, NOW, PAYLOAD).unwrap();
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_valid_signature() {
        let header = sign_payload(SECRET, NOW, PAYLOAD).unwrap();
        assert!(verify_signature(PAYLOAD, &header, SECRET, DEFAULT_TOLERANCE_SECS, NOW).is_ok());
    }

    #[test]
    fn test_any_v1_signature_may_match() {
        let good = compute_signature(SECRET, NOW, PAYLOAD).unwrap();
        let header = format!("t={},v1={},v1={}", NOW, "00".repeat(32), good);
        assert!(verify_signature(PAYLOAD, &header, SECRET, DEFAULT_TOLERANCE_SECS, NOW).is_ok());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let header = sign_payload("whsec_other", NOW, PAYLOAD).unwrap();
        let err = verify_signature(PAYLOAD, &header, SECRET, DEFAULT_TOLERANCE_SECS, NOW).unwrap_err();
        assert!(matches!(err, BookingError::SignatureInvalid(_)));
    }

    #[test]
    fn test_modified_payload_rejected() {
        let header = sign_payload(SECRET, NOW, PAYLOAD).unwrap();
        let tampered = br#"{"id":"evt_1","type":"checkout.session.completed","x":1}"#;
        assert!(verify_signature(tampered, &header, SECRET, DEFAULT_TOLERANCE_SECS, NOW).is_err());
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let old = NOW - 600;
        let header = sign_payload(SECRET, old, PAYLOAD).unwrap();
        let err = verify_signature(PAYLOAD, &header, SECRET, DEFAULT_TOLERANCE_SECS, NOW).unwrap_err();
        assert_eq!(err.to_string(), "Webhook signature invalid: Timestamp outside tolerance");
    }

    #[test]
    fn test_extreme_timestamps_rejected() {
        for t in [i64::MIN, i64::MAX, -1] {
            let header = format!("t={},v1={}", t, "00".repeat(32));
            let err = verify_signature(PAYLOAD, &header, SECRET, DEFAULT_TOLERANCE_SECS, NOW)
                .unwrap_err();
            assert_eq!(err.to_string(), "Webhook signature invalid: Timestamp outside tolerance");
        }
    }

    #[test]
    fn test_non_hex_signature_rejected() {
        let header = format!("t={},v1=zz-not-hex", NOW);
        assert!(verify_signature(PAYLOAD, &header, SECRET, DEFAULT_TOLERANCE_SECS, NOW).is_err());
    }
}
