//! Bearer token inspection
//!
//! The client never verifies signatures; it only reads the unverified
//! expiry claim to decide whether a persisted credential is still usable.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

/// Extract the `exp` claim (Unix seconds) from a JWT-shaped token.
///
/// Returns None unless the token is three dot-separated base64url segments
/// whose payload is JSON with a numeric `exp`.
pub fn parse_exp(token: &str) -> Option<u64> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return None;
    }

    let payload_bytes = URL_SAFE_NO_PAD.decode(parts[1]).ok()?;
    let payload: serde_json::Value = serde_json::from_slice(&payload_bytes).ok()?;
    payload.get("exp")?.as_u64()
}

/// Well-formed and unexpired at `now` (Unix seconds).
pub fn is_valid(token: &str, now: u64) -> bool {
    match parse_exp(token) {
        Some(exp) => exp > now,
        None => false,
    }
}

#[cfg(test)]
pub(crate) fn make_token(exp: u64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"u1","exp":{exp}}}"#));
    format!("{header}.{payload}.sig")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_the_exp_claim() {
        let token = make_token(1_900_000_000);
        assert_eq!(parse_exp(&token), Some(1_900_000_000));
    }

    #[test]
    fn rejects_malformed_tokens() {
        assert_eq!(parse_exp("not-a-token"), None);
        assert_eq!(parse_exp("a.b"), None);
        assert_eq!(parse_exp("a.!!!.c"), None);
        // Payload without exp is treated as absent.
        let header = URL_SAFE_NO_PAD.encode(b"{}");
        let payload = URL_SAFE_NO_PAD.encode(br#"{"sub":"u1"}"#);
        assert_eq!(parse_exp(&format!("{header}.{payload}.sig")), None);
    }

    #[test]
    fn expiry_is_checked_against_now() {
        let token = make_token(1000);
        assert!(is_valid(&token, 999));
        assert!(!is_valid(&token, 1000));
        assert!(!is_valid(&token, 2000));
        assert!(!is_valid("garbage", 0));
    }
}
