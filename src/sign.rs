use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Bybit v5 request signature.
///
/// Payload is `timestamp + api_key + recv_window + query_string` with no
/// separators, in that exact order; the digest is HMAC-SHA256 keyed with the
/// API secret, hex encoded lowercase. Changing the field order or inserting
/// delimiters invalidates every signature.
pub fn sign(timestamp: i64, api_key: &str, recv_window: i64, query: &str, secret: &str) -> String {
    let payload = format!("{timestamp}{api_key}{recv_window}{query}");
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regression_fixture() {
        let sig = sign(1700000000000, "testkey", 5000, "accountType=UNIFIED&coin=USDT", "testsecret");
        assert_eq!(sig, "3d0f63498fa25097a1d185b1ea2e9607a319ea6eb6f8518b96124c56c7e10c41");
    }

    #[test]
    fn digest_is_64_lowercase_hex() {
        let sig = sign(1700000000000, "key", 5000, "a=b", "secret");
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn every_field_changes_the_signature() {
        let base = sign(1700000000000, "key", 5000, "a=b", "secret");
        assert_ne!(base, sign(1700000000001, "key", 5000, "a=b", "secret"));
        assert_ne!(base, sign(1700000000000, "key2", 5000, "a=b", "secret"));
        assert_ne!(base, sign(1700000000000, "key", 15000, "a=b", "secret"));
        assert_ne!(base, sign(1700000000000, "key", 5000, "a=c", "secret"));
        assert_ne!(base, sign(1700000000000, "key", 5000, "a=b", "secret2"));
    }

    #[test]
    fn empty_query_is_signed_without_special_casing() {
        let sig = sign(1700000000000, "testkey", 5000, "", "testsecret");
        assert_eq!(sig, "2fc9e776b3f07b2ee447067e0f627438055b198bb14dba79e1a3d50e40a5bd8d");
    }
}

// eof
