//! `X-Hub-Signature-256` verification.
//!
//! GitHub signs every delivery with an HMAC-SHA256 of the raw body keyed by
//! the webhook secret and sends it as `sha256=<lowercase hex>`.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Tag GitHub puts in front of the hex digest.
pub const SIGNATURE_PREFIX: &str = "sha256=";

const DIGEST_HEX_LEN: usize = 64;

/// Computes the header value GitHub would send for `payload`.
pub fn sign(payload: &[u8], secret: &str) -> String {
    let mut mac = new_mac(secret);
    mac.update(payload);
    format!("{SIGNATURE_PREFIX}{}", hex::encode(mac.finalize().into_bytes()))
}

/// Returns true iff `signature` is exactly `sign(payload, secret)`.
///
/// The digest comparison is constant-time. Anything that is not the
/// `sha256=` tag followed by 64 lowercase hex characters is rejected before
/// the comparison, so acceptance is byte-equality with the expected header.
pub fn verify_signature(payload: &[u8], secret: &str, signature: &str) -> bool {
    let Some(digest) = signature.strip_prefix(SIGNATURE_PREFIX) else {
        return false;
    };

    if digest.len() != DIGEST_HEX_LEN || !digest.bytes().all(is_lower_hex) {
        return false;
    }

    let expected = match hex::decode(digest) {
        Ok(expected) => expected,
        Err(_) => return false,
    };

    let mut mac = new_mac(secret);
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}

fn new_mac(secret: &str) -> HmacSha256 {
    // HMAC is defined for keys of any length, including empty ones.
    HmacSha256::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("hmac accepts keys of any length"))
}

fn is_lower_hex(b: u8) -> bool {
    b.is_ascii_digit() || (b'a'..=b'f').contains(&b)
}
