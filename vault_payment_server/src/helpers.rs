//! Webhook signature primitives.
//!
//! Each provider signs the raw request body with a shared secret; only the digest algorithm and
//! the text encoding of the signature differ between them.
use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha512};

type HmacSha256 = Hmac<Sha256>;
type HmacSha512 = Hmac<Sha512>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HmacAlgorithm {
    /// HMAC-SHA256, hex-encoded signature.
    Sha256Hex,
    /// HMAC-SHA256, base64-encoded signature.
    Sha256Base64,
    /// HMAC-SHA512, hex-encoded signature.
    Sha512Hex,
}

impl HmacAlgorithm {
    /// Signs `data` with `secret` and returns the signature in this algorithm's text encoding.
    /// Used by tests and by providers' sandbox tooling; verification never goes through string
    /// comparison.
    pub fn sign(&self, secret: &str, data: &[u8]) -> String {
        match self {
            HmacAlgorithm::Sha256Hex => hex::encode(sha256_bytes(secret, data)),
            HmacAlgorithm::Sha256Base64 => base64::encode(sha256_bytes(secret, data)),
            HmacAlgorithm::Sha512Hex => {
                let mut mac = HmacSha512::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
                mac.update(data);
                hex::encode(mac.finalize().into_bytes())
            },
        }
    }

    /// Verifies a provided signature against `data`. The underlying MAC comparison is constant
    /// time; an undecodable signature is simply invalid.
    pub fn verify(&self, secret: &str, data: &[u8], provided: &str) -> bool {
        let provided = match self {
            HmacAlgorithm::Sha256Hex | HmacAlgorithm::Sha512Hex => hex::decode(provided).ok(),
            HmacAlgorithm::Sha256Base64 => base64::decode(provided).ok(),
        };
        let Some(provided) = provided else {
            return false;
        };
        match self {
            HmacAlgorithm::Sha256Hex | HmacAlgorithm::Sha256Base64 => {
                let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
                mac.update(data);
                mac.verify_slice(&provided).is_ok()
            },
            HmacAlgorithm::Sha512Hex => {
                let mut mac = HmacSha512::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
                mac.update(data);
                mac.verify_slice(&provided).is_ok()
            },
        }
    }
}

fn sha256_bytes(secret: &str, data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}
