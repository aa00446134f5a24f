//! Request signing for the Kalshi trade API.
//!
//! Kalshi authenticates REST calls with an RSA-PSS-SHA256 signature over
//! `timestamp_ms + METHOD + path` (path only, no query string), carried in
//! three headers alongside the API key id. Key material arrives as PEM text
//! resolved by kf-config; it is never logged and `RequestSigner` exposes no
//! way to read it back.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::pss::BlindedSigningKey;
use rsa::sha2::Sha256;
use rsa::signature::{RandomizedSigner, SignatureEncoding};
use rsa::RsaPrivateKey;

use crate::ClientError;

pub const HEADER_KEY: &str = "KALSHI-ACCESS-KEY";
pub const HEADER_SIGNATURE: &str = "KALSHI-ACCESS-SIGNATURE";
pub const HEADER_TIMESTAMP: &str = "KALSHI-ACCESS-TIMESTAMP";

/// Signs requests with a fixed API key id and RSA private key.
pub struct RequestSigner {
    key_id: String,
    signing_key: BlindedSigningKey<Sha256>,
}

impl RequestSigner {
    /// Build a signer from PEM text. Accepts PKCS#8 (`BEGIN PRIVATE KEY`)
    /// and PKCS#1 (`BEGIN RSA PRIVATE KEY`) encodings.
    pub fn from_pem(key_id: String, pem: &str) -> Result<Self, ClientError> {
        let private_key = RsaPrivateKey::from_pkcs8_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
            .map_err(|e| ClientError::Auth(format!("private key PEM rejected: {e}")))?;

        Ok(Self {
            key_id,
            signing_key: BlindedSigningKey::<Sha256>::new(private_key),
        })
    }

    /// Produce the three auth headers for one request.
    ///
    /// `path` must be the URL path only (e.g. `/trade-api/v2/portfolio/balance`);
    /// query parameters are not part of the signed message.
    pub fn headers(&self, method: &str, path: &str) -> Vec<(&'static str, String)> {
        let timestamp_ms = chrono::Utc::now().timestamp_millis();
        let message = format!("{timestamp_ms}{method}{path}");
        let signature = self.sign(&message);

        vec![
            (HEADER_KEY, self.key_id.clone()),
            (HEADER_SIGNATURE, signature),
            (HEADER_TIMESTAMP, timestamp_ms.to_string()),
        ]
    }

    fn sign(&self, message: &str) -> String {
        let mut rng = rand::thread_rng();
        let signature = self.signing_key.sign_with_rng(&mut rng, message.as_bytes());
        BASE64.encode(signature.to_bytes())
    }
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Key material must never reach logs.
        f.debug_struct("RequestSigner")
            .field("key_id", &self.key_id)
            .field("signing_key", &"<REDACTED>")
            .finish()
    }
}
