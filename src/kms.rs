//! # Key Management Service
//!
//! Client for a remote key management service (KMS). The KMS owns all private
//! key material: this client only asks it to generate keys and to sign data
//! with a key referenced by its identifier.
//!
//! The KMS exposes two endpoints:
//!
//! - `POST /key/generate` with `{"alg": <algorithm>}`, returning
//!   `{"kid": <key id>, "jwk": <public JWK>, "b58": <base58 public key>}`.
//! - `POST /sign` with `{"kid": <key id>, "data": <base64url padded>}`,
//!   returning `{"sig": <base64url>}`.

use std::fmt::{self, Display};
use std::str::FromStr;

use base64ct::{Base64Url, Base64UrlUnpadded, Encoding};
use reqwest::Response;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::config::Config;
use crate::error::{Error, Result};

/// Key algorithms the KMS can generate keys for.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub enum KeyAlgorithm {
    /// Ed25519 signing key.
    #[serde(rename = "ed25519")]
    Ed25519,

    /// X25519 key agreement key.
    #[serde(rename = "x25519")]
    X25519,

    /// NIST P-256.
    #[serde(rename = "p256")]
    P256,

    /// NIST P-384.
    #[serde(rename = "p384")]
    P384,

    /// NIST P-521.
    #[serde(rename = "p521")]
    P521,

    /// secp256k1 (Bitcoin curve).
    #[serde(rename = "secp256k1")]
    Secp256k1,

    /// BLS12-381 G1.
    #[serde(rename = "bls12-381g1")]
    Bls12381G1,

    /// BLS12-381 G2.
    #[serde(rename = "bls12-381g2")]
    Bls12381G2,
}

impl KeyAlgorithm {
    /// All algorithms, in wire-token order.
    pub const ALL: [Self; 8] = [
        Self::Ed25519,
        Self::X25519,
        Self::P256,
        Self::P384,
        Self::P521,
        Self::Secp256k1,
        Self::Bls12381G1,
        Self::Bls12381G2,
    ];

    /// The token used for the algorithm on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ed25519 => "ed25519",
            Self::X25519 => "x25519",
            Self::P256 => "p256",
            Self::P384 => "p384",
            Self::P521 => "p521",
            Self::Secp256k1 => "secp256k1",
            Self::Bls12381G1 => "bls12-381g1",
            Self::Bls12381G2 => "bls12-381g2",
        }
    }
}

impl Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|alg| alg.as_str() == s)
            .ok_or_else(|| Error::MalformedInput(format!("unsupported key algorithm: {s}")))
    }
}

/// A key generated by the KMS.
///
/// The public key is returned twice: as a JWK and as a raw base58 string. The
/// KMS guarantees both describe the same key.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct KeyRecord {
    /// Key identifier, unique within the KMS.
    pub kid: String,

    /// Public key as a JWK.
    pub jwk: Map<String, Value>,

    /// Public key as a raw base58 (bitcoin alphabet) string.
    pub b58: String,
}

/// Operations the signer needs from a key management service.
///
/// Implementations must not hold private key material locally.
pub trait KeyService: Send + Sync {
    /// Generate a new key pair using the specified algorithm.
    fn generate_key(&self, alg: KeyAlgorithm) -> impl Future<Output = Result<KeyRecord>> + Send;

    /// Sign `data` with the key identified by `kid`, returning the raw
    /// signature bytes.
    fn sign(&self, kid: &str, data: &[u8]) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

#[derive(Serialize)]
struct GenerateKeyRequest {
    alg: KeyAlgorithm,
}

#[derive(Serialize)]
struct SignRequest<'a> {
    kid: &'a str,
    data: String,
}

#[derive(Deserialize)]
struct SignResponse {
    sig: String,
}

/// HTTP client for the KMS.
///
/// Holds a single reusable connection pool bound to the KMS base URL. Clones
/// share the pool.
#[derive(Clone, Debug)]
pub struct KmsClient {
    base_url: Url,
    http_client: reqwest::Client,
}

impl KmsClient {
    /// Create a client for the KMS described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Configuration(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.base_url().clone(),
            http_client,
        })
    }

    /// The KMS base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}/{path}"))
            .map_err(|e| Error::Configuration(format!("invalid KMS endpoint {path}: {e}")))
    }
}

impl KeyService for KmsClient {
    async fn generate_key(&self, alg: KeyAlgorithm) -> Result<KeyRecord> {
        let url = self.endpoint("key/generate")?;
        tracing::debug!("generating {alg} key");

        let res = self.http_client.post(url).json(&GenerateKeyRequest { alg }).send().await?;
        unpack_response(res, "error generating key").await
    }

    async fn sign(&self, kid: &str, data: &[u8]) -> Result<Vec<u8>> {
        let url = self.endpoint("sign")?;
        let request = SignRequest {
            kid,
            data: encode_data(data),
        };
        tracing::debug!("signing {} bytes with key {kid}", data.len());

        let res = self.http_client.post(url).json(&request).send().await?;
        let body: SignResponse = unpack_response(res, "error signing message").await?;
        decode_signature(&body.sig)
    }
}

/// Encode data for transmission to the KMS: URL-safe base64 with padding.
#[must_use]
pub fn encode_data(data: &[u8]) -> String {
    Base64Url::encode_string(data)
}

/// Decode a URL-safe base64 signature returned by the KMS. Padding is
/// optional.
///
/// # Errors
///
/// Returns [`Error::RemoteService`] if the KMS returned a value that is not
/// URL-safe base64.
pub fn decode_signature(sig: &str) -> Result<Vec<u8>> {
    let decoded = if sig.ends_with('=') {
        Base64Url::decode_vec(sig)
    } else {
        Base64UrlUnpadded::decode_vec(sig)
    };
    decoded.map_err(|e| {
        tracing::error!("invalid signature encoding from KMS: {e}");
        Error::RemoteService {
            status: None,
            reason: format!("invalid signature encoding: {e}"),
        }
    })
}

// Unpack a KMS response, classifying any non-success status.
async fn unpack_response<T: DeserializeOwned>(res: Response, context: &str) -> Result<T> {
    let status = res.status();
    if !status.is_success() {
        return Err(Error::remote(status, context));
    }
    res.json::<T>().await.map_err(|e| {
        tracing::error!("{context}: unable to deserialize response: {e}");
        Error::RemoteService {
            status: Some(status.as_u16()),
            reason: format!("{context}: unable to deserialize response: {e}"),
        }
    })
}
