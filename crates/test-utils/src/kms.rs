//! Mock key management service.
//!
//! Serves the KMS HTTP API (`POST /key/generate`, `POST /sign`) on a local
//! port. Keys are not real: a key's public bytes are the SHA-256 of its id and,
//! unless a fixed signature is configured, a signature is the SHA-256 of the
//! key id followed by the signed data. Both are deterministic.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use base64ct::{Base64Url, Base64UrlUnpadded, Encoding};
use dashmap::DashMap;
use multibase::Base;
use serde::Deserialize;
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use tokio::net::TcpListener;

/// A signing request as received by the mock.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignRequest {
    /// Key id.
    pub kid: String,

    /// Data exactly as transmitted (base64url, padded).
    pub data: String,
}

/// In-process KMS. Clones share state.
#[derive(Clone, Default)]
pub struct MockKms {
    state: Arc<KmsState>,
}

#[derive(Default)]
struct KmsState {
    keys: DashMap<String, String>,
    signatures: DashMap<String, Vec<u8>>,
    next_kids: Mutex<VecDeque<String>>,
    counter: AtomicUsize,
    requests: Mutex<Vec<SignRequest>>,
    failure: Mutex<Option<StatusCode>>,
}

#[derive(Deserialize)]
struct GenerateBody {
    alg: String,
}

#[derive(Deserialize)]
struct SignBody {
    kid: String,
    data: String,
}

impl MockKms {
    /// Create an empty KMS.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `kid` for the next generated key. Otherwise keys are named
    /// `key-<n>`.
    #[must_use]
    pub fn with_kid(self, kid: impl Into<String>) -> Self {
        self.state.next_kids.lock().expect("lock").push_back(kid.into());
        self
    }

    /// Always return `sig` when signing with `kid`. The key need not have
    /// been generated.
    #[must_use]
    pub fn with_signature(self, kid: impl Into<String>, sig: Vec<u8>) -> Self {
        self.state.signatures.insert(kid.into(), sig);
        self
    }

    /// Respond to every request with `status` from now on.
    pub fn fail_with(&self, status: u16) {
        let status = StatusCode::from_u16(status).expect("valid status");
        *self.state.failure.lock().expect("lock") = Some(status);
    }

    /// Signing requests received so far.
    #[must_use]
    pub fn sign_requests(&self) -> Vec<SignRequest> {
        self.state.requests.lock().expect("lock").clone()
    }

    /// Algorithm the key `kid` was generated with.
    #[must_use]
    pub fn algorithm(&self, kid: &str) -> Option<String> {
        self.state.keys.get(kid).map(|alg| alg.clone())
    }

    /// Start serving on an ephemeral local port, returning the base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start(&self) -> Result<String> {
        let app = Router::new()
            .route("/key/generate", post(generate))
            .route("/sign", post(sign))
            .with_state(self.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move { axum::serve(listener, app).await });

        Ok(format!("http://{addr}"))
    }

    fn failure(&self) -> Option<StatusCode> {
        *self.state.failure.lock().expect("lock")
    }
}

/// Public key bytes for a mock key.
#[must_use]
pub fn public_key(kid: &str) -> [u8; 32] {
    Sha256::digest(kid.as_bytes()).into()
}

async fn generate(
    State(kms): State<MockKms>, Json(body): Json<GenerateBody>,
) -> Result<Json<Value>, StatusCode> {
    if let Some(status) = kms.failure() {
        return Err(status);
    }

    let next = kms.state.next_kids.lock().expect("lock").pop_front();
    let kid = next.unwrap_or_else(|| {
        format!("key-{}", kms.state.counter.fetch_add(1, Ordering::Relaxed))
    });
    kms.state.keys.insert(kid.clone(), body.alg);

    let key = public_key(&kid);
    let b58 = multibase::encode(Base::Base58Btc, key);
    Ok(Json(json!({
        "kid": kid,
        "jwk": {
            "kty": "OKP",
            "crv": "Ed25519",
            "x": Base64UrlUnpadded::encode_string(&key),
        },
        "b58": &b58[1..],
    })))
}

async fn sign(
    State(kms): State<MockKms>, Json(body): Json<SignBody>,
) -> Result<Json<Value>, StatusCode> {
    kms.state.requests.lock().expect("lock").push(SignRequest {
        kid: body.kid.clone(),
        data: body.data.clone(),
    });
    if let Some(status) = kms.failure() {
        return Err(status);
    }

    let data = Base64Url::decode_vec(&body.data).map_err(|_| StatusCode::BAD_REQUEST)?;
    let sig = if let Some(sig) = kms.state.signatures.get(&body.kid) {
        sig.clone()
    } else if kms.state.keys.contains_key(&body.kid) {
        Sha256::new().chain_update(&body.kid).chain_update(&data).finalize().to_vec()
    } else {
        return Err(StatusCode::NOT_FOUND);
    };

    Ok(Json(json!({"sig": Base64Url::encode_string(&sig)})))
}
