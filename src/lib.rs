//! # KMS Signer
//!
//! Linked Data Proof signing with keys held by a remote Key Management Service
//! (KMS). The host process never sees private key material: documents are
//! canonicalized and hashed locally, and the KMS signs the result.
//!
//! The crate provides:
//!
//! - [`KmsClient`], a client for the KMS key generation and signing endpoints,
//! - [`KmsSuiteProvider`], which builds a [`RemoteSigningSuite`] for a proof
//!   type and verification method,
//! - [`KmsStrategy`], which picks the verification method a DID signs with,
//! - [`Plugin`], which wires the above together from [`Config`].
//!
//! # Canonicalization
//!
//! Suites canonicalize with JCS ([`Jcs`]) by default. Standard
//! `Ed25519Signature2020` verifiers expect RDF dataset canonicalization, so
//! hosts that need interoperable proofs implement [`Canonicalize`] and set it
//! with [`RemoteSigningSuite::canonicalizer`].
//!
//! # Example
//!
//! ```rust,no_run
//! use credibil_kms_signer::{Config, Plugin, Proof, SuiteProvider};
//! use serde_json::json;
//!
//! # async fn run() -> credibil_kms_signer::Result<()> {
//! let plugin = Plugin::setup(&Config::new("https://kms.example")?)?;
//! let suite = plugin.suite_provider.get_suite(
//!     "Ed25519Signature2020",
//!     Proof::default(),
//!     "did:temp:issuer#abc123",
//! )?;
//! let credential = json!({"issuer": "did:temp:issuer"});
//! let _signed = suite.add_proof(credential, "assertionMethod").await?;
//! # Ok(())
//! # }
//! ```

mod canonical;
mod config;
mod core;
mod document;
mod error;
mod kms;
pub mod method;
pub mod peer;
mod proof;
mod provider;
mod strategy;
mod suite;

pub use self::canonical::{Canonicalize, Jcs};
pub use self::config::{Config, KMS_BASE_URL};
pub use self::core::Kind;
pub use self::document::{Document, Relationship};
pub use self::error::{Error, Result};
pub use self::kms::{KeyAlgorithm, KeyRecord, KeyService, KmsClient, decode_signature, encode_data};
pub use self::method::DidMethod;
pub use self::peer::{DidResolver, PeerDid4};
pub use self::proof::{ASSERTION_METHOD, AUTHENTICATION, OneOrMany, Proof};
pub use self::provider::{KmsSuiteProvider, SuiteProvider, key_id};
pub use self::strategy::{DefaultStrategy, KmsStrategy, VerificationKeyStrategy};
pub use self::suite::{LinkedDataSignature, RemoteSigningSuite, SignatureType};

/// The collaborators registered with the host agent.
///
/// Suites from `suite_provider` use JCS canonicalization; see the crate docs
/// for using RDF canonicalization instead.
#[derive(Clone, Debug)]
pub struct Plugin {
    /// Client for the configured KMS.
    pub client: KmsClient,

    /// Provider of signature suites backed by the KMS.
    pub suite_provider: KmsSuiteProvider<KmsClient>,

    /// Strategy for choosing a DID's verification method.
    pub key_strategy: KmsStrategy,

    /// DID methods supported by the plugin.
    pub did_methods: Vec<DidMethod>,
}

impl Plugin {
    /// Build the plugin's collaborators for the KMS described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the KMS client cannot be created.
    pub fn setup(config: &Config) -> Result<Self> {
        let client = KmsClient::new(config)?;
        tracing::debug!("KMS signer configured for {}", config.base_url());

        Ok(Self {
            suite_provider: KmsSuiteProvider::new(client.clone()),
            client,
            key_strategy: KmsStrategy::new(),
            did_methods: vec![method::temp()],
        })
    }

    /// Build the plugin from the `KMS_BASE_URL` environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `KMS_BASE_URL` is not set or invalid.
    pub fn from_env() -> Result<Self> {
        Self::setup(&Config::from_env()?)
    }
}
