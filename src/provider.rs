//! # Suite Provider
//!
//! Hosts ask a [`SuiteProvider`] for a signature suite matching a proof type
//! and verification method. Providers that cannot produce the requested type
//! return [`Error::UnsupportedProofType`] so the host can try another provider.

use crate::error::{Error, Result};
use crate::kms::KeyService;
use crate::proof::Proof;
use crate::suite::{LinkedDataSignature, RemoteSigningSuite, SignatureType};

/// Resolves a signature suite for a proof request.
pub trait SuiteProvider: Send + Sync {
    /// The suite returned by the provider.
    type Suite<'a>: LinkedDataSignature
    where
        Self: 'a;

    /// Get a suite able to produce `proof_type` proofs, signing with the key
    /// referenced by `verification_method`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedProofType`] if the provider cannot produce
    /// `proof_type` proofs, or [`Error::MalformedInput`] if the verification
    /// method does not reference a key.
    fn get_suite(
        &self, proof_type: &str, proof: Proof, verification_method: &str,
    ) -> Result<Self::Suite<'_>>;
}

/// Provides [`RemoteSigningSuite`]s bound to a shared KMS client.
#[derive(Clone, Debug)]
pub struct KmsSuiteProvider<K: KeyService> {
    client: K,
}

impl<K: KeyService> KmsSuiteProvider<K> {
    /// Create a provider whose suites sign with `client`.
    #[must_use]
    pub const fn new(client: K) -> Self {
        Self { client }
    }

    /// The KMS client suites are bound to.
    #[must_use]
    pub const fn client(&self) -> &K {
        &self.client
    }
}

impl<K: KeyService> SuiteProvider for KmsSuiteProvider<K> {
    type Suite<'a>
        = RemoteSigningSuite<'a, K>
    where
        Self: 'a;

    fn get_suite(
        &self, proof_type: &str, proof: Proof, verification_method: &str,
    ) -> Result<Self::Suite<'_>> {
        let signature_type = proof_type.parse::<SignatureType>().inspect_err(|_| {
            tracing::debug!("unsupported proof type: {proof_type}");
        })?;
        let kid = key_id(verification_method)?;

        tracing::debug!(
            "suite for kid: {kid}, proof: {proof:?}, verification method: {verification_method}"
        );
        Ok(RemoteSigningSuite::new(&self.client, kid)
            .signature_type(signature_type)
            .verification_method(verification_method)
            .proof(proof))
    }
}

/// Extract the KMS key identifier from a verification method: the fragment
/// following the last `#`.
///
/// # Errors
///
/// Returns [`Error::MalformedInput`] if the verification method has no
/// fragment or the fragment is empty.
pub fn key_id(verification_method: &str) -> Result<&str> {
    match verification_method.rsplit_once('#') {
        Some((_, kid)) if !kid.is_empty() => Ok(kid),
        _ => Err(Error::MalformedInput(format!(
            "verification method {verification_method} has no key identifier"
        ))),
    }
}
