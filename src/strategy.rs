//! # Verification Key Strategy
//!
//! Decides which verification method (key reference) a DID should sign with.
//! [`KmsStrategy`] prefers the first `assertionMethod` of a `did:peer:4`
//! document and otherwise defers to a fallback strategy, by default
//! [`DefaultStrategy`].

use crate::error::Result;
use crate::kms::KeyAlgorithm;
use crate::peer::{self, DidResolver, PeerDid4};

/// Determines the verification method id to use for a DID.
pub trait VerificationKeyStrategy: Send + Sync {
    /// Get the verification method id for `did`, if one can be determined.
    ///
    /// `allowed_key_types` and `proof_purpose` constrain the choice;
    /// strategies may ignore them.
    fn verification_method_id(
        &self, did: &str, allowed_key_types: Option<&[KeyAlgorithm]>, proof_purpose: Option<&str>,
    ) -> impl Future<Output = Result<Option<String>>> + Send;
}

/// The host agent's stock strategy: derives the verification method from the
/// DID for `did:key` and `did:sov`, otherwise `None`.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultStrategy;

impl VerificationKeyStrategy for DefaultStrategy {
    async fn verification_method_id(
        &self, did: &str, _: Option<&[KeyAlgorithm]>, _: Option<&str>,
    ) -> Result<Option<String>> {
        if let Some(multikey) = did.strip_prefix("did:key:") {
            return Ok(Some(format!("{did}#{multikey}")));
        }
        if did.starts_with("did:sov:") {
            return Ok(Some(format!("{did}#key-1")));
        }
        Ok(None)
    }
}

/// Strategy for DIDs whose keys are held by the KMS.
///
/// For `did:peer:4` DIDs the first `assertionMethod` of the resolved document
/// is used, regardless of the requested proof purpose. Anything else,
/// including a peer DID without assertion methods, is passed unchanged to the
/// fallback. Resolution errors are returned rather than falling back.
#[derive(Clone, Debug, Default)]
pub struct KmsStrategy<R = PeerDid4, F = DefaultStrategy>
where
    R: DidResolver,
    F: VerificationKeyStrategy,
{
    resolver: R,
    fallback: F,
}

impl KmsStrategy {
    /// Create a strategy using the `did:peer:4` resolver and the default
    /// fallback.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            resolver: PeerDid4,
            fallback: DefaultStrategy,
        }
    }
}

impl<R: DidResolver, F: VerificationKeyStrategy> KmsStrategy<R, F> {
    /// Create a strategy from a resolver and fallback strategy.
    #[must_use]
    pub const fn with(resolver: R, fallback: F) -> Self {
        Self { resolver, fallback }
    }

    /// The resolver used for `did:peer:4` DIDs.
    #[must_use]
    pub const fn resolver(&self) -> &R {
        &self.resolver
    }

    /// The strategy used when no peer assertion method is found.
    #[must_use]
    pub const fn fallback(&self) -> &F {
        &self.fallback
    }
}

impl<R: DidResolver, F: VerificationKeyStrategy> VerificationKeyStrategy for KmsStrategy<R, F> {
    async fn verification_method_id(
        &self, did: &str, allowed_key_types: Option<&[KeyAlgorithm]>, proof_purpose: Option<&str>,
    ) -> Result<Option<String>> {
        if did.starts_with(peer::PREFIX) {
            let doc = self.resolver.resolve(did).await?;
            if let Some(fragment) = doc.first_assertion_method() {
                tracing::debug!("using first assertion method {fragment} for {did}");
                return Ok(Some(format!("{did}{fragment}")));
            }
        }
        self.fallback.verification_method_id(did, allowed_key_types, proof_purpose).await
    }
}
