//! # Signature Suites
//!
//! A signature suite turns a document and a set of proof options into a signed
//! [`Proof`]. The suites here never see private keys: the final signing step
//! is delegated to a [`KeyService`].
//!
//! Suites are write-only. Verification needs only the public key and is
//! available through the host's existing verification paths, so
//! [`LinkedDataSignature::verify_signature`] always fails.

use std::fmt::{self, Display};
use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use multibase::Base;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::canonical::{Canonicalize, Jcs};
use crate::error::{Error, Result};
use crate::kms::KeyService;
use crate::proof::Proof;

/// Signature suites that can be produced with a remote key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SignatureType {
    /// [Ed25519Signature2020](https://w3c-ccg.github.io/lds-ed25519-2020).
    #[default]
    Ed25519Signature2020,
}

impl SignatureType {
    /// The proof `type` value for the suite.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ed25519Signature2020 => "Ed25519Signature2020",
        }
    }
}

impl Display for SignatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignatureType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Ed25519Signature2020" => Ok(Self::Ed25519Signature2020),
            _ => Err(Error::UnsupportedProofType(s.to_string())),
        }
    }
}

/// The operations of a linked data signature suite.
pub trait LinkedDataSignature: Send + Sync {
    /// The suite's proof type.
    fn proof_type(&self) -> SignatureType;

    /// Canonicalize `input` ahead of hashing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Canonicalization`] if the input cannot be
    /// canonicalized.
    fn canonicalize(&self, input: &Value) -> Result<Vec<u8>>;

    /// Sign `verify_data`, adding the signature to `proof` as `proofValue`.
    fn sign(&self, verify_data: &[u8], proof: Proof) -> impl Future<Output = Result<Proof>> + Send;

    /// Verify a signature.
    fn verify_signature(
        &self, verify_data: &[u8], verification_method: &Value, document: &Value, proof: &Proof,
    ) -> Result<bool>;
}

/// A signature suite whose signing key is held by a remote KMS.
///
/// Built per signing operation (see [`crate::SuiteProvider`]) and dropped once
/// the proof has been produced.
#[derive(Debug)]
pub struct RemoteSigningSuite<'a, K: KeyService, C: Canonicalize = Jcs> {
    signature_type: SignatureType,
    client: &'a K,
    canonicalizer: C,
    kid: String,
    proof: Option<Proof>,
    verification_method: Option<String>,
    date: Option<DateTime<Utc>>,
}

impl<'a, K: KeyService> RemoteSigningSuite<'a, K> {
    /// Create a suite that signs with the KMS key `kid`.
    ///
    /// The suite canonicalizes with [`Jcs`]. Proofs verifiable by a standard
    /// `Ed25519Signature2020` verifier need an RDF canonicalizer, set with
    /// [`RemoteSigningSuite::canonicalizer`].
    #[must_use]
    pub fn new(client: &'a K, kid: impl Into<String>) -> Self {
        Self {
            signature_type: SignatureType::default(),
            client,
            canonicalizer: Jcs,
            kid: kid.into(),
            proof: None,
            verification_method: None,
            date: None,
        }
    }
}

impl<'a, K: KeyService, C: Canonicalize> RemoteSigningSuite<'a, K, C> {
    /// Set the proof type produced by the suite.
    #[must_use]
    pub const fn signature_type(mut self, signature_type: SignatureType) -> Self {
        self.signature_type = signature_type;
        self
    }

    /// Use a different canonicalization algorithm.
    #[must_use]
    pub fn canonicalizer<C2: Canonicalize>(self, canonicalizer: C2) -> RemoteSigningSuite<'a, K, C2> {
        RemoteSigningSuite {
            signature_type: self.signature_type,
            client: self.client,
            canonicalizer,
            kid: self.kid,
            proof: self.proof,
            verification_method: self.verification_method,
            date: self.date,
        }
    }

    /// Proof options to start from when creating a proof.
    #[must_use]
    pub fn proof(mut self, proof: Proof) -> Self {
        self.proof = Some(proof);
        self
    }

    /// The verification method (DID URL) a verifier should use.
    #[must_use]
    pub fn verification_method(mut self, verification_method: impl Into<String>) -> Self {
        self.verification_method = Some(verification_method.into());
        self
    }

    /// Creation date for the proof. Defaults to now.
    #[must_use]
    pub const fn date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    /// The KMS key identifier used for signing.
    #[must_use]
    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// Create a proof for `document`.
    ///
    /// Builds the proof options from the suite's settings, hashes the
    /// canonicalized options and document, and signs the result with the KMS.
    ///
    /// # Errors
    ///
    /// Returns an error if either input cannot be canonicalized or the KMS
    /// fails to sign.
    pub async fn create_proof(&self, document: &Value, proof_purpose: &str) -> Result<Proof> {
        let mut proof = self.proof.clone().unwrap_or_default();
        proof.type_ = self.signature_type.to_string();
        proof.proof_value = None;
        if let Some(vm) = &self.verification_method {
            proof.verification_method.clone_from(vm);
        }
        if proof.verification_method.is_empty() {
            return Err(Error::MalformedInput("proof has no verification method".to_string()));
        }
        proof.proof_purpose = proof_purpose.to_string();
        if proof.created.is_none() {
            proof.created = Some(self.date.unwrap_or_else(|| Utc::now().trunc_subsecs(0)));
        }

        let verify_data = self.verify_data(document, &proof)?;
        self.sign(&verify_data, proof).await
    }

    /// Create a proof for `document` and embed it as the document's `proof`.
    ///
    /// # Errors
    ///
    /// Returns an error if `document` is not a JSON object or the proof cannot
    /// be created.
    pub async fn add_proof(&self, mut document: Value, proof_purpose: &str) -> Result<Value> {
        if !document.is_object() {
            return Err(Error::MalformedInput("document is not a JSON object".to_string()));
        }
        let proof = self.create_proof(&document, proof_purpose).await?;
        if let Some(obj) = document.as_object_mut() {
            obj.insert("proof".to_string(), serde_json::to_value(proof)?);
        }
        Ok(document)
    }

    // sha256(canonical proof options) || sha256(canonical document)
    //
    // Options take the document's `@context` so an RDF canonicalizer can
    // expand their terms. Signature members are never part of the options.
    fn verify_data(&self, document: &Value, proof: &Proof) -> Result<Vec<u8>> {
        let mut options = serde_json::to_value(proof)?;
        if let Some(obj) = options.as_object_mut() {
            for key in ["proofValue", "jws", "signatureValue"] {
                obj.remove(key);
            }
            if let Some(context) = document.get("@context") {
                obj.insert("@context".to_string(), context.clone());
            }
        }

        let mut unsecured = document.clone();
        if let Some(obj) = unsecured.as_object_mut() {
            obj.remove("proof");
        }

        let options_hash = Sha256::digest(self.canonicalize(&options)?);
        let document_hash = Sha256::digest(self.canonicalize(&unsecured)?);
        Ok([options_hash.as_slice(), document_hash.as_slice()].concat())
    }
}

impl<K: KeyService, C: Canonicalize> LinkedDataSignature for RemoteSigningSuite<'_, K, C> {
    fn proof_type(&self) -> SignatureType {
        self.signature_type
    }

    fn canonicalize(&self, input: &Value) -> Result<Vec<u8>> {
        tracing::debug!("canonicalizing input: {input}");
        self.canonicalizer.canonicalize(input)
    }

    async fn sign(&self, verify_data: &[u8], mut proof: Proof) -> Result<Proof> {
        let sig = self.client.sign(&self.kid, verify_data).await?;
        proof.proof_value = Some(multibase::encode(Base::Base58Btc, sig));
        tracing::debug!("signed proof with key {}: {proof:?}", self.kid);
        Ok(proof)
    }

    fn verify_signature(&self, _: &[u8], _: &Value, _: &Value, _: &Proof) -> Result<bool> {
        Err(Error::UnsupportedOperation("verification not supported by KMS".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::kms::{KeyAlgorithm, KeyRecord};

    // Signs by hashing the key id and data; records each request.
    #[derive(Default)]
    struct EchoKms {
        requests: Mutex<Vec<(String, Vec<u8>)>>,
    }

    impl KeyService for EchoKms {
        async fn generate_key(&self, _: KeyAlgorithm) -> Result<KeyRecord> {
            Err(Error::UnsupportedOperation("generate".to_string()))
        }

        async fn sign(&self, kid: &str, data: &[u8]) -> Result<Vec<u8>> {
            self.requests.lock().expect("lock").push((kid.to_string(), data.to_vec()));
            Ok(Sha256::new().chain_update(kid).chain_update(data).finalize().to_vec())
        }
    }

    #[tokio::test]
    async fn sign_sets_proof_value() {
        let kms = EchoKms::default();
        let suite = RemoteSigningSuite::new(&kms, "key-1");

        let proof = suite.sign(b"data", Proof::default()).await.expect("should sign");

        let (base, sig) = multibase::decode(proof.proof_value.expect("should be set"))
            .expect("should decode");
        assert_eq!(base, Base::Base58Btc);
        let expected = Sha256::new().chain_update("key-1").chain_update(b"data").finalize();
        assert_eq!(sig, expected.to_vec());
        assert_eq!(kms.requests.lock().expect("lock").len(), 1);
    }

    #[test]
    fn verify_unsupported() {
        let kms = EchoKms::default();
        let suite = RemoteSigningSuite::new(&kms, "key-1");
        let err = suite
            .verify_signature(b"data", &json!({}), &json!({}), &Proof::default())
            .expect_err("should fail");
        assert!(matches!(err, Error::UnsupportedOperation(_)));
    }

    #[tokio::test]
    async fn create_proof() {
        let kms = EchoKms::default();
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let suite = RemoteSigningSuite::new(&kms, "key-1")
            .verification_method("did:example:123#key-1")
            .date(created);

        let document = json!({
            "@context": ["https://www.w3.org/2018/credentials/v1"],
            "type": ["VerifiableCredential"],
            "issuer": "did:example:123",
            "credentialSubject": {"id": "did:example:456"}
        });
        let proof = suite.create_proof(&document, "assertionMethod").await.expect("should sign");

        assert_eq!(proof.type_, "Ed25519Signature2020");
        assert_eq!(proof.verification_method, "did:example:123#key-1");
        assert_eq!(proof.proof_purpose, "assertionMethod");
        assert_eq!(proof.created, Some(created));
        assert!(proof.proof_value.is_some());

        // verify data is two SHA-256 digests
        let requests = kms.requests.lock().expect("lock");
        let (kid, verify_data) = &requests[0];
        assert_eq!(kid, "key-1");
        assert_eq!(verify_data.len(), 64);

        let mut options = proof.clone();
        options.proof_value = None;
        let mut options = serde_json::to_value(options).expect("should serialize");
        options["@context"] = document["@context"].clone();
        let expected_options = Sha256::digest(Jcs.canonicalize(&options).expect("canonical"));
        let expected_doc = Sha256::digest(Jcs.canonicalize(&document).expect("canonical"));
        assert_eq!(&verify_data[..32], expected_options.as_slice());
        assert_eq!(&verify_data[32..], expected_doc.as_slice());
    }

    // Records each canonicalizer input.
    #[derive(Default)]
    struct Recorder {
        inputs: Mutex<Vec<Value>>,
    }

    impl Canonicalize for Recorder {
        fn canonicalize(&self, input: &Value) -> Result<Vec<u8>> {
            self.inputs.lock().expect("lock").push(input.clone());
            Jcs.canonicalize(input)
        }
    }

    #[tokio::test]
    async fn options_carry_document_context() {
        let kms = EchoKms::default();
        let recorder = Recorder::default();
        let mut template = Proof::default();
        template.extra.insert("jws".to_string(), json!("eyJhbGciOiJFZERTQSJ9..sig"));
        template.extra.insert("signatureValue".to_string(), json!("legacy"));
        let suite = RemoteSigningSuite::new(&kms, "key-1")
            .verification_method("did:example:1#key-1")
            .proof(template)
            .canonicalizer(&recorder);

        let document = json!({
            "@context": ["https://www.w3.org/2018/credentials/v1"],
            "id": "urn:uuid:1",
            "proof": {"type": "Other"}
        });
        suite.create_proof(&document, "assertionMethod").await.expect("should sign");

        let inputs = recorder.inputs.lock().expect("lock");
        assert_eq!(inputs.len(), 2);

        let options = inputs[0].as_object().expect("should be an object");
        assert_eq!(options.get("@context"), Some(&document["@context"]));
        assert_eq!(options.get("proofPurpose"), Some(&json!("assertionMethod")));
        assert!(options.get("jws").is_none());
        assert!(options.get("signatureValue").is_none());
        assert!(options.get("proofValue").is_none());

        assert_eq!(inputs[1], json!({
            "@context": ["https://www.w3.org/2018/credentials/v1"],
            "id": "urn:uuid:1"
        }));
    }

    #[tokio::test]
    async fn options_without_context() {
        let kms = EchoKms::default();
        let recorder = Recorder::default();
        let suite = RemoteSigningSuite::new(&kms, "key-1")
            .verification_method("did:example:1#key-1")
            .canonicalizer(&recorder);

        suite.create_proof(&json!({"id": "urn:uuid:1"}), "assertionMethod").await.expect("should sign");

        let inputs = recorder.inputs.lock().expect("lock");
        assert!(inputs[0].get("@context").is_none());
    }

    #[tokio::test]
    async fn create_proof_ignores_existing_proof() {
        let kms = EchoKms::default();
        let suite = RemoteSigningSuite::new(&kms, "key-1").verification_method("did:example:1#a");

        let bare = json!({"id": "urn:uuid:1"});
        let with_proof = json!({"id": "urn:uuid:1", "proof": {"type": "Other"}});
        suite.create_proof(&bare, "assertionMethod").await.expect("should sign");
        suite.create_proof(&with_proof, "assertionMethod").await.expect("should sign");

        let requests = kms.requests.lock().expect("lock");
        assert_eq!(requests[0].1[32..], requests[1].1[32..]);
    }

    #[tokio::test]
    async fn create_proof_requires_verification_method() {
        let kms = EchoKms::default();
        let suite = RemoteSigningSuite::new(&kms, "key-1");
        let err = suite.create_proof(&json!({}), "assertionMethod").await.expect_err("should fail");
        assert!(matches!(err, Error::MalformedInput(_)));
        assert!(kms.requests.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn add_proof() {
        let kms = EchoKms::default();
        let template = Proof {
            challenge: Some("abc".to_string()),
            ..Proof::default()
        };
        let suite = RemoteSigningSuite::new(&kms, "key-1")
            .verification_method("did:example:1#key-1")
            .proof(template);

        let signed =
            suite.add_proof(json!({"id": "urn:uuid:1"}), "authentication").await.expect("should sign");
        assert_eq!(signed["proof"]["challenge"], "abc");
        assert_eq!(signed["proof"]["proofPurpose"], "authentication");
        assert!(signed["proof"]["proofValue"].as_str().is_some_and(|v| v.starts_with('z')));

        let err = suite.add_proof(json!([1, 2]), "authentication").await.expect_err("should fail");
        assert!(matches!(err, Error::MalformedInput(_)));
    }

    #[test]
    fn signature_type_tokens() {
        assert_eq!(
            "Ed25519Signature2020".parse::<SignatureType>().expect("should parse"),
            SignatureType::Ed25519Signature2020
        );
        let err = "Ed25519Signature2018".parse::<SignatureType>().expect_err("should fail");
        assert_eq!(err, Error::UnsupportedProofType("Ed25519Signature2018".to_string()));
    }
}
