//! # DID Peer (numalgo 4)
//!
//! A `did:peer:4` DID carries its own document. The long form is
//!
//! ```text
//! did:peer:4<hash>:<encoded document>
//! ```
//!
//! where `<encoded document>` is the multibase (base58btc) encoding of the
//! multicodec `json` prefix followed by the JSON input document, and `<hash>`
//! is the multibase (base58btc) encoding of the sha2-256 multihash of the
//! `<encoded document>` string. The short form, `did:peer:4<hash>`, cannot be
//! resolved on its own.
//!
//! See <https://identity.foundation/peer-did-method-spec/#method-4-short-form-and-long-form>.

use multibase::Base;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::document::Document;
use crate::error::{Error, Result};

/// Prefix shared by all `did:peer:4` DIDs.
pub const PREFIX: &str = "did:peer:4";

// varint-encoded multicodec `json` (0x0200)
const JSON_CODEC: [u8; 2] = [0x80, 0x04];

// multihash header: sha2-256, 32 bytes
const SHA2_256: [u8; 2] = [0x12, 0x20];

/// Resolves a DID to its DID document.
pub trait DidResolver: Send + Sync {
    /// Resolve `did`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Resolution`] if the DID cannot be resolved.
    fn resolve(&self, did: &str) -> impl Future<Output = Result<Document>> + Send;
}

/// Resolver for long-form `did:peer:4` DIDs.
#[derive(Clone, Copy, Debug, Default)]
pub struct PeerDid4;

impl DidResolver for PeerDid4 {
    async fn resolve(&self, did: &str) -> Result<Document> {
        resolve(did)
    }
}

/// Resolve a long-form `did:peer:4` DID into its contextualized document.
///
/// The document's `id` is set to the long-form DID, the short form is added
/// to `alsoKnownAs`, and verification methods without a controller are
/// controlled by the DID.
///
/// # Errors
///
/// Returns [`Error::Resolution`] if the DID is not a long-form `did:peer:4`,
/// the hash does not match the encoded document, or the document cannot be
/// decoded.
pub fn resolve(did: &str) -> Result<Document> {
    let (short, encoded) = split(did)?;
    let mut doc = decode_document(encoded)?;

    doc.id = did.to_string();
    let also_known_as = doc.also_known_as.get_or_insert_with(Vec::new);
    if !also_known_as.iter().any(|aka| aka == short) {
        also_known_as.push(short.to_string());
    }
    for vm in doc.embedded_methods_mut() {
        vm.entry("controller").or_insert_with(|| Value::String(did.to_string()));
    }

    tracing::debug!("resolved {short}");
    Ok(doc)
}

/// Encode an input document as a long-form `did:peer:4` DID.
///
/// The input document has no root `id`; any `id` set on `document` is not
/// encoded.
///
/// # Errors
///
/// Returns [`Error::MalformedInput`] if the document cannot be serialized.
pub fn encode(document: &Document) -> Result<String> {
    let input = Document {
        id: String::new(),
        ..document.clone()
    };
    let json = serde_json::to_vec(&input)?;
    let encoded = multibase::encode(Base::Base58Btc, [&JSON_CODEC[..], &json[..]].concat());
    Ok(format!("{PREFIX}{}:{encoded}", hash(&encoded)))
}

/// The short form of a long-form `did:peer:4` DID.
///
/// # Errors
///
/// Returns [`Error::Resolution`] if the DID is not a valid long-form
/// `did:peer:4`.
pub fn short_form(did: &str) -> Result<&str> {
    split(did).map(|(short, _)| short)
}

// Split a long-form DID into its short form and encoded document, checking the
// hash.
fn split(did: &str) -> Result<(&str, &str)> {
    let Some(rest) = did.strip_prefix(PREFIX) else {
        return Err(Error::Resolution(format!("{did} is not a did:peer:4")));
    };
    let Some((expected, encoded)) = rest.split_once(':') else {
        return Err(Error::Resolution(format!("{did} is not a long-form did:peer:4")));
    };
    if hash(encoded) != expected {
        return Err(Error::Resolution(format!("{did} hash does not match document")));
    }
    Ok((&did[..PREFIX.len() + expected.len()], encoded))
}

fn hash(encoded: &str) -> String {
    let digest = Sha256::digest(encoded.as_bytes());
    multibase::encode(Base::Base58Btc, [&SHA2_256[..], digest.as_slice()].concat())
}

fn decode_document(encoded: &str) -> Result<Document> {
    let (base, bytes) = multibase::decode(encoded)
        .map_err(|e| Error::Resolution(format!("invalid document encoding: {e}")))?;
    if base != Base::Base58Btc {
        return Err(Error::Resolution("document is not base58btc encoded".to_string()));
    }
    let Some(json) = bytes.strip_prefix(&JSON_CODEC[..]) else {
        return Err(Error::Resolution("document is not multicodec json".to_string()));
    };
    serde_json::from_slice(json).map_err(|e| Error::Resolution(format!("invalid document: {e}")))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn input_document() -> Document {
        serde_json::from_value(json!({
            "@context": ["https://www.w3.org/ns/did/v1", "https://w3id.org/security/multikey/v1"],
            "verificationMethod": [{
                "id": "#key-1",
                "type": "Multikey",
                "publicKeyMultibase": "z6MkqRYqQiSgvZQdnBytw86Qbs2ZWUkGv22od935YF4s8M7V"
            }],
            "authentication": ["#key-1"],
            "assertionMethod": ["#key-1"]
        }))
        .expect("should deserialize")
    }

    #[test]
    fn resolve_long_form() {
        let did = encode(&input_document()).expect("should encode");
        let short = short_form(&did).expect("should split");
        assert!(short.starts_with("did:peer:4z"));
        assert!(did.starts_with(&format!("{short}:z")));

        let doc = resolve(&did).expect("should resolve");
        assert_eq!(doc.id, did);
        assert_eq!(doc.also_known_as, Some(vec![short.to_string()]));
        assert_eq!(doc.first_assertion_method(), Some("#key-1"));

        let vm = &doc.verification_method.expect("should have methods")[0];
        assert_eq!(vm.get("controller"), Some(&Value::String(did.clone())));
        assert_eq!(vm.get("id"), Some(&json!("#key-1")));
    }

    #[test]
    fn input_document_has_no_id() {
        let mut document = input_document();
        document.id = "did:example:123".to_string();
        let did = encode(&document).expect("should encode");
        let (_, encoded) = did.rsplit_once(':').expect("long form");

        let (_, bytes) = multibase::decode(encoded).expect("should decode");
        let json = bytes.strip_prefix(&JSON_CODEC[..]).expect("should be multicodec json");
        let value: Value = serde_json::from_slice(json).expect("should parse");
        assert!(value.get("id").is_none());
        assert_eq!(value["assertionMethod"], json!(["#key-1"]));

        assert_eq!(encode(&input_document()).expect("should encode"), did);
    }

    #[test]
    fn tampered_document() {
        let did = encode(&input_document()).expect("should encode");
        let other = encode(&Document::default()).expect("should encode");
        let (_, other_doc) = other.rsplit_once(':').expect("long form");
        let tampered = format!("{}:{other_doc}", short_form(&did).expect("should split"));

        let err = resolve(&tampered).expect_err("should fail");
        assert!(matches!(err, Error::Resolution(_)));
    }

    #[test]
    fn short_form_unresolvable() {
        let did = encode(&input_document()).expect("should encode");
        let short = short_form(&did).expect("should split");
        assert!(matches!(resolve(short), Err(Error::Resolution(_))));
    }

    #[test]
    fn not_peer() {
        assert!(matches!(resolve("did:key:z6Mk"), Err(Error::Resolution(_))));
        assert!(matches!(resolve("did:peer:4zQm:not-multibase!"), Err(Error::Resolution(_))));
    }
}
