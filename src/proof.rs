//! # Linked Data Proof
//!
//! [W3C Data Integrity](https://www.w3.org/TR/vc-data-integrity) proof
//! descriptor. The same structure is used for the proof options (before
//! signing) and the proof itself: signing only adds `proofValue`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Proof purpose used when issuing credentials.
pub const ASSERTION_METHOD: &str = "assertionMethod";

/// Proof purpose used when authenticating (e.g. presentations).
pub const AUTHENTICATION: &str = "authentication";

/// An embedded proof, or the options used to create one.
///
/// `proof_value` is `None` on proof options and is set exactly once, when the
/// proof is signed.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
#[allow(clippy::struct_field_names)]
pub struct Proof {
    /// An optional identifier for the proof. MUST be a URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// The proof type, e.g. "`Ed25519Signature2020`".
    #[serde(rename = "type")]
    pub type_: String,

    /// The reason for the proof, e.g. "`assertionMethod`".
    #[serde(skip_serializing_if = "String::is_empty")]
    pub proof_purpose: String,

    /// DID URL of the key used to verify the proof.
    /// e.g. `did:example:123456789abcdefghi#keys-1`.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub verification_method: String,

    /// The date-time the proof was created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,

    /// The date-time the proof expires.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,

    /// Security domain(s) in which the proof is meant to be used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<OneOrMany<String>>,

    /// Used to mitigate replay attacks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,

    /// Supplied by the proof creator to reduce linkability.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    /// The signature as a multibase-encoded string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_value: Option<String>,

    /// Members not otherwise modelled. Preserved through signing.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `OneOrMany` allows serde to serialize/deserialize a single object or a set
/// of objects.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    /// A single object.
    One(T),

    /// A set of objects.
    Many(Vec<T>),
}

impl<T: Default> Default for OneOrMany<T> {
    fn default() -> Self {
        Self::One(T::default())
    }
}

impl<T> From<T> for OneOrMany<T> {
    fn from(value: T) -> Self {
        Self::One(value)
    }
}

impl<T> From<Vec<T>> for OneOrMany<T> {
    fn from(value: Vec<T>) -> Self {
        Self::Many(value)
    }
}
